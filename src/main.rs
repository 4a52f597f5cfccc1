use anyhow::{Context, Result, anyhow};
use log::{debug, info};

use pn_synth::config::SynthConfig;
use pn_synth::net::io;
use pn_synth::options::Options;
use pn_synth::synthesize::{RegionUtility, Synthesizer};
use pn_synth::ts::{TransitionSystem, TsDocument};

fn main() -> Result<()> {
    if std::env::var("PN_LOG").is_ok() {
        let e = env_logger::Env::new()
            .filter("PN_LOG")
            .write_style("PN_LOG_STYLE");
        env_logger::init_from_env(e);
    }

    // PN_FLAGS comes first so that explicit arguments win
    let mut flags = shellwords::split(&std::env::var("PN_FLAGS").unwrap_or_default())
        .context("PN_FLAGS is not a valid argument list")?;
    flags.extend(std::env::args().skip(1));
    let options = Options::parse_from_args(&flags).map_err(|e| anyhow!("{e}"))?;
    debug!("PN options: {:?}", options);

    let config = SynthConfig::load_from_file(&options.config)?;
    let properties = config.properties.merge(options.properties);
    let parallel = config.parallel || options.parallel;

    let document = TsDocument::read(&options.input)
        .with_context(|| format!("Failed to read transition system: {:?}", options.input))?;
    let ts = TransitionSystem::try_from(&document)
        .with_context(|| format!("Invalid transition system: {:?}", options.input))?;
    info!(
        "transition system `{}`: {} states, {} arcs",
        ts.name(),
        ts.state_count(),
        ts.arc_count()
    );

    let utility = RegionUtility::new(&ts)?;
    let locations = config.location_map(&utility)?;
    let outcome = Synthesizer::new(&utility, properties, &locations)?
        .with_parallel(parallel)
        .synthesize()?;
    print!("{outcome}");

    let net = outcome.to_net();
    io::write_file(&options.output, &net)
        .with_context(|| format!("Failed to write net: {:?}", options.output))?;
    if let Some(dot) = &options.dot {
        net.write_dot(dot)
            .with_context(|| format!("Failed to write DOT file: {:?}", dot))?;
    }

    if !outcome.is_success() {
        std::process::exit(2);
    }
    Ok(())
}
