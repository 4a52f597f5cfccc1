//! Parsing Options.
//! `pn-synth <INPUT> [--config FILE] [--k-bounded K] [--plain] [--pure] ...`

use clap::{Arg, ArgAction, Command, value_parser};
use std::error::Error;
use std::path::PathBuf;

use crate::synthesize::PnProperties;

fn flag(name: &'static str, long: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(long).help(help).action(ArgAction::SetTrue)
}

fn make_options_parser() -> clap::Command {
    let parser = Command::new("pn-synth")
        .no_binary_name(true)
        .version("v0.1.0")
        .about("Synthesize a Petri net from a labeled transition system")
        .arg(
            Arg::new("input")
                .value_name("TS")
                .help("Transition system in JSON or RON (chosen by extension)")
                .required(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("TOML configuration file")
                .default_value("pn-synth.toml")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("k-bounded")
                .short('k')
                .long("k-bounded")
                .value_name("K")
                .help("Every place holds at most K tokens")
                .value_parser(value_parser!(u32)),
        )
        .arg(flag("plain", "plain", "Arc weights are at most 1"))
        .arg(flag("pure", "pure", "No side conditions"))
        .arg(flag("t-net", "t-net", "Every place has at most one input and one output transition"))
        .arg(flag("conflict-free", "conflict-free", "Places with several outputs never lose tokens"))
        .arg(flag(
            "output-nonbranching",
            "output-nonbranching",
            "Every place has at most one output transition",
        ))
        .arg(flag("parallel", "parallel", "Solve separation problems in parallel"))
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Path to file where the synthesized net will be stored")
                .default_value("net.json")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("dot")
                .long("dot")
                .value_name("FILE")
                .help("Also render the net as Graphviz DOT")
                .value_parser(value_parser!(PathBuf)),
        );
    parser
}

#[derive(Debug, Default)]
pub struct Options {
    pub input: PathBuf,
    pub config: PathBuf,
    pub properties: PnProperties,
    pub parallel: bool,
    pub output: PathBuf,
    pub dot: Option<PathBuf>,
}

impl Options {
    pub fn parse_from_str(s: &str) -> Result<Self, Box<dyn Error>> {
        let flags = shellwords::split(s)?;
        Self::parse_from_args(&flags)
    }

    pub fn parse_from_args(flags: &[String]) -> Result<Self, Box<dyn Error>> {
        let app = make_options_parser();
        let matches = app.try_get_matches_from(flags.iter())?;

        let mut properties = PnProperties::new()
            .with_plain(matches.get_flag("plain"))
            .with_pure(matches.get_flag("pure"))
            .with_t_net(matches.get_flag("t-net"))
            .with_conflict_free(matches.get_flag("conflict-free"))
            .with_output_nonbranching(matches.get_flag("output-nonbranching"));
        if let Some(k) = matches.get_one::<u32>("k-bounded") {
            properties = properties.with_k_bounded(*k);
        }

        let path = |id: &str| -> Result<PathBuf, Box<dyn Error>> {
            Ok(matches
                .get_one::<PathBuf>(id)
                .ok_or_else(|| format!("missing value for `{id}`"))?
                .clone())
        };

        Ok(Options {
            input: path("input")?,
            config: path("config")?,
            properties,
            parallel: matches.get_flag("parallel"),
            output: path("output")?,
            dot: matches.get_one::<PathBuf>("dot").cloned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_from_str() {
        let options = Options::parse_from_str("ts.json -k 1 --plain --dot 'out net.dot'").unwrap();
        assert_eq!(options.input, PathBuf::from("ts.json"));
        assert_eq!(options.config, PathBuf::from("pn-synth.toml"));
        assert_eq!(options.output, PathBuf::from("net.json"));
        assert_eq!(options.dot, Some(PathBuf::from("out net.dot")));
        assert_eq!(options.properties.k_bounded(), Some(1));
        assert!(options.properties.is_plain());
        assert!(!options.properties.is_pure());
        assert!(!options.parallel);
    }

    #[test]
    fn test_conflict_free_flag_implies_plain() {
        let options = Options::parse_from_args(&[
            "ts.ron".to_owned(),
            "--conflict-free".to_owned(),
            "--parallel".to_owned(),
        ])
        .unwrap();
        assert!(options.properties.is_plain());
        assert!(options.parallel);
    }

    #[test]
    fn test_parse_from_str_err() {
        assert!(Options::parse_from_str("ts.json -k many").is_err());
        assert!(Options::parse_from_str("--plain").is_err());
        assert!(Options::parse_from_str("ts.json 'unterminated").is_err());
    }
}
