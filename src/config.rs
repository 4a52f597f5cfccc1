use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::synthesize::{LocationMap, PnProperties, RegionUtility};

/// Contents of a `pn-synth.toml` file.
///
/// ```toml
/// parallel = true
///
/// [properties]
/// k_bounded = 1
/// plain = true
///
/// [locations]
/// send = "client"
/// recv = "server"
/// ```
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
pub struct SynthConfig {
    #[serde(default)]
    pub properties: PnProperties,
    /// Event label -> location.
    #[serde(default)]
    pub locations: BTreeMap<String, String>,
    #[serde(default)]
    pub parallel: bool,
}

impl SynthConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: SynthConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        Ok(config)
    }

    pub fn location_map(&self, utility: &RegionUtility<'_>) -> Result<LocationMap> {
        LocationMap::from_labels(utility, &self.locations).context("Invalid [locations] table")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ts::TransitionSystem;

    #[test]
    fn missing_file_gives_defaults() {
        let config = SynthConfig::load_from_file("/nonexistent/pn-synth.toml").unwrap();
        assert_eq!(config, SynthConfig::default());
    }

    #[test]
    fn parses_properties_and_locations() {
        let config: SynthConfig = toml::from_str(
            r#"
            parallel = true

            [properties]
            k_bounded = 2
            t_net = true

            [locations]
            a = "left"
            "#,
        )
        .unwrap();
        assert!(config.parallel);
        assert_eq!(config.properties.k_bounded(), Some(2));
        assert!(config.properties.is_t_net());

        let mut ts = TransitionSystem::new("ts", "s0");
        let s0 = ts.initial();
        let s1 = ts.add_state("s1").unwrap();
        ts.add_arc(s0, "a", s1);
        let utility = RegionUtility::new(&ts).unwrap();
        let map = config.location_map(&utility).unwrap();
        assert_eq!(map.locations().into_iter().collect::<Vec<_>>(), vec!["left"]);
    }

    #[test]
    fn unknown_location_label_is_reported() {
        let config: SynthConfig = toml::from_str("[locations]\nzz = \"left\"").unwrap();
        let ts = TransitionSystem::new("ts", "s0");
        let utility = RegionUtility::new(&ts).unwrap();
        assert!(config.location_map(&utility).is_err());
    }
}
