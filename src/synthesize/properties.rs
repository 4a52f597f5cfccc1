use std::fmt;

use serde::{Deserialize, Serialize};

/// Structural properties requested for the synthesized net.
///
/// Conflict-freedom implies plainness; the builder keeps both flags in sync
/// and [`PnProperties::is_plain`] reports the normalized value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct PnProperties {
    k_bounded: Option<u32>,
    plain: bool,
    pure: bool,
    t_net: bool,
    conflict_free: bool,
    output_nonbranching: bool,
}

impl PnProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_k_bounded(mut self, k: u32) -> Self {
        self.k_bounded = Some(k);
        self
    }

    pub fn with_plain(mut self, plain: bool) -> Self {
        self.plain = plain;
        self
    }

    pub fn with_pure(mut self, pure: bool) -> Self {
        self.pure = pure;
        self
    }

    pub fn with_t_net(mut self, t_net: bool) -> Self {
        self.t_net = t_net;
        self
    }

    pub fn with_conflict_free(mut self, conflict_free: bool) -> Self {
        self.conflict_free = conflict_free;
        if conflict_free {
            self.plain = true;
        }
        self
    }

    pub fn with_output_nonbranching(mut self, output_nonbranching: bool) -> Self {
        self.output_nonbranching = output_nonbranching;
        self
    }

    pub fn k_bounded(&self) -> Option<u32> {
        self.k_bounded
    }

    pub fn is_plain(&self) -> bool {
        self.plain || self.conflict_free
    }

    pub fn is_pure(&self) -> bool {
        self.pure
    }

    pub fn is_t_net(&self) -> bool {
        self.t_net
    }

    pub fn is_conflict_free(&self) -> bool {
        self.conflict_free
    }

    pub fn is_output_nonbranching(&self) -> bool {
        self.output_nonbranching
    }

    /// Takes the `[properties]` flags of `other` on top of `self` (flags are
    /// only ever switched on, the tighter bound wins).
    pub fn merge(self, other: PnProperties) -> Self {
        let k_bounded = match (self.k_bounded, other.k_bounded) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        Self {
            k_bounded,
            plain: self.plain || other.plain,
            pure: self.pure || other.pure,
            t_net: self.t_net || other.t_net,
            conflict_free: self.conflict_free || other.conflict_free,
            output_nonbranching: self.output_nonbranching || other.output_nonbranching,
        }
    }
}

impl fmt::Display for PnProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Vec::new();
        if let Some(k) = self.k_bounded {
            names.push(format!("{k}-bounded"));
        }
        for (set, name) in [
            (self.is_plain(), "plain"),
            (self.pure, "pure"),
            (self.t_net, "tnet"),
            (self.conflict_free, "conflict-free"),
            (self.output_nonbranching, "output-nonbranching"),
        ] {
            if set {
                names.push(name.to_owned());
            }
        }
        write!(f, "[{}]", names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_free_implies_plain() {
        let properties = PnProperties::new().with_conflict_free(true);
        assert!(properties.is_plain());
        assert!(properties.is_conflict_free());
        assert!(!PnProperties::new().is_plain());
    }

    #[test]
    fn display_lists_requested_properties() {
        assert_eq!(PnProperties::new().to_string(), "[]");
        let properties = PnProperties::new().with_k_bounded(2).with_pure(true).with_t_net(true);
        assert_eq!(properties.to_string(), "[2-bounded, pure, tnet]");
    }

    #[test]
    fn merge_keeps_the_tighter_bound() {
        let left = PnProperties::new().with_k_bounded(3).with_plain(true);
        let right = PnProperties::new().with_k_bounded(1).with_pure(true);
        let merged = left.merge(right);
        assert_eq!(merged.k_bounded(), Some(1));
        assert!(merged.is_plain() && merged.is_pure());
        assert_eq!(PnProperties::new().merge(left).k_bounded(), Some(3));
    }

    #[test]
    fn deserializes_with_defaults() {
        let properties: PnProperties = toml::from_str("pure = true\nk_bounded = 1").unwrap();
        assert_eq!(properties, PnProperties::new().with_pure(true).with_k_bounded(1));
    }
}
