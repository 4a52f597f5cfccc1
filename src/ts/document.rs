//! Serde form of a transition system, read and written through `net::io`.
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::net::io::{self, IoError};
use crate::ts::{TransitionSystem, TsError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArcDocument {
    pub source: String,
    pub label: String,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TsDocument {
    pub name: String,
    pub initial: String,
    /// Declared states; the initial state may be omitted.
    #[serde(default)]
    pub states: Vec<String>,
    #[serde(default)]
    pub arcs: Vec<ArcDocument>,
}

impl TsDocument {
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, IoError> {
        io::read_file(path)
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<(), IoError> {
        io::write_file(path, self)
    }
}

impl TryFrom<&TsDocument> for TransitionSystem {
    type Error = TsError;

    fn try_from(doc: &TsDocument) -> Result<Self, Self::Error> {
        let mut ts = TransitionSystem::new(doc.name.clone(), doc.initial.clone());
        let mut initial_listed = false;
        for state in &doc.states {
            if *state == doc.initial && !initial_listed {
                initial_listed = true;
                continue;
            }
            ts.add_state(state.clone())?;
        }
        for arc in &doc.arcs {
            ts.add_arc_by_name(&arc.source, &arc.label, &arc.target)?;
        }
        Ok(ts)
    }
}

impl From<&TransitionSystem> for TsDocument {
    fn from(ts: &TransitionSystem) -> Self {
        Self {
            name: ts.name().to_owned(),
            initial: ts.state_name(ts.initial()).to_owned(),
            states: ts.states().map(|s| ts.state_name(s).to_owned()).collect(),
            arcs: ts
                .arcs()
                .map(|arc| ArcDocument {
                    source: ts.state_name(arc.source).to_owned(),
                    label: arc.label.to_owned(),
                    target: ts.state_name(arc.target).to_owned(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::io::{from_json_str, from_ron_str};

    const CYCLE: &str = r#"{
        "name": "cycle",
        "initial": "s0",
        "states": ["s0", "s1"],
        "arcs": [
            { "source": "s0", "label": "a", "target": "s1" },
            { "source": "s1", "label": "b", "target": "s0" }
        ]
    }"#;

    #[test]
    fn json_document_builds_transition_system() {
        let doc: TsDocument = from_json_str(CYCLE).unwrap();
        let ts = TransitionSystem::try_from(&doc).unwrap();
        assert_eq!(ts.name(), "cycle");
        assert_eq!(ts.state_count(), 2);
        assert_eq!(ts.arc_count(), 2);
        assert_eq!(ts.state_name(ts.initial()), "s0");
        assert_eq!(TsDocument::from(&ts), doc);
    }

    #[test]
    fn ron_document_with_implicit_initial_state() {
        let doc: TsDocument = from_ron_str(
            r#"(name: "line", initial: "s0", states: ["s1"],
                arcs: [(source: "s0", label: "a", target: "s1")])"#,
        )
        .unwrap();
        let ts = TransitionSystem::try_from(&doc).unwrap();
        assert_eq!(ts.states().count(), 2);
    }

    #[test]
    fn undeclared_arc_endpoint_is_rejected() {
        let mut doc: TsDocument = from_json_str(CYCLE).unwrap();
        doc.arcs.push(ArcDocument {
            source: "s1".into(),
            label: "c".into(),
            target: "s9".into(),
        });
        assert_eq!(
            TransitionSystem::try_from(&doc).unwrap_err(),
            TsError::UnknownState("s9".into())
        );
    }
}
