//! 带标签迁移系统（LTS）：区域综合的输入。
//!
//! 状态为 petgraph 节点，弧权重为事件标签；状态与弧的遍历顺序即插入顺序，
//! 因此生成树、事件编号等派生结构在多次运行间保持确定。

mod document;

use std::collections::BTreeSet;

use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use rustc_hash::FxHashMap;
use thiserror::Error;

pub use document::{ArcDocument, TsDocument};

pub type StateId = NodeIndex;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TsError {
    #[error("state `{0}` is declared twice")]
    DuplicateState(String),
    #[error("state `{0}` is not declared")]
    UnknownState(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    pub name: String,
}

/// Borrowed view of one labeled edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arc<'a> {
    pub id: EdgeIndex,
    pub source: StateId,
    pub label: &'a str,
    pub target: StateId,
}

#[derive(Debug, Clone)]
pub struct TransitionSystem {
    name: String,
    graph: DiGraph<State, String>,
    initial: StateId,
    names: FxHashMap<String, StateId>,
}

impl TransitionSystem {
    /// Creates a transition system holding only its initial state.
    pub fn new(name: impl Into<String>, initial: impl Into<String>) -> Self {
        let mut ts = Self {
            name: name.into(),
            graph: DiGraph::new(),
            initial: NodeIndex::new(0),
            names: FxHashMap::default(),
        };
        ts.initial = ts.insert_state(initial.into());
        ts
    }

    fn insert_state(&mut self, name: String) -> StateId {
        let id = self.graph.add_node(State { name: name.clone() });
        self.names.insert(name, id);
        id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_state(&mut self, name: impl Into<String>) -> Result<StateId, TsError> {
        let name = name.into();
        if self.names.contains_key(&name) {
            return Err(TsError::DuplicateState(name));
        }
        Ok(self.insert_state(name))
    }

    /// Returns the state called `name`, creating it if needed.
    pub fn state_or_insert(&mut self, name: &str) -> StateId {
        match self.names.get(name) {
            Some(id) => *id,
            None => self.insert_state(name.to_owned()),
        }
    }

    pub fn state(&self, name: &str) -> Option<StateId> {
        self.names.get(name).copied()
    }

    pub fn state_name(&self, state: StateId) -> &str {
        &self.graph[state].name
    }

    pub fn initial(&self) -> StateId {
        self.initial
    }

    pub fn set_initial(&mut self, state: StateId) {
        assert!(
            state.index() < self.graph.node_count(),
            "initial state {state:?} does not belong to `{}`",
            self.name
        );
        self.initial = state;
    }

    pub fn add_arc(&mut self, source: StateId, label: impl Into<String>, target: StateId) -> EdgeIndex {
        self.graph.add_edge(source, target, label.into())
    }

    pub fn add_arc_by_name(&mut self, source: &str, label: &str, target: &str) -> Result<EdgeIndex, TsError> {
        let source = self
            .state(source)
            .ok_or_else(|| TsError::UnknownState(source.to_owned()))?;
        let target = self
            .state(target)
            .ok_or_else(|| TsError::UnknownState(target.to_owned()))?;
        Ok(self.add_arc(source, label, target))
    }

    pub fn state_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn arc_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn states(&self) -> impl Iterator<Item = StateId> + '_ {
        self.graph.node_indices()
    }

    pub fn arcs(&self) -> impl Iterator<Item = Arc<'_>> {
        self.graph.edge_references().map(|edge| Arc {
            id: edge.id(),
            source: edge.source(),
            label: edge.weight().as_str(),
            target: edge.target(),
        })
    }

    /// Outgoing arcs of `state` in insertion order.
    pub fn outgoing(&self, state: StateId) -> Vec<Arc<'_>> {
        let mut arcs = self
            .graph
            .edges(state)
            .map(|edge| Arc {
                id: edge.id(),
                source: edge.source(),
                label: edge.weight().as_str(),
                target: edge.target(),
            })
            .collect::<Vec<_>>();
        arcs.sort_by_key(|arc| arc.id);
        arcs
    }

    pub fn is_enabled(&self, state: StateId, label: &str) -> bool {
        self.graph.edges(state).any(|edge| edge.weight() == label)
    }

    /// Distinct arc labels in lexicographic order.
    pub fn alphabet(&self) -> BTreeSet<&str> {
        self.graph.edge_weights().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_states_and_arcs_in_order() {
        let mut ts = TransitionSystem::new("ts", "s0");
        let s0 = ts.initial();
        let s1 = ts.add_state("s1").unwrap();
        ts.add_arc(s0, "b", s1);
        ts.add_arc(s0, "a", s1);
        ts.add_arc_by_name("s1", "c", "s0").unwrap();

        assert_eq!(ts.state_count(), 2);
        assert_eq!(ts.arc_count(), 3);
        assert_eq!(ts.state("s1"), Some(s1));
        assert_eq!(ts.state_name(s0), "s0");
        let labels = ts.outgoing(s0).iter().map(|arc| arc.label).collect::<Vec<_>>();
        assert_eq!(labels, vec!["b", "a"]);
        assert_eq!(ts.alphabet().into_iter().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert!(ts.is_enabled(s1, "c"));
        assert!(!ts.is_enabled(s1, "a"));
    }

    #[test]
    fn rejects_duplicate_and_unknown_states() {
        let mut ts = TransitionSystem::new("ts", "s0");
        assert_eq!(ts.add_state("s0"), Err(TsError::DuplicateState("s0".into())));
        assert_eq!(
            ts.add_arc_by_name("s0", "a", "nowhere"),
            Err(TsError::UnknownState("nowhere".into()))
        );
        let s1 = ts.state_or_insert("s1");
        assert_eq!(ts.state_or_insert("s1"), s1);
    }
}
