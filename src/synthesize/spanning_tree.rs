//! 从初始状态出发的广度优先生成树。每个可达状态记录一条到达它的树弧，
//! 以及沿树路径计数得到的 Parikh 向量；非树弧（chord）留给区域基计算使用。
use std::collections::VecDeque;

use petgraph::graph::EdgeIndex;
use rustc_hash::FxHashMap;

use crate::net::ids::EventId;
use crate::net::index_vec::IndexVec;
use crate::synthesize::UtilityError;
use crate::synthesize::utility::EventIndex;
use crate::ts::{StateId, TransitionSystem};

/// Event occurrence counts along the tree path to a state.
pub type ParikhVector = IndexVec<EventId, u64>;

#[derive(Debug, Clone)]
pub struct SpanningTree {
    /// Tree arc `(source, event)` entering each reachable non-initial state.
    predecessor: FxHashMap<StateId, (StateId, EventId)>,
    parikh: FxHashMap<StateId, ParikhVector>,
    /// Reachable states in breadth-first order, initial state first.
    order: Vec<StateId>,
    chords: Vec<EdgeIndex>,
    state_names: FxHashMap<StateId, String>,
}

impl SpanningTree {
    pub fn new(ts: &TransitionSystem, events: &EventIndex) -> Result<Self, UtilityError> {
        let initial = ts.initial();
        let mut predecessor = FxHashMap::default();
        let mut parikh = FxHashMap::default();
        let mut order = vec![initial];
        let mut chords = Vec::new();

        parikh.insert(initial, IndexVec::from_elem_n(0, events.len()));
        let mut queue = VecDeque::from([initial]);
        while let Some(state) = queue.pop_front() {
            for arc in ts.outgoing(state) {
                if parikh.contains_key(&arc.target) {
                    chords.push(arc.id);
                    continue;
                }
                let event = events.index(arc.label)?;
                let mut vector = parikh[&state].clone();
                vector[event] += 1;
                parikh.insert(arc.target, vector);
                predecessor.insert(arc.target, (state, event));
                order.push(arc.target);
                queue.push_back(arc.target);
            }
        }
        chords.sort();

        let state_names = ts
            .states()
            .map(|state| (state, ts.state_name(state).to_owned()))
            .collect();

        Ok(Self {
            predecessor,
            parikh,
            order,
            chords,
            state_names,
        })
    }

    pub fn initial(&self) -> StateId {
        self.order[0]
    }

    pub fn is_reachable(&self, state: StateId) -> bool {
        self.parikh.contains_key(&state)
    }

    pub fn parikh_vector(&self, state: StateId) -> Result<&ParikhVector, UtilityError> {
        self.parikh.get(&state).ok_or_else(|| {
            UtilityError::Unreachable(
                self.state_names
                    .get(&state)
                    .cloned()
                    .unwrap_or_else(|| format!("{state:?}")),
            )
        })
    }

    pub fn predecessor(&self, state: StateId) -> Option<(StateId, EventId)> {
        self.predecessor.get(&state).copied()
    }

    /// Events along the tree path from the initial state to `state`.
    pub fn firing_sequence(&self, state: StateId) -> Result<Vec<EventId>, UtilityError> {
        self.parikh_vector(state)?;
        let mut sequence = Vec::new();
        let mut current = state;
        while let Some((source, event)) = self.predecessor(current) {
            sequence.push(event);
            current = source;
        }
        sequence.reverse();
        Ok(sequence)
    }

    pub fn reachable_states(&self) -> &[StateId] {
        &self.order
    }

    /// Arcs with a reachable source that are not tree arcs, in arc order.
    pub fn chords(&self) -> &[EdgeIndex] {
        &self.chords
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthesize::fixtures;

    #[test]
    fn tree_covers_reachable_states_only() {
        let ts = fixtures::cycle_with_orphan();
        let events = EventIndex::new(&ts);
        let tree = SpanningTree::new(&ts, &events).unwrap();

        let s0 = ts.state("s0").unwrap();
        let s1 = ts.state("s1").unwrap();
        let u = ts.state("u").unwrap();
        assert_eq!(tree.reachable_states(), &[s0, s1]);
        assert!(!tree.is_reachable(u));
        assert_eq!(
            tree.parikh_vector(u).unwrap_err(),
            UtilityError::Unreachable("u".into())
        );

        let a = events.index("a").unwrap();
        assert_eq!(tree.parikh_vector(s1).unwrap()[a], 1);
        assert_eq!(tree.predecessor(s1), Some((s0, a)));
        assert_eq!(tree.firing_sequence(s1).unwrap(), vec![a]);
        // s1 --b--> s0 closes the cycle; u --c--> s0 is ignored
        assert_eq!(tree.chords().len(), 1);
    }

    #[test]
    fn diamond_has_one_chord() {
        let ts = fixtures::diamond();
        let events = EventIndex::new(&ts);
        let tree = SpanningTree::new(&ts, &events).unwrap();
        assert_eq!(tree.reachable_states().len(), 4);
        assert_eq!(tree.chords().len(), 1);

        let s3 = ts.state("s3").unwrap();
        let vector = tree.parikh_vector(s3).unwrap();
        assert_eq!(vector.iter().copied().collect::<Vec<_>>(), vec![1, 1]);
        assert_eq!(tree.firing_sequence(s3).unwrap().len(), 2);
    }
}
