use std::fmt;

use crate::net::ids::EventId;
use crate::net::index_vec::{Idx, IndexVec};
use crate::net::structure::Weight;
use crate::synthesize::UtilityError;
use crate::synthesize::spanning_tree::{ParikhVector, SpanningTree};
use crate::synthesize::utility::RegionUtility;
use crate::ts::StateId;

/// A candidate place: per-event backward (consumed) and forward (produced)
/// weights plus an initial marking.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Region {
    backward: IndexVec<EventId, Weight>,
    forward: IndexVec<EventId, Weight>,
    initial_marking: Weight,
}

impl Region {
    pub fn new(
        backward: IndexVec<EventId, Weight>,
        forward: IndexVec<EventId, Weight>,
        initial_marking: Weight,
    ) -> Self {
        assert_eq!(
            backward.len(),
            forward.len(),
            "backward and forward weights must cover the same events"
        );
        Self {
            backward,
            forward,
            initial_marking,
        }
    }

    /// Pure region with the given net weights and initial marking 0.
    pub fn from_weights(weights: &[i64]) -> Self {
        Self::new(
            weights.iter().map(|w| (-w).max(0) as Weight).collect(),
            weights.iter().map(|w| (*w).max(0) as Weight).collect(),
            0,
        )
    }

    pub fn with_initial_marking(mut self, initial_marking: Weight) -> Self {
        self.initial_marking = initial_marking;
        self
    }

    pub fn number_of_events(&self) -> usize {
        self.backward.len()
    }

    pub fn backward_weight(&self, event: EventId) -> Weight {
        self.backward[event]
    }

    pub fn forward_weight(&self, event: EventId) -> Weight {
        self.forward[event]
    }

    /// Net effect of `event` on the region's marking.
    pub fn weight(&self, event: EventId) -> i64 {
        self.forward[event] as i64 - self.backward[event] as i64
    }

    pub fn initial_marking(&self) -> Weight {
        self.initial_marking
    }

    /// `m0 + Parikh · weight`
    pub fn evaluate_parikh_vector(&self, parikh: &ParikhVector) -> i64 {
        self.initial_marking as i64 + self.weighted_sum(parikh)
    }

    fn weighted_sum(&self, parikh: &ParikhVector) -> i64 {
        parikh
            .iter_enumerated()
            .map(|(event, count)| *count as i64 * self.weight(event))
            .sum()
    }

    pub fn marking_at(&self, utility: &RegionUtility<'_>, state: StateId) -> Result<i64, UtilityError> {
        Ok(self.evaluate_parikh_vector(utility.parikh_vector(state)?))
    }

    /// Removes side conditions: for every event the smaller of the two weights
    /// is subtracted from both, keeping the net weight.
    pub fn make_pure(&self) -> Region {
        let (backward, forward) = self
            .backward
            .iter()
            .zip(self.forward.iter())
            .map(|(b, f)| {
                let common = (*b).min(*f);
                (b - common, f - common)
            })
            .unzip::<_, _, Vec<_>, Vec<_>>();
        Region::new(backward.into(), forward.into(), self.initial_marking)
    }

    pub fn is_pure(&self) -> bool {
        self.backward
            .iter()
            .zip(self.forward.iter())
            .all(|(b, f)| *b == 0 || *f == 0)
    }

    /// Smallest initial marking keeping every reachable marking non-negative.
    pub fn minimal_consistent_marking(&self, utility: &RegionUtility<'_>) -> Weight {
        self.minimal_consistent_marking_in(utility.spanning_tree())
    }

    pub(crate) fn minimal_consistent_marking_in(&self, tree: &SpanningTree) -> Weight {
        tree.reachable_states()
            .iter()
            .filter_map(|state| tree.parikh_vector(*state).ok())
            .map(|parikh| -self.weighted_sum(parikh))
            .max()
            .unwrap_or(0)
            .max(0) as Weight
    }

    /// The region's markings at `state` and `other` differ.
    pub fn solves_state_separation(
        &self,
        utility: &RegionUtility<'_>,
        state: StateId,
        other: StateId,
    ) -> Result<bool, UtilityError> {
        Ok(self.marking_at(utility, state)? != self.marking_at(utility, other)?)
    }

    /// `event` cannot fire at `state` when this region is a place.
    pub fn solves_event_separation(
        &self,
        utility: &RegionUtility<'_>,
        state: StateId,
        event: EventId,
    ) -> Result<bool, UtilityError> {
        Ok(self.marking_at(utility, state)? < self.backward_weight(event) as i64)
    }

    /// Renders as `{init=m0, label:backward>forward, ...}` using the
    /// utility's event labels.
    pub fn display_with<'r>(&'r self, utility: &'r RegionUtility<'_>) -> impl fmt::Display {
        RegionDisplay {
            region: self,
            label: move |event: EventId| utility.event_label(event).to_owned(),
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        RegionDisplay {
            region: self,
            label: |event: EventId| event.index().to_string(),
        }
        .fmt(f)
    }
}

struct RegionDisplay<'r, F> {
    region: &'r Region,
    label: F,
}

impl<F: Fn(EventId) -> String> fmt::Display for RegionDisplay<'_, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{init={}", self.region.initial_marking)?;
        for event in self.region.backward.indices() {
            let (b, w) = (self.region.backward[event], self.region.forward[event]);
            if b != 0 || w != 0 {
                write!(f, ", {}:{}>{}", (self.label)(event), b, w)?;
            }
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthesize::fixtures;

    fn region(backward: &[Weight], forward: &[Weight], m0: Weight) -> Region {
        Region::new(backward.to_vec().into(), forward.to_vec().into(), m0)
    }

    #[test]
    fn weights_and_markings() {
        let ts = fixtures::cycle_with_orphan();
        let utility = RegionUtility::new(&ts).unwrap();
        let (a, b) = (EventId::new(0), EventId::new(1));
        // consumed by a, produced by b
        let r = region(&[1, 0, 0], &[0, 1, 0], 1);
        assert_eq!(r.weight(a), -1);
        assert_eq!(r.weight(b), 1);

        let s0 = ts.state("s0").unwrap();
        let s1 = ts.state("s1").unwrap();
        let u = ts.state("u").unwrap();
        assert_eq!(r.marking_at(&utility, s0), Ok(1));
        assert_eq!(r.marking_at(&utility, s1), Ok(0));
        assert!(r.marking_at(&utility, u).is_err());
        assert_eq!(r.solves_state_separation(&utility, s0, s1), Ok(true));
        assert_eq!(r.solves_event_separation(&utility, s1, a), Ok(true));
        assert_eq!(r.solves_event_separation(&utility, s0, a), Ok(false));
    }

    #[test]
    fn make_pure_keeps_net_weight() {
        let r = region(&[2, 1, 0], &[3, 1, 4], 5);
        let pure = r.make_pure();
        assert!(!r.is_pure());
        assert!(pure.is_pure());
        for event in (0..3).map(EventId::new) {
            assert_eq!(pure.weight(event), r.weight(event));
        }
        assert_eq!(pure.backward_weight(EventId::new(0)), 0);
        assert_eq!(pure.forward_weight(EventId::new(0)), 1);
        assert_eq!(pure.initial_marking(), 5);
    }

    #[test]
    fn minimal_marking_covers_deepest_consumption() {
        let ts = fixtures::cycle_with_orphan();
        let utility = RegionUtility::new(&ts).unwrap();
        // a consumes two tokens: s1 would go to -2 from an empty start
        let r = region(&[2, 0, 0], &[0, 2, 0], 7);
        assert_eq!(r.minimal_consistent_marking(&utility), 2);
        // producer-only regions need no tokens
        let r = region(&[0, 2, 0], &[2, 0, 0], 0);
        assert_eq!(r.minimal_consistent_marking(&utility), 0);
    }

    #[test]
    fn display_lists_nonzero_events() {
        let ts = fixtures::cycle_with_orphan();
        let utility = RegionUtility::new(&ts).unwrap();
        let r = region(&[1, 0, 0], &[0, 1, 0], 1);
        assert_eq!(r.to_string(), "{init=1, 0:1>0, 1:0>1}");
        assert_eq!(r.display_with(&utility).to_string(), "{init=1, a:1>0, b:0>1}");
    }
}
