use std::ops::Range;

use num::bigint::BigInt;

use crate::net::ids::EventId;
use crate::net::index_vec::{Idx, IndexVec};
use crate::net::structure::Weight;
use crate::synthesize::region::Region;
use crate::synthesize::separation::SeparationError;

/// Position of every unknown in the flat solution vector:
///
/// ```text
/// | weight (E) | basis coefficients (B) | forward (E) | backward (E) | m0 |
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableLayout {
    events: usize,
    basis: usize,
}

impl VariableLayout {
    pub fn new(events: usize, basis: usize) -> Self {
        Self { events, basis }
    }

    pub fn weights(&self) -> Range<usize> {
        0..self.events
    }

    pub fn coefficients(&self) -> Range<usize> {
        let start = self.weights().end;
        start..start + self.basis
    }

    pub fn forward_weights(&self) -> Range<usize> {
        let start = self.coefficients().end;
        start..start + self.events
    }

    pub fn backward_weights(&self) -> Range<usize> {
        let start = self.forward_weights().end;
        start..start + self.events
    }

    pub fn initial_marking(&self) -> usize {
        self.backward_weights().end
    }

    /// Total number of variables, `3E + B + 1`.
    pub fn len(&self) -> usize {
        self.initial_marking() + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn weight(&self, event: EventId) -> usize {
        self.weights().start + event.index()
    }

    pub fn coefficient(&self, basis_entry: usize) -> usize {
        self.coefficients().start + basis_entry
    }

    pub fn forward(&self, event: EventId) -> usize {
        self.forward_weights().start + event.index()
    }

    pub fn backward(&self, event: EventId) -> usize {
        self.backward_weights().start + event.index()
    }

    /// A zero coefficient vector covering every variable.
    pub fn zeros(&self) -> Vec<i64> {
        vec![0; self.len()]
    }

    /// Reads the region out of a solution vector.
    pub fn decode(&self, solution: &[BigInt]) -> Result<Region, SeparationError> {
        let value = |variable: usize| -> Result<Weight, SeparationError> {
            let value = solution.get(variable).cloned().unwrap_or_default();
            Weight::try_from(&value).map_err(|_| SeparationError::ValueOutOfRange {
                variable,
                value: value.to_string(),
            })
        };
        let backward = self
            .backward_weights()
            .map(value)
            .collect::<Result<IndexVec<EventId, _>, _>>()?;
        let forward = self
            .forward_weights()
            .map(value)
            .collect::<Result<IndexVec<EventId, _>, _>>()?;
        Ok(Region::new(backward, forward, value(self.initial_marking())?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_follow_each_other() {
        let layout = VariableLayout::new(2, 3);
        assert_eq!(layout.weights(), 0..2);
        assert_eq!(layout.coefficients(), 2..5);
        assert_eq!(layout.forward_weights(), 5..7);
        assert_eq!(layout.backward_weights(), 7..9);
        assert_eq!(layout.initial_marking(), 9);
        assert_eq!(layout.len(), 10);
        assert_eq!(layout.backward(EventId::new(1)), 8);
    }

    #[test]
    fn decode_reads_weights_and_marking() {
        let layout = VariableLayout::new(2, 1);
        // w = (1, -2), lambda = 7, f = (1, 0), b = (0, 2), m0 = 3
        let solution = [1, -2, 7, 1, 0, 0, 2, 3].map(BigInt::from);
        let region = layout.decode(&solution).unwrap();
        assert_eq!(region.weight(EventId::new(0)), 1);
        assert_eq!(region.backward_weight(EventId::new(1)), 2);
        assert_eq!(region.initial_marking(), 3);

        let negative = [0, 0, 0, 0, 0, 0, 0, -1].map(BigInt::from);
        assert!(matches!(
            layout.decode(&negative),
            Err(SeparationError::ValueOutOfRange { variable: 7, .. })
        ));
    }
}
