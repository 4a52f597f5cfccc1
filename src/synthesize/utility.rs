use indexmap::IndexSet;
use log::debug;
use num::bigint::BigInt;
use num::traits::{One, Signed, Zero};

use crate::net::ids::EventId;
use crate::net::index_vec::Idx;
use crate::synthesize::UtilityError;
use crate::synthesize::region::Region;
use crate::synthesize::spanning_tree::{ParikhVector, SpanningTree};
use crate::ts::{StateId, TransitionSystem};

/// Fixed bijection between arc labels and `0..E`, in lexicographic label order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventIndex {
    labels: IndexSet<String>,
}

impl EventIndex {
    pub fn new(ts: &TransitionSystem) -> Self {
        Self {
            labels: ts.alphabet().into_iter().map(str::to_owned).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn index(&self, label: &str) -> Result<EventId, UtilityError> {
        self.labels
            .get_index_of(label)
            .map(EventId::from_usize)
            .ok_or_else(|| UtilityError::UnknownEvent(label.to_owned()))
    }

    pub fn label(&self, event: EventId) -> &str {
        &self.labels[event.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (EventId, &str)> {
        self.labels
            .iter()
            .enumerate()
            .map(|(idx, label)| (EventId::from_usize(idx), label.as_str()))
    }
}

/// Everything about a transition system that separation problems share:
/// event numbering, spanning tree and a basis of the region space. Immutable
/// once built, so one instance can serve concurrent queries.
#[derive(Debug, Clone)]
pub struct RegionUtility<'a> {
    ts: &'a TransitionSystem,
    events: EventIndex,
    tree: SpanningTree,
    basis: Vec<Region>,
}

impl<'a> RegionUtility<'a> {
    pub fn new(ts: &'a TransitionSystem) -> Result<Self, UtilityError> {
        let events = EventIndex::new(ts);
        let tree = SpanningTree::new(ts, &events)?;
        let weights = region_basis(ts, &events, &tree)?;
        let basis = weights
            .iter()
            .map(|weights| {
                let region = Region::from_weights(weights);
                let marking = region.minimal_consistent_marking_in(&tree);
                region.with_initial_marking(marking)
            })
            .collect::<Vec<_>>();
        debug!(
            "region utility for `{}`: {} events, {} reachable states, {} chords, basis of size {}",
            ts.name(),
            events.len(),
            tree.reachable_states().len(),
            tree.chords().len(),
            basis.len()
        );
        Ok(Self {
            ts,
            events,
            tree,
            basis,
        })
    }

    pub fn transition_system(&self) -> &'a TransitionSystem {
        self.ts
    }

    pub fn number_of_events(&self) -> usize {
        self.events.len()
    }

    pub fn events(&self) -> &EventIndex {
        &self.events
    }

    pub fn event_index(&self, label: &str) -> Result<EventId, UtilityError> {
        self.events.index(label)
    }

    pub fn event_label(&self, event: EventId) -> &str {
        self.events.label(event)
    }

    pub fn spanning_tree(&self) -> &SpanningTree {
        &self.tree
    }

    pub fn is_reachable(&self, state: StateId) -> bool {
        self.tree.is_reachable(state)
    }

    pub fn parikh_vector(&self, state: StateId) -> Result<&ParikhVector, UtilityError> {
        self.tree.parikh_vector(state)
    }

    pub fn region_basis(&self) -> &[Region] {
        &self.basis
    }
}

/// Integer basis of `{ w ∈ Z^E : ψ·w = 0 for every chord }`, where a chord
/// `s --e--> s'` contributes `ψ = Parikh(s) + e - Parikh(s')`.
///
/// Column operations with extended gcd steps bring the chord matrix into
/// echelon form while the same operations are applied to an identity matrix;
/// the columns that end up zero in the chord matrix span exactly the integer
/// kernel, not just a sublattice of it.
fn region_basis(
    ts: &TransitionSystem,
    events: &EventIndex,
    tree: &SpanningTree,
) -> Result<Vec<Vec<i64>>, UtilityError> {
    let size = events.len();
    let mut rows = Vec::with_capacity(tree.chords().len());
    let arcs = ts.arcs().collect::<Vec<_>>();
    for chord in tree.chords() {
        let arc = arcs[chord.index()];
        let source = tree.parikh_vector(arc.source)?;
        let target = tree.parikh_vector(arc.target)?;
        let mut row = source
            .iter()
            .zip(target.iter())
            .map(|(s, t)| BigInt::from(*s) - BigInt::from(*t))
            .collect::<Vec<_>>();
        row[events.index(arc.label)?.index()] += BigInt::one();
        if row.iter().any(|value| !value.is_zero()) {
            rows.push(row);
        }
    }

    // identity matrix receiving the same column operations as `rows`
    let mut transform = (0..size)
        .map(|j| {
            let mut row = vec![BigInt::zero(); size];
            row[j] = BigInt::one();
            row
        })
        .collect::<Vec<_>>();

    let mut pivot = 0usize;
    for i in 0..rows.len() {
        if pivot == size {
            break;
        }
        for j in pivot + 1..size {
            if rows[i][j].is_zero() {
                continue;
            }
            let a = rows[i][pivot].clone();
            let b = rows[i][j].clone();
            let (g, x, y) = extended_gcd(&a, &b);
            let (a, b) = (a / &g, b / &g);
            // [pivot, j] <- [x*pivot + y*j, -b*pivot + a*j], determinant 1
            combine_columns(&mut rows, pivot, j, (&x, &y), (&(-&b), &a));
            combine_columns(&mut transform, pivot, j, (&x, &y), (&(-b), &a));
        }
        if !rows[i][pivot].is_zero() {
            pivot += 1;
        }
    }

    (pivot..size)
        .map(|j| {
            transform
                .iter()
                .map(|row| {
                    i64::try_from(&row[j]).map_err(|_| UtilityError::BasisOverflow(row[j].to_string()))
                })
                .collect()
        })
        .collect()
}

/// Replaces columns `p` and `q` of `matrix` by `first.0*p + first.1*q` and
/// `second.0*p + second.1*q`.
fn combine_columns(
    matrix: &mut [Vec<BigInt>],
    p: usize,
    q: usize,
    first: (&BigInt, &BigInt),
    second: (&BigInt, &BigInt),
) {
    for row in matrix.iter_mut() {
        let (left, right) = (row[p].clone(), row[q].clone());
        row[p] = first.0 * &left + first.1 * &right;
        row[q] = second.0 * &left + second.1 * &right;
    }
}

/// `(g, x, y)` with `g = gcd(a, b) > 0` and `a*x + b*y = g`; `b` must be nonzero.
fn extended_gcd(a: &BigInt, b: &BigInt) -> (BigInt, BigInt, BigInt) {
    let (mut old_r, mut r) = (a.clone(), b.clone());
    let (mut old_x, mut x) = (BigInt::one(), BigInt::zero());
    let (mut old_y, mut y) = (BigInt::zero(), BigInt::one());
    while !r.is_zero() {
        let quotient = &old_r / &r;
        let next_r = &old_r - &quotient * &r;
        old_r = std::mem::replace(&mut r, next_r);
        let next_x = &old_x - &quotient * &x;
        old_x = std::mem::replace(&mut x, next_x);
        let next_y = &old_y - &quotient * &y;
        old_y = std::mem::replace(&mut y, next_y);
    }
    if old_r.is_negative() {
        (-old_r, -old_x, -old_y)
    } else {
        (old_r, old_x, old_y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthesize::fixtures;

    fn dot(parikh: &ParikhVector, weights: &[i64]) -> i64 {
        parikh.iter().zip(weights).map(|(p, w)| *p as i64 * w).sum()
    }

    #[test]
    fn event_index_is_sorted_and_strict() {
        let ts = fixtures::diamond();
        let utility = RegionUtility::new(&ts).unwrap();
        assert_eq!(utility.number_of_events(), 2);
        assert_eq!(utility.event_index("a").unwrap(), EventId::new(0));
        assert_eq!(utility.event_label(EventId::new(1)), "b");
        assert_eq!(
            utility.event_index("zz"),
            Err(UtilityError::UnknownEvent("zz".into()))
        );
    }

    #[test]
    fn tree_without_chords_has_unit_basis() {
        let ts = fixtures::single_arc();
        let utility = RegionUtility::new(&ts).unwrap();
        let basis = utility.region_basis();
        assert_eq!(basis.len(), 1);
        assert_eq!(basis[0].weight(EventId::new(0)), 1);
    }

    #[test]
    fn cycle_forces_opposite_weights() {
        let ts = fixtures::cycle_with_orphan();
        let utility = RegionUtility::new(&ts).unwrap();
        // events a, b, c; the chord s1 --b--> s0 demands w(a) + w(b) = 0
        let a = utility.event_index("a").unwrap();
        let b = utility.event_index("b").unwrap();
        let basis = utility.region_basis();
        assert_eq!(basis.len(), 2);
        for region in basis {
            assert_eq!(region.weight(a) + region.weight(b), 0);
        }
        assert!(basis.iter().any(|region| region.weight(a) != 0));
    }

    #[test]
    fn basis_regions_are_consistent_with_every_chord() {
        let ts = fixtures::diamond();
        let utility = RegionUtility::new(&ts).unwrap();
        let tree = utility.spanning_tree();
        let arcs = ts.arcs().collect::<Vec<_>>();
        for region in utility.region_basis() {
            let weights = (0..utility.number_of_events())
                .map(|e| region.weight(EventId::from_usize(e)))
                .collect::<Vec<_>>();
            for arc in &arcs {
                let event = utility.event_index(arc.label).unwrap();
                let before = dot(tree.parikh_vector(arc.source).unwrap(), &weights);
                let after = dot(tree.parikh_vector(arc.target).unwrap(), &weights);
                assert_eq!(before + weights[event.index()], after);
            }
        }
    }

    #[test]
    fn basis_generates_the_whole_integer_kernel() {
        // 2*w0 + w1 + w2 = 0 has kernel vector (0, 1, -1) which is only a
        // half-integer combination of the rational echelon basis.
        let mut ts = TransitionSystem::new("kernel", "s0");
        let s0 = ts.initial();
        let s1 = ts.add_state("s1").unwrap();
        let s2 = ts.add_state("s2").unwrap();
        // tree a, a, b; the chord t --c--> s0 contributes (2, 1, 1)
        let t = ts.add_state("t").unwrap();
        ts.add_arc(s0, "a", s1);
        ts.add_arc(s1, "a", s2);
        ts.add_arc(s2, "b", t);
        ts.add_arc(t, "c", s0);
        let utility = RegionUtility::new(&ts).unwrap();
        let basis = utility
            .region_basis()
            .iter()
            .map(|region| (0..3).map(|e| region.weight(EventId::new(e))).collect::<Vec<_>>())
            .collect::<Vec<_>>();
        assert_eq!(basis.len(), 2);
        // the 2x3 basis matrix must have a 2x2 minor equal to +-1 for
        // (0, 1, -1) and (1, -2, 0) to be integer combinations
        let minor = |i: usize, j: usize| basis[0][i] * basis[1][j] - basis[0][j] * basis[1][i];
        let gcd_of_minors = [minor(0, 1), minor(0, 2), minor(1, 2)]
            .iter()
            .fold(0i64, |acc, m| num::integer::gcd(acc, *m));
        assert_eq!(gcd_of_minors, 1);
        for row in &basis {
            assert_eq!(2 * row[0] + row[1] + row[2], 0);
        }
    }

    #[test]
    fn extended_gcd_normalizes_sign() {
        let (g, x, y) = extended_gcd(&BigInt::from(-4), &BigInt::from(6));
        assert_eq!(g, BigInt::from(2));
        assert_eq!(BigInt::from(-4) * x + BigInt::from(6) * y, g);
    }
}
