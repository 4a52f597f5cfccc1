//! 整数可行性：有理松弛 + 缩放或分支定界，外加对析取约束组的笛卡尔积搜索。
use itertools::Itertools;
use log::debug;
use num::bigint::BigInt;
use num::integer::Integer;
use num::rational::BigRational;
use num::traits::{One, Signed, Zero};

use crate::equations::simplex::{LinearRow, feasible_point};
use crate::equations::{ConstraintGroup, InequalitySystem, Relation};

/// Finds an integer vector satisfying every `Required` group and at least one
/// alternative of every non-empty `AnyOf` group.
///
/// The search order is fixed, so identical input always yields the same
/// answer (and the same witness).
pub fn find_solution(groups: &[ConstraintGroup]) -> Option<Vec<BigInt>> {
    let variables = groups
        .iter()
        .map(ConstraintGroup::number_of_variables)
        .max()
        .unwrap_or(0);

    let mut mandatory = Vec::new();
    let mut disjunctions: Vec<&[InequalitySystem]> = Vec::new();
    for group in groups {
        match group.alternatives() {
            [] => {}
            [single] => mandatory.extend(rows_of(single)),
            alternatives => disjunctions.push(alternatives),
        }
    }

    if feasible_point(&mandatory, variables).is_none() {
        debug!("mandatory part ({} rows) is infeasible", mandatory.len());
        return None;
    }

    if disjunctions.is_empty() {
        return solve_integer(&mandatory, variables);
    }

    // Alternatives whose relaxation already contradicts the mandatory part can
    // never be chosen.
    let mut candidates = Vec::with_capacity(disjunctions.len());
    for alternatives in &disjunctions {
        let viable = alternatives
            .iter()
            .filter(|alternative| {
                let mut rows = mandatory.clone();
                rows.extend(rows_of(alternative));
                feasible_point(&rows, variables).is_some()
            })
            .collect::<Vec<_>>();
        if viable.is_empty() {
            debug!("every alternative of a group is infeasible");
            return None;
        }
        candidates.push(viable);
    }
    debug!(
        "searching {} combinations of disjunctive alternatives",
        candidates.iter().map(Vec::len).product::<usize>()
    );

    for combination in candidates
        .iter()
        .map(|viable| viable.iter().copied())
        .multi_cartesian_product()
    {
        let mut rows = mandatory.clone();
        for alternative in combination {
            rows.extend(rows_of(alternative));
        }
        if let Some(solution) = solve_integer(&rows, variables) {
            return Some(solution);
        }
    }
    None
}

fn rows_of(system: &InequalitySystem) -> impl Iterator<Item = LinearRow> + '_ {
    system.inequalities().iter().map(LinearRow::from)
}

/// Scaling a solution by any factor `>= 1` keeps every row satisfied.
fn is_scale_invariant(rows: &[LinearRow]) -> bool {
    rows.iter().all(|row| {
        row.rhs.is_zero()
            || match row.relation {
                Relation::LessEqual => row.rhs.is_negative(),
                Relation::GreaterEqual => row.rhs.is_positive(),
                Relation::Equal => false,
            }
    })
}

fn scale_to_integers(point: &[BigRational]) -> Vec<BigInt> {
    let lcm = point
        .iter()
        .fold(BigInt::one(), |acc, value| acc.lcm(value.denom()));
    point
        .iter()
        .map(|value| value.numer() * (&lcm / value.denom()))
        .collect()
}

fn solve_integer(rows: &[LinearRow], variables: usize) -> Option<Vec<BigInt>> {
    if is_scale_invariant(rows) {
        return feasible_point(rows, variables).map(|point| scale_to_integers(&point));
    }

    // depth-first branch and bound, nearer rounding first
    let mut stack: Vec<Vec<LinearRow>> = vec![Vec::new()];
    let mut nodes = 0usize;
    while let Some(bounds) = stack.pop() {
        nodes += 1;
        let mut node_rows = rows.to_vec();
        node_rows.extend(bounds.iter().cloned());
        let Some(point) = feasible_point(&node_rows, variables) else {
            continue;
        };
        let Some(variable) = point.iter().position(|value| !value.is_integer()) else {
            debug!("integer point found after {nodes} branch-and-bound nodes");
            return Some(point.iter().map(BigRational::to_integer).collect());
        };

        let value = &point[variable];
        let floor = value.floor().to_integer();
        let ceil = &floor + BigInt::one();
        let mut down = bounds.clone();
        down.push(LinearRow::bound(variable, Relation::LessEqual, floor.clone()));
        let mut up = bounds;
        up.push(LinearRow::bound(variable, Relation::GreaterEqual, ceil));

        let half = BigRational::new(BigInt::one(), BigInt::from(2));
        if value - BigRational::from_integer(floor) <= half {
            stack.push(up);
            stack.push(down);
        } else {
            stack.push(down);
            stack.push(up);
        }
    }
    debug!("no integer point after {nodes} branch-and-bound nodes");
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn system(rows: &[(&[i64], Relation, i64)]) -> InequalitySystem {
        let mut system = InequalitySystem::new();
        for (coefficients, relation, rhs) in rows {
            system.add_inequality(*rhs, *relation, coefficients.to_vec(), "");
        }
        system
    }

    #[test]
    fn homogeneous_system_is_scaled_to_integers() {
        // 2*x0 - 3*x1 = 0, x0 >= 1
        let required = system(&[
            (&[2, -3], Relation::Equal, 0),
            (&[1], Relation::GreaterEqual, 1),
        ]);
        let solution = find_solution(&[ConstraintGroup::Required(required.clone())]).unwrap();
        assert!(required.is_satisfied(&solution));
        assert!(solution[0] >= BigInt::from(1));
    }

    #[test]
    fn branch_and_bound_rejects_parity_conflict() {
        // 2*x0 = 2*x1 + 1 has rational but no integer solutions
        let required = system(&[
            (&[2, -2], Relation::Equal, 1),
            (&[1], Relation::GreaterEqual, 0),
            (&[1], Relation::LessEqual, 3),
            (&[0, 1], Relation::GreaterEqual, 0),
            (&[0, 1], Relation::LessEqual, 3),
        ]);
        assert!(find_solution(&[ConstraintGroup::Required(required)]).is_none());
    }

    #[test]
    fn branch_and_bound_finds_bounded_integer_point() {
        // 3*x0 + 2*x1 = 7, 0 <= x0, x1 <= 5
        let required = system(&[
            (&[3, 2], Relation::Equal, 7),
            (&[1], Relation::GreaterEqual, 0),
            (&[0, 1], Relation::GreaterEqual, 0),
            (&[1], Relation::LessEqual, 5),
            (&[0, 1], Relation::LessEqual, 5),
        ]);
        let solution = find_solution(&[ConstraintGroup::Required(required.clone())]).unwrap();
        assert!(required.is_satisfied(&solution));
        assert_eq!(solution, vec![BigInt::from(1), BigInt::from(2)]);
    }

    #[test]
    fn one_alternative_per_group_suffices() {
        let required = system(&[
            (&[1], Relation::GreaterEqual, 0),
            (&[0, 1], Relation::GreaterEqual, 0),
            (&[1, 1], Relation::GreaterEqual, 1),
        ]);
        // x0 = 0 or x1 = 0; and x0 >= 2 or x1 >= 2 (the first pairing is infeasible)
        let zero = ConstraintGroup::AnyOf(vec![
            system(&[(&[1], Relation::Equal, 0)]),
            system(&[(&[0, 1], Relation::Equal, 0)]),
        ]);
        let big = ConstraintGroup::AnyOf(vec![
            system(&[(&[1], Relation::GreaterEqual, 2)]),
            system(&[(&[0, 1], Relation::GreaterEqual, 2)]),
        ]);
        let solution = find_solution(&[ConstraintGroup::Required(required), zero, big]).unwrap();
        let x0 = &solution[0];
        let x1 = &solution[1];
        assert!(x0.is_zero() || x1.is_zero());
        assert!(*x0 >= BigInt::from(2) || *x1 >= BigInt::from(2));
    }

    #[test]
    fn empty_group_is_dropped_and_unsatisfiable_group_fails() {
        let required = system(&[(&[1], Relation::GreaterEqual, 1)]);
        let groups = [
            ConstraintGroup::Required(required.clone()),
            ConstraintGroup::AnyOf(Vec::new()),
        ];
        assert!(find_solution(&groups).is_some());

        let impossible = ConstraintGroup::AnyOf(vec![
            system(&[(&[1], Relation::LessEqual, 0)]),
            system(&[(&[1], Relation::LessEqual, -5)]),
        ]);
        assert!(find_solution(&[ConstraintGroup::Required(required), impossible]).is_none());
    }

    #[test]
    fn verdict_and_witness_are_deterministic() {
        let required = system(&[
            (&[1, -1, 0], Relation::Equal, 0),
            (&[0, 1, 1], Relation::LessEqual, -1),
            (&[1], Relation::LessEqual, 4),
        ]);
        let groups = [ConstraintGroup::Required(required)];
        assert_eq!(find_solution(&groups), find_solution(&groups));
    }
}
