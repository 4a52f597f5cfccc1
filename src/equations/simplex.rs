//! 精确有理数两阶段单纯形法的第一阶段：只判定可行性并给出一个可行点。
//!
//! 自由变量拆成 `x = p - q`；被某条单变量约束限定为非负的变量只保留 `p` 列。
//! 入基/出基均采用 Bland 规则，保证在退化情形下终止。
use num::bigint::BigInt;
use num::rational::BigRational;
use num::traits::{One, Signed, Zero};

use crate::equations::{Inequality, Relation};

/// Sparse row `Σ coefficient·x[variable]  relation  rhs`.
#[derive(Debug, Clone)]
pub(crate) struct LinearRow {
    pub terms: Vec<(usize, i64)>,
    pub relation: Relation,
    pub rhs: BigInt,
}

impl LinearRow {
    pub fn bound(variable: usize, relation: Relation, value: BigInt) -> Self {
        Self {
            terms: vec![(variable, 1)],
            relation,
            rhs: value,
        }
    }

    /// The row alone forces its only variable to be non-negative.
    fn forces_nonnegative(&self) -> Option<usize> {
        let [(variable, coefficient)] = self.terms.as_slice() else {
            return None;
        };
        let nonnegative = match self.relation {
            Relation::GreaterEqual => *coefficient > 0 && !self.rhs.is_negative(),
            Relation::LessEqual => *coefficient < 0 && !self.rhs.is_positive(),
            Relation::Equal => false,
        };
        nonnegative.then_some(*variable)
    }
}

impl From<&Inequality> for LinearRow {
    fn from(inequality: &Inequality) -> Self {
        Self {
            terms: inequality
                .coefficients
                .iter()
                .enumerate()
                .filter(|(_, coefficient)| **coefficient != 0)
                .map(|(variable, coefficient)| (variable, *coefficient))
                .collect(),
            relation: inequality.relation,
            rhs: BigInt::from(inequality.rhs),
        }
    }
}

struct Tableau {
    rows: Vec<Vec<BigRational>>,
    /// Reduced costs of the phase-one objective; last entry is `-objective`.
    costs: Vec<BigRational>,
    basis: Vec<usize>,
    rhs: usize,
}

impl Tableau {
    fn pivot(&mut self, row: usize, column: usize) {
        let pivot = self.rows[row][column].clone();
        for value in self.rows[row].iter_mut() {
            *value /= pivot.clone();
        }
        let pivot_row = self.rows[row].clone();
        let eliminate = |target: &mut Vec<BigRational>| {
            let factor = target[column].clone();
            if factor.is_zero() {
                return;
            }
            for (value, pivot_value) in target.iter_mut().zip(&pivot_row) {
                if !pivot_value.is_zero() {
                    *value -= pivot_value * &factor;
                }
            }
        };
        for (idx, target) in self.rows.iter_mut().enumerate() {
            if idx != row {
                eliminate(target);
            }
        }
        eliminate(&mut self.costs);
        self.basis[row] = column;
    }

    fn entering_column(&self) -> Option<usize> {
        (0..self.rhs).find(|&column| self.costs[column].is_negative())
    }

    fn leaving_row(&self, column: usize) -> Option<usize> {
        let mut best: Option<(usize, BigRational)> = None;
        for (idx, row) in self.rows.iter().enumerate() {
            if !row[column].is_positive() {
                continue;
            }
            let ratio = &row[self.rhs] / &row[column];
            let better = match &best {
                None => true,
                Some((current, current_ratio)) => {
                    ratio < *current_ratio
                        || (ratio == *current_ratio && self.basis[idx] < self.basis[*current])
                }
            };
            if better {
                best = Some((idx, ratio));
            }
        }
        best.map(|(idx, _)| idx)
    }
}

/// Returns a rational point satisfying every row, or `None` if the rows are
/// infeasible over the rationals.
pub(crate) fn feasible_point(rows: &[LinearRow], variables: usize) -> Option<Vec<BigRational>> {
    let mut nonnegative = vec![false; variables];
    for row in rows {
        if let Some(variable) = row.forces_nonnegative() {
            nonnegative[variable] = true;
        }
    }

    let mut active = Vec::with_capacity(rows.len());
    for row in rows {
        if row.terms.is_empty() {
            if !row.relation.holds(&BigInt::zero(), &row.rhs) {
                return None;
            }
            continue;
        }
        // `x >= 0` is already implied by dropping the negative column.
        if row.forces_nonnegative().is_some() && row.rhs.is_zero() {
            continue;
        }
        active.push(row);
    }

    // (positive column, negative column) per variable
    let mut columns = Vec::with_capacity(variables);
    let mut next = 0usize;
    for restricted in &nonnegative {
        let positive = next;
        next += 1;
        let negative = if *restricted {
            None
        } else {
            next += 1;
            Some(next - 1)
        };
        columns.push((positive, negative));
    }
    let slack_start = next;
    let slacks = active
        .iter()
        .filter(|row| row.relation != Relation::Equal)
        .count();
    let artificial_start = slack_start + slacks;
    let rhs = artificial_start + active.len();

    let mut tableau_rows = Vec::with_capacity(active.len());
    let mut slack = slack_start;
    for (idx, row) in active.iter().enumerate() {
        let mut values = vec![BigRational::zero(); rhs + 1];
        for &(variable, coefficient) in &row.terms {
            let coefficient = BigRational::from_integer(BigInt::from(coefficient));
            let (positive, negative) = columns[variable];
            values[positive] += coefficient.clone();
            if let Some(negative) = negative {
                values[negative] -= coefficient;
            }
        }
        match row.relation {
            Relation::LessEqual => {
                values[slack] = BigRational::one();
                slack += 1;
            }
            Relation::GreaterEqual => {
                values[slack] = -BigRational::one();
                slack += 1;
            }
            Relation::Equal => {}
        }
        values[rhs] = BigRational::from_integer(row.rhs.clone());
        if values[rhs].is_negative() {
            for value in values.iter_mut() {
                *value = -value.clone();
            }
        }
        values[artificial_start + idx] = BigRational::one();
        tableau_rows.push(values);
    }

    let mut costs = vec![BigRational::zero(); rhs + 1];
    for row in &tableau_rows {
        for (column, value) in row.iter().enumerate() {
            if column < artificial_start || column == rhs {
                costs[column] -= value;
            }
        }
    }

    let mut tableau = Tableau {
        rows: tableau_rows,
        costs,
        basis: (artificial_start..rhs).collect(),
        rhs,
    };

    while let Some(column) = tableau.entering_column() {
        // phase one is bounded below by zero, so a leaving row always exists
        let Some(row) = tableau.leaving_row(column) else {
            break;
        };
        tableau.pivot(row, column);
    }

    if !tableau.costs[rhs].is_zero() {
        return None;
    }

    let mut values = vec![BigRational::zero(); rhs];
    for (row, column) in tableau.basis.iter().enumerate() {
        values[*column] = tableau.rows[row][rhs].clone();
    }
    Some(
        columns
            .into_iter()
            .map(|(positive, negative)| match negative {
                Some(negative) => &values[positive] - &values[negative],
                None => values[positive].clone(),
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(terms: &[(usize, i64)], relation: Relation, rhs: i64) -> LinearRow {
        LinearRow {
            terms: terms.to_vec(),
            relation,
            rhs: BigInt::from(rhs),
        }
    }

    fn check(rows: &[LinearRow], point: &[BigRational]) -> bool {
        rows.iter().all(|row| {
            let lhs = row.terms.iter().fold(BigRational::zero(), |acc, (v, c)| {
                acc + &point[*v] * BigRational::from_integer(BigInt::from(*c))
            });
            let rhs = BigRational::from_integer(row.rhs.clone());
            match row.relation {
                Relation::LessEqual => lhs <= rhs,
                Relation::Equal => lhs == rhs,
                Relation::GreaterEqual => lhs >= rhs,
            }
        })
    }

    #[test]
    fn finds_point_with_negative_free_variable() {
        // x0 - x1 = -3, x1 >= 0, x1 <= 1
        let rows = vec![
            row(&[(0, 1), (1, -1)], Relation::Equal, -3),
            row(&[(1, 1)], Relation::GreaterEqual, 0),
            row(&[(1, 1)], Relation::LessEqual, 1),
        ];
        let point = feasible_point(&rows, 2).unwrap();
        assert!(check(&rows, &point));
        assert!(point[0].is_negative());
    }

    #[test]
    fn fractional_vertex_is_rational() {
        // 2*x0 = 1
        let rows = vec![row(&[(0, 2)], Relation::Equal, 1)];
        let point = feasible_point(&rows, 1).unwrap();
        assert_eq!(point[0], BigRational::new(BigInt::from(1), BigInt::from(2)));
    }

    #[test]
    fn detects_infeasibility() {
        // x0 >= 0, x0 <= -1
        let rows = vec![
            row(&[(0, 1)], Relation::GreaterEqual, 0),
            row(&[(0, 1)], Relation::LessEqual, -1),
        ];
        assert!(feasible_point(&rows, 1).is_none());

        let empty_violated = vec![row(&[], Relation::GreaterEqual, 1)];
        assert!(feasible_point(&empty_violated, 0).is_none());
    }

    #[test]
    fn degenerate_system_terminates() {
        // many redundant homogeneous rows through the origin
        let mut rows = Vec::new();
        for k in 1..6 {
            rows.push(row(&[(0, k), (1, -k)], Relation::LessEqual, 0));
            rows.push(row(&[(0, -k), (1, k), (2, 1)], Relation::LessEqual, 0));
        }
        rows.push(row(&[(2, 1)], Relation::LessEqual, -1));
        let point = feasible_point(&rows, 3).unwrap();
        assert!(check(&rows, &point));
    }
}
