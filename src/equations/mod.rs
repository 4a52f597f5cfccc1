//! 线性整数约束系统。
//!
//! 每条约束形如 `coefficients · x  {<=, =, >=}  rhs`，变量向量 `x` 的长度由使用方
//! 约定（较短的系数向量按 0 补齐）。求解器中的变量是无符号限制的整数，
//! 非负性须以显式约束给出。
//!
//! 求解入口 [`find_solution`] 接受若干 [`ConstraintGroup`]：`Required` 必须整体满足，
//! `AnyOf` 至少满足其中一个备选子系统。

mod simplex;
mod solver;

use std::fmt;

use num::bigint::BigInt;
use num::traits::Zero;

pub use solver::find_solution;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    LessEqual,
    Equal,
    GreaterEqual,
}

impl Relation {
    pub fn holds(self, lhs: &BigInt, rhs: &BigInt) -> bool {
        match self {
            Relation::LessEqual => lhs <= rhs,
            Relation::Equal => lhs == rhs,
            Relation::GreaterEqual => lhs >= rhs,
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Relation::LessEqual => "<=",
            Relation::Equal => "=",
            Relation::GreaterEqual => ">=",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inequality {
    pub rhs: i64,
    pub relation: Relation,
    pub coefficients: Vec<i64>,
    pub comment: String,
}

impl Inequality {
    pub fn coefficient(&self, variable: usize) -> i64 {
        self.coefficients.get(variable).copied().unwrap_or(0)
    }

    pub fn evaluate(&self, solution: &[BigInt]) -> BigInt {
        self.coefficients
            .iter()
            .zip(solution)
            .filter(|(coefficient, _)| **coefficient != 0)
            .fold(BigInt::zero(), |acc, (coefficient, value)| {
                acc + BigInt::from(*coefficient) * value
            })
    }

    pub fn is_satisfied(&self, solution: &[BigInt]) -> bool {
        self.relation
            .holds(&self.evaluate(solution), &BigInt::from(self.rhs))
    }
}

impl fmt::Display for Inequality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (variable, coefficient) in self.coefficients.iter().enumerate() {
            if *coefficient == 0 {
                continue;
            }
            if !first {
                f.write_str(" + ")?;
            }
            write!(f, "{coefficient}*x[{variable}]")?;
            first = false;
        }
        if first {
            f.write_str("0")?;
        }
        write!(f, " {} {}", self.relation, self.rhs)?;
        if !self.comment.is_empty() {
            write!(f, "\t# {}", self.comment)?;
        }
        Ok(())
    }
}

/// An ordered conjunction of linear constraints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InequalitySystem {
    inequalities: Vec<Inequality>,
}

impl InequalitySystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_inequality(
        &mut self,
        rhs: i64,
        relation: Relation,
        coefficients: impl Into<Vec<i64>>,
        comment: impl Into<String>,
    ) {
        self.inequalities.push(Inequality {
            rhs,
            relation,
            coefficients: coefficients.into(),
            comment: comment.into(),
        });
    }

    pub fn extend_from(&mut self, other: &InequalitySystem) {
        self.inequalities.extend(other.inequalities.iter().cloned());
    }

    pub fn inequalities(&self) -> &[Inequality] {
        &self.inequalities
    }

    pub fn len(&self) -> usize {
        self.inequalities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inequalities.is_empty()
    }

    /// Smallest variable count covering every coefficient vector.
    pub fn number_of_variables(&self) -> usize {
        self.inequalities
            .iter()
            .map(|inequality| inequality.coefficients.len())
            .max()
            .unwrap_or(0)
    }

    pub fn is_satisfied(&self, solution: &[BigInt]) -> bool {
        self.inequalities
            .iter()
            .all(|inequality| inequality.is_satisfied(solution))
    }
}

impl fmt::Display for InequalitySystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for inequality in &self.inequalities {
            writeln!(f, "{inequality}")?;
        }
        Ok(())
    }
}

/// One conjunct handed to [`find_solution`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintGroup {
    /// Every constraint must hold.
    Required(InequalitySystem),
    /// At least one alternative must hold. No alternatives at all means no
    /// requirement.
    AnyOf(Vec<InequalitySystem>),
}

impl ConstraintGroup {
    pub fn alternatives(&self) -> &[InequalitySystem] {
        match self {
            ConstraintGroup::Required(system) => std::slice::from_ref(system),
            ConstraintGroup::AnyOf(systems) => systems,
        }
    }

    pub fn number_of_variables(&self) -> usize {
        self.alternatives()
            .iter()
            .map(InequalitySystem::number_of_variables)
            .max()
            .unwrap_or(0)
    }
}
