//! Parametric integer programming
//!
//! A [`ParametricSolver`] takes a [`ParametricProgram`] and returns the
//! lexicographic minimum of its unknowns as a function of the parameters:
//! a quasi-affine selection tree (QUAST). Leaves are affine vectors over the
//! parameters; inner nodes split the parameter space on the sign of an
//! affine condition. Nodes may introduce new parameters `floor(e / d)` that
//! later vectors and conditions refer to.
//!
//! [`PipSolver`] is the built-in implementation: a parametric dual simplex
//! over exact rationals with Gomory cuts, after Feautrier's PIP.

pub mod context;
pub mod solver;
pub mod tableau;

use std::fmt;

use num_rational::Rational64;
use serde::{Deserialize, Serialize};

use crate::error::ExploreResult;
use crate::ilp::ParametricProgram;

pub use solver::PipSolver;

/// Solves a parametric program for its lexicographic minimum
pub trait ParametricSolver {
    fn solve(&self, program: &ParametricProgram) -> ExploreResult<SolutionTree>;
}

/// `floor(numerator · (p, q_0..q_{rank-1}, 1) / divisor)`
///
/// The numerator covers the program parameters, every new parameter of
/// lower rank, then the constant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewParameter {
    pub rank: usize,
    pub numerator: Vec<i64>,
    pub divisor: i64,
}

/// Value of every unknown as an affine function
///
/// Coefficients cover the program parameters, the new parameters in scope
/// (by rank), then the constant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolutionVector {
    pub coeffs: Vec<Rational64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TreeBody {
    Solution(Vec<SolutionVector>),
    NoSolution,
    /// `condition · (p, q, 1) >= 0` selects `then_branch`
    Conditional {
        condition: Vec<i64>,
        then_branch: Box<SolutionTree>,
        else_branch: Box<SolutionTree>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolutionTree {
    /// New parameters introduced at this node, visible to its body
    pub new_parameters: Vec<NewParameter>,
    pub body: TreeBody,
}

impl SolutionTree {
    pub fn leaf(vectors: Vec<SolutionVector>) -> Self {
        Self {
            new_parameters: Vec::new(),
            body: TreeBody::Solution(vectors),
        }
    }

    pub fn no_solution() -> Self {
        Self {
            new_parameters: Vec::new(),
            body: TreeBody::NoSolution,
        }
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let pad = "  ".repeat(depth);
        for p in &self.new_parameters {
            writeln!(
                f,
                "{}(newparm {} (div #[{}] {}))",
                pad,
                p.rank,
                join(&p.numerator),
                p.divisor
            )?;
        }
        match &self.body {
            TreeBody::NoSolution => writeln!(f, "{}()", pad),
            TreeBody::Solution(vectors) => {
                writeln!(f, "{}(list", pad)?;
                for v in vectors {
                    writeln!(f, "{}  #[{}]", pad, join(&v.coeffs))?;
                }
                writeln!(f, "{})", pad)
            }
            TreeBody::Conditional {
                condition,
                then_branch,
                else_branch,
            } => {
                writeln!(f, "{}(if #[{}]", pad, join(condition))?;
                then_branch.write_indented(f, depth + 1)?;
                else_branch.write_indented(f, depth + 1)?;
                writeln!(f, "{})", pad)
            }
        }
    }
}

/// PIP-style QUAST text
impl fmt::Display for SolutionTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}

fn join<T: fmt::Display>(values: &[T]) -> String {
    values
        .iter()
        .map(T::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}
