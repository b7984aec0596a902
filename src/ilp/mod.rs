//! Parametric integer programs built for each candidate vector
//!
//! Both programs use the big-parameter encoding: a maximization becomes the
//! lexicographic minimization of `B − k` over non-negative unknowns, and
//! unknowns that may be negative are shifted by `B`. The extractor checks
//! that `B` cancels from the answer; callers never see it.

pub mod schedule;
pub mod throughput;

use serde::{Deserialize, Serialize};

use crate::polyhedron::Constraint;

pub use schedule::{ScheduleIlp, SCHEDULE_UTILIZATION_WEIGHT};
pub use throughput::ThroughputIlp;

/// An ILP over non-negative integer unknowns, minimized lexicographically
///
/// Row coefficients are laid out as unknowns, parameters (one of which is
/// the big parameter), constant. Context rows cover parameters and constant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParametricProgram {
    unknowns: usize,
    parameters: usize,
    rows: Vec<Constraint>,
    context: Vec<Constraint>,
    big_parameter: usize,
}

impl ParametricProgram {
    /// `big_parameter` indexes the parameters, not the full row
    pub fn new(
        unknowns: usize,
        parameters: usize,
        rows: Vec<Constraint>,
        context: Vec<Constraint>,
        big_parameter: usize,
    ) -> Self {
        debug_assert!(big_parameter < parameters);
        debug_assert!(rows.iter().all(|r| r.coeffs.len() == unknowns + parameters + 1));
        debug_assert!(context.iter().all(|r| r.coeffs.len() == parameters + 1));
        Self {
            unknowns,
            parameters,
            rows,
            context,
            big_parameter,
        }
    }

    pub fn unknowns(&self) -> usize {
        self.unknowns
    }

    /// Number of parameters, big parameter included
    pub fn parameters(&self) -> usize {
        self.parameters
    }

    pub fn rows(&self) -> &[Constraint] {
        &self.rows
    }

    pub fn context(&self) -> &[Constraint] {
        &self.context
    }

    /// Index of the big parameter among the parameters
    pub fn big_parameter(&self) -> usize {
        self.big_parameter
    }

    /// Column of the big parameter in a constraint row
    pub fn big_parameter_column(&self) -> usize {
        self.unknowns + self.big_parameter
    }

    /// PIP text form (flag column first), for tracing
    pub fn to_pip_text(&self) -> String {
        let mut out = String::new();
        for (label, rows) in [("constraints", &self.rows), ("context", &self.context)] {
            let width = rows.first().map_or(0, |r| r.coeffs.len() + 1);
            out.push_str(&format!("# {}\n{} {}\n", label, rows.len(), width));
            for row in rows {
                out.push_str(&row.kind.flag().to_string());
                for c in &row.coeffs {
                    out.push_str(&format!(" {}", c));
                }
                out.push('\n');
            }
        }
        out
    }
}
