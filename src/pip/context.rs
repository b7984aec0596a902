//! Parameter context: the set of parameter values a tree node covers
//!
//! Rows are integer `≥ 0` constraints over the parameters (declared ones
//! first, then new parameters by rank) and the constant. Every parameter is
//! a non-negative integer. Emptiness is decided exactly with the same
//! tableau, solved non-parametrically with Gomory cuts.

use log::trace;
use num_bigint::BigInt;
use num_traits::{Signed, Zero};

use crate::error::{ExploreError, ExploreResult};
use crate::pip::tableau::Tableau;
use crate::polyhedron::{Constraint, ConstraintKind};

#[derive(Debug, Clone)]
pub struct Context {
    parameters: usize,
    rows: Vec<Vec<BigInt>>,
}

impl Context {
    /// Context rows from program constraints; equalities become two rows
    pub fn new(parameters: usize, constraints: &[Constraint]) -> Self {
        let mut rows = Vec::new();
        for c in constraints {
            let row: Vec<BigInt> = c.coeffs.iter().map(|&v| BigInt::from(v)).collect();
            if c.kind == ConstraintKind::Equality {
                rows.push(row.iter().map(|v| -v).collect());
            }
            rows.push(row);
        }
        Self { parameters, rows }
    }

    pub fn parameters(&self) -> usize {
        self.parameters
    }

    pub fn rows(&self) -> &[Vec<BigInt>] {
        &self.rows
    }

    pub fn push(&mut self, row: Vec<BigInt>) {
        debug_assert_eq!(row.len(), self.parameters + 1);
        self.rows.push(row);
    }

    /// A copy restricted by one more row
    pub fn with(&self, row: Vec<BigInt>) -> Self {
        let mut context = self.clone();
        context.push(row);
        context
    }

    pub fn add_parameter(&mut self) {
        for row in &mut self.rows {
            row.insert(self.parameters, BigInt::zero());
        }
        self.parameters += 1;
    }

    /// Whether some non-negative integer point satisfies every row
    ///
    /// Runs at most `limit` pivots and cuts before giving up with a
    /// solver error.
    pub fn is_feasible(&self, limit: usize) -> ExploreResult<bool> {
        if self.rows.iter().any(|row| is_contradiction(row)) {
            return Ok(false);
        }
        let mut tableau = Tableau::new(self.parameters, 0);
        for row in &self.rows {
            tableau.push_inequality(row);
        }

        for _ in 0..limit {
            let negative = tableau
                .rows()
                .iter()
                .position(|row| row.constant[0].is_negative());
            if let Some(r) = negative {
                match tableau.pivot_column(r) {
                    Some(j) => tableau.pivot(r, j),
                    None => return Ok(false),
                }
                continue;
            }

            match tableau.first_remainder() {
                Some((i, remainder)) => tableau.push_cut(i, &remainder, None),
                None => return Ok(true),
            }
        }

        trace!("context feasibility gave up after {} steps", limit);
        Err(ExploreError::solver(format!(
            "context feasibility did not converge within {} steps",
            limit
        )))
    }
}

/// `0·p + c >= 0` with `c < 0`
fn is_contradiction(row: &[BigInt]) -> bool {
    let (constant, coeffs) = match row.split_last() {
        Some(split) => split,
        None => return false,
    };
    constant.is_negative() && coeffs.iter().all(|c| c.is_zero())
}
