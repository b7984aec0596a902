//! Parametric integer polyhedra in constraint form
//!
//! A constraint is `a·x + b·p + c ⋈ 0` where `⋈` is `=` or `≥`. Coefficients
//! are stored as one vector laid out as unknowns, parameters, constant; this
//! matches the PIP / PolyLib matrix convention minus its leading flag column.

use serde::{Deserialize, Serialize};

use crate::error::{ExploreError, ExploreResult};
use crate::matrix::IntMatrix;

/// Equality or `≥ 0` inequality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintKind {
    Equality,
    Inequality,
}

impl ConstraintKind {
    /// PIP flag column value: 0 for equality, 1 for inequality
    pub fn flag(self) -> i64 {
        match self {
            ConstraintKind::Equality => 0,
            ConstraintKind::Inequality => 1,
        }
    }

    pub fn from_flag(flag: i64) -> ExploreResult<Self> {
        match flag {
            0 => Ok(ConstraintKind::Equality),
            1 => Ok(ConstraintKind::Inequality),
            other => Err(ExploreError::input(format!(
                "Constraint flag must be 0 (equality) or 1 (inequality), got {}",
                other
            ))),
        }
    }
}

/// One affine constraint row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    pub kind: ConstraintKind,
    pub coeffs: Vec<i64>,
}

impl Constraint {
    pub fn inequality(coeffs: Vec<i64>) -> Self {
        Self {
            kind: ConstraintKind::Inequality,
            coeffs,
        }
    }

    pub fn equality(coeffs: Vec<i64>) -> Self {
        Self {
            kind: ConstraintKind::Equality,
            coeffs,
        }
    }

    /// Constant term (last coefficient)
    pub fn constant(&self) -> i64 {
        self.coeffs.last().copied().unwrap_or(0)
    }

    /// Render with variable names; `names` covers every non-constant column
    pub fn format_with_names(&self, names: &[String]) -> String {
        let mut terms = Vec::new();
        for (coeff, name) in self.coeffs.iter().zip(names) {
            match *coeff {
                0 => {}
                1 => terms.push(name.clone()),
                -1 => terms.push(format!("-{}", name)),
                c => terms.push(format!("{}{}", c, name)),
            }
        }
        let c = self.constant();
        if c != 0 || terms.is_empty() {
            terms.push(c.to_string());
        }
        let lhs = terms.join(" + ").replace("+ -", "- ");
        match self.kind {
            ConstraintKind::Equality => format!("{} = 0", lhs),
            ConstraintKind::Inequality => format!("{} >= 0", lhs),
        }
    }
}

/// A parametric polyhedron over `dimensions` unknowns and `parameters` symbols
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Polyhedron {
    pub dimensions: usize,
    pub parameters: usize,
    pub constraints: Vec<Constraint>,
}

impl Polyhedron {
    pub fn new(dimensions: usize, parameters: usize, constraints: Vec<Constraint>) -> Self {
        Self {
            dimensions,
            parameters,
            constraints,
        }
    }

    /// Interpret a PIP matrix (flag column first) as a polyhedron
    pub fn from_pip_matrix(
        matrix: &IntMatrix,
        dimensions: usize,
        parameters: usize,
    ) -> ExploreResult<Self> {
        let expected = dimensions + parameters + 2;
        if matrix.nrows() > 0 && matrix.ncols() != expected {
            return Err(ExploreError::input(format!(
                "Constraint matrix has {} columns, expected {} (flag + {} unknowns + {} parameters + constant)",
                matrix.ncols(),
                expected,
                dimensions,
                parameters
            )));
        }
        let constraints = matrix
            .rows()
            .map(|row| {
                Ok(Constraint {
                    kind: ConstraintKind::from_flag(row[0])?,
                    coeffs: row[1..].to_vec(),
                })
            })
            .collect::<ExploreResult<Vec<_>>>()?;
        Ok(Self::new(dimensions, parameters, constraints))
    }

    /// Width of every coefficient vector
    pub fn width(&self) -> usize {
        self.dimensions + self.parameters + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pip_matrix() {
        // 0 <= i <= N
        let m = IntMatrix::from_rows(vec![vec![1, 1, 0, 0], vec![1, -1, 1, 0]]).unwrap();
        let poly = Polyhedron::from_pip_matrix(&m, 1, 1).unwrap();
        assert_eq!(poly.constraints.len(), 2);
        assert_eq!(poly.constraints[1].coeffs, vec![-1, 1, 0]);
        assert_eq!(poly.width(), 3);
    }

    #[test]
    fn test_from_pip_matrix_rejects_bad_flag() {
        let m = IntMatrix::from_rows(vec![vec![2, 1, 0]]).unwrap();
        assert!(Polyhedron::from_pip_matrix(&m, 1, 0).is_err());
    }

    #[test]
    fn test_from_pip_matrix_rejects_width() {
        let m = IntMatrix::from_rows(vec![vec![1, 1, 0]]).unwrap();
        assert!(matches!(
            Polyhedron::from_pip_matrix(&m, 1, 1),
            Err(ExploreError::InputError { .. })
        ));
    }

    #[test]
    fn test_format_with_names() {
        let names = vec!["i".to_string(), "N".to_string()];
        let c = Constraint::inequality(vec![-1, 1, -1]);
        assert_eq!(c.format_with_names(&names), "-i + N - 1 >= 0");
    }
}
