//! Exact lattice geometry for the allocation and the change of basis

use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, ToPrimitive, Zero};

use crate::error::{ExploreError, ExploreResult};
use crate::matrix::IntMatrix;
use crate::polyhedron::{Constraint, Polyhedron};

/// Row-major matrix over exact rationals
pub type RationalMatrix = Vec<Vec<BigRational>>;

/// Polyhedral operations the explorer needs
pub trait GeometryService {
    /// Integer basis of `{x : vector·x = 0}`, one basis vector per column
    fn nullspace(&self, vector: &[i64]) -> ExploreResult<IntMatrix>;

    fn inverse(&self, matrix: &IntMatrix) -> ExploreResult<RationalMatrix>;

    /// `{z : transform·z ∈ polyhedron}`, where `transform` acts on
    /// `(x, p, 1)` column vectors
    fn preimage(
        &self,
        polyhedron: &Polyhedron,
        transform: &RationalMatrix,
    ) -> ExploreResult<Polyhedron>;
}

/// Built-in geometry over exact integers and rationals
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactGeometry;

impl GeometryService for ExactGeometry {
    /// Unimodular column reduction: combine every column into the first
    /// until only the first has a non-zero product with `vector`
    fn nullspace(&self, vector: &[i64]) -> ExploreResult<IntMatrix> {
        let n = vector.len();
        if n == 0 {
            return Err(ExploreError::geometry("nullspace of an empty vector"));
        }
        let mut basis = IntMatrix::identity(n);
        let mut head = vector[0];

        for j in 1..n {
            let value = vector[j];
            if value == 0 {
                continue;
            }
            if head == 0 {
                swap_columns(&mut basis, 0, j);
                head = value;
                continue;
            }
            let e = head.extended_gcd(&value);
            let (a, b) = (head / e.gcd, value / e.gcd);
            for r in 0..n {
                let c0 = basis.get(r, 0);
                let cj = basis.get(r, j);
                basis.set(r, 0, e.x * c0 + e.y * cj);
                basis.set(r, j, b * c0 - a * cj);
            }
            head = e.gcd;
        }

        if head == 0 {
            return Err(ExploreError::geometry("nullspace of the zero vector"));
        }
        let mut kernel = IntMatrix::zeros(n, n - 1);
        for r in 0..n {
            for c in 1..n {
                kernel.set(r, c - 1, basis.get(r, c));
            }
        }
        Ok(kernel)
    }

    /// Gauss-Jordan elimination
    fn inverse(&self, matrix: &IntMatrix) -> ExploreResult<RationalMatrix> {
        let n = matrix.nrows();
        if matrix.ncols() != n {
            return Err(ExploreError::geometry(format!(
                "cannot invert a {}x{} matrix",
                n,
                matrix.ncols()
            )));
        }
        let mut left: RationalMatrix = matrix
            .rows()
            .map(|row| row.iter().map(|&v| rational(v)).collect())
            .collect();
        let mut right: RationalMatrix = (0..n)
            .map(|i| (0..n).map(|j| rational(i64::from(i == j))).collect())
            .collect();

        for col in 0..n {
            let pivot = (col..n)
                .find(|&r| !left[r][col].is_zero())
                .ok_or_else(|| ExploreError::geometry("change of basis is singular"))?;
            left.swap(col, pivot);
            right.swap(col, pivot);

            let scale = left[col][col].recip();
            for v in left[col].iter_mut().chain(right[col].iter_mut()) {
                *v *= &scale;
            }
            for r in 0..n {
                if r == col || left[r][col].is_zero() {
                    continue;
                }
                let factor = left[r][col].clone();
                for k in 0..n {
                    let delta = &factor * &left[col][k];
                    left[r][k] -= delta;
                    let delta = &factor * &right[col][k];
                    right[r][k] -= delta;
                }
            }
        }
        Ok(right)
    }

    fn preimage(
        &self,
        polyhedron: &Polyhedron,
        transform: &RationalMatrix,
    ) -> ExploreResult<Polyhedron> {
        let width = polyhedron.width();
        if transform.len() != width || transform.iter().any(|row| row.len() != width) {
            return Err(ExploreError::geometry(format!(
                "transform must be {}x{} to act on this polyhedron",
                width, width
            )));
        }
        let constraints = polyhedron
            .constraints
            .iter()
            .map(|c| {
                let row: Vec<BigRational> = (0..width)
                    .map(|j| {
                        c.coeffs
                            .iter()
                            .zip(transform)
                            .fold(BigRational::zero(), |acc, (&a, t)| acc + rational(a) * &t[j])
                    })
                    .collect();
                Ok(Constraint {
                    kind: c.kind,
                    coeffs: normalize(&row)?,
                })
            })
            .collect::<ExploreResult<Vec<_>>>()?;
        Ok(Polyhedron::new(
            polyhedron.dimensions,
            polyhedron.parameters,
            constraints,
        ))
    }
}

fn rational(v: i64) -> BigRational {
    BigRational::from_integer(BigInt::from(v))
}

fn swap_columns(m: &mut IntMatrix, a: usize, b: usize) {
    for r in 0..m.nrows() {
        let tmp = m.get(r, a);
        m.set(r, a, m.get(r, b));
        m.set(r, b, tmp);
    }
}

/// Clear denominators and divide out the common factor
fn normalize(row: &[BigRational]) -> ExploreResult<Vec<i64>> {
    let lcm = row
        .iter()
        .fold(BigInt::one(), |acc, v| acc.lcm(v.denom()));
    let scaled: Vec<BigInt> = row
        .iter()
        .map(|v| (v * BigRational::from_integer(lcm.clone())).to_integer())
        .collect();
    let gcd = scaled.iter().fold(BigInt::zero(), |acc, v| acc.gcd(v));
    scaled
        .into_iter()
        .map(|v| {
            let v = if gcd.is_zero() || gcd.is_one() { v } else { v / &gcd };
            v.to_i64()
                .ok_or_else(|| ExploreError::geometry(format!("coefficient {} overflows i64", v)))
        })
        .collect()
}

/// Exact integer view of a rational matrix, if every entry is integral
pub fn to_integer_matrix(matrix: &RationalMatrix) -> Option<IntMatrix> {
    let rows = matrix
        .iter()
        .map(|row| {
            row.iter()
                .map(|v| if v.is_integer() { v.to_integer().to_i64() } else { None })
                .collect::<Option<Vec<_>>>()
        })
        .collect::<Option<Vec<_>>>()?;
    IntMatrix::from_rows_with_cols(rows, matrix.first().map_or(0, Vec::len)).ok()
}

/// True when `matrix · vector = 0` for every row
pub fn annihilates(matrix: &IntMatrix, vector: &[i64]) -> bool {
    matrix
        .rows()
        .all(|row| row.iter().zip(vector).map(|(a, b)| a * b).sum::<i64>() == 0)
}

/// Sign-insensitive check used on change-of-basis determinants
pub fn is_unimodular(matrix: &IntMatrix) -> bool {
    matches!(matrix.determinant(), Some(d) if d.abs() == 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polyhedron::ConstraintKind;

    #[test]
    fn test_nullspace_axis_vectors() {
        let geometry = ExactGeometry;
        let kernel = geometry.nullspace(&[-1, 0]).unwrap();
        assert_eq!(kernel.nrows(), 2);
        assert_eq!(kernel.ncols(), 1);
        assert_eq!(kernel.transpose().row(0), &[0, 1]);

        let kernel = geometry.nullspace(&[0, 1]).unwrap();
        assert_eq!(kernel.transpose().row(0), &[1, 0]);
    }

    #[test]
    fn test_nullspace_is_a_lattice_basis() {
        let geometry = ExactGeometry;
        for vector in [vec![1, 1], vec![2, -3], vec![1, 2, 3], vec![0, 2, 3], vec![3, 0, -2]] {
            let allocation = geometry.nullspace(&vector).unwrap().transpose();
            assert_eq!(allocation.nrows(), vector.len() - 1);
            assert!(annihilates(&allocation, &vector));

            // |det [A; u]| = |u|² exactly when A is a basis of the kernel lattice
            let mut rows: Vec<Vec<i64>> = allocation.rows().map(<[i64]>::to_vec).collect();
            rows.push(vector.clone());
            let full = IntMatrix::from_rows(rows).unwrap();
            let norm: i128 = vector.iter().map(|&c| i128::from(c * c)).sum();
            assert_eq!(full.determinant().map(i128::abs), Some(norm));
        }
    }

    #[test]
    fn test_nullspace_of_zero_vector() {
        assert!(ExactGeometry.nullspace(&[0, 0]).is_err());
    }

    #[test]
    fn test_inverse() {
        let m = IntMatrix::from_rows(vec![vec![2, 1], vec![1, 1]]).unwrap();
        let inv = ExactGeometry.inverse(&m).unwrap();
        let inv = to_integer_matrix(&inv).unwrap();
        assert_eq!(inv.row(0), &[1, -1]);
        assert_eq!(inv.row(1), &[-1, 2]);

        let half = IntMatrix::from_rows(vec![vec![2, 0], vec![0, 1]]).unwrap();
        assert!(to_integer_matrix(&ExactGeometry.inverse(&half).unwrap()).is_none());
    }

    #[test]
    fn test_singular_inverse() {
        let m = IntMatrix::from_rows(vec![vec![1, 2], vec![2, 4]]).unwrap();
        assert!(matches!(
            ExactGeometry.inverse(&m),
            Err(ExploreError::GeometryError { .. })
        ));
    }

    #[test]
    fn test_preimage_swaps_coordinates() {
        // 0 <= i <= N - 1, j = 0; swap i and j
        let poly = Polyhedron::new(
            2,
            1,
            vec![
                Constraint::inequality(vec![1, 0, 0, 0]),
                Constraint::inequality(vec![-1, 0, 1, -1]),
                Constraint::equality(vec![0, 2, 0, 0]),
            ],
        );
        let swap = IntMatrix::from_rows(vec![
            vec![0, 1, 0, 0],
            vec![1, 0, 0, 0],
            vec![0, 0, 1, 0],
            vec![0, 0, 0, 1],
        ])
        .unwrap();
        let transform = ExactGeometry.inverse(&swap).unwrap();
        let image = ExactGeometry.preimage(&poly, &transform).unwrap();
        assert_eq!(image.constraints[0].coeffs, vec![0, 1, 0, 0]);
        assert_eq!(image.constraints[1].coeffs, vec![0, -1, 1, -1]);
        assert_eq!(image.constraints[2].kind, ConstraintKind::Equality);
        assert_eq!(image.constraints[2].coeffs, vec![1, 0, 0, 0]);
    }
}
