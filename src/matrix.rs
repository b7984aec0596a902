//! Dense integer matrices
//!
//! Used for dependency and vertex sets, the allocation matrix, and the raw
//! PIP matrices read from disk.

use serde::{Deserialize, Serialize};

use crate::error::{ExploreError, ExploreResult};

/// Row-major integer matrix
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntMatrix {
    rows: usize,
    cols: usize,
    data: Vec<i64>,
}

impl IntMatrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0; rows * cols],
        }
    }

    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m.set(i, i, 1);
        }
        m
    }

    /// Build from explicit rows; all rows must share one length
    pub fn from_rows(rows: Vec<Vec<i64>>) -> ExploreResult<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        Self::from_rows_with_cols(rows, cols)
    }

    /// Build from rows with a declared column count (needed for empty matrices)
    pub fn from_rows_with_cols(rows: Vec<Vec<i64>>, cols: usize) -> ExploreResult<Self> {
        let nrows = rows.len();
        let mut data = Vec::with_capacity(nrows * cols);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != cols {
                return Err(ExploreError::input(format!(
                    "Row {} has {} elements, expected {}",
                    i,
                    row.len(),
                    cols
                )));
            }
            data.extend(row);
        }
        Ok(Self {
            rows: nrows,
            cols,
            data,
        })
    }

    pub fn nrows(&self) -> usize {
        self.rows
    }

    pub fn ncols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> i64 {
        self.data[row * self.cols + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: i64) {
        self.data[row * self.cols + col] = value;
    }

    pub fn row(&self, row: usize) -> &[i64] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[i64]> {
        (0..self.rows).map(move |r| self.row(r))
    }

    pub fn transpose(&self) -> Self {
        let mut t = Self::zeros(self.cols, self.rows);
        for i in 0..self.rows {
            for j in 0..self.cols {
                t.set(j, i, self.get(i, j));
            }
        }
        t
    }

    /// Integer determinant by fraction-free (Bareiss) elimination
    pub fn determinant(&self) -> Option<i128> {
        if self.rows != self.cols {
            return None;
        }
        let n = self.rows;
        let mut m: Vec<Vec<i128>> = self
            .rows()
            .map(|r| r.iter().map(|&v| v as i128).collect())
            .collect();
        let mut sign = 1i128;
        let mut prev = 1i128;
        for k in 0..n {
            if m[k][k] == 0 {
                let Some(swap) = (k + 1..n).find(|&i| m[i][k] != 0) else {
                    return Some(0);
                };
                m.swap(k, swap);
                sign = -sign;
            }
            for i in k + 1..n {
                for j in k + 1..n {
                    m[i][j] = (m[i][j] * m[k][k] - m[i][k] * m[k][j]) / prev;
                }
            }
            prev = m[k][k];
        }
        Some(if n == 0 { 1 } else { sign * m[n - 1][n - 1] })
    }
}

/// Dot product of two integer vectors of equal length
pub fn dot(a: &[i64], b: &[i64]) -> i64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

impl std::fmt::Display for IntMatrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in self.rows() {
            write!(f, "[ ")?;
            for v in row {
                write!(f, "{} ", v)?;
            }
            write!(f, "]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows_rejects_ragged() {
        let err = IntMatrix::from_rows(vec![vec![1, 2], vec![3]]).unwrap_err();
        assert!(matches!(err, ExploreError::InputError { .. }));
    }

    #[test]
    fn test_transpose() {
        let m = IntMatrix::from_rows(vec![vec![1, 2, 3], vec![4, 5, 6]]).unwrap();
        let t = m.transpose();
        assert_eq!(t.nrows(), 3);
        assert_eq!(t.row(2), &[3, 6]);
    }

    #[test]
    fn test_determinant() {
        let m = IntMatrix::from_rows(vec![vec![0, 1], vec![-1, -1]]).unwrap();
        assert_eq!(m.determinant(), Some(1));

        let m = IntMatrix::from_rows(vec![vec![2, 0, 1], vec![1, 1, 0], vec![1, 0, 1]]).unwrap();
        assert_eq!(m.determinant(), Some(1));

        let singular = IntMatrix::from_rows(vec![vec![1, 2], vec![2, 4]]).unwrap();
        assert_eq!(singular.determinant(), Some(0));
    }

    #[test]
    fn test_display() {
        let m = IntMatrix::from_rows(vec![vec![0, 1], vec![1, 0]]).unwrap();
        assert_eq!(m.to_string(), "[ 0 1 ][ 1 0 ]");
    }
}
