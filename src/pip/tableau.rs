//! Dual simplex tableau with parametric constants
//!
//! Every row holds a basic quantity as `Σ coeffs[j]·y_j + constant(p)`,
//! where `y` are the current non-basic variables and `constant` is affine
//! in the parameters. The first `unknowns` rows are the unknowns themselves
//! and start as the identity; the remaining rows are constraint slacks that
//! must stay non-negative. The current point is `y = 0`.
//!
//! Columns stay lexicographically positive over the unknown rows, so every
//! pivot chosen by [`Tableau::pivot_column`] moves the point to a
//! lexicographically larger one and the first feasible point is the
//! lexicographic minimum.

use std::cmp::Ordering;

use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

/// Coefficients over the parameters, then the constant
pub type ParamVector = Vec<BigRational>;

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub coeffs: Vec<BigRational>,
    pub constant: ParamVector,
}

/// Fractional part of a parametric value, in lowest common terms
///
/// `value(p) = integral(p) + (numerator · (p, 1)) / divisor` with every
/// numerator entry in `[0, divisor)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remainder {
    pub numerator: Vec<BigInt>,
    pub divisor: BigInt,
}

impl Remainder {
    /// True when only the constant entry is non-zero
    pub fn is_constant(&self) -> bool {
        self.numerator[..self.numerator.len() - 1]
            .iter()
            .all(|r| r.is_zero())
    }
}

#[derive(Debug, Clone)]
pub struct Tableau {
    unknowns: usize,
    parameters: usize,
    rows: Vec<Row>,
}

impl Tableau {
    /// Identity rows for the unknowns and no constraints yet
    pub fn new(unknowns: usize, parameters: usize) -> Self {
        let rows = (0..unknowns)
            .map(|i| {
                let mut coeffs = vec![BigRational::zero(); unknowns];
                coeffs[i] = BigRational::one();
                Row {
                    coeffs,
                    constant: vec![BigRational::zero(); parameters + 1],
                }
            })
            .collect();
        Self {
            unknowns,
            parameters,
            rows,
        }
    }

    pub fn unknowns(&self) -> usize {
        self.unknowns
    }

    pub fn parameters(&self) -> usize {
        self.parameters
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Append `coeffs · (x, p, 1) >= 0`, expressed in the current basis
    pub fn push_inequality(&mut self, coeffs: &[BigInt]) {
        debug_assert_eq!(coeffs.len(), self.unknowns + self.parameters + 1);
        let mut row = Row {
            coeffs: vec![BigRational::zero(); self.unknowns],
            constant: coeffs[self.unknowns..]
                .iter()
                .cloned()
                .map(BigRational::from_integer)
                .collect(),
        };
        for (i, a) in coeffs[..self.unknowns].iter().enumerate() {
            if a.is_zero() {
                continue;
            }
            let a = BigRational::from_integer(a.clone());
            let unknown = &self.rows[i];
            for (dst, src) in row.coeffs.iter_mut().zip(&unknown.coeffs) {
                *dst += &a * src;
            }
            for (dst, src) in row.constant.iter_mut().zip(&unknown.constant) {
                *dst += &a * src;
            }
        }
        self.rows.push(row);
    }

    /// Append `coeffs · (x, p, 1) = 0` as a pair of opposite inequalities
    pub fn push_equality(&mut self, coeffs: &[BigInt]) {
        self.push_inequality(coeffs);
        let negated: Vec<BigInt> = coeffs.iter().map(|c| -c).collect();
        self.push_inequality(&negated);
    }

    pub fn push_row(&mut self, row: Row) {
        debug_assert_eq!(row.coeffs.len(), self.unknowns);
        debug_assert_eq!(row.constant.len(), self.parameters + 1);
        self.rows.push(row);
    }

    /// Add a parameter column (zero everywhere) just before the constant
    pub fn add_parameter(&mut self) {
        for row in &mut self.rows {
            row.constant.insert(self.parameters, BigRational::zero());
        }
        self.parameters += 1;
    }

    /// Column with a positive entry in row `r` minimizing `column / entry`
    /// lexicographically over the unknown rows; `None` if row `r` has no
    /// positive entry
    pub fn pivot_column(&self, r: usize) -> Option<usize> {
        let row = &self.rows[r];
        let mut best: Option<usize> = None;
        for j in 0..self.unknowns {
            if !row.coeffs[j].is_positive() {
                continue;
            }
            best = match best {
                Some(b) if self.compare_columns(r, b, j) != Ordering::Greater => Some(b),
                _ => Some(j),
            };
        }
        best
    }

    fn compare_columns(&self, r: usize, a: usize, b: usize) -> Ordering {
        let pa = &self.rows[r].coeffs[a];
        let pb = &self.rows[r].coeffs[b];
        for row in &self.rows[..self.unknowns] {
            let lhs = &row.coeffs[a] / pa;
            let rhs = &row.coeffs[b] / pb;
            match lhs.cmp(&rhs) {
                Ordering::Equal => continue,
                other => return other,
            }
        }
        Ordering::Equal
    }

    /// Exchange the slack of row `r` with non-basic variable `j`
    pub fn pivot(&mut self, r: usize, j: usize) {
        let pivot_row = self.rows[r].clone();
        let pivot = pivot_row.coeffs[j].clone();
        for row in &mut self.rows {
            let factor = &row.coeffs[j] / &pivot;
            if factor.is_zero() {
                continue;
            }
            for (k, coeff) in row.coeffs.iter_mut().enumerate() {
                if k == j {
                    *coeff = factor.clone();
                } else {
                    *coeff -= &factor * &pivot_row.coeffs[k];
                }
            }
            for (c, pc) in row.constant.iter_mut().zip(&pivot_row.constant) {
                *c -= &factor * pc;
            }
        }
    }

    /// Fractional part of the value of unknown `i`, if it is not integral
    pub fn remainder(&self, i: usize) -> Option<Remainder> {
        let constant = &self.rows[i].constant;
        if constant.iter().all(BigRational::is_integer) {
            return None;
        }
        let divisor = constant
            .iter()
            .fold(BigInt::one(), |acc, c| acc.lcm(c.denom()));
        let scale = BigRational::from_integer(divisor.clone());
        let numerator = constant
            .iter()
            .map(|c| (c * &scale).to_integer().mod_floor(&divisor))
            .collect();
        Some(Remainder { numerator, divisor })
    }

    /// First unknown with a fractional value
    pub fn first_remainder(&self) -> Option<(usize, Remainder)> {
        (0..self.unknowns).find_map(|i| self.remainder(i).map(|r| (i, r)))
    }

    /// Append the Gomory cut of unknown row `i`
    ///
    /// `column` is the parameter holding `floor(remainder / divisor)`, or
    /// `None` when the remainder is constant. The cut reads
    /// `Σ frac(-a_j)·y_j + q - remainder / divisor >= 0`.
    pub fn push_cut(&mut self, i: usize, remainder: &Remainder, column: Option<usize>) {
        let coeffs = self.rows[i]
            .coeffs
            .iter()
            .map(|a| fraction(&-a))
            .collect();
        let divisor = BigRational::from_integer(remainder.divisor.clone());
        let mut constant: ParamVector = remainder
            .numerator
            .iter()
            .map(|r| -BigRational::from_integer(r.clone()) / &divisor)
            .collect();
        if let Some(column) = column {
            constant[column] += BigRational::one();
        }
        self.push_row(Row { coeffs, constant });
    }

    /// Replace `remainder / divisor` by the parameter at `column` in the
    /// value of unknown `i`, once the context forces them equal
    pub fn absorb_remainder(&mut self, i: usize, remainder: &Remainder, column: usize) {
        let divisor = BigRational::from_integer(remainder.divisor.clone());
        let constant = &mut self.rows[i].constant;
        for (c, r) in constant.iter_mut().zip(&remainder.numerator) {
            *c -= BigRational::from_integer(r.clone()) / &divisor;
        }
        constant[column] += BigRational::one();
    }
}

/// `x - floor(x)`, always in `[0, 1)`
pub fn fraction(x: &BigRational) -> BigRational {
    x - x.floor()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[i64]) -> Vec<BigInt> {
        values.iter().map(|&v| BigInt::from(v)).collect()
    }

    fn q(n: i64, d: i64) -> BigRational {
        BigRational::new(BigInt::from(n), BigInt::from(d))
    }

    #[test]
    fn test_pivot_expresses_unknown_through_slack() {
        // x >= 0, x - 3 >= 0, no parameters
        let mut tableau = Tableau::new(1, 0);
        tableau.push_inequality(&ints(&[1, -3]));
        assert_eq!(tableau.pivot_column(1), Some(0));
        tableau.pivot(1, 0);
        // x = s + 3
        assert_eq!(tableau.rows()[0].coeffs, vec![q(1, 1)]);
        assert_eq!(tableau.rows()[0].constant, vec![q(3, 1)]);
        assert_eq!(tableau.rows()[1].constant, vec![q(0, 1)]);
    }

    #[test]
    fn test_pivot_column_is_lexicographic() {
        // x0 + x1 - 1 >= 0: raising x1 keeps x0 = 0
        let mut tableau = Tableau::new(2, 0);
        tableau.push_inequality(&ints(&[1, 1, -1]));
        assert_eq!(tableau.pivot_column(2), Some(1));
        tableau.pivot(2, 1);
        assert_eq!(tableau.rows()[0].constant, vec![q(0, 1)]);
        assert_eq!(tableau.rows()[1].constant, vec![q(1, 1)]);
    }

    #[test]
    fn test_no_positive_entry() {
        let mut tableau = Tableau::new(1, 0);
        tableau.push_inequality(&ints(&[-1, -1]));
        assert_eq!(tableau.pivot_column(1), None);
    }

    #[test]
    fn test_parametric_remainder() {
        // x = 3/2 N + 1/4
        let mut tableau = Tableau::new(1, 1);
        tableau.push_inequality(&ints(&[0, 0, 0]));
        tableau.rows[0].constant = vec![q(3, 2), q(1, 4)];
        let remainder = tableau.remainder(0).unwrap();
        assert_eq!(remainder.divisor, BigInt::from(4));
        assert_eq!(remainder.numerator, ints(&[2, 1]));
        assert!(!remainder.is_constant());

        tableau.add_parameter();
        let padded = Remainder {
            numerator: ints(&[2, 0, 1]),
            divisor: BigInt::from(4),
        };
        tableau.push_cut(0, &padded, Some(1));
        let cut = tableau.rows().last().unwrap();
        assert_eq!(cut.constant, vec![q(-1, 2), q(1, 1), q(-1, 4)]);
    }

    #[test]
    fn test_absorb_remainder() {
        let mut tableau = Tableau::new(1, 2);
        tableau.rows[0].constant = vec![q(1, 2), q(0, 1), q(0, 1)];
        let remainder = tableau.remainder(0).unwrap();
        tableau.absorb_remainder(0, &remainder, 1);
        assert_eq!(tableau.rows()[0].constant, vec![q(0, 1), q(1, 1), q(0, 1)]);
        assert!(tableau.remainder(0).is_none());
    }

    #[test]
    fn test_fraction() {
        assert_eq!(fraction(&q(7, 3)), q(1, 3));
        assert_eq!(fraction(&q(-7, 3)), q(2, 3));
        assert_eq!(fraction(&q(2, 1)), q(0, 1));
    }
}
