//! Rational affine functions of the symbolic parameters

use num_rational::Rational64;
use num_traits::{Signed, Zero};
use serde::{Deserialize, Serialize};

/// `c_0·p_0 + … + c_{P-1}·p_{P-1} + c_P`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffineForm {
    /// One coefficient per parameter, then the constant
    coeffs: Vec<Rational64>,
}

impl AffineForm {
    pub fn zero(parameters: usize) -> Self {
        Self {
            coeffs: vec![Rational64::zero(); parameters + 1],
        }
    }

    pub fn constant(parameters: usize, value: Rational64) -> Self {
        let mut form = Self::zero(parameters);
        form.coeffs[parameters] = value;
        form
    }

    /// Parameter coefficients followed by the constant
    pub fn from_coeffs(coeffs: Vec<Rational64>) -> Self {
        assert!(!coeffs.is_empty(), "affine form needs a constant term");
        Self { coeffs }
    }

    pub fn parameters(&self) -> usize {
        self.coeffs.len() - 1
    }

    pub fn coeff(&self, parameter: usize) -> Rational64 {
        self.coeffs[parameter]
    }

    pub fn constant_term(&self) -> Rational64 {
        self.coeffs[self.parameters()]
    }

    pub fn coeffs(&self) -> &[Rational64] {
        &self.coeffs
    }

    pub fn negate(&mut self) {
        for c in &mut self.coeffs {
            *c = -*c;
        }
    }

    /// Exact value at an integer instantiation of the parameters
    pub fn evaluate(&self, values: &[i64]) -> Rational64 {
        assert_eq!(values.len(), self.parameters(), "one value per parameter");
        values
            .iter()
            .zip(&self.coeffs)
            .fold(self.constant_term(), |acc, (&v, &c)| {
                acc + c * Rational64::from_integer(v)
            })
    }

    /// Smallest integer not below the value at `values`
    pub fn evaluate_ceil(&self, values: &[i64]) -> i64 {
        self.evaluate(values).ceil().to_integer()
    }

    /// Render as e.g. `1/2N + 3M - 1`
    pub fn format_with_names(&self, names: &[String]) -> String {
        let mut out = String::new();
        for (coeff, name) in self.coeffs.iter().zip(names) {
            if coeff.is_zero() {
                continue;
            }
            push_term(&mut out, *coeff, name);
        }
        let c = self.constant_term();
        if !c.is_zero() || out.is_empty() {
            push_term(&mut out, c, "");
        }
        out
    }
}

fn push_term(out: &mut String, coeff: Rational64, name: &str) {
    let magnitude = coeff.abs();
    if out.is_empty() {
        if coeff.is_negative() {
            out.push('-');
        }
    } else if coeff.is_negative() {
        out.push_str(" - ");
    } else {
        out.push_str(" + ");
    }
    if name.is_empty() || magnitude != Rational64::from_integer(1) {
        out.push_str(&magnitude.to_string());
    }
    out.push_str(name);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(n: i64, d: i64) -> Rational64 {
        Rational64::new(n, d)
    }

    #[test]
    fn test_evaluate() {
        let form = AffineForm::from_coeffs(vec![r(1, 2), r(3, 1), r(-1, 1)]);
        assert_eq!(form.evaluate(&[4, 1]), r(4, 1));
        assert_eq!(form.evaluate(&[3, 0]), r(1, 2));
    }

    #[test]
    fn test_strict_ceiling() {
        let form = AffineForm::from_coeffs(vec![r(1, 2), r(0, 1)]);
        assert_eq!(form.evaluate_ceil(&[4]), 2);
        assert_eq!(form.evaluate_ceil(&[5]), 3);
        let negative = AffineForm::constant(0, r(-3, 2));
        assert_eq!(negative.evaluate_ceil(&[]), -1);
    }

    #[test]
    fn test_format() {
        let names = vec!["N".to_string(), "M".to_string()];
        let form = AffineForm::from_coeffs(vec![r(1, 2), r(-1, 1), r(-1, 1)]);
        assert_eq!(form.format_with_names(&names), "1/2N - M - 1");
        assert_eq!(AffineForm::zero(2).format_with_names(&names), "0");
        let n = AffineForm::from_coeffs(vec![r(1, 1), r(0, 1), r(0, 1)]);
        assert_eq!(n.format_with_names(&names), "N");
    }

    #[test]
    fn test_negate() {
        let mut form = AffineForm::from_coeffs(vec![r(-1, 1), r(2, 3)]);
        form.negate();
        assert_eq!(form.coeffs(), &[r(1, 1), r(-2, 3)]);
    }
}
