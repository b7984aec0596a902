//! Enumeration of candidate projection vectors
//!
//! Vectors are produced in lexicographic (odometer) order inside the box
//! `[-M, M]^D`. By default enumeration starts at `(0,…,0,1)`, which covers
//! exactly one of `u` and `-u` for every non-zero `u`; the schedule search
//! tries the other sign on its own. `full_box` starts at `(-M,…,-M)`
//! instead and visits all `(2M+1)^D` vectors.

use num_integer::Integer;
use serde::{Deserialize, Serialize};

use crate::matrix::dot;

/// A candidate direction along which the iteration space collapses to time
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CandidateVector {
    components: Vec<i64>,
    bound: i64,
}

impl CandidateVector {
    pub fn new(components: Vec<i64>, bound: i64) -> Self {
        Self { components, bound }
    }

    pub fn components(&self) -> &[i64] {
        &self.components
    }

    pub fn dimensions(&self) -> usize {
        self.components.len()
    }

    /// GCD of the non-zero components; 0 for the zero vector
    pub fn gcd(&self) -> i64 {
        self.components
            .iter()
            .filter(|&&c| c != 0)
            .fold(0, |acc, &c| acc.gcd(&c))
    }

    /// True iff the squared Euclidean norm exceeds `M²`
    pub fn is_over_bound(&self) -> bool {
        let magnitude: i64 = self.components.iter().map(|c| c * c).sum();
        magnitude > self.bound * self.bound
    }

    /// Primitive and within the magnitude bound
    pub fn is_admissible(&self) -> bool {
        self.gcd() == 1 && !self.is_over_bound()
    }

    pub fn negated(&self) -> Self {
        Self {
            components: self.components.iter().map(|c| -c).collect(),
            bound: self.bound,
        }
    }

    pub fn dot(&self, other: &[i64]) -> i64 {
        dot(&self.components, other)
    }
}

impl std::fmt::Display for CandidateVector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.components.iter().map(i64::to_string).collect();
        write!(f, "({})", parts.join(", "))
    }
}

/// Odometer over `[-M, M]^D`
#[derive(Debug, Clone)]
pub struct VectorEnumerator {
    index: Vec<i64>,
    bound: i64,
}

impl VectorEnumerator {
    /// Enumerate from `(0,…,0,1)` until the first coordinate exceeds `bound`
    pub fn new(dimensions: usize, bound: i64) -> Self {
        assert!(dimensions > 0, "enumerator needs at least one dimension");
        let mut index = vec![0; dimensions];
        index[dimensions - 1] = 1;
        Self { index, bound }
    }

    /// Enumerate the whole box starting at `(-M,…,-M)`
    pub fn full_box(dimensions: usize, bound: i64) -> Self {
        assert!(dimensions > 0, "enumerator needs at least one dimension");
        Self {
            index: vec![-bound; dimensions],
            bound,
        }
    }

    /// The vector currently under the odometer
    pub fn current(&self) -> CandidateVector {
        CandidateVector::new(self.index.clone(), self.bound)
    }

    /// Advance to the lexicographically next vector
    pub fn advance(&mut self) {
        let last = self.index.len() - 1;
        self.index[last] += 1;

        for i in (0..last).rev() {
            if self.index[i + 1] > self.bound {
                self.index[i + 1] = -self.bound;
                self.index[i] += 1;
            } else {
                break;
            }
        }
    }

    /// Exhausted once the first coordinate has passed the bound
    pub fn end(&self) -> bool {
        self.index[0] > self.bound
    }

    /// See [`CandidateVector::gcd`]
    pub fn gcd(&self) -> i64 {
        self.current().gcd()
    }

    /// See [`CandidateVector::is_over_bound`]
    pub fn is_over_bound(&self) -> bool {
        self.current().is_over_bound()
    }

    /// Only the vectors worth scoring
    pub fn admissible(self) -> impl Iterator<Item = CandidateVector> {
        self.filter(CandidateVector::is_admissible)
    }
}

impl Iterator for VectorEnumerator {
    type Item = CandidateVector;

    fn next(&mut self) -> Option<Self::Item> {
        if self.end() {
            return None;
        }
        let current = self.current();
        self.advance();
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_gcd() {
        assert_eq!(CandidateVector::new(vec![0, 0, 0], 3).gcd(), 0);
        assert_eq!(CandidateVector::new(vec![2, 4, 6], 9).gcd(), 2);
        assert_eq!(CandidateVector::new(vec![1, 0, 3], 9).gcd(), 1);
        assert_eq!(CandidateVector::new(vec![-2, 0, 4], 9).gcd(), 2);
    }

    #[test]
    fn test_over_bound_boundary() {
        // |(1, 1)|^2 = 2
        assert!(CandidateVector::new(vec![1, 1], 1).is_over_bound());
        // |(0, 2)|^2 = 4 = M^2 is within bound
        assert!(!CandidateVector::new(vec![0, 2], 2).is_over_bound());
        assert!(CandidateVector::new(vec![1, 2], 2).is_over_bound());
    }

    #[test]
    fn test_first_vectors() {
        let vectors: Vec<Vec<i64>> = VectorEnumerator::new(2, 1)
            .map(|v| v.components().to_vec())
            .collect();
        assert_eq!(vectors, vec![vec![0, 1], vec![1, -1], vec![1, 0], vec![1, 1]]);
    }

    #[test]
    fn test_full_box_visits_every_vector_once() {
        for (d, m) in [(1, 2), (2, 1), (2, 3), (3, 2)] {
            let visited: Vec<_> = VectorEnumerator::full_box(d, m).collect();
            let unique: HashSet<_> = visited.iter().cloned().collect();
            assert_eq!(visited.len(), ((2 * m + 1) as usize).pow(d as u32));
            assert_eq!(unique.len(), visited.len());
        }
    }

    #[test]
    fn test_half_space_covers_each_direction_once() {
        let (d, m) = (3, 2);
        let visited: HashSet<_> = VectorEnumerator::new(d, m).collect();
        assert_eq!(visited.len(), (((2 * m + 1) as usize).pow(d as u32) - 1) / 2);
        for v in &visited {
            assert!(!visited.contains(&v.negated()));
        }
    }

    #[test]
    fn test_enumeration_is_lexicographically_increasing() {
        let visited: Vec<_> = VectorEnumerator::full_box(3, 1)
            .map(|v| v.components().to_vec())
            .collect();
        assert!(visited.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_admissible_filter() {
        let admissible: Vec<Vec<i64>> = VectorEnumerator::new(2, 1)
            .admissible()
            .map(|v| v.components().to_vec())
            .collect();
        assert_eq!(admissible, vec![vec![0, 1], vec![1, 0]]);

        let full: Vec<Vec<i64>> = VectorEnumerator::full_box(2, 1)
            .admissible()
            .map(|v| v.components().to_vec())
            .collect();
        assert_eq!(full, vec![vec![-1, 0], vec![0, -1], vec![0, 1], vec![1, 0]]);
    }

    #[test]
    fn test_enumerator_queries() {
        let mut e = VectorEnumerator::new(2, 2);
        assert_eq!(e.gcd(), 1);
        assert!(!e.is_over_bound());
        e.advance(); // (0, 2)
        assert_eq!(e.gcd(), 2);
        assert!(!e.end());
    }
}
