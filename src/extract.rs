//! Reading solver answers back into closed-form results
//!
//! New parameters are folded into each leaf by replacing every
//! `floor(e / d)` with `e / d`, highest rank first so that definitions
//! referring to earlier new parameters expand too. A leaf sees the new
//! parameters of every node on its path. Conditionals are accepted when
//! their leaves fold to the same answer: the throughput objective for the
//! throughput program, every value for the schedule program. The big
//! parameter must then cancel exactly; anything else means the encoding
//! and the solver disagree.

use log::debug;
use num_rational::Rational64;
use num_traits::{One, Zero};
use serde::{Deserialize, Serialize};

use crate::affine::AffineForm;
use crate::error::{ExploreError, ExploreResult};
use crate::ilp::ParametricProgram;
use crate::pip::{NewParameter, SolutionTree, SolutionVector, TreeBody};

/// Maximum run length along the projection vector, and a pair realizing it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThroughputSolution {
    pub bpp: AffineForm,
    pub x1: Vec<AffineForm>,
    pub x2: Vec<AffineForm>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSolution {
    pub schedule: Vec<i64>,
    pub utilization: i64,
    pub latency: i64,
}

pub struct SolutionExtractor;

impl SolutionExtractor {
    /// Unknown order: `k'`, `x1[0..D]`, `x2[0..D]`
    pub fn throughput(
        tree: &SolutionTree,
        program: &ParametricProgram,
        dimensions: usize,
    ) -> ExploreResult<ThroughputSolution> {
        let leaves =
            folded_leaves(tree, program.parameters(), 1 + 2 * dimensions, "throughput")?;
        let mut solved = leaves.into_iter();
        let folded = match solved.next() {
            Some(Some(folded)) => folded,
            Some(None) | None => {
                return Err(ExploreError::violation(
                    "throughput program has no solution",
                ))
            }
        };
        for other in solved {
            match other {
                Some(other) if other[0] == folded[0] => {
                    if other != folded {
                        debug!("throughput branches differ in the point pair; keeping the first");
                    }
                }
                Some(_) => {
                    return Err(ExploreError::violation(
                        "throughput objective depends on a parameter condition",
                    ))
                }
                None => {
                    return Err(ExploreError::violation(
                        "throughput program has no solution under some parameter condition",
                    ))
                }
            }
        }

        let big = program.big_parameter();
        let k = &folded[0];
        if Rational64::one() - k[big] != Rational64::zero() {
            return Err(ExploreError::violation(format!(
                "big parameter does not cancel in the throughput objective (coefficient {})",
                k[big]
            )));
        }
        let mut bpp = without_big(k, big);
        bpp.negate();

        let mut points = Vec::with_capacity(2 * dimensions);
        for (i, value) in folded[1..].iter().enumerate() {
            if !value[big].is_zero() {
                return Err(ExploreError::violation(format!(
                    "throughput point coordinate {} depends on the big parameter",
                    i
                )));
            }
            points.push(without_big(value, big));
        }
        let x2 = points.split_off(dimensions);

        debug!("throughput objective folded to {:?}", bpp.coeffs());
        Ok(ThroughputSolution { bpp, x1: points, x2 })
    }

    /// Unknown order: `q`, utilization, latency, `l'[0..D]`
    ///
    /// `Ok(None)` when the program has no solution, so the caller can try
    /// the other sign of the projection vector.
    pub fn schedule(
        tree: &SolutionTree,
        program: &ParametricProgram,
        dimensions: usize,
    ) -> ExploreResult<Option<ScheduleSolution>> {
        let leaves = folded_leaves(tree, program.parameters(), 3 + dimensions, "schedule")?;
        let folded = match leaves.split_first() {
            Some((first, rest)) if rest.iter().all(|leaf| leaf == first) => first.clone(),
            _ => {
                return Err(ExploreError::violation(
                    "schedule depends on a parameter condition",
                ))
            }
        };
        let Some(folded) = folded else {
            return Ok(None);
        };

        let big = program.big_parameter();
        let utilization = scalar(&folded[1], big, Rational64::zero(), "utilization")?;
        let latency = scalar(&folded[2], big, Rational64::zero(), "latency")?;
        if utilization < 0 || latency < 0 {
            return Err(ExploreError::violation(format!(
                "negative schedule metric (utilization {}, latency {})",
                utilization, latency
            )));
        }

        let schedule = folded[3..]
            .iter()
            .map(|value| scalar(value, big, Rational64::one(), "schedule"))
            .collect::<ExploreResult<Vec<_>>>()?;

        Ok(Some(ScheduleSolution {
            schedule,
            utilization,
            latency,
        }))
    }
}

/// Every leaf of `tree` in then-first order, folded; `None` for no solution
fn folded_leaves(
    tree: &SolutionTree,
    parameters: usize,
    count: usize,
    what: &str,
) -> ExploreResult<Vec<Option<Vec<Vec<Rational64>>>>> {
    let mut leaves = Vec::new();
    collect_leaves(tree, &[], parameters, count, what, &mut leaves)?;
    Ok(leaves)
}

fn collect_leaves(
    tree: &SolutionTree,
    scope: &[NewParameter],
    parameters: usize,
    count: usize,
    what: &str,
    leaves: &mut Vec<Option<Vec<Vec<Rational64>>>>,
) -> ExploreResult<()> {
    let mut scope = scope.to_vec();
    scope.extend(tree.new_parameters.iter().cloned());
    match &tree.body {
        TreeBody::Solution(vectors) => {
            expect_count(vectors, count, what)?;
            let folded = vectors
                .iter()
                .map(|v| fold(v, &scope, parameters))
                .collect::<ExploreResult<Vec<_>>>()?;
            leaves.push(Some(folded));
        }
        TreeBody::NoSolution => leaves.push(None),
        TreeBody::Conditional {
            then_branch,
            else_branch,
            ..
        } => {
            collect_leaves(then_branch, &scope, parameters, count, what, leaves)?;
            collect_leaves(else_branch, &scope, parameters, count, what, leaves)?;
        }
    }
    Ok(())
}

fn expect_count(vectors: &[SolutionVector], expected: usize, what: &str) -> ExploreResult<()> {
    if vectors.len() != expected {
        return Err(ExploreError::violation(format!(
            "{} answer has {} values, expected {}",
            what,
            vectors.len(),
            expected
        )));
    }
    Ok(())
}

/// Expand every new parameter; returns `parameters + 1` coefficients
fn fold(
    vector: &SolutionVector,
    new_parameters: &[NewParameter],
    parameters: usize,
) -> ExploreResult<Vec<Rational64>> {
    let expected = parameters + new_parameters.len() + 1;
    if vector.coeffs.len() != expected {
        return Err(ExploreError::violation(format!(
            "solution vector has {} coefficients, expected {}",
            vector.coeffs.len(),
            expected
        )));
    }
    let mut coeffs = vector.coeffs.clone();
    let constant = expected - 1;

    for rank in (0..new_parameters.len()).rev() {
        let column = parameters + rank;
        let multiplier = coeffs[column];
        if multiplier.is_zero() {
            continue;
        }
        let definition = new_parameters
            .iter()
            .find(|p| p.rank == rank)
            .ok_or_else(|| ExploreError::violation(format!("new parameter {} is undefined", rank)))?;
        if definition.numerator.len() != column + 1 || definition.divisor == 0 {
            return Err(ExploreError::violation(format!(
                "malformed definition of new parameter {}",
                rank
            )));
        }
        let (terms, last) = definition.numerator.split_at(column);
        for (k, &n) in terms.iter().enumerate() {
            coeffs[k] += multiplier * Rational64::new(n, definition.divisor);
        }
        coeffs[constant] += multiplier * Rational64::new(last[0], definition.divisor);
        coeffs[column] = Rational64::zero();
    }

    let mut out = coeffs[..parameters].to_vec();
    out.push(coeffs[constant]);
    Ok(out)
}

/// Drop the big parameter column
fn without_big(coeffs: &[Rational64], big: usize) -> AffineForm {
    let kept = coeffs
        .iter()
        .enumerate()
        .filter(|&(k, _)| k != big)
        .map(|(_, c)| *c)
        .collect();
    AffineForm::from_coeffs(kept)
}

/// A constant integer value whose big parameter coefficient is `big_coeff`
fn scalar(
    coeffs: &[Rational64],
    big: usize,
    big_coeff: Rational64,
    what: &str,
) -> ExploreResult<i64> {
    if coeffs[big] != big_coeff {
        return Err(ExploreError::violation(format!(
            "{} has big parameter coefficient {}, expected {}",
            what, coeffs[big], big_coeff
        )));
    }
    let symbolic = coeffs[..coeffs.len() - 1]
        .iter()
        .enumerate()
        .any(|(k, c)| k != big && !c.is_zero());
    let value = coeffs[coeffs.len() - 1];
    if symbolic || !value.is_integer() {
        return Err(ExploreError::violation(format!(
            "{} is not an integer constant",
            what
        )));
    }
    Ok(value.to_integer())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polyhedron::Constraint;

    fn r(n: i64) -> Rational64 {
        Rational64::from_integer(n)
    }

    fn v(coeffs: &[i64]) -> SolutionVector {
        SolutionVector {
            coeffs: coeffs.iter().map(|&c| r(c)).collect(),
        }
    }

    /// Shape-only programs: only the parameter layout matters here
    fn throughput_program(parameters: usize) -> ParametricProgram {
        ParametricProgram::new(5, parameters, vec![], vec![], parameters - 1)
    }

    fn schedule_program() -> ParametricProgram {
        ParametricProgram::new(5, 1, Vec::<Constraint>::new(), vec![], 0)
    }

    #[test]
    fn test_throughput_box() {
        // k' = B - N, x1 = (N, 0), x2 = (0, 0); parameters N, B
        let tree = SolutionTree::leaf(vec![
            v(&[-1, 1, 0]),
            v(&[1, 0, 0]),
            v(&[0, 0, 0]),
            v(&[0, 0, 0]),
            v(&[0, 0, 0]),
        ]);
        let solution = SolutionExtractor::throughput(&tree, &throughput_program(2), 2).unwrap();
        assert_eq!(solution.bpp.coeffs(), &[r(1), r(0)]);
        assert_eq!(solution.x1[0].coeffs(), &[r(1), r(0)]);
        assert_eq!(solution.x2.len(), 2);
    }

    #[test]
    fn test_big_parameter_not_cancelled() {
        let tree = SolutionTree::leaf(vec![
            v(&[-1, 2, 0]),
            v(&[0, 0, 0]),
            v(&[0, 0, 0]),
            v(&[0, 0, 0]),
            v(&[0, 0, 0]),
        ]);
        let err = SolutionExtractor::throughput(&tree, &throughput_program(2), 2).unwrap_err();
        assert!(matches!(err, ExploreError::EncodingViolation { .. }));
    }

    #[test]
    fn test_point_depending_on_big_parameter() {
        let tree = SolutionTree::leaf(vec![
            v(&[-1, 1, 0]),
            v(&[0, 1, 0]),
            v(&[0, 0, 0]),
            v(&[0, 0, 0]),
            v(&[0, 0, 0]),
        ]);
        assert!(SolutionExtractor::throughput(&tree, &throughput_program(2), 2).is_err());
    }

    /// q0 = floor((N + 1) / 2), split on N odd; 1-D run along u = (2)
    /// in 0 <= x <= N - 1
    fn parity_tree(else_objective: &[i64], else_x1: &[i64]) -> SolutionTree {
        SolutionTree {
            new_parameters: vec![NewParameter {
                rank: 0,
                numerator: vec![1, 0, 1],
                divisor: 2,
            }],
            body: TreeBody::Conditional {
                condition: vec![-1, 0, 2, -1],
                then_branch: Box::new(SolutionTree::leaf(vec![
                    v(&[-1, 1, 1, 0]),
                    v(&[1, 0, 0, -1]),
                    v(&[0, 0, 0, 0]),
                ])),
                else_branch: Box::new(SolutionTree::leaf(vec![
                    v(else_objective),
                    v(else_x1),
                    v(&[0, 0, 0, 0]),
                ])),
            },
        }
    }

    #[test]
    fn test_parity_branches_fold_to_one_objective() {
        // then: B - N + q0, else: B - q0 + 1; both fold to B - (N - 1)/2
        let tree = parity_tree(&[0, 1, -1, 1], &[0, 0, 2, -2]);
        let solution = SolutionExtractor::throughput(&tree, &throughput_program(2), 1).unwrap();
        assert_eq!(
            solution.bpp.coeffs(),
            &[Rational64::new(1, 2), Rational64::new(-1, 2)]
        );
        assert_eq!(solution.x1[0].coeffs(), &[r(1), r(-1)]);
        assert_eq!(solution.x2[0].coeffs(), &[r(0), r(0)]);
    }

    #[test]
    fn test_branch_points_may_differ() {
        let tree = parity_tree(&[0, 1, -1, 1], &[0, 0, 0, 0]);
        let solution = SolutionExtractor::throughput(&tree, &throughput_program(2), 1).unwrap();
        assert_eq!(solution.x1[0].coeffs(), &[r(1), r(-1)]);
    }

    #[test]
    fn test_branch_objectives_must_agree() {
        // else: B - q0 folds to B - (N + 1)/2
        let tree = parity_tree(&[0, 1, -1, 0], &[0, 0, 2, -2]);
        let err = SolutionExtractor::throughput(&tree, &throughput_program(2), 1).unwrap_err();
        assert!(matches!(err, ExploreError::EncodingViolation { .. }));
    }

    #[test]
    fn test_branch_new_parameters_are_scoped_to_the_path() {
        // the else branch defines q1 = floor(q0 / 1) and reads k' through it
        let mut tree = parity_tree(&[0, 1, -1, 1], &[0, 0, 2, -2]);
        if let TreeBody::Conditional { else_branch, .. } = &mut tree.body {
            *else_branch = Box::new(SolutionTree {
                new_parameters: vec![NewParameter {
                    rank: 1,
                    numerator: vec![0, 0, 1, 0],
                    divisor: 1,
                }],
                body: TreeBody::Solution(vec![
                    v(&[0, 1, 0, -1, 1]),
                    v(&[0, 0, 0, 2, -2]),
                    v(&[0, 0, 0, 0, 0]),
                ]),
            });
        }
        let solution = SolutionExtractor::throughput(&tree, &throughput_program(2), 1).unwrap();
        assert_eq!(
            solution.bpp.coeffs(),
            &[Rational64::new(1, 2), Rational64::new(-1, 2)]
        );
    }

    #[test]
    fn test_conditional_without_solution_signals_retry() {
        let tree = SolutionTree {
            new_parameters: vec![],
            body: TreeBody::Conditional {
                condition: vec![1, 0, 0],
                then_branch: Box::new(SolutionTree::no_solution()),
                else_branch: Box::new(SolutionTree::no_solution()),
            },
        };
        let result = SolutionExtractor::schedule(&tree, &schedule_program(), 2).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_partial_schedule_is_a_violation() {
        let tree = SolutionTree {
            new_parameters: vec![],
            body: TreeBody::Conditional {
                condition: vec![1, 0, 0],
                then_branch: Box::new(SolutionTree::leaf(vec![
                    v(&[0, 2050]),
                    v(&[0, 1]),
                    v(&[0, 2]),
                    v(&[1, -1]),
                    v(&[1, -1]),
                ])),
                else_branch: Box::new(SolutionTree::no_solution()),
            },
        };
        let err = SolutionExtractor::schedule(&tree, &schedule_program(), 2).unwrap_err();
        assert!(matches!(err, ExploreError::EncodingViolation { .. }));
    }

    #[test]
    fn test_throughput_without_solution_is_a_violation() {
        let tree = SolutionTree::no_solution();
        assert!(SolutionExtractor::throughput(&tree, &throughput_program(2), 2).is_err());
    }

    #[test]
    fn test_new_parameter_folding() {
        // q0 = floor(N / 2), q1 = floor((q0 + 1) / 3); k' = B - 2q0 - 3q1
        // folds to B - N - (N/2 + 1) = B - 3/2 N - 1
        let tree = SolutionTree {
            new_parameters: vec![
                NewParameter {
                    rank: 0,
                    numerator: vec![1, 0, 0],
                    divisor: 2,
                },
                NewParameter {
                    rank: 1,
                    numerator: vec![0, 0, 1, 1],
                    divisor: 3,
                },
            ],
            body: TreeBody::Solution(vec![
                v(&[0, 1, -2, -3, 0]),
                v(&[0, 0, 0, 0, 0]),
                v(&[0, 0, 0, 0, 0]),
                v(&[0, 0, 0, 0, 0]),
                v(&[0, 0, 0, 0, 0]),
            ]),
        };
        let solution = SolutionExtractor::throughput(&tree, &throughput_program(2), 2).unwrap();
        assert_eq!(solution.bpp.coeffs(), &[Rational64::new(3, 2), r(1)]);
    }

    #[test]
    fn test_schedule_extraction() {
        // q, t = 1, s = 2, l' = (B - 1, B - 1)
        let tree = SolutionTree::leaf(vec![
            v(&[0, 2050]),
            v(&[0, 1]),
            v(&[0, 2]),
            v(&[1, -1]),
            v(&[1, -1]),
        ]);
        let solution = SolutionExtractor::schedule(&tree, &schedule_program(), 2)
            .unwrap()
            .unwrap();
        assert_eq!(solution.schedule, vec![-1, -1]);
        assert_eq!(solution.utilization, 1);
        assert_eq!(solution.latency, 2);
    }

    #[test]
    fn test_schedule_no_solution_signals_retry() {
        let tree = SolutionTree::no_solution();
        let result = SolutionExtractor::schedule(&tree, &schedule_program(), 2).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_schedule_entry_must_carry_big_parameter() {
        let tree = SolutionTree::leaf(vec![
            v(&[0, 0]),
            v(&[0, 1]),
            v(&[0, 2]),
            v(&[0, -1]),
            v(&[1, -1]),
        ]);
        assert!(SolutionExtractor::schedule(&tree, &schedule_program(), 2).is_err());
    }

    #[test]
    fn test_fractional_utilization_is_a_violation() {
        let mut tree_vectors = vec![v(&[0, 0]), v(&[0, 1]), v(&[0, 2]), v(&[1, 0]), v(&[1, 0])];
        tree_vectors[1].coeffs[1] = Rational64::new(1, 2);
        let tree = SolutionTree::leaf(tree_vectors);
        assert!(SolutionExtractor::schedule(&tree, &schedule_program(), 2).is_err());
    }
}
