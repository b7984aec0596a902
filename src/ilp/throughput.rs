//! Throughput ILP: the longest run of domain points along a projection vector
//!
//! For a projection vector `u`, the block pipelining period is the largest
//! `k` such that two domain points satisfy `x1 − x2 = k·u`. The solver only
//! minimizes, so the program minimizes `k' = B − k` instead:
//!
//! ```text
//! unknowns:   k'  x1[0..D]  x2[0..D]
//! parameters: p[0..P]  B
//! rows:       A·x1 + b(p) ⋈ 0          (every domain row)
//!             A·x2 + b(p) ⋈ 0          (every domain row)
//!             u_i·k' + x1_i − x2_i − u_i·B = 0   for each i
//! ```

use log::trace;

use crate::enumerator::CandidateVector;
use crate::error::{ExploreError, ExploreResult};
use crate::ilp::ParametricProgram;
use crate::polyhedron::{Constraint, Polyhedron};

/// Builder for the throughput program of one candidate vector
pub struct ThroughputIlp;

impl ThroughputIlp {
    /// Encode `max k s.t. x1, x2 ∈ domain, x1 − x2 = k·u`
    pub fn build(
        domain: &Polyhedron,
        context: &Polyhedron,
        vector: &CandidateVector,
    ) -> ExploreResult<ParametricProgram> {
        let d = domain.dimensions;
        let p = domain.parameters;
        if vector.dimensions() != d {
            return Err(ExploreError::input(format!(
                "Projection vector has {} components, domain has {} dimensions",
                vector.dimensions(),
                d
            )));
        }

        let unknowns = 1 + 2 * d;
        let parameters = p + 1;
        let width = unknowns + parameters + 1;
        let x1 = 1;
        let x2 = 1 + d;
        let params = unknowns;
        let big = unknowns + p;
        let constant = width - 1;

        let mut rows = Vec::with_capacity(2 * domain.constraints.len() + d);

        for offset in [x1, x2] {
            for c in &domain.constraints {
                let mut coeffs = vec![0; width];
                coeffs[offset..offset + d].copy_from_slice(&c.coeffs[..d]);
                coeffs[params..params + p].copy_from_slice(&c.coeffs[d..d + p]);
                coeffs[constant] = c.constant();
                rows.push(Constraint {
                    kind: c.kind,
                    coeffs,
                });
            }
        }

        // x1 − x2 = (B − k')·u
        for (i, &u) in vector.components().iter().enumerate() {
            let mut coeffs = vec![0; width];
            coeffs[0] = u;
            coeffs[x1 + i] = 1;
            coeffs[x2 + i] = -1;
            coeffs[big] = -u;
            rows.push(Constraint::equality(coeffs));
        }

        // Same parameter context, with a free column for B.
        let context_rows = context
            .constraints
            .iter()
            .map(|c| {
                let mut coeffs = Vec::with_capacity(parameters + 1);
                coeffs.extend_from_slice(&c.coeffs[..p]);
                coeffs.push(0);
                coeffs.push(c.constant());
                Constraint {
                    kind: c.kind,
                    coeffs,
                }
            })
            .collect();

        let program = ParametricProgram::new(unknowns, parameters, rows, context_rows, p);
        trace!("throughput ILP for {}:\n{}", vector, program.to_pip_text());
        Ok(program)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polyhedron::ConstraintKind;

    /// 0 <= i <= N, 0 <= j <= N with context N >= 1
    fn parametric_square() -> (Polyhedron, Polyhedron) {
        let domain = Polyhedron::new(
            2,
            1,
            vec![
                Constraint::inequality(vec![1, 0, 0, 0]),
                Constraint::inequality(vec![-1, 0, 1, 0]),
                Constraint::inequality(vec![0, 1, 0, 0]),
                Constraint::inequality(vec![0, -1, 1, 0]),
            ],
        );
        let context = Polyhedron::new(0, 1, vec![Constraint::inequality(vec![1, -1])]);
        (domain, context)
    }

    #[test]
    fn test_row_layout() {
        let (domain, context) = parametric_square();
        let u = CandidateVector::new(vec![1, -1], 2);
        let program = ThroughputIlp::build(&domain, &context, &u).unwrap();

        assert_eq!(program.unknowns(), 5);
        assert_eq!(program.parameters(), 2);
        assert_eq!(program.big_parameter(), 1);
        assert_eq!(program.big_parameter_column(), 6);
        assert_eq!(program.rows().len(), 4 * 2 + 2);

        // N - i >= 0 for x1, then for x2
        assert_eq!(program.rows()[1].coeffs, vec![0, -1, 0, 0, 0, 1, 0, 0]);
        assert_eq!(program.rows()[5].coeffs, vec![0, 0, 0, -1, 0, 1, 0, 0]);

        // k' + x1_0 - x2_0 - B = 0 and -k' + x1_1 - x2_1 + B = 0
        let eq0 = &program.rows()[8];
        assert_eq!(eq0.kind, ConstraintKind::Equality);
        assert_eq!(eq0.coeffs, vec![1, 1, 0, -1, 0, 0, -1, 0]);
        assert_eq!(program.rows()[9].coeffs, vec![-1, 0, 1, 0, -1, 0, 1, 0]);
    }

    #[test]
    fn test_context_gets_big_parameter_column() {
        let (domain, context) = parametric_square();
        let u = CandidateVector::new(vec![1, 0], 2);
        let program = ThroughputIlp::build(&domain, &context, &u).unwrap();
        assert_eq!(program.context().len(), 1);
        assert_eq!(program.context()[0].coeffs, vec![1, 0, -1]);
    }

    #[test]
    fn test_dimension_mismatch() {
        let (domain, context) = parametric_square();
        let u = CandidateVector::new(vec![1, 0, 0], 2);
        assert!(ThroughputIlp::build(&domain, &context, &u).is_err());
    }
}
