//! Schedule ILP: a linear schedule compatible with a projection vector
//!
//! The schedule `l` must give every dependency at least `S` cycles of delay
//! and advance along the projection vector (`l·u ≥ 1`). Among those it
//! minimizes `W·t + s`, where `t ≥ l·u` is the processor utilization proxy
//! and `s` bounds the latency over every pair of vertices.
//!
//! ```text
//! unknowns:   q  t  s  l'[0..D]      with l_i = l'_i − B
//! parameters: B
//! rows:       t − l·u ≥ 0
//!             l·u − 1 ≥ 0
//!             q − W·t − s ≥ 0
//!             −l·d − S ≥ 0             for every dependency d
//!             s − l·(Vi − Vj) ≥ 0      for every ordered vertex pair i ≠ j
//! ```

use log::trace;

use crate::enumerator::CandidateVector;
use crate::ilp::ParametricProgram;
use crate::matrix::IntMatrix;
use crate::polyhedron::Constraint;

/// Weight of utilization against latency in the schedule objective.
///
/// A tuning knob: large enough that one unit of utilization outweighs any
/// latency difference on the problems explored so far.
pub const SCHEDULE_UTILIZATION_WEIGHT: i64 = 2048;

const Q: usize = 0;
const T: usize = 1;
const S: usize = 2;
const L: usize = 3;

/// Builder for schedule programs over one set of dependencies and vertices
#[derive(Debug, Clone)]
pub struct ScheduleIlp<'a> {
    dependencies: &'a IntMatrix,
    vertices: &'a IntMatrix,
    pipeline_stages: i64,
    weight: i64,
}

impl<'a> ScheduleIlp<'a> {
    pub fn new(dependencies: &'a IntMatrix, vertices: &'a IntMatrix, pipeline_stages: i64) -> Self {
        Self {
            dependencies,
            vertices,
            pipeline_stages,
            weight: SCHEDULE_UTILIZATION_WEIGHT,
        }
    }

    pub fn with_weight(mut self, weight: i64) -> Self {
        self.weight = weight;
        self
    }

    /// Build a fresh program for `vector`; a retry builds another from `vector.negated()`
    pub fn build(&self, vector: &CandidateVector) -> ParametricProgram {
        let d = vector.dimensions();
        let unknowns = L + d;
        let width = unknowns + 2;
        let big = unknowns;
        let constant = unknowns + 1;

        let mut rows = Vec::new();

        // Row for `sign · l·w + rest`: l'_i gets sign·w_i, B gets -sign·Σw.
        let schedule_row = |w: &[i64], sign: i64| {
            let mut coeffs = vec![0; width];
            for (i, &wi) in w.iter().enumerate() {
                coeffs[L + i] = sign * wi;
            }
            coeffs[big] = -sign * w.iter().sum::<i64>();
            coeffs
        };

        let u = vector.components();

        // t - l·u >= 0
        let mut coeffs = schedule_row(u, -1);
        coeffs[T] = 1;
        rows.push(Constraint::inequality(coeffs));

        // l·u - 1 >= 0
        let mut coeffs = schedule_row(u, 1);
        coeffs[constant] = -1;
        rows.push(Constraint::inequality(coeffs));

        // q - W·t - s >= 0
        let mut coeffs = vec![0; width];
        coeffs[Q] = 1;
        coeffs[T] = -self.weight;
        coeffs[S] = -1;
        rows.push(Constraint::inequality(coeffs));

        // -l·d - S >= 0
        for dep in self.dependencies.rows() {
            let mut coeffs = schedule_row(dep, -1);
            coeffs[constant] = -self.pipeline_stages;
            rows.push(Constraint::inequality(coeffs));
        }

        // s - l·(Vi - Vj) >= 0
        for (i, vi) in self.vertices.rows().enumerate() {
            for (j, vj) in self.vertices.rows().enumerate() {
                if i == j {
                    continue;
                }
                let diff: Vec<i64> = vi.iter().zip(vj).map(|(a, b)| a - b).collect();
                let mut coeffs = schedule_row(&diff, -1);
                coeffs[S] = 1;
                rows.push(Constraint::inequality(coeffs));
            }
        }

        // B >= 0
        let context = vec![Constraint::inequality(vec![1, 0])];

        let program = ParametricProgram::new(unknowns, 1, rows, context, 0);
        trace!("schedule ILP for {}:\n{}", vector, program.to_pip_text());
        program
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square_inputs() -> (IntMatrix, IntMatrix) {
        let deps = IntMatrix::from_rows(vec![vec![1, 0], vec![0, 1]]).unwrap();
        let verts =
            IntMatrix::from_rows(vec![vec![0, 0], vec![1, 0], vec![0, 1], vec![1, 1]]).unwrap();
        (deps, verts)
    }

    #[test]
    fn test_row_count_and_order() {
        let (deps, verts) = unit_square_inputs();
        let program = ScheduleIlp::new(&deps, &verts, 1).build(&CandidateVector::new(vec![1, 2], 3));

        // 3 fixed rows, 2 dependencies, 4*3 vertex pairs
        assert_eq!(program.rows().len(), 3 + 2 + 12);
        assert_eq!(program.unknowns(), 5);
        assert_eq!(program.big_parameter_column(), 5);

        // t - l'·u + 3B >= 0
        assert_eq!(program.rows()[0].coeffs, vec![0, 1, 0, -1, -2, 3, 0]);
        // l'·u - 3B - 1 >= 0
        assert_eq!(program.rows()[1].coeffs, vec![0, 0, 0, 1, 2, -3, -1]);
        // q - 2048t - s >= 0
        assert_eq!(program.rows()[2].coeffs, vec![1, -2048, -1, 0, 0, 0, 0]);
        // -l'_0 + B - 1 >= 0
        assert_eq!(program.rows()[3].coeffs, vec![0, 0, 0, -1, 0, 1, -1]);
        // pair (V0, V1): V0 - V1 = (-1, 0): s + l'_0 - B >= 0
        assert_eq!(program.rows()[5].coeffs, vec![0, 0, 1, 1, 0, -1, 0]);
        assert_eq!(program.context()[0].coeffs, vec![1, 0]);
    }

    #[test]
    fn test_pipeline_stages_and_weight() {
        let (deps, verts) = unit_square_inputs();
        let program = ScheduleIlp::new(&deps, &verts, 4)
            .with_weight(16)
            .build(&CandidateVector::new(vec![0, 1], 1));
        assert_eq!(program.rows()[2].coeffs[T], -16);
        assert_eq!(program.rows()[4].coeffs[program.unknowns() + 1], -4);
    }

    #[test]
    fn test_negated_vector_builds_fresh_program() {
        let (deps, verts) = unit_square_inputs();
        let builder = ScheduleIlp::new(&deps, &verts, 1);
        let u = CandidateVector::new(vec![1, 0], 1);
        let first = builder.build(&u);
        let second = builder.build(&u.negated());
        assert_eq!(first.rows()[1].coeffs, vec![0, 0, 0, 1, 0, -1, -1]);
        assert_eq!(second.rows()[1].coeffs, vec![0, 0, 0, -1, 0, 1, -1]);
        assert_eq!(first.rows()[2..], second.rows()[2..]);
    }
}
