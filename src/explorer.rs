//! Per-candidate evaluation pipeline and the enumeration loop

use log::{debug, info};

use crate::config::ExploreConfig;
use crate::counting::{EnumerativeCounter, PeCount, PointCounter};
use crate::enumerator::{CandidateVector, VectorEnumerator};
use crate::error::{ExploreError, ExploreResult};
use crate::extract::{ScheduleSolution, SolutionExtractor};
use crate::geometry::{ExactGeometry, GeometryService};
use crate::ilp::{ScheduleIlp, ThroughputIlp, SCHEDULE_UTILIZATION_WEIGHT};
use crate::pip::{ParametricSolver, PipSolver};
use crate::problem::Problem;
use crate::solution::ProjectionSolution;

/// Which sign of the candidate the schedule search is on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScheduleAttempt {
    TryPositive,
    TryNegative,
}

#[derive(Debug)]
enum ScheduleOutcome {
    Found(CandidateVector, ScheduleSolution),
    Infeasible,
}

/// Evaluates candidate projection vectors against one problem
pub struct ProjectionExplorer<'a, S = PipSolver, G = ExactGeometry, C = EnumerativeCounter> {
    problem: &'a Problem,
    config: ExploreConfig,
    solver: S,
    geometry: G,
    counter: C,
    weight: i64,
}

impl<'a> ProjectionExplorer<'a> {
    /// Explorer backed by the built-in solver, geometry and counter
    pub fn new(problem: &'a Problem, config: ExploreConfig) -> Self {
        Self::with_services(
            problem,
            config,
            PipSolver::new(),
            ExactGeometry,
            EnumerativeCounter,
        )
    }
}

impl<'a, S, G, C> ProjectionExplorer<'a, S, G, C>
where
    S: ParametricSolver,
    G: GeometryService,
    C: PointCounter<Count = PeCount>,
{
    pub fn with_services(
        problem: &'a Problem,
        config: ExploreConfig,
        solver: S,
        geometry: G,
        counter: C,
    ) -> Self {
        Self {
            problem,
            config,
            solver,
            geometry,
            counter,
            weight: SCHEDULE_UTILIZATION_WEIGHT,
        }
    }

    /// Override the utilization weight of the schedule objective
    pub fn with_weight(mut self, weight: i64) -> Self {
        self.weight = weight;
        self
    }

    pub fn config(&self) -> &ExploreConfig {
        &self.config
    }

    /// Enumerator matching the configured bound and mode
    pub fn enumerator(&self) -> VectorEnumerator {
        let d = self.problem.dimensions;
        if self.config.full_box {
            VectorEnumerator::full_box(d, self.config.magnitude_bound)
        } else {
            VectorEnumerator::new(d, self.config.magnitude_bound)
        }
    }

    /// Run the whole pipeline for one candidate
    pub fn evaluate(&self, candidate: &CandidateVector) -> ExploreResult<ProjectionSolution> {
        let problem = self.problem;
        let d = problem.dimensions;
        debug!("evaluating projection vector {}", candidate);

        let program = ThroughputIlp::build(&problem.domain, &problem.context, candidate)?;
        let tree = self.solver.solve(&program)?;
        let throughput = SolutionExtractor::throughput(&tree, &program, d)?;

        let (vector, schedule) = match self.find_schedule(candidate)? {
            ScheduleOutcome::Found(vector, schedule) => (vector, schedule),
            ScheduleOutcome::Infeasible => {
                return Err(ExploreError::Infeasible {
                    vector: candidate.components().to_vec(),
                })
            }
        };

        let mut solution = ProjectionSolution::new(
            vector.components().to_vec(),
            throughput,
            schedule,
            problem.parameter_names.clone(),
        );
        solution.compute_schedule_network(&problem.dependencies);
        solution.compute_allocation(&self.geometry)?;
        solution.compute_interconnection_network(&problem.dependencies);
        solution.count_pes(
            &problem.domain,
            &problem.instantiation,
            &self.geometry,
            &self.counter,
        )?;
        solution.compute_instance_bpp(&problem.instantiation);
        Ok(solution)
    }

    /// Schedule for the candidate, or for its negation if the candidate
    /// itself admits none. Each attempt solves a freshly built program.
    fn find_schedule(&self, candidate: &CandidateVector) -> ExploreResult<ScheduleOutcome> {
        let problem = self.problem;
        let builder = ScheduleIlp::new(
            &problem.dependencies,
            &problem.vertices,
            self.config.pipeline_stages,
        )
        .with_weight(self.weight);

        let mut attempt = ScheduleAttempt::TryPositive;
        loop {
            let vector = match attempt {
                ScheduleAttempt::TryPositive => candidate.clone(),
                ScheduleAttempt::TryNegative => candidate.negated(),
            };
            let program = builder.build(&vector);
            let tree = self.solver.solve(&program)?;
            if let Some(schedule) =
                SolutionExtractor::schedule(&tree, &program, problem.dimensions)?
            {
                return Ok(ScheduleOutcome::Found(vector, schedule));
            }
            attempt = match attempt {
                ScheduleAttempt::TryPositive => {
                    debug!("no schedule for {}, trying {}", vector, vector.negated());
                    ScheduleAttempt::TryNegative
                }
                ScheduleAttempt::TryNegative => return Ok(ScheduleOutcome::Infeasible),
            };
        }
    }

    /// Evaluate every admissible vector the enumerator yields, in order
    pub fn explore(&self, enumerator: VectorEnumerator) -> ExploreResult<Vec<ProjectionSolution>> {
        let mut results = Vec::new();
        for candidate in enumerator.admissible() {
            results.push(self.evaluate(&candidate)?);
        }
        info!("evaluated {} projection vectors", results.len());
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::IntMatrix;
    use crate::polyhedron::{Constraint, Polyhedron};

    /// 0 <= i, j <= 1 with unit dependencies along both axes
    fn unit_square() -> Problem {
        let domain = Polyhedron::new(
            2,
            0,
            vec![
                Constraint::inequality(vec![1, 0, 0]),
                Constraint::inequality(vec![-1, 0, 1]),
                Constraint::inequality(vec![0, 1, 0]),
                Constraint::inequality(vec![0, -1, 1]),
            ],
        );
        Problem::new(
            vec![],
            vec![],
            domain,
            Polyhedron::new(0, 0, vec![]),
            IntMatrix::from_rows(vec![vec![1, 0], vec![0, 1]]).unwrap(),
            IntMatrix::from_rows(vec![vec![0, 0], vec![1, 0], vec![0, 1], vec![1, 1]]).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_retry_with_negated_vector() {
        let problem = unit_square();
        let explorer = ProjectionExplorer::new(&problem, ExploreConfig::default());
        let solution = explorer
            .evaluate(&CandidateVector::new(vec![1, 0], 3))
            .unwrap();

        assert_eq!(solution.projection_vector, vec![-1, 0]);
        assert_eq!(solution.schedule, vec![-1, -1]);
        assert_eq!(solution.utilization, 1);
        assert_eq!(solution.latency, 2);
        assert_eq!(solution.instance_bpp, 1);
        assert_eq!(solution.instance_pe_count, 2);
        let links: Vec<i64> = solution.allocation.row(0).iter().map(|v| v.abs()).collect();
        assert_eq!(links, vec![0, 1]);
    }

    #[test]
    fn test_zero_dependency_is_infeasible_for_both_signs() {
        // a dependency of zero can never be delayed by a positive number of stages
        let mut problem = unit_square();
        problem.dependencies = IntMatrix::from_rows(vec![vec![0, 0]]).unwrap();
        let explorer = ProjectionExplorer::new(&problem, ExploreConfig::default());
        let err = explorer
            .evaluate(&CandidateVector::new(vec![0, 1], 3))
            .unwrap_err();
        assert!(matches!(err, ExploreError::Infeasible { .. }));
    }

    #[test]
    fn test_enumerator_mode() {
        let problem = unit_square();
        let half = ProjectionExplorer::new(&problem, ExploreConfig::default());
        assert_eq!(half.enumerator().admissible().count(), 8);
        let full = ProjectionExplorer::new(&problem, ExploreConfig::default().with_full_box(true));
        assert_eq!(full.enumerator().admissible().count(), 16);
    }
}
