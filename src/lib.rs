//! Systolic Array Projection Explorer
//!
//! This library explores projection vectors for mapping a parametric loop
//! nest onto a systolic array. Each candidate vector is scored by its block
//! pipelining period, a linear schedule, the resulting processor count and
//! the interconnection it needs; the explored set is then ranked.
//!
//! # Example
//!
//! ```rust
//! use systolic_projection::{
//!     explore_problem, parse_matrices, ExploreConfig, Polyhedron, Problem,
//! };
//!
//! // 0 <= i <= 1, 0 <= j <= 1 with unit dependencies along both axes
//! let matrices = parse_matrices(
//!     "4 4\n1 1 0 0\n1 -1 0 1\n1 0 1 0\n1 0 -1 1\n\
//!      0 2\n\
//!      2 2\n1 0\n0 1\n\
//!      4 2\n0 0\n1 0\n0 1\n1 1\n",
//!     4,
//! )
//! .unwrap();
//! let domain = Polyhedron::from_pip_matrix(&matrices[0], 2, 0).unwrap();
//! let context = Polyhedron::from_pip_matrix(&matrices[1], 0, 0).unwrap();
//! let problem = Problem::new(
//!     vec![],
//!     vec![],
//!     domain,
//!     context,
//!     matrices[2].clone(),
//!     matrices[3].clone(),
//! )
//! .unwrap();
//!
//! let config = ExploreConfig::new(1, 100, 1).unwrap();
//! let ranked = explore_problem(&problem, config).unwrap();
//! for solution in &ranked {
//!     println!("{}", solution);
//! }
//! ```

pub mod affine;
pub mod config;
pub mod counting;
pub mod enumerator;
pub mod error;
pub mod explorer;
pub mod extract;
pub mod geometry;
pub mod ilp;
pub mod lexer;
pub mod matrix;
pub mod parser;
pub mod pip;
pub mod polyhedron;
pub mod problem;
pub mod ranking;
pub mod solution;

pub use affine::AffineForm;
pub use config::{ExploreConfig, ProblemConfig};
pub use counting::{EnumerativeCounter, ParametricCount, PeCount, PointCounter};
pub use enumerator::{CandidateVector, VectorEnumerator};
pub use error::{ExploreError, ExploreResult};
pub use explorer::ProjectionExplorer;
pub use geometry::{ExactGeometry, GeometryService};
pub use ilp::{ParametricProgram, ScheduleIlp, ThroughputIlp};
pub use matrix::IntMatrix;
pub use parser::parse_matrices;
pub use pip::{ParametricSolver, PipSolver, SolutionTree};
pub use polyhedron::{Constraint, ConstraintKind, Polyhedron};
pub use problem::Problem;
pub use solution::ProjectionSolution;

/// Explore every admissible vector of a problem and rank the results
pub fn explore_problem(
    problem: &Problem,
    config: ExploreConfig,
) -> ExploreResult<Vec<ProjectionSolution>> {
    config.validate()?;
    let threshold = config.pe_inefficiency;
    let explorer = ProjectionExplorer::new(problem, config);
    let results = explorer.explore(explorer.enumerator())?;
    Ok(ranking::rank(results, threshold))
}

/// Load a problem from its configuration file and explore it
pub fn explore_file(
    path: impl AsRef<std::path::Path>,
    config: ExploreConfig,
) -> ExploreResult<Vec<ProjectionSolution>> {
    let problem = Problem::load(&ProblemConfig::from_file(path)?)?;
    explore_problem(&problem, config)
}
