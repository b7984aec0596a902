//! Example: The Unit Square, One Vector at a Time
//!
//! Walks a single candidate through each stage of the pipeline: the
//! throughput program, the schedule search with its sign retry, the
//! allocation and the processor count.
//!
//! Run with: cargo run --example unit_square

use systolic_projection::explorer::ProjectionExplorer;
use systolic_projection::extract::SolutionExtractor;
use systolic_projection::{
    CandidateVector, Constraint, ExploreConfig, IntMatrix, ParametricSolver, PipSolver,
    Polyhedron, Problem, ScheduleIlp, ThroughputIlp,
};

fn main() {
    println!("=== Unit Square Example ===\n");

    // 0 <= i <= 1, 0 <= j <= 1
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
    let problem = Problem::new(
        vec![],
        vec![],
        domain,
        Polyhedron::new(0, 0, vec![]),
        IntMatrix::from_rows(vec![vec![1, 0], vec![0, 1]]).unwrap(),
        IntMatrix::from_rows(vec![vec![0, 0], vec![1, 0], vec![0, 1], vec![1, 1]]).unwrap(),
    )
    .unwrap();

    let u = CandidateVector::new(vec![1, 0], 1);
    let solver = PipSolver::new();

    // Step 1: throughput
    println!("Step 1: throughput program for u = {}", u);
    let program = ThroughputIlp::build(&problem.domain, &problem.context, &u).unwrap();
    println!("{}", program.to_pip_text());
    let tree = solver.solve(&program).unwrap();
    println!("Solution tree:\n{}", tree);
    let throughput = SolutionExtractor::throughput(&tree, &program, 2).unwrap();
    println!("BPP: {} + 1\n", throughput.bpp.format_with_names(&[]));

    // Step 2: schedule, once per sign
    let builder = ScheduleIlp::new(&problem.dependencies, &problem.vertices, 1);
    for v in [u.clone(), u.negated()] {
        let program = builder.build(&v);
        let tree = solver.solve(&program).unwrap();
        match SolutionExtractor::schedule(&tree, &program, 2).unwrap() {
            Some(s) => println!(
                "Step 2: u = {} schedules as {:?} (utilization {}, latency {})",
                v, s.schedule, s.utilization, s.latency
            ),
            None => println!("Step 2: u = {} has no schedule", v),
        }
    }
    println!();

    // Step 3: the whole pipeline
    let explorer = ProjectionExplorer::new(&problem, ExploreConfig::default());
    let solution = explorer.evaluate(&u).unwrap();
    println!("Step 3: full evaluation");
    print!("{}", solution.summary());
    println!("\nCSV: {}", solution);
}
