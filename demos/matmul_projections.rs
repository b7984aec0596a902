//! Example: Projections of Matrix Multiplication
//!
//! Explores every primitive projection vector of the N x N x N
//! matrix-multiplication cube and prints the ranked mappings.
//!
//! Run with: cargo run --example matmul_projections [magnitude-bound]

use std::path::Path;

use systolic_projection::{explore_file, ExploreConfig};

fn main() {
    println!("=== Matrix Multiplication Projections ===\n");

    let bound = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(1);
    let config = ExploreConfig::new(bound, 100, 1).unwrap();

    let cfg = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/data/matmul.cfg");
    println!("Problem: {}", cfg.display());
    println!("Magnitude bound: {}\n", bound);

    match explore_file(&cfg, config) {
        Ok(solutions) => {
            println!("{} mapping(s), best first (N = 8):\n", solutions.len());
            for (rank, solution) in solutions.iter().enumerate() {
                println!("#{}", rank + 1);
                print!("{}", solution.summary());
                println!();
            }

            println!("As CSV:");
            for solution in &solutions {
                println!("{}", solution);
            }
        }
        Err(e) => eprintln!("Exploration failed: {}", e),
    }
}
