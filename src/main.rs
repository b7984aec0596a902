//! Systolic Array Projection Explorer CLI
//!
//! Usage:
//!   projection-explorer -i matmul.cfg
//!   projection-explorer -i matmul.cfg -m 2 -n 4 -s 2 --pretty
//!   projection-explorer -i matmul.cfg --full-box --json

use std::path::PathBuf;

use clap::Parser as ClapParser;
use colored::Colorize;
use log::{debug, info};

use systolic_projection::{
    explore_problem, ExploreConfig, ExploreResult, Problem, ProblemConfig, ProjectionSolution,
};

#[derive(ClapParser, Debug)]
#[command(name = "projection-explorer")]
#[command(author = "FPGA Team")]
#[command(version = "0.1.0")]
#[command(about = "Explores projection vectors for mapping loop nests onto systolic arrays")]
struct Args {
    /// Polyhedron configuration file
    #[arg(short = 'i', long = "polyhedron", value_name = "FILE")]
    polyhedron: PathBuf,

    /// Bound on the magnitude of a projection vector
    #[arg(short = 'm', long = "magnitude-bound", default_value_t = 3)]
    magnitude_bound: i64,

    /// Largest processor utilization to report (1-100)
    #[arg(
        short = 'n',
        long = "pe-inefficiency",
        default_value_t = 100,
        value_parser = clap::value_parser!(i64).range(1..=100)
    )]
    pe_inefficiency: i64,

    /// Minimum pipeline stages per dependency (1-100)
    #[arg(
        short = 's',
        long = "pe-pipeline-stages",
        default_value_t = 1,
        value_parser = clap::value_parser!(i64).range(1..=100)
    )]
    pipeline_stages: i64,

    /// Enumerate the whole box instead of one sign per direction
    #[arg(long = "full-box")]
    full_box: bool,

    /// Output as JSON
    #[arg(short = 'j', long = "json")]
    json_output: bool,

    /// Colored multi-line summaries instead of CSV lines
    #[arg(long = "pretty")]
    pretty: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,
}

fn main() {
    let args = Args::parse();

    let log_level = if args.quiet {
        log::LevelFilter::Error
    } else {
        match args.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    };
    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();

    let solutions = run(&args).unwrap_or_else(|e| {
        eprintln!("{}: {}", "Error".red(), e);
        std::process::exit(1);
    });

    if args.json_output {
        match serde_json::to_string_pretty(&solutions) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("{}: Failed to serialize to JSON: {}", "Error".red(), e);
                std::process::exit(1);
            }
        }
    } else if args.pretty {
        print_summaries(&solutions);
    } else {
        for solution in &solutions {
            println!("{}", solution);
        }
    }
}

fn run(args: &Args) -> ExploreResult<Vec<ProjectionSolution>> {
    let config = ExploreConfig::new(args.magnitude_bound, args.pe_inefficiency, args.pipeline_stages)?
        .with_full_box(args.full_box);
    debug!("Exploration config: {:?}", config);

    let problem_config = ProblemConfig::from_file(&args.polyhedron)?;
    let problem = Problem::load(&problem_config)?;
    info!(
        "Loaded {}-dimensional problem with parameters {:?}",
        problem.dimensions, problem.parameter_names
    );

    let threshold = config.pe_inefficiency;
    let ranked = explore_problem(&problem, config)?;
    info!("{} solutions within utilization {}", ranked.len(), threshold);
    Ok(ranked)
}

fn print_summaries(solutions: &[ProjectionSolution]) {
    println!("{}", "Projection Exploration Results".bold().green());
    println!("{}", "=".repeat(50));
    println!();

    if solutions.is_empty() {
        println!("(no projection vector within the utilization bound)");
        return;
    }
    for (rank, solution) in solutions.iter().enumerate() {
        println!("{} {}", "Rank".bold(), (rank + 1).to_string().bold());
        print!("{}", solution.summary());
        println!();
    }
}
