//! Exploration options and the polyhedron configuration file
//!
//! A problem configuration file names the loop nest's shape and points at
//! the matrix files, e.g.
//!
//! ```text
//! dimensions = 3
//! parameters = 1
//! parameternames = N
//! parameterinstantiations = 64
//! pipconstraints = matmul.pip
//! dependencies = matmul.dep
//! vertices = matmul.vert
//! ```
//!
//! Matrix paths are relative to the configuration file's directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ExploreError, ExploreResult};
use crate::parser::{ConfigEntry, Parser};

/// Options controlling one exploration run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExploreConfig {
    /// Bound M on the Euclidean norm of a candidate vector
    pub magnitude_bound: i64,
    /// Largest utilization (λ·u) a reported solution may have
    pub pe_inefficiency: i64,
    /// Minimum delay S every dependency must incur under the schedule
    pub pipeline_stages: i64,
    /// Enumerate the whole box instead of the half starting at (0,…,0,1)
    pub full_box: bool,
}

impl ExploreConfig {
    pub fn new(
        magnitude_bound: i64,
        pe_inefficiency: i64,
        pipeline_stages: i64,
    ) -> ExploreResult<Self> {
        let config = Self {
            magnitude_bound,
            pe_inefficiency,
            pipeline_stages,
            full_box: false,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_full_box(mut self, full_box: bool) -> Self {
        self.full_box = full_box;
        self
    }

    /// Check the ranges accepted on the command line
    pub fn validate(&self) -> ExploreResult<()> {
        if self.magnitude_bound < 1 {
            return Err(ExploreError::config(format!(
                "Magnitude bound must be at least 1, got {}",
                self.magnitude_bound
            )));
        }
        if !(1..=100).contains(&self.pe_inefficiency) {
            return Err(ExploreError::config(format!(
                "Processor inefficiency must be between 1 and 100, got {}",
                self.pe_inefficiency
            )));
        }
        if !(1..=100).contains(&self.pipeline_stages) {
            return Err(ExploreError::config(format!(
                "Processor pipeline stages must be between 1 and 100, got {}",
                self.pipeline_stages
            )));
        }
        Ok(())
    }
}

impl Default for ExploreConfig {
    fn default() -> Self {
        Self {
            magnitude_bound: 3,
            pe_inefficiency: 100,
            pipeline_stages: 1,
            full_box: false,
        }
    }
}

/// Contents of a polyhedron configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemConfig {
    pub dimensions: usize,
    pub parameters: usize,
    pub parameter_names: Vec<String>,
    pub parameter_instantiations: Vec<i64>,
    /// Domain and context matrices in PIP format
    pub constraints_path: PathBuf,
    pub dependencies_path: PathBuf,
    pub vertices_path: PathBuf,
}

impl ProblemConfig {
    /// Read and parse a configuration file
    pub fn from_file(path: impl AsRef<Path>) -> ExploreResult<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|e| ExploreError::io(path, e))?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Self::parse(&source, base)
    }

    /// Parse configuration text; matrix paths are joined onto `base_dir`
    pub fn parse(source: &str, base_dir: &Path) -> ExploreResult<Self> {
        let entries = Parser::new(source).parse_entries()?;

        let mut dimensions = None;
        let mut parameters = None;
        let mut parameter_names = None;
        let mut parameter_instantiations = None;
        let mut constraints_path = None;
        let mut dependencies_path = None;
        let mut vertices_path = None;

        for entry in &entries {
            match entry.key.as_str() {
                "dimensions" => dimensions = Some(single_count(entry)?),
                "parameters" => parameters = Some(single_count(entry)?),
                "parameternames" => parameter_names = Some(entry.values.clone()),
                "parameterinstantiations" => {
                    let values = entry
                        .values
                        .iter()
                        .map(|v| parse_int(entry, v))
                        .collect::<ExploreResult<Vec<_>>>()?;
                    parameter_instantiations = Some(values);
                }
                "pipconstraints" => constraints_path = Some(single_path(entry, base_dir)?),
                "dependencies" => dependencies_path = Some(single_path(entry, base_dir)?),
                "vertices" => vertices_path = Some(single_path(entry, base_dir)?),
                other => {
                    return Err(ExploreError::config(format!(
                        "Unknown option '{}' at line {}",
                        other, entry.line
                    )))
                }
            }
        }

        let dimensions =
            dimensions.ok_or_else(|| ExploreError::config("Must specify dimensions of polyhedron"))?;
        let parameters =
            parameters.ok_or_else(|| ExploreError::config("Must specify parameters of polyhedron"))?;
        // A problem without parameters may leave both lists out.
        let parameter_names = match parameter_names {
            Some(names) => names,
            None if parameters == 0 => Vec::new(),
            None => {
                return Err(ExploreError::config(
                    "Must specify parameter names for polyhedron",
                ))
            }
        };
        let parameter_instantiations = match parameter_instantiations {
            Some(values) => values,
            None if parameters == 0 => Vec::new(),
            None => {
                return Err(ExploreError::config(
                    "Must specify parameter instantiations for polyhedron",
                ))
            }
        };

        if parameter_names.len() != parameters {
            return Err(ExploreError::config(
                "Number of parameters do not match number of parameter names",
            ));
        }
        if parameter_instantiations.len() != parameters {
            return Err(ExploreError::config(
                "Number of parameters do not match number of parameter instantiations",
            ));
        }

        Ok(Self {
            dimensions,
            parameters,
            parameter_names,
            parameter_instantiations,
            constraints_path: constraints_path
                .ok_or_else(|| ExploreError::config("Must specify pip constraints of polyhedron"))?,
            dependencies_path: dependencies_path
                .ok_or_else(|| ExploreError::config("Must specify dependencies of polyhedron"))?,
            vertices_path: vertices_path
                .ok_or_else(|| ExploreError::config("Must specify vertices of polyhedron"))?,
        })
    }
}

fn parse_int(entry: &ConfigEntry, value: &str) -> ExploreResult<i64> {
    value.parse::<i64>().map_err(|_| {
        ExploreError::config(format!(
            "Option '{}' at line {} expects integers, got '{}'",
            entry.key, entry.line, value
        ))
    })
}

fn single_value<'a>(entry: &'a ConfigEntry) -> ExploreResult<&'a str> {
    match entry.values.as_slice() {
        [value] => Ok(value.as_str()),
        _ => Err(ExploreError::config(format!(
            "Option '{}' at line {} expects exactly one value",
            entry.key, entry.line
        ))),
    }
}

fn single_count(entry: &ConfigEntry) -> ExploreResult<usize> {
    let value = parse_int(entry, single_value(entry)?)?;
    usize::try_from(value).map_err(|_| {
        ExploreError::config(format!(
            "Option '{}' at line {} must be non-negative",
            entry.key, entry.line
        ))
    })
}

fn single_path(entry: &ConfigEntry, base_dir: &Path) -> ExploreResult<PathBuf> {
    Ok(base_dir.join(single_value(entry)?))
}
