//! Error types for the projection explorer

use std::path::PathBuf;
use thiserror::Error;

/// Result type for exploration operations
pub type ExploreResult<T> = Result<T, ExploreError>;

/// Exploration errors
///
/// Every variant is fatal for the run. Schedule infeasibility for a single
/// sign of the projection vector never surfaces here: the explorer retries
/// with the negated vector and only reports `Infeasible` once both fail.
#[derive(Debug, Error)]
pub enum ExploreError {
    /// The ILP encoding and the solver answer disagree
    #[error("Encoding violation: {message}")]
    EncodingViolation { message: String },

    #[error("No schedule exists for projection vector {vector:?} or its negation")]
    Infeasible { vector: Vec<i64> },

    #[error("Input error: {message}")]
    InputError { message: String },

    #[error("Lexer error at line {line}: {message}")]
    LexerError { line: usize, message: String },

    #[error("Parse error: {message}")]
    ParseError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Solver error: {message}")]
    SolverError { message: String },

    #[error("Geometry error: {message}")]
    GeometryError { message: String },
}

impl ExploreError {
    pub fn violation(msg: impl Into<String>) -> Self {
        ExploreError::EncodingViolation { message: msg.into() }
    }

    pub fn input(msg: impl Into<String>) -> Self {
        ExploreError::InputError { message: msg.into() }
    }

    pub fn parse_error(msg: impl Into<String>) -> Self {
        ExploreError::ParseError { message: msg.into() }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        ExploreError::ConfigError { message: msg.into() }
    }

    pub fn solver(msg: impl Into<String>) -> Self {
        ExploreError::SolverError { message: msg.into() }
    }

    pub fn geometry(msg: impl Into<String>) -> Self {
        ExploreError::GeometryError { message: msg.into() }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ExploreError::Io {
            path: path.into(),
            source,
        }
    }
}
