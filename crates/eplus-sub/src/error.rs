//! Error types for IDF substitution and simulation runs

use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

use crate::request::FieldKey;

/// Core error type for substitution and simulation operations
#[derive(Error, Debug)]
pub enum SubError {
    /// Sequence-valued entries of a batch disagree in length
    #[error("Inconsistent batch size for {key}: expected {expected}, got {found}")]
    InconsistentBatchSize {
        key: FieldKey,
        expected: usize,
        found: usize,
    },

    /// A value that cannot be substituted as a single scalar
    #[error("Invalid scalar value for {key}: {reason}")]
    InvalidScalarValue { key: String, reason: String },

    /// IO error tied to a path
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The simulation binary could not be started
    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The simulation binary exited unsuccessfully
    #[error("Simulation failed with {status}")]
    SimulationFailed { status: ExitStatus },

    /// The simulation did not produce its result file
    #[error("Simulation result not found: {}", path.display())]
    ResultMissing { path: PathBuf },

    /// Malformed CSV
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Missing or non-numeric table column
    #[error("Column error: {0}")]
    Column(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unparseable request or config document
    #[error("Parse error: {0}")]
    Parse(String),

    /// Substitution pattern failed to compile
    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),
}

impl SubError {
    /// Wrap an IO error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for substitution operations
pub type Result<T> = std::result::Result<T, SubError>;
