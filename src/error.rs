use std::io;
use thiserror::Error;

/// Errors that abort a comparison run.
#[derive(Debug, Error)]
pub enum BenchError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read table '{path}': {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("Table '{path}' is missing required column '{column}'")]
    MissingColumn { path: String, column: String },

    #[error(
        "Truth breakpoints '{first}' and '{second}' collapse onto the same key '{key}'; the truth set is corrupt"
    )]
    DuplicateTruthBreakpoint {
        key: String,
        first: String,
        second: String,
    },

    #[error("Prediction table holds {count} sample labels ({labels}), expected exactly one")]
    MultipleSamples { count: usize, labels: String },

    #[error("Invalid read-support thresholds: lower ({lower}) is not below upper ({upper})")]
    InvalidThresholds { lower: f64, upper: f64 },
}

pub type Result<T> = std::result::Result<T, BenchError>;

impl From<BenchError> for io::Error {
    fn from(err: BenchError) -> Self {
        match err {
            BenchError::Io(e) => e,
            other => io::Error::new(io::ErrorKind::InvalidData, other.to_string()),
        }
    }
}
