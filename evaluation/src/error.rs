//! Evaluation error types
//!
//! Only errors that must stop a batch live in [`EvalError`]. Failures that
//! belong to a single file (conversion, verification, malformed reports) are
//! modelled as values at their own boundary and never abort the run.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for evaluation operations
pub type EvalResult<T> = Result<T, EvalError>;

/// Errors that can occur while driving an evaluation
#[derive(Error, Debug)]
pub enum EvalError {
    /// Generic I/O failure outside a per-file pipeline
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The original source could not be written back after a conversion.
    ///
    /// Always fatal: continuing would risk losing the original file.
    #[error("Failed to restore original source at {path}: {source}")]
    RestorationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The in-flight journal exists but cannot be read or parsed
    #[error("In-flight journal at {path} is unreadable: {message}")]
    Journal { path: PathBuf, message: String },

    /// The persisted score log could not be read or appended
    #[error("Score log {path}: {message}")]
    ScoreLog { path: PathBuf, message: String },

    /// A dataset directory or file is missing expected content
    #[error("Dataset error: {message}")]
    Dataset { message: String },

    /// JSON encoding/decoding failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EvalError {
    /// Wrap an I/O error with the path it concerns
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error leaves the corpus in an unsafe state
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::RestorationFailed { .. } | Self::Journal { .. })
    }
}
