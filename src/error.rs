//! Error types for Trueno-Track
//!
//! Toyota Way: Clear error messages with actionable guidance (Respect for People)

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Trueno-Track error types
#[derive(Error, Debug)]
pub enum Error {
    /// Resume requested for a run hash the repository does not know
    #[error("Run not found: {0}\nCheck the run hash and the repository location")]
    RunNotFound(String),

    /// Write attempted against a run that was already closed
    #[error("Run {0} is closed\nReopen it by resuming the run hash")]
    RunClosed(String),

    /// Hook needing a run handle was invoked after teardown
    #[error("Tracking callback already torn down; a callback tracks a single run")]
    AdapterClosed,

    /// Metric value that cannot be stored
    #[error("Invalid metric '{name}': {reason}")]
    InvalidMetric {
        /// Metric name
        name: String,
        /// Why the value was rejected
        reason: String,
    },

    /// Run parameter that cannot be stored
    #[error("Invalid run parameter '{key}': {reason}")]
    InvalidParam {
        /// Parameter key
        key: String,
        /// Why the value was rejected
        reason: String,
    },

    /// DDL parsing error
    #[error("SQL parse error: {0}")]
    ParseError(String),

    /// Storage error (Parquet/Arrow/run files)
    #[error("Storage error: {0}")]
    StorageError(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
