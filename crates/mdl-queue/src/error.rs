//! Error types for the queue manager and conversion engines.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type for queue manager operations.
pub type Result<T> = std::result::Result<T, QueueError>;

/// Errors returned synchronously by queue manager operations.
///
/// None of these change manager state: a failed call leaves the queue,
/// the configuration and the run state exactly as they were.
#[derive(Error, Debug)]
pub enum QueueError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("The download queue is empty")]
    EmptyQueue,

    #[error("IO error while {op} '{}': {source}", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Concurrency limiter unavailable: {0}")]
    Concurrency(String),
}

impl QueueError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn io_path(op: &'static str, path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            op,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Errors reported by a [`ConversionEngine`](crate::engine::ConversionEngine) for a single job.
///
/// These never leave the job they belong to: the manager records them on the
/// job (`Failed` + message, or `Cancelled`) and keeps the run going.
#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("Conversion cancelled")]
    Cancelled,

    #[error("Failed to spawn converter: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Converter exited with {}: {detail}", code.map_or_else(|| "signal".to_string(), |c| format!("code {c}")))]
    ExitStatus { code: Option<i32>, detail: String },

    #[error("{0}")]
    Failed(String),

    #[error("Converter panicked: {0}")]
    Panicked(String),
}

impl ConversionError {
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }

    /// Whether this error is the engine acknowledging a cancellation request.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
