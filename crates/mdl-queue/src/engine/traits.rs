//! Conversion engine trait and related types.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::ConversionError;
use crate::job::{ConversionProgress, JobId};

/// Progress callback handed to an engine for one conversion.
///
/// Cheap to call from the engine's hot loop; it never blocks on readers.
pub type ProgressCallback = Arc<dyn Fn(ConversionProgress) + Send + Sync>;

/// One source-to-destination conversion.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    /// Job the request belongs to, for logging.
    pub job_id: JobId,
    /// Source URI or local path.
    pub source: String,
    /// Full destination file path, extension included.
    pub destination: PathBuf,
}

impl ConversionRequest {
    pub fn new(job_id: JobId, source: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        Self {
            job_id,
            source: source.into(),
            destination: destination.into(),
        }
    }
}

/// Trait for conversion engines.
///
/// Engines must check `cancellation_token` at reasonable intervals and return
/// [`ConversionError::Cancelled`] once they observe it, rather than blocking
/// indefinitely.
#[async_trait]
pub trait ConversionEngine: Send + Sync {
    /// Short engine name for logs.
    fn name(&self) -> &'static str;

    /// File extension (without dot) of the files this engine writes.
    fn output_extension(&self) -> &str;

    /// Run one conversion to completion, cancellation or failure.
    async fn convert(
        &self,
        request: ConversionRequest,
        cancellation_token: CancellationToken,
        on_progress: ProgressCallback,
    ) -> Result<(), ConversionError>;

    /// Check if the engine can run (e.g., binary exists).
    fn is_available(&self) -> bool {
        true
    }

    /// Engine version string, if known.
    fn version(&self) -> Option<String> {
        None
    }
}
