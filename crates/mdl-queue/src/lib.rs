//! Download queue manager for HLS (M3U8) streams.
//!
//! Jobs are queued with [`QueueManager::enqueue`], converted by a
//! [`ConversionEngine`] with bounded parallelism once [`QueueManager::start`]
//! is called, and observed through [`QueueManager::snapshot`] or the
//! [`QueueEvent`] stream.

pub mod engine;
pub mod error;
pub mod events;
pub mod job;
pub mod manager;
pub mod naming;
pub mod snapshot;

pub use engine::{
    ConversionEngine, ConversionRequest, FfmpegEngine, FfmpegEngineConfig, ProgressCallback,
};
pub use error::{ConversionError, QueueError, Result};
pub use events::{QueueEvent, RunId};
pub use job::{ConversionProgress, Job, JobId, JobOutcome, JobStatus};
pub use manager::{QueueManager, QueueManagerConfig, StopOutcome};
pub use snapshot::QueueSnapshot;
