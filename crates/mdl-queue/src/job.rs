//! Job entity and lifecycle status.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ConversionError;

/// Identifier of a job: the sequence number assigned at enqueue time.
///
/// Sequence numbers are never reused within one manager, even after a job is
/// removed from the queue.
pub type JobId = u64;

/// Lifecycle status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobStatus {
    /// Waiting in the pending queue.
    Pending,
    /// Picked up by the run loop and handed to the conversion engine.
    InProgress,
    /// Conversion finished successfully.
    Completed,
    /// The engine observed the run's cancellation signal.
    Cancelled,
    /// Conversion failed; the job carries the error message.
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InProgress => "InProgress",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
            Self::Failed => "Failed",
        }
    }

    /// Terminal statuses never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress of an in-flight conversion, as reported by the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionProgress {
    /// Completion percentage in `[0, 100]`.
    pub percent: u8,
    /// Media time converted so far.
    pub elapsed: Duration,
    /// Total media length, zero while unknown.
    pub total: Duration,
}

impl ConversionProgress {
    /// Build a progress record, deriving the percentage from `elapsed / total`.
    pub fn from_times(elapsed: Duration, total: Duration) -> Self {
        let percent = if total.is_zero() {
            0
        } else {
            (elapsed.as_secs_f64() / total.as_secs_f64() * 100.0).floor() as u64
        };
        Self::new(percent, elapsed, total)
    }

    /// Build a progress record with an explicit percentage, clamped to 100.
    pub fn new(percent: u64, elapsed: Duration, total: Duration) -> Self {
        Self {
            percent: percent.min(100) as u8,
            elapsed,
            total,
        }
    }
}

/// A queued, running or finished conversion request.
///
/// Values handed out by the manager are copies; mutating one has no effect
/// on the manager's state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Job {
    pub id: JobId,
    /// Validated source URI or local path.
    pub source: String,
    /// `<pattern>_<id>`, assigned once at enqueue time.
    pub destination_name: String,
    pub status: JobStatus,
    pub progress: ConversionProgress,
    /// Set only when `status` is `Failed`.
    pub error: Option<String>,
    pub enqueued_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Job {
    /// A new `Pending` job.
    pub fn new(id: JobId, source: String, destination_name: String) -> Self {
        Self {
            id,
            source,
            destination_name,
            status: JobStatus::Pending,
            progress: ConversionProgress::default(),
            error: None,
            enqueued_at: Utc::now(),
            started_at: None,
            finished_at: None,
        }
    }

    pub(crate) fn start(&mut self) {
        self.status = JobStatus::InProgress;
        self.started_at = Some(Utc::now());
    }

    pub(crate) fn finish(&mut self, outcome: JobOutcome) {
        self.finished_at = Some(Utc::now());
        match outcome {
            JobOutcome::Completed => {
                self.status = JobStatus::Completed;
                self.progress.percent = 100;
            }
            JobOutcome::Cancelled => self.status = JobStatus::Cancelled,
            JobOutcome::Failed(message) => {
                self.status = JobStatus::Failed;
                self.error = Some(message);
            }
        }
    }

    /// Wall-clock time spent converting, up to now for a running job.
    pub fn wall_time(&self) -> Option<chrono::Duration> {
        let started = self.started_at?;
        let end = self.finished_at.unwrap_or_else(Utc::now);
        Some(end - started)
    }
}

/// Terminal outcome of one conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Completed,
    Cancelled,
    Failed(String),
}

impl JobOutcome {
    /// Map an engine result to an outcome.
    ///
    /// Any error surfacing after the run was cancelled counts as the engine
    /// unwinding from that cancellation.
    pub fn from_result(result: Result<(), ConversionError>, run_cancelled: bool) -> Self {
        match result {
            Ok(()) => Self::Completed,
            Err(e) if e.is_cancellation() || run_cancelled => Self::Cancelled,
            Err(e) => Self::Failed(e.to_string()),
        }
    }

    pub fn status(&self) -> JobStatus {
        match self {
            Self::Completed => JobStatus::Completed,
            Self::Cancelled => JobStatus::Cancelled,
            Self::Failed(_) => JobStatus::Failed,
        }
    }
}
