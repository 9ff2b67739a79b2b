//! Events broadcast by the queue manager.

use crate::job::{ConversionProgress, Job, JobId};

/// Identifier of one `start`..`stop`/drain cycle.
pub type RunId = u64;

/// Events emitted by the [`QueueManager`](crate::QueueManager).
///
/// Job payloads are copies taken at the moment of the transition.
#[derive(Debug, Clone)]
pub enum QueueEvent {
    /// A job was appended to the pending queue.
    JobQueued { job: Job },
    /// A pending job was removed with `dequeue_last`.
    JobRemoved { job: Job },
    /// The run loop handed a job to the conversion engine.
    JobStarted { run: RunId, job: Job },
    /// Progress update for an in-flight job.
    JobProgress {
        id: JobId,
        progress: ConversionProgress,
    },
    /// A job reached a terminal status and moved to the history.
    JobFinished { run: RunId, job: Job },
    /// A run was started.
    RunStarted { run: RunId },
    /// A run was stopped; `discarded` pending jobs were dropped and
    /// `in_flight` conversions were asked to cancel.
    RunStopped {
        run: RunId,
        discarded: usize,
        in_flight: usize,
    },
    /// A run ended because the queue emptied and nothing is in flight.
    RunDrained { run: RunId },
}

impl QueueEvent {
    /// Job the event refers to, if any.
    pub fn job_id(&self) -> Option<JobId> {
        match self {
            Self::JobQueued { job }
            | Self::JobRemoved { job }
            | Self::JobStarted { job, .. }
            | Self::JobFinished { job, .. } => Some(job.id),
            Self::JobProgress { id, .. } => Some(*id),
            Self::RunStarted { .. } | Self::RunStopped { .. } | Self::RunDrained { .. } => None,
        }
    }

    /// Whether the event ends a run.
    pub fn ends_run(&self) -> bool {
        matches!(self, Self::RunStopped { .. } | Self::RunDrained { .. })
    }
}
