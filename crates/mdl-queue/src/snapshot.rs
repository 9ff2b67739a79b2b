//! Point-in-time view of the queue manager.

use std::path::PathBuf;

use serde::Serialize;

use crate::events::RunId;
use crate::job::{Job, JobId, JobStatus};

/// Copy of the manager's partitions and configuration.
///
/// The three job lists are disjoint and were captured together, so a job
/// appears in exactly one of them.
#[derive(Debug, Clone, Serialize)]
pub struct QueueSnapshot {
    /// Active run, if any.
    pub run: Option<RunId>,
    pub output_dir: Option<PathBuf>,
    pub naming_pattern: Option<String>,
    pub max_concurrency: usize,
    /// Pending jobs in queue order.
    pub pending: Vec<Job>,
    /// In-flight jobs with their latest progress.
    pub in_progress: Vec<Job>,
    /// Finished jobs in completion order.
    pub history: Vec<Job>,
}

impl QueueSnapshot {
    pub fn is_running(&self) -> bool {
        self.run.is_some()
    }

    /// Total number of jobs known to the manager.
    pub fn total(&self) -> usize {
        self.pending.len() + self.in_progress.len() + self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Number of finished jobs with the given status.
    pub fn count_finished(&self, status: JobStatus) -> usize {
        self.history.iter().filter(|job| job.status == status).count()
    }

    /// Find a job in any partition.
    pub fn find(&self, id: JobId) -> Option<&Job> {
        self.pending
            .iter()
            .chain(&self.in_progress)
            .chain(&self.history)
            .find(|job| job.id == id)
    }

    /// Find a job by destination name in any partition.
    pub fn find_by_name(&self, destination_name: &str) -> Option<&Job> {
        self.pending
            .iter()
            .chain(&self.in_progress)
            .chain(&self.history)
            .find(|job| job.destination_name == destination_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::JobOutcome;

    fn job(id: JobId) -> Job {
        Job::new(id, format!("https://example.com/{id}.m3u8"), format!("clip_{id}"))
    }

    fn sample() -> QueueSnapshot {
        let mut running = job(2);
        running.start();
        let mut done = job(1);
        done.start();
        done.finish(JobOutcome::Completed);
        let mut failed = job(0);
        failed.start();
        failed.finish(JobOutcome::Failed("boom".into()));

        QueueSnapshot {
            run: Some(1),
            output_dir: Some(PathBuf::from("/tmp/out")),
            naming_pattern: Some("clip".into()),
            max_concurrency: 2,
            pending: vec![job(3), job(4)],
            in_progress: vec![running],
            history: vec![failed, done],
        }
    }

    #[test]
    fn test_counts() {
        let snapshot = sample();
        assert!(snapshot.is_running());
        assert_eq!(snapshot.total(), 5);
        assert!(!snapshot.is_empty());
        assert_eq!(snapshot.count_finished(JobStatus::Completed), 1);
        assert_eq!(snapshot.count_finished(JobStatus::Failed), 1);
        assert_eq!(snapshot.count_finished(JobStatus::Cancelled), 0);
    }

    #[test]
    fn test_find_searches_all_partitions() {
        let snapshot = sample();
        assert_eq!(snapshot.find(4).unwrap().status, JobStatus::Pending);
        assert_eq!(snapshot.find(2).unwrap().status, JobStatus::InProgress);
        assert_eq!(
            snapshot.find_by_name("clip_0").unwrap().error.as_deref(),
            Some("boom")
        );
        assert!(snapshot.find(99).is_none());
    }
}
