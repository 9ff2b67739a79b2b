//! Download queue manager.
//!
//! The manager owns three disjoint partitions of jobs (pending queue,
//! in-progress set, finished history) behind one short-held mutex. `start`
//! spawns a run loop that drains the pending queue with at most
//! `max_concurrency` conversions in flight, each on its own task holding a
//! semaphore permit. Progress of in-flight jobs flows through a per-job
//! `watch` channel so the conversion task never contends with status readers.

use std::any::Any;
use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::FutureExt;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::sync::{Notify, OwnedSemaphorePermit, Semaphore, broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::engine::{ConversionEngine, ConversionRequest, ProgressCallback};
use crate::error::{ConversionError, QueueError, Result};
use crate::events::{QueueEvent, RunId};
use crate::job::{ConversionProgress, Job, JobId, JobOutcome, JobStatus};
use crate::naming::{destination_name, sanitize_pattern, validate_source};
use crate::snapshot::QueueSnapshot;

/// Configuration for the queue manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueManagerConfig {
    /// Maximum number of conversions in flight at once.
    pub max_concurrency: usize,
    /// Capacity of the event broadcast channel.
    pub event_capacity: usize,
}

impl Default for QueueManagerConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            event_capacity: 256,
        }
    }
}

impl QueueManagerConfig {
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.max_concurrency == 0 {
            return Err(QueueError::invalid_argument(
                "max_concurrency must be at least 1",
            ));
        }
        if self.max_concurrency > Semaphore::MAX_PERMITS {
            return Err(QueueError::invalid_argument(format!(
                "max_concurrency must not exceed {}",
                Semaphore::MAX_PERMITS
            )));
        }
        if self.event_capacity == 0 {
            return Err(QueueError::invalid_argument(
                "event_capacity must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Result of a successful [`QueueManager::stop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopOutcome {
    pub run: RunId,
    /// Pending jobs dropped from the queue.
    pub discarded: usize,
    /// Conversions that were signalled and are still unwinding.
    pub in_flight: usize,
}

enum RunState {
    Idle,
    Running {
        run: RunId,
        token: CancellationToken,
    },
}

/// In-progress entry; the job copy keeps its start-time fields, the
/// receiver carries live progress.
struct ActiveJob {
    job: Job,
    progress: watch::Receiver<ConversionProgress>,
}

struct QueueState {
    run: RunState,
    last_run: RunId,
    output_dir: Option<PathBuf>,
    naming_pattern: Option<String>,
    next_sequence: JobId,
    pending: VecDeque<Job>,
    in_progress: Vec<ActiveJob>,
    history: Vec<Job>,
}

impl QueueState {
    fn new() -> Self {
        Self {
            run: RunState::Idle,
            last_run: 0,
            output_dir: None,
            naming_pattern: None,
            next_sequence: 1,
            pending: VecDeque::new(),
            in_progress: Vec::new(),
            history: Vec::new(),
        }
    }

    fn current_run(&self) -> Option<RunId> {
        match &self.run {
            RunState::Running { run, .. } => Some(*run),
            RunState::Idle => None,
        }
    }

    fn is_current(&self, run: RunId) -> bool {
        self.current_run() == Some(run)
    }

    fn is_idle(&self) -> bool {
        matches!(self.run, RunState::Idle) && self.in_progress.is_empty()
    }

    fn ensure_not_running(&self, action: &str) -> Result<()> {
        match self.current_run() {
            Some(run) => Err(QueueError::invalid_state(format!(
                "cannot {action} while run {run} is active"
            ))),
            None => Ok(()),
        }
    }
}

enum NextStep {
    Dispatch {
        job: Job,
        progress_tx: watch::Sender<ConversionProgress>,
    },
    /// Queue empty but conversions still in flight.
    Wait,
    /// Queue empty and nothing in flight; the run is over.
    Drained,
    /// The run was stopped or superseded.
    Stale,
}

struct Inner {
    config: QueueManagerConfig,
    engine: Arc<dyn ConversionEngine>,
    /// Shared by all runs so jobs unwinding from a stopped run still count.
    semaphore: Arc<Semaphore>,
    state: Mutex<QueueState>,
    /// Wakes a waiting run loop on enqueue or job completion.
    wake: Notify,
    idle_tx: watch::Sender<bool>,
    event_tx: broadcast::Sender<QueueEvent>,
}

impl Inner {
    fn emit(&self, event: QueueEvent) {
        let _ = self.event_tx.send(event);
    }

    fn sync_idle(&self, state: &QueueState) {
        let idle = state.is_idle();
        self.idle_tx.send_if_modified(|current| {
            let changed = *current != idle;
            *current = idle;
            changed
        });
    }

    fn destination_path(&self, output_dir: &Path, job: &Job) -> PathBuf {
        let extension = self.engine.output_extension();
        if extension.is_empty() {
            output_dir.join(&job.destination_name)
        } else {
            output_dir.join(format!("{}.{}", job.destination_name, extension))
        }
    }

    async fn run_loop(
        self: Arc<Self>,
        handle: Handle,
        run: RunId,
        token: CancellationToken,
        output_dir: PathBuf,
    ) {
        debug!(run, "Run loop started");

        loop {
            let permit = tokio::select! {
                biased;
                _ = token.cancelled() => break,
                permit = Arc::clone(&self.semaphore).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => {
                        error!(run, "Concurrency limiter closed, abandoning run");
                        self.abandon_run(run);
                        break;
                    }
                },
            };

            match self.next_step(run, &token) {
                NextStep::Dispatch { job, progress_tx } => {
                    self.spawn_job(&handle, run, &job, &output_dir, &token, progress_tx, permit);
                }
                NextStep::Wait => {
                    drop(permit);
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => break,
                        _ = self.wake.notified() => {}
                    }
                }
                NextStep::Drained | NextStep::Stale => break,
            }
        }

        debug!(run, "Run loop exited");
    }

    /// Pop the queue head straight into the in-progress set.
    fn next_step(&self, run: RunId, token: &CancellationToken) -> NextStep {
        let mut state = self.state.lock();
        if token.is_cancelled() || !state.is_current(run) {
            return NextStep::Stale;
        }

        match self.take_next(&mut state, run) {
            Some((job, progress_tx)) => NextStep::Dispatch { job, progress_tx },
            None if state.in_progress.is_empty() => {
                state.run = RunState::Idle;
                self.sync_idle(&state);
                info!(run, "Queue drained, run finished");
                self.emit(QueueEvent::RunDrained { run });
                NextStep::Drained
            }
            None => NextStep::Wait,
        }
    }

    /// Move the queue head into the in-progress set. Caller holds the state lock.
    fn take_next(
        &self,
        state: &mut QueueState,
        run: RunId,
    ) -> Option<(Job, watch::Sender<ConversionProgress>)> {
        let mut job = state.pending.pop_front()?;
        job.start();
        let (progress_tx, progress_rx) = watch::channel(ConversionProgress::default());
        state.in_progress.push(ActiveJob {
            job: job.clone(),
            progress: progress_rx,
        });
        info!(run, job = job.id, source = %job.source, "Job started");
        self.emit(QueueEvent::JobStarted {
            run,
            job: job.clone(),
        });
        Some((job, progress_tx))
    }

    #[allow(clippy::too_many_arguments)]
    fn spawn_job(
        self: &Arc<Self>,
        handle: &Handle,
        run: RunId,
        job: &Job,
        output_dir: &Path,
        token: &CancellationToken,
        progress_tx: watch::Sender<ConversionProgress>,
        permit: OwnedSemaphorePermit,
    ) {
        let request = ConversionRequest::new(
            job.id,
            job.source.clone(),
            self.destination_path(output_dir, job),
        );
        handle.spawn(Arc::clone(self).run_job(run, request, token.clone(), progress_tx, permit));
    }

    fn abandon_run(&self, run: RunId) {
        let mut state = self.state.lock();
        if !state.is_current(run) {
            return;
        }
        if let RunState::Running { token, .. } = &state.run {
            token.cancel();
        }
        state.run = RunState::Idle;
        self.sync_idle(&state);
        self.emit(QueueEvent::RunStopped {
            run,
            discarded: 0,
            in_flight: state.in_progress.len(),
        });
    }

    async fn run_job(
        self: Arc<Self>,
        run: RunId,
        request: ConversionRequest,
        token: CancellationToken,
        progress_tx: watch::Sender<ConversionProgress>,
        _permit: OwnedSemaphorePermit,
    ) {
        let id = request.job_id;
        let on_progress = self.progress_sink(id, progress_tx);

        let result = AssertUnwindSafe(self.engine.convert(request, token.clone(), on_progress))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| {
                Err(ConversionError::Panicked(panic_message(payload.as_ref())))
            });

        let outcome = JobOutcome::from_result(result, token.is_cancelled());
        self.finish_job(run, id, outcome);
    }

    fn progress_sink(&self, id: JobId, tx: watch::Sender<ConversionProgress>) -> ProgressCallback {
        let events = self.event_tx.clone();
        Arc::new(move |progress: ConversionProgress| {
            let progress = ConversionProgress {
                percent: progress.percent.min(100),
                ..progress
            };
            tx.send_replace(progress);
            let _ = events.send(QueueEvent::JobProgress { id, progress });
        })
    }

    /// Move a job from the in-progress set into the history.
    fn finish_job(&self, run: RunId, id: JobId, outcome: JobOutcome) {
        let job = {
            let mut state = self.state.lock();
            let Some(index) = state.in_progress.iter().position(|a| a.job.id == id) else {
                warn!(run, job = id, "Finished job is not in the in-progress set");
                return;
            };
            let ActiveJob { mut job, progress } = state.in_progress.remove(index);
            job.progress = *progress.borrow();
            job.finish(outcome);
            state.history.push(job.clone());
            self.sync_idle(&state);
            self.emit(QueueEvent::JobFinished {
                run,
                job: job.clone(),
            });
            job
        };

        match job.status {
            JobStatus::Failed => warn!(
                run,
                job = job.id,
                error = job.error.as_deref().unwrap_or_default(),
                "Job failed"
            ),
            status => info!(run, job = job.id, %status, "Job finished"),
        }

        self.wake.notify_one();
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Owns the download queue and runs conversions with bounded parallelism.
///
/// Cheap to clone; clones share the same queue.
#[derive(Clone)]
pub struct QueueManager {
    inner: Arc<Inner>,
}

impl QueueManager {
    /// Create a manager around a conversion engine.
    pub fn new(config: QueueManagerConfig, engine: Arc<dyn ConversionEngine>) -> Result<Self> {
        config.validate()?;

        let (event_tx, _) = broadcast::channel(config.event_capacity);
        let (idle_tx, _) = watch::channel(true);

        Ok(Self {
            inner: Arc::new(Inner {
                semaphore: Arc::new(Semaphore::new(config.max_concurrency)),
                config,
                engine,
                state: Mutex::new(QueueState::new()),
                wake: Notify::new(),
                idle_tx,
                event_tx,
            }),
        })
    }

    pub fn config(&self) -> &QueueManagerConfig {
        &self.inner.config
    }

    pub fn engine(&self) -> &Arc<dyn ConversionEngine> {
        &self.inner.engine
    }

    /// Subscribe to queue events.
    pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
        self.inner.event_tx.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.inner.state.lock().current_run().is_some()
    }

    pub fn output_dir(&self) -> Option<PathBuf> {
        self.inner.state.lock().output_dir.clone()
    }

    pub fn naming_pattern(&self) -> Option<String> {
        self.inner.state.lock().naming_pattern.clone()
    }

    /// Set the directory converted files are written to, creating it if needed.
    pub fn set_output_directory(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(QueueError::invalid_argument(
                "output directory must not be empty",
            ));
        }

        self.inner
            .state
            .lock()
            .ensure_not_running("change the output directory")?;

        std::fs::create_dir_all(path)
            .map_err(|e| QueueError::io_path("creating output directory", path, e))?;

        let mut state = self.inner.state.lock();
        // a run may have started while the directory was being created
        state.ensure_not_running("change the output directory")?;
        state.output_dir = Some(path.to_path_buf());
        info!(path = %path.display(), "Output directory set");
        Ok(())
    }

    /// Set the naming pattern for jobs enqueued from now on.
    ///
    /// Returns the sanitised pattern that was stored.
    pub fn set_naming_pattern(&self, pattern: &str) -> Result<String> {
        let pattern = sanitize_pattern(pattern)?;

        let mut state = self.inner.state.lock();
        state.ensure_not_running("change the naming pattern")?;
        state.naming_pattern = Some(pattern.clone());
        info!(%pattern, "Naming pattern set");
        Ok(pattern)
    }

    /// Append a job for `source` to the tail of the pending queue.
    pub fn enqueue(&self, source: &str) -> Result<Job> {
        let source = validate_source(source)?;

        let (job, running) = {
            let mut state = self.inner.state.lock();
            let Some(pattern) = state.naming_pattern.as_deref() else {
                return Err(QueueError::invalid_state(
                    "set a naming pattern before adding jobs",
                ));
            };
            let id = state.next_sequence;
            let job = Job::new(id, source, destination_name(pattern, id));
            state.next_sequence += 1;
            state.pending.push_back(job.clone());
            self.inner.emit(QueueEvent::JobQueued { job: job.clone() });
            (job, state.current_run().is_some())
        };

        info!(job = job.id, source = %job.source, name = %job.destination_name, "Job queued");
        if running {
            self.inner.wake.notify_one();
        }
        Ok(job)
    }

    /// Remove the most recently enqueued job that has not started yet.
    pub fn dequeue_last(&self) -> Result<Job> {
        let mut state = self.inner.state.lock();
        let job = state.pending.pop_back().ok_or(QueueError::EmptyQueue)?;
        self.inner.emit(QueueEvent::JobRemoved { job: job.clone() });
        info!(job = job.id, name = %job.destination_name, "Job removed");
        Ok(job)
    }

    /// Start processing the pending queue in the background.
    ///
    /// Up to `max_concurrency` jobs are `InProgress` when this returns; the
    /// rest are picked up by the run loop. Must be called from within a tokio
    /// runtime.
    pub fn start(&self) -> Result<RunId> {
        let handle = Handle::try_current()
            .map_err(|_| QueueError::invalid_state("start requires a running tokio runtime"))?;

        let mut state = self.inner.state.lock();
        if let Some(run) = state.current_run() {
            return Err(QueueError::invalid_state(format!(
                "run {run} is already active"
            )));
        }
        let Some(output_dir) = state.output_dir.clone() else {
            return Err(QueueError::invalid_state("output directory is not set"));
        };
        if state.naming_pattern.is_none() {
            return Err(QueueError::invalid_state("naming pattern is not set"));
        }
        if state.pending.is_empty() {
            return Err(QueueError::EmptyQueue);
        }
        if self.inner.semaphore.is_closed() {
            return Err(QueueError::Concurrency(
                "concurrency limiter is closed".to_string(),
            ));
        }

        state.last_run += 1;
        let run = state.last_run;
        let token = CancellationToken::new();
        state.run = RunState::Running {
            run,
            token: token.clone(),
        };
        self.inner.sync_idle(&state);
        self.inner.emit(QueueEvent::RunStarted { run });
        let pending = state.pending.len();

        // the first jobs are in flight before start returns, so an
        // immediate stop cancels them instead of discarding them
        let mut dispatched = 0;
        while !state.pending.is_empty() {
            let Ok(permit) = Arc::clone(&self.inner.semaphore).try_acquire_owned() else {
                break;
            };
            let Some((job, progress_tx)) = self.inner.take_next(&mut state, run) else {
                break;
            };
            self.inner
                .spawn_job(&handle, run, &job, &output_dir, &token, progress_tx, permit);
            dispatched += 1;
        }
        drop(state);

        info!(
            run,
            pending,
            dispatched,
            max_concurrency = self.inner.config.max_concurrency,
            "Run started"
        );
        handle.spawn(Arc::clone(&self.inner).run_loop(handle.clone(), run, token, output_dir));
        Ok(run)
    }

    /// Stop the active run.
    ///
    /// Pending jobs are discarded, in-flight conversions are signalled and
    /// finish in the background. Returns without waiting for them.
    pub fn stop(&self) -> Result<StopOutcome> {
        let mut state = self.inner.state.lock();
        let RunState::Running { run, token } = std::mem::replace(&mut state.run, RunState::Idle)
        else {
            return Err(QueueError::invalid_state("no run is active"));
        };

        token.cancel();
        let discarded = state.pending.len();
        state.pending.clear();
        let in_flight = state.in_progress.len();
        self.inner.sync_idle(&state);
        self.inner.emit(QueueEvent::RunStopped {
            run,
            discarded,
            in_flight,
        });
        drop(state);

        info!(run, discarded, in_flight, "Run stopped");
        Ok(StopOutcome {
            run,
            discarded,
            in_flight,
        })
    }

    /// Consistent copy of all partitions, with live progress for in-flight jobs.
    pub fn snapshot(&self) -> QueueSnapshot {
        let state = self.inner.state.lock();
        QueueSnapshot {
            run: state.current_run(),
            output_dir: state.output_dir.clone(),
            naming_pattern: state.naming_pattern.clone(),
            max_concurrency: self.inner.config.max_concurrency,
            pending: state.pending.iter().cloned().collect(),
            in_progress: state
                .in_progress
                .iter()
                .map(|active| {
                    let mut job = active.job.clone();
                    job.progress = *active.progress.borrow();
                    job
                })
                .collect(),
            history: state.history.clone(),
        }
    }

    /// Resolve once no run is active and no conversion is in flight.
    pub async fn wait_idle(&self) {
        let mut idle = self.inner.idle_tx.subscribe();
        // the sender lives in `inner`, so this only errors if it was dropped
        let _ = idle.wait_for(|idle| *idle).await;
    }
}

impl std::fmt::Debug for QueueManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueManager")
            .field("config", &self.inner.config)
            .field("engine", &self.inner.engine.name())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;

    struct InstantEngine;

    #[async_trait]
    impl ConversionEngine for InstantEngine {
        fn name(&self) -> &'static str {
            "instant"
        }

        fn output_extension(&self) -> &str {
            "mp4"
        }

        async fn convert(
            &self,
            _request: ConversionRequest,
            _cancellation_token: CancellationToken,
            on_progress: ProgressCallback,
        ) -> std::result::Result<(), ConversionError> {
            on_progress(ConversionProgress::new(
                250,
                std::time::Duration::from_secs(1),
                std::time::Duration::from_secs(1),
            ));
            Ok(())
        }
    }

    fn manager() -> QueueManager {
        QueueManager::new(QueueManagerConfig::default(), Arc::new(InstantEngine)).unwrap()
    }

    #[test]
    fn test_zero_concurrency_is_rejected() {
        let result = QueueManager::new(
            QueueManagerConfig::default().with_max_concurrency(0),
            Arc::new(InstantEngine),
        );
        assert!(matches!(result, Err(QueueError::InvalidArgument(_))));
    }

    #[test]
    fn test_enqueue_requires_pattern() {
        let manager = manager();
        let result = manager.enqueue("https://example.com/a.m3u8");
        assert!(matches!(result, Err(QueueError::InvalidState(_))));
        assert!(manager.snapshot().is_empty());
    }

    #[test]
    fn test_enqueue_rejects_invalid_source_before_pattern_check() {
        let manager = manager();
        assert!(matches!(
            manager.enqueue(""),
            Err(QueueError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_sequence_numbers_are_not_reused() {
        let manager = manager();
        manager.set_naming_pattern("clip").unwrap();

        let first = manager.enqueue("https://example.com/a.m3u8").unwrap();
        let second = manager.enqueue("https://example.com/a.m3u8").unwrap();
        assert_eq!(first.destination_name, "clip_1");
        assert_eq!(second.destination_name, "clip_2");

        let removed = manager.dequeue_last().unwrap();
        assert_eq!(removed.id, second.id);

        let third = manager.enqueue("https://example.com/a.m3u8").unwrap();
        assert_eq!(third.destination_name, "clip_3");

        let snapshot = manager.snapshot();
        let names: Vec<_> = snapshot
            .pending
            .iter()
            .map(|j| j.destination_name.as_str())
            .collect();
        assert_eq!(names, ["clip_1", "clip_3"]);
    }

    #[test]
    fn test_dequeue_last_on_empty_queue() {
        let manager = manager();
        assert!(matches!(manager.dequeue_last(), Err(QueueError::EmptyQueue)));
    }

    #[test]
    fn test_pattern_change_only_affects_new_jobs() {
        let manager = manager();
        manager.set_naming_pattern("first").unwrap();
        manager.enqueue("https://example.com/a.m3u8").unwrap();
        assert_eq!(manager.set_naming_pattern(" second/part ").unwrap(), "second_part");
        manager.enqueue("https://example.com/b.m3u8").unwrap();

        let snapshot = manager.snapshot();
        assert_eq!(snapshot.pending[0].destination_name, "first_1");
        assert_eq!(snapshot.pending[1].destination_name, "second_part_2");
        assert_eq!(snapshot.naming_pattern.as_deref(), Some("second_part"));
    }

    #[test]
    fn test_set_output_directory_creates_it() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested").join("out");
        let manager = manager();
        manager.set_output_directory(&target).unwrap();
        assert!(target.is_dir());
        assert_eq!(manager.output_dir(), Some(target));
    }

    #[test]
    fn test_set_output_directory_io_failure() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("occupied");
        std::fs::write(&file, b"not a directory").unwrap();

        let manager = manager();
        let result = manager.set_output_directory(file.join("out"));
        assert!(matches!(result, Err(QueueError::Io { .. })));
        assert!(manager.output_dir().is_none());
    }

    #[test]
    fn test_start_outside_runtime_fails_without_state_change() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager();
        manager.set_output_directory(dir.path()).unwrap();
        manager.set_naming_pattern("clip").unwrap();
        manager.enqueue("https://example.com/a.m3u8").unwrap();

        assert!(matches!(manager.start(), Err(QueueError::InvalidState(_))));
        assert!(!manager.is_running());
        assert_eq!(manager.snapshot().pending.len(), 1);
    }

    #[tokio::test]
    async fn test_start_preconditions() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager();

        // nothing configured
        assert!(matches!(manager.start(), Err(QueueError::InvalidState(_))));

        manager.set_output_directory(dir.path()).unwrap();
        assert!(matches!(manager.start(), Err(QueueError::InvalidState(_))));

        manager.set_naming_pattern("clip").unwrap();
        assert!(matches!(manager.start(), Err(QueueError::EmptyQueue)));

        assert!(matches!(manager.stop(), Err(QueueError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_progress_is_clamped_and_kept_on_completion() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager();
        manager.set_output_directory(dir.path()).unwrap();
        manager.set_naming_pattern("clip").unwrap();
        manager.enqueue("https://example.com/a.m3u8").unwrap();

        manager.start().unwrap();
        tokio::time::timeout(std::time::Duration::from_secs(5), manager.wait_idle())
            .await
            .unwrap();

        let snapshot = manager.snapshot();
        assert!(!snapshot.is_running());
        assert_eq!(snapshot.history.len(), 1);
        let job = &snapshot.history[0];
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.progress.percent, 100);
        assert_eq!(job.progress.total, std::time::Duration::from_secs(1));
    }
}
