//! Task poller
//!
//! Polls a job's status until it reaches a terminal state. The loop is an
//! explicit state machine (`Idle -> Pending/Processing -> Completed/Failed`)
//! advanced once per tick, with cancellation checked at every tick boundary.
//!
//! The current state is published on a `watch` channel so that other loops
//! working on the same job (log tails) can tell when it has finished.

use async_trait::async_trait;
use simlab_core::domain::job::{AsJobSnapshot, JobSnapshot, JobStatus};
use simlab_core::dto::report::ReportStatus;
use simlab_core::dto::simulation::{PrepareStatus, PrepareStatusQuery};
use tokio::sync::watch;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::SimlabClient;
use crate::error::{ClientError, Result};

/// Source of job status snapshots
///
/// Transport failures are returned as-is; the poller does not retry them.
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Snapshot type returned by the endpoint
    type Snapshot: AsJobSnapshot + Send;

    /// Fetches the current status with a single round trip
    async fn fetch_status(&self) -> Result<Self::Snapshot>;
}

/// State of a polled job, as last observed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    /// Nothing observed yet
    Idle,
    Pending,
    Processing,
    Completed,
    Failed,
}

impl PollState {
    pub fn is_terminal(self) -> bool {
        matches!(self, PollState::Completed | PollState::Failed)
    }
}

impl From<JobStatus> for PollState {
    fn from(status: JobStatus) -> Self {
        match status {
            JobStatus::Pending => PollState::Pending,
            JobStatus::Processing => PollState::Processing,
            JobStatus::Completed => PollState::Completed,
            JobStatus::Failed => PollState::Failed,
        }
    }
}

/// Drives a [`StatusSource`] to a terminal state
#[derive(Debug)]
pub struct TaskPoller {
    interval: Duration,
    state: watch::Sender<PollState>,
    fetches: u32,
    last_progress: Option<u8>,
}

impl TaskPoller {
    /// Creates a poller that waits `interval` between fetches
    pub fn new(interval: Duration) -> Self {
        let (state, _) = watch::channel(PollState::Idle);
        Self {
            interval,
            state,
            fetches: 0,
            last_progress: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Last observed state
    pub fn state(&self) -> PollState {
        *self.state.borrow()
    }

    /// Number of successful status fetches so far
    pub fn fetches(&self) -> u32 {
        self.fetches
    }

    /// Receiver that follows the poller's state
    pub fn subscribe(&self) -> watch::Receiver<PollState> {
        self.state.subscribe()
    }

    /// Applies one snapshot and returns the new state
    ///
    /// A terminal state is sticky: later snapshots are ignored.
    pub fn observe(&mut self, job: &JobSnapshot) -> PollState {
        let current = self.state();
        if current.is_terminal() {
            return current;
        }

        if let Some(last) = self.last_progress {
            if job.progress < last {
                debug!("Progress went backwards ({}% -> {}%)", last, job.progress);
            }
        }
        self.last_progress = Some(job.progress);

        let next = PollState::from(job.status);
        self.state.send_replace(next);
        next
    }

    /// Polls until the job completes or fails
    ///
    /// `on_progress` is called with every snapshot, in fetch order, before
    /// the snapshot is acted on.
    ///
    /// # Returns
    /// The completed snapshot (carrying `result`). A failed job becomes
    /// [`ClientError::JobFailed`] with the job's `error`; an observed
    /// cancellation becomes [`ClientError::Cancelled`].
    pub async fn run<S>(
        &mut self,
        source: &S,
        cancel: &CancellationToken,
        mut on_progress: impl FnMut(&S::Snapshot),
    ) -> Result<S::Snapshot>
    where
        S: StatusSource + ?Sized,
    {
        loop {
            if cancel.is_cancelled() {
                return Err(ClientError::Cancelled);
            }

            let snapshot = source.fetch_status().await?;
            self.fetches += 1;

            debug!(
                "Status poll #{}: {} ({}%)",
                self.fetches,
                snapshot.job().status,
                snapshot.job().progress
            );
            on_progress(&snapshot);

            match self.observe(snapshot.job()) {
                PollState::Completed => {
                    info!("Job completed after {} poll(s)", self.fetches);
                    return Ok(snapshot);
                }
                PollState::Failed => {
                    let message = snapshot
                        .job()
                        .error
                        .clone()
                        .unwrap_or_else(|| "job failed".to_string());
                    info!("Job failed after {} poll(s): {}", self.fetches, message);
                    return Err(ClientError::JobFailed { message });
                }
                _ => {}
            }

            tokio::select! {
                _ = cancel.cancelled() => return Err(ClientError::Cancelled),
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }
}

// =============================================================================
// Status sources backed by the API
// =============================================================================

/// Status of a graph task (ontology generation, graph build)
#[derive(Debug, Clone)]
pub struct GraphTaskStatus {
    client: SimlabClient,
    task_id: String,
}

#[async_trait]
impl StatusSource for GraphTaskStatus {
    type Snapshot = JobSnapshot;

    async fn fetch_status(&self) -> Result<JobSnapshot> {
        self.client.get_task_status(&self.task_id).await
    }
}

/// Status of a report generation job
#[derive(Debug, Clone)]
pub struct ReportGenerationStatus {
    client: SimlabClient,
    report_id: String,
}

#[async_trait]
impl StatusSource for ReportGenerationStatus {
    type Snapshot = ReportStatus;

    async fn fetch_status(&self) -> Result<ReportStatus> {
        self.client.get_report_status(&self.report_id).await
    }
}

/// Status of a simulation preparation job
#[derive(Debug, Clone)]
pub struct PrepareTaskStatus {
    client: SimlabClient,
    query: PrepareStatusQuery,
}

#[async_trait]
impl StatusSource for PrepareTaskStatus {
    type Snapshot = PrepareStatus;

    async fn fetch_status(&self) -> Result<PrepareStatus> {
        self.client.get_prepare_status(&self.query).await
    }
}

impl SimlabClient {
    /// Status source for a graph task
    pub fn graph_task(&self, task_id: impl Into<String>) -> GraphTaskStatus {
        GraphTaskStatus {
            client: self.clone(),
            task_id: task_id.into(),
        }
    }

    /// Status source for a report generation job
    pub fn report_generation(&self, report_id: impl Into<String>) -> ReportGenerationStatus {
        ReportGenerationStatus {
            client: self.clone(),
            report_id: report_id.into(),
        }
    }

    /// Status source for a simulation preparation job
    pub fn prepare_task(&self, query: PrepareStatusQuery) -> PrepareTaskStatus {
        PrepareTaskStatus {
            client: self.clone(),
            query,
        }
    }

    /// Polls a graph task to completion with the configured interval
    pub async fn wait_for_task(
        &self,
        task_id: &str,
        cancel: &CancellationToken,
        on_progress: impl FnMut(&JobSnapshot),
    ) -> Result<JobSnapshot> {
        TaskPoller::new(self.poll_interval())
            .run(&self.graph_task(task_id), cancel, on_progress)
            .await
    }

    /// Polls report generation to completion with the configured interval
    pub async fn wait_for_report(
        &self,
        report_id: &str,
        cancel: &CancellationToken,
        on_progress: impl FnMut(&ReportStatus),
    ) -> Result<ReportStatus> {
        TaskPoller::new(self.poll_interval())
            .run(&self.report_generation(report_id), cancel, on_progress)
            .await
    }

    /// Polls simulation preparation to completion with the configured interval
    pub async fn wait_for_prepare(
        &self,
        query: PrepareStatusQuery,
        cancel: &CancellationToken,
        on_progress: impl FnMut(&PrepareStatus),
    ) -> Result<PrepareStatus> {
        TaskPoller::new(self.poll_interval())
            .run(&self.prepare_task(query), cancel, on_progress)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::time::Instant;

    /// Replays a fixed sequence of snapshots
    struct Scripted {
        snapshots: Mutex<VecDeque<Result<JobSnapshot>>>,
        fetches: Mutex<Vec<Instant>>,
    }

    impl Scripted {
        fn new(snapshots: Vec<Result<JobSnapshot>>) -> Self {
            Self {
                snapshots: Mutex::new(snapshots.into()),
                fetches: Mutex::new(Vec::new()),
            }
        }

        fn fetch_count(&self) -> usize {
            self.fetches.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl StatusSource for Scripted {
        type Snapshot = JobSnapshot;

        async fn fetch_status(&self) -> Result<JobSnapshot> {
            self.fetches.lock().unwrap().push(Instant::now());
            self.snapshots
                .lock()
                .unwrap()
                .pop_front()
                .expect("poller fetched past the end of the script")
        }
    }

    fn snap(status: JobStatus, progress: u8) -> Result<JobSnapshot> {
        Ok(JobSnapshot::new(status, progress))
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_until_completed() {
        let source = Scripted::new(vec![
            snap(JobStatus::Pending, 0),
            snap(JobStatus::Processing, 30),
            snap(JobStatus::Processing, 70),
            Ok(JobSnapshot::new(JobStatus::Completed, 100).with_result(json!({ "graph_id": "g-1" }))),
        ]);
        let mut poller = TaskPoller::new(Duration::from_millis(2000));
        let mut reported = Vec::new();

        let job = poller
            .run(&source, &CancellationToken::new(), |s| reported.push(s.progress))
            .await
            .unwrap();

        assert_eq!(source.fetch_count(), 4);
        assert_eq!(poller.fetches(), 4);
        assert_eq!(reported, vec![0, 30, 70, 100]);
        assert_eq!(job.result, Some(json!({ "graph_id": "g-1" })));
        assert_eq!(poller.state(), PollState::Completed);

        let fetches = source.fetches.lock().unwrap();
        for pair in fetches.windows(2) {
            assert_eq!(pair[1] - pair[0], Duration::from_millis(2000));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_job_raises_its_error() {
        let source = Scripted::new(vec![
            snap(JobStatus::Pending, 0),
            Ok(JobSnapshot::new(JobStatus::Failed, 10).with_error("LLM quota exceeded")),
        ]);
        let mut poller = TaskPoller::new(Duration::from_millis(2000));

        let err = poller
            .run(&source, &CancellationToken::new(), |_| {})
            .await
            .unwrap_err();

        assert_eq!(source.fetch_count(), 2);
        match err {
            ClientError::JobFailed { message } => assert_eq!(message, "LLM quota exceeded"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(poller.state(), PollState::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_error_is_not_retried() {
        let source = Scripted::new(vec![
            snap(JobStatus::Processing, 10),
            Err(ClientError::api_error(502, "bad gateway")),
        ]);
        let mut poller = TaskPoller::new(Duration::from_millis(100));

        let err = poller
            .run(&source, &CancellationToken::new(), |_| {})
            .await
            .unwrap_err();

        assert!(err.is_server_error());
        assert_eq!(source.fetch_count(), 2);
        assert_eq!(poller.state(), PollState::Processing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_before_first_fetch() {
        let source = Scripted::new(Vec::new());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = TaskPoller::new(Duration::from_millis(100))
            .run(&source, &cancel, |_| {})
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::Cancelled));
        assert_eq!(source.fetch_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_during_wait() {
        let source = Scripted::new(vec![snap(JobStatus::Processing, 5)]);
        let cancel = CancellationToken::new();
        let canceller = cancel.clone();
        let mut poller = TaskPoller::new(Duration::from_secs(60));

        let err = poller
            .run(&source, &cancel, |_| canceller.cancel())
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::Cancelled));
        assert_eq!(source.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_state_is_published() {
        let mut poller = TaskPoller::new(Duration::from_millis(10));
        let mut rx = poller.subscribe();
        assert_eq!(*rx.borrow(), PollState::Idle);

        poller.observe(&JobSnapshot::new(JobStatus::Processing, 20));
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), PollState::Processing);

        poller.observe(&JobSnapshot::new(JobStatus::Completed, 100));
        assert!(rx.borrow_and_update().is_terminal());

        // Terminal states are sticky
        poller.observe(&JobSnapshot::new(JobStatus::Processing, 50));
        assert_eq!(poller.state(), PollState::Completed);
    }
}
