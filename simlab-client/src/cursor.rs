//! Incremental log cursor
//!
//! Reads an append-only log in consecutive windows. The cursor remembers the
//! index of the first line it has not received yet (`from_line`) and the
//! lines received so far. Reads are pure range reads, so repeating one with
//! the same `from_line` after a failure is always safe.

use async_trait::async_trait;
use simlab_core::domain::log::{LogBatch, LogStreamKind};
use tokio::sync::watch;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::SimlabClient;
use crate::error::{ClientError, Result};
use crate::poller::PollState;

/// Source of log windows
#[async_trait]
pub trait LogSource: Send + Sync {
    /// Returns the lines starting at `from_line`; the server picks how many
    async fn logs_since(&self, from_line: u64) -> Result<LogBatch>;
}

/// One log stream of a report job
#[derive(Debug, Clone)]
pub struct ReportLog {
    client: SimlabClient,
    report_id: String,
    kind: LogStreamKind,
}

impl ReportLog {
    pub fn kind(&self) -> LogStreamKind {
        self.kind
    }
}

#[async_trait]
impl LogSource for ReportLog {
    async fn logs_since(&self, from_line: u64) -> Result<LogBatch> {
        self.client
            .get_report_log(&self.report_id, self.kind, from_line)
            .await
    }
}

impl SimlabClient {
    /// Log source for one stream of a report job
    pub fn report_log(&self, report_id: impl Into<String>, kind: LogStreamKind) -> ReportLog {
        ReportLog {
            client: self.clone(),
            report_id: report_id.into(),
            kind,
        }
    }
}

/// Read position in a log plus everything read so far
///
/// Fetching takes `&mut self`, so a cursor can only ever have one fetch in
/// flight and its position only moves forward.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogCursor {
    from_line: u64,
    lines: Vec<String>,
}

impl LogCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cursor that skips the first `from_line` lines
    pub fn starting_at(from_line: u64) -> Self {
        Self {
            from_line,
            lines: Vec::new(),
        }
    }

    /// Index of the next line to request
    pub fn from_line(&self) -> u64 {
        self.from_line
    }

    /// Lines received so far, in log order
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }

    /// Merges a window into the view and advances the cursor
    ///
    /// Lines below `from_line` (already received) are dropped, so applying
    /// the same window twice changes nothing. Returns the number of lines
    /// appended.
    pub fn apply(&mut self, batch: &LogBatch) -> usize {
        if batch.logs.is_empty() {
            return 0;
        }

        let next = batch.to_line.saturating_add(1);
        let expected = batch.from_line.saturating_add(batch.logs.len() as u64);
        if next != expected {
            warn!(
                "Log window {}..={} holds {} line(s), expected up to line {}",
                batch.from_line,
                batch.to_line,
                batch.logs.len(),
                expected - 1
            );
        }
        if batch.from_line > self.from_line {
            warn!(
                "Log window starts at line {} but cursor is at {}",
                batch.from_line, self.from_line
            );
        }

        let skip = self.from_line.saturating_sub(batch.from_line) as usize;
        let fresh = batch.logs.iter().skip(skip);
        let before = self.lines.len();
        self.lines.extend(fresh.cloned());

        self.from_line = self.from_line.max(next);
        self.lines.len() - before
    }

    /// Fetches the next window from `source` and merges it
    ///
    /// On error the cursor is left untouched, so the same call can simply
    /// be repeated.
    pub async fn fetch_next<S>(&mut self, source: &S) -> Result<LogBatch>
    where
        S: LogSource + ?Sized,
    {
        let batch = source.logs_since(self.from_line).await?;
        let appended = self.apply(&batch);
        debug!(
            "Fetched {} new log line(s), next line {} of {}",
            appended, self.from_line, batch.total_lines
        );
        Ok(batch)
    }
}

/// Consecutive failed reads tolerated once the job is terminal
pub const DEFAULT_DRAIN_FAILURE_LIMIT: u32 = 5;

/// Live tail of a log while its job runs
#[derive(Debug, Clone, Copy)]
pub struct LogTail {
    interval: Duration,
    drain_failure_limit: u32,
}

impl LogTail {
    /// Creates a tail that waits `interval` once it has caught up
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            drain_failure_limit: DEFAULT_DRAIN_FAILURE_LIMIT,
        }
    }

    /// Gives up after `limit` consecutive failed reads of a finished job
    ///
    /// While the job runs, failed reads are always retried.
    pub fn with_drain_failure_limit(mut self, limit: u32) -> Self {
        self.drain_failure_limit = limit.max(1);
        self
    }

    /// Follows `source` until the log is drained and the job is terminal
    ///
    /// A window with `has_more` is followed by an immediate fetch; otherwise
    /// the tail sleeps `interval`. `has_more=false` alone does not stop the
    /// tail, because the job may still write. A failed read is logged and
    /// re-attempted at the next tick from the same line; business failures
    /// end the tail. Once the job is terminal, the read error is returned
    /// after the drain failure limit is reached.
    ///
    /// # Arguments
    /// * `source` - Log to read
    /// * `cursor` - Position to continue from; updated in place
    /// * `job_state` - State published by the job's [`crate::poller::TaskPoller`]
    /// * `cancel` - Stops the tail at the next tick boundary
    /// * `on_lines` - Called with each non-empty run of new lines
    pub async fn run<S>(
        &self,
        source: &S,
        cursor: &mut LogCursor,
        job_state: watch::Receiver<PollState>,
        cancel: &CancellationToken,
        mut on_lines: impl FnMut(&[String]),
    ) -> Result<()>
    where
        S: LogSource + ?Sized,
    {
        let mut drain_failures = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(ClientError::Cancelled);
            }

            // Sampled before the read: if the job was already terminal, this
            // read sees every line it wrote.
            let job_done = job_state.borrow().is_terminal();
            let before = cursor.lines().len();

            match cursor.fetch_next(source).await {
                Ok(batch) => {
                    drain_failures = 0;
                    let fresh = &cursor.lines()[before..];
                    if !fresh.is_empty() {
                        on_lines(fresh);
                    }

                    if batch.has_more && !batch.logs.is_empty() {
                        continue;
                    }

                    if !batch.has_more && job_done {
                        debug!("Log drained at line {}", cursor.from_line());
                        return Ok(());
                    }
                }
                Err(e) if e.is_business() => return Err(e),
                Err(e) if job_done && drain_failures + 1 >= self.drain_failure_limit => {
                    warn!(
                        "Giving up on log at line {} after {} failed read(s): {}",
                        cursor.from_line(),
                        drain_failures + 1,
                        e
                    );
                    return Err(e);
                }
                Err(e) => {
                    if job_done {
                        drain_failures += 1;
                    }
                    warn!(
                        "Log fetch failed, retrying from line {}: {}",
                        cursor.from_line(),
                        e
                    );
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => return Err(ClientError::Cancelled),
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }
}
