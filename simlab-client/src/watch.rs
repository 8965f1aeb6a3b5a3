//! Report status and logs followed together
//!
//! A report job has one status and two logs. [`SimlabClient::watch_report`]
//! polls the status and tails both logs concurrently on the current task;
//! the tails stop once the poller has seen a terminal state and the logs are
//! drained.

use std::sync::{Mutex, MutexGuard, PoisonError};

use simlab_core::domain::log::LogStreamKind;
use simlab_core::dto::report::ReportStatus;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::SimlabClient;
use crate::cursor::{LogCursor, LogTail};
use crate::error::{ClientError, Result};
use crate::poller::{PollState, TaskPoller};

/// Receives progress while a report is watched
///
/// Both methods default to doing nothing.
pub trait WatchObserver: Send {
    /// Called with every status snapshot, the terminal one included
    fn on_progress(&mut self, _status: &ReportStatus) {}

    /// Called with each run of new lines of one log
    fn on_log_lines(&mut self, _kind: LogStreamKind, _lines: &[String]) {}
}

/// Ignores everything
impl WatchObserver for () {}

/// Outcome of a completed report watch
///
/// A log that was not tailed is empty.
#[derive(Debug, Clone)]
pub struct ReportWatch {
    pub status: ReportStatus,
    pub agent_log: Vec<String>,
    pub console_log: Vec<String>,
}

/// Which logs a report watch tails, and from which line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchLogs {
    pub agent: Option<LogCursor>,
    pub console: Option<LogCursor>,
}

impl WatchLogs {
    /// Both logs from their first line
    pub fn both() -> Self {
        Self {
            agent: Some(LogCursor::new()),
            console: Some(LogCursor::new()),
        }
    }

    /// A single log, resuming at `from_line`
    pub fn only(kind: LogStreamKind, from_line: u64) -> Self {
        let cursor = Some(LogCursor::starting_at(from_line));
        match kind {
            LogStreamKind::Agent => Self {
                agent: cursor,
                console: None,
            },
            LogStreamKind::Console => Self {
                agent: None,
                console: cursor,
            },
        }
    }
}

impl SimlabClient {
    /// Polls a report to completion while tailing its agent and console logs
    ///
    /// Same as [`SimlabClient::watch_report_with`] with [`WatchLogs::both`].
    pub async fn watch_report<O>(
        &self,
        report_id: &str,
        cancel: &CancellationToken,
        observer: &mut O,
    ) -> Result<ReportWatch>
    where
        O: WatchObserver + ?Sized,
    {
        self.watch_report_with(report_id, WatchLogs::both(), cancel, observer)
            .await
    }

    /// Polls a report to completion while tailing the selected logs
    ///
    /// If polling fails before the job is terminal, the tails are cancelled
    /// and the polling error is returned. A failed job still lets the tails
    /// drain before [`ClientError::JobFailed`] is returned, so the observer
    /// sees the whole log.
    ///
    /// # Arguments
    /// * `report_id` - Report returned by [`SimlabClient::generate_report`]
    /// * `logs` - Logs to tail and their starting cursors
    /// * `cancel` - Stops polling and the tails
    /// * `observer` - Receives progress and log lines as they arrive
    pub async fn watch_report_with<O>(
        &self,
        report_id: &str,
        logs: WatchLogs,
        cancel: &CancellationToken,
        observer: &mut O,
    ) -> Result<ReportWatch>
    where
        O: WatchObserver + ?Sized,
    {
        let observer = Mutex::new(observer);

        let status_source = self.report_generation(report_id);
        let mut poller = TaskPoller::new(self.poll_interval());
        let job_state = poller.subscribe();
        let tails_cancel = cancel.child_token();

        let tail = LogTail::new(self.log_interval());
        let WatchLogs {
            agent: mut agent_cursor,
            console: mut console_cursor,
        } = logs;

        let poll = async {
            let result = poller
                .run(&status_source, cancel, |status| {
                    lock(&observer).on_progress(status)
                })
                .await;

            match &result {
                Ok(_) | Err(ClientError::JobFailed { .. }) => {}
                Err(e) => {
                    debug!("Report {} polling ended early ({}), stopping log tails", report_id, e);
                    tails_cancel.cancel();
                }
            }
            result
        };

        let (status, agent, console) = tokio::join!(
            poll,
            self.tail_report_log(
                report_id,
                LogStreamKind::Agent,
                agent_cursor.as_mut(),
                tail,
                job_state.clone(),
                &tails_cancel,
                &observer,
            ),
            self.tail_report_log(
                report_id,
                LogStreamKind::Console,
                console_cursor.as_mut(),
                tail,
                job_state,
                &tails_cancel,
                &observer,
            ),
        );
        let status = status?;
        agent?;
        console?;

        Ok(ReportWatch {
            status,
            agent_log: agent_cursor.map(LogCursor::into_lines).unwrap_or_default(),
            console_log: console_cursor.map(LogCursor::into_lines).unwrap_or_default(),
        })
    }

    /// Tails one log of a report; a log without a cursor is skipped
    #[allow(clippy::too_many_arguments)]
    async fn tail_report_log<O>(
        &self,
        report_id: &str,
        kind: LogStreamKind,
        cursor: Option<&mut LogCursor>,
        tail: LogTail,
        job_state: watch::Receiver<PollState>,
        cancel: &CancellationToken,
        observer: &Mutex<&mut O>,
    ) -> Result<()>
    where
        O: WatchObserver + ?Sized,
    {
        let Some(cursor) = cursor else {
            return Ok(());
        };

        let source = self.report_log(report_id, kind);
        tail.run(&source, cursor, job_state, cancel, |lines| {
            lock(observer).on_log_lines(kind, lines)
        })
        .await
    }
}

fn lock<'a, 'b, T: ?Sized>(observer: &'a Mutex<&'b mut T>) -> MutexGuard<'a, &'b mut T> {
    observer.lock().unwrap_or_else(PoisonError::into_inner)
}
