//! Job domain types
//!
//! A job is a unit of long-running work tracked by the remote service.
//! The client only ever observes snapshots of it.

use serde::{Deserialize, Serialize};

/// Job lifecycle status
///
/// The domain is shared by every job kind (graph tasks, report generation,
/// simulation preparation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Whether no further transitions can occur
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Processing => write!(f, "processing"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Point-in-time view of a job as reported by a status endpoint
///
/// `error` is only expected when `status` is failed and `result` only when
/// it is completed; both are kept optional because the client never
/// validates the server's payload beyond the status itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub status: JobStatus,
    #[serde(default)]
    pub progress: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_step: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
}

impl JobSnapshot {
    /// Creates a snapshot with only status and progress set
    pub fn new(status: JobStatus, progress: u8) -> Self {
        Self {
            status,
            progress,
            message: None,
            current_step: None,
            error: None,
            result: None,
        }
    }

    /// Attaches a result payload
    pub fn with_result(mut self, result: serde_json::Value) -> Self {
        self.result = Some(result);
        self
    }

    /// Attaches an error message
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Anything that carries a job snapshot
///
/// Endpoint-specific status payloads embed a [`JobSnapshot`] and add their
/// own fields; this lets generic code (the poller) look at the common part.
pub trait AsJobSnapshot {
    fn job(&self) -> &JobSnapshot;
}

impl AsJobSnapshot for JobSnapshot {
    fn job(&self) -> &JobSnapshot {
        self
    }
}
