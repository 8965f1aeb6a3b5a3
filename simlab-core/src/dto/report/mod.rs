//! Report DTOs

use serde::{Deserialize, Serialize};

use crate::domain::job::{AsJobSnapshot, JobSnapshot, JobStatus};

/// Request to start report generation for a finished simulation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateReport {
    pub simulation_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force_regenerate: Option<bool>,
}

/// Acknowledgement of a report generation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportAccepted {
    pub report_id: String,
    #[serde(default)]
    pub status: Option<JobStatus>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Report generation status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportStatus {
    #[serde(default)]
    pub report_id: Option<String>,
    #[serde(flatten)]
    pub job: JobSnapshot,
}

impl AsJobSnapshot for ReportStatus {
    fn job(&self) -> &JobSnapshot {
        &self.job
    }
}

/// One turn of a conversation with the report agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

/// Question sent to the report agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportChat {
    pub simulation_id: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub chat_history: Vec<ChatTurn>,
}

/// Agent answer plus the updated history to send with the next question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
    #[serde(default)]
    pub chat_history: Vec<ChatTurn>,
}
