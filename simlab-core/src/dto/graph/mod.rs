//! Graph DTOs: ontology generation and graph construction

use serde::{Deserialize, Serialize};

use crate::domain::upload::{PendingUpload, UploadFile};

/// Multipart payload for ontology generation
///
/// Sent as form fields `files` (repeated), `simulation_requirement`,
/// `project_name` and optionally `additional_context`.
#[derive(Debug, Clone)]
pub struct OntologyUpload {
    pub project_name: String,
    pub simulation_requirement: String,
    pub additional_context: Option<String>,
    pub files: Vec<UploadFile>,
}

impl OntologyUpload {
    /// Builds the upload from a hand-off taken from an earlier step
    pub fn from_pending(pending: PendingUpload, project_name: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
            simulation_requirement: pending.simulation_requirement,
            additional_context: None,
            files: pending.files,
        }
    }
}

/// Request to build a graph from a project's prepared ontology
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildGraph {
    pub project_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph_name: Option<String>,
}

/// Acknowledgement of an accepted graph task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskAccepted {
    #[serde(alias = "taskId")]
    pub task_id: String,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}
