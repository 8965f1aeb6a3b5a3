//! Graph-related API endpoints

use crate::SimlabClient;
use crate::error::{ClientError, Result};
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use simlab_core::domain::job::JobSnapshot;
use simlab_core::domain::upload::UploadFile;
use simlab_core::dto::graph::{BuildGraph, OntologyUpload, TaskAccepted};
use std::path::Path;
use tracing::info;

impl SimlabClient {
    // =============================================================================
    // Graph Tasks
    // =============================================================================

    /// Upload documents and a simulation requirement to generate an ontology
    ///
    /// The form is rebuilt from the in-memory files on every attempt, so a
    /// retried submission sends the same body.
    ///
    /// # Returns
    /// The accepted task; poll it with [`SimlabClient::wait_for_task`]
    ///
    /// # Example
    /// ```no_run
    /// # use simlab_client::SimlabClient;
    /// # use simlab_core::domain::upload::UploadFile;
    /// # use simlab_core::dto::graph::OntologyUpload;
    /// # async fn example() -> simlab_client::Result<()> {
    /// let client = SimlabClient::new("http://localhost:5001");
    /// let task = client.generate_ontology(&OntologyUpload {
    ///     project_name: "shop".to_string(),
    ///     simulation_requirement: "build an e-commerce graph".to_string(),
    ///     additional_context: None,
    ///     files: vec![UploadFile::new("catalog.md", b"# Catalog".to_vec())],
    /// }).await?;
    /// println!("task: {}", task.task_id);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn generate_ontology(&self, upload: &OntologyUpload) -> Result<TaskAccepted> {
        let url = self.url("/api/graph/ontology/generate");
        let url = url.as_str();

        let accepted: TaskAccepted = self
            .retry
            .invoke_when(
                move || async move {
                    let response = self
                        .client
                        .post(url)
                        .multipart(ontology_form(upload))
                        .send()
                        .await?;

                    self.handle_response(response).await
                },
                ClientError::is_retryable,
            )
            .await?;

        info!(
            "Ontology generation submitted for project '{}' ({} file(s)): task {}",
            upload.project_name,
            upload.files.len(),
            accepted.task_id
        );
        Ok(accepted)
    }

    /// Build a graph from a project's prepared ontology
    ///
    /// # Returns
    /// The accepted task
    pub async fn build_graph(&self, req: &BuildGraph) -> Result<TaskAccepted> {
        let accepted: TaskAccepted = self.post_json_with_retry("/api/graph/build", req).await?;

        info!(
            "Graph build submitted for project {}: task {}",
            req.project_id, accepted.task_id
        );
        Ok(accepted)
    }

    /// Get the status of a graph task
    ///
    /// Not retried: a poller simply asks again on its next tick.
    pub async fn get_task_status(&self, task_id: &str) -> Result<JobSnapshot> {
        self.get_json(self.api_url(&["graph", "task", task_id])?)
            .await
    }

    // =============================================================================
    // Graph Data
    // =============================================================================

    /// Get the nodes and edges of a built graph
    pub async fn get_graph_data(&self, graph_id: &str) -> Result<Value> {
        self.get_json(self.api_url(&["graph", "data", graph_id])?)
            .await
    }

    /// Get a project's details
    pub async fn get_project(&self, project_id: &str) -> Result<Value> {
        self.get_json(self.api_url(&["graph", "project", project_id])?)
            .await
    }
}

/// Multipart body of an ontology submission
fn ontology_form(upload: &OntologyUpload) -> Form {
    let mut form = Form::new()
        .text("simulation_requirement", upload.simulation_requirement.clone())
        .text("project_name", upload.project_name.clone());

    if let Some(context) = &upload.additional_context {
        form = form.text("additional_context", context.clone());
    }

    for file in &upload.files {
        let part = Part::bytes(file.bytes.clone()).file_name(file.file_name.clone());
        form = form.part("files", part);
    }

    form
}

/// Reads a document from disk for upload
pub async fn read_upload(path: impl AsRef<Path>) -> Result<UploadFile> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| {
            ClientError::InvalidRequest(format!("{} is not a file path", path.display()))
        })?;

    Ok(UploadFile::new(file_name, bytes))
}
