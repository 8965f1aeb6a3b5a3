//! Pipeline command handlers
//!
//! Chains several jobs, each step waiting for the previous one.

use anyhow::{Context, Result, anyhow};
use clap::Subcommand;
use colored::*;
use simlab_core::domain::job::JobSnapshot;
use simlab_core::domain::upload::UploadHandoff;
use simlab_core::dto::graph::{BuildGraph, OntologyUpload};
use std::path::PathBuf;

use super::graph::{print_accepted, read_files, wait_for_task};
use crate::config::Config;

/// Pipeline subcommands
#[derive(Subcommand)]
pub enum PipelineCommands {
    /// Upload documents, generate the ontology and build the graph
    Run {
        /// Document to upload (repeatable)
        #[arg(short, long = "file", required = true)]
        files: Vec<PathBuf>,

        /// What the simulation should explore
        #[arg(short, long)]
        requirement: String,

        /// Name of the project to create
        #[arg(short, long)]
        project_name: String,

        /// Display name of the graph
        #[arg(short, long)]
        graph_name: Option<String>,
    },
}

/// Handle pipeline commands
///
/// # Arguments
/// * `command` - The pipeline command to execute
/// * `config` - The CLI configuration
pub async fn handle_pipeline_command(command: PipelineCommands, config: &Config) -> Result<()> {
    match command {
        PipelineCommands::Run {
            files,
            requirement,
            project_name,
            graph_name,
        } => run_graph_pipeline(files, requirement, project_name, graph_name, config).await,
    }
}

/// Ontology generation followed by a graph build
async fn run_graph_pipeline(
    files: Vec<PathBuf>,
    requirement: String,
    project_name: String,
    graph_name: Option<String>,
    config: &Config,
) -> Result<()> {
    let client = config.client()?;

    println!("{}", "Step 1/3: collecting documents".bold());
    let mut handoff = UploadHandoff::new();
    handoff.stash(read_files(&files).await?, requirement);

    println!("{}", "Step 2/3: generating ontology".bold());
    let pending = handoff
        .take()
        .ok_or_else(|| anyhow!("No documents were collected"))?;
    let upload = OntologyUpload::from_pending(pending, project_name);
    let task = client
        .generate_ontology(&upload)
        .await
        .context("Failed to submit ontology generation")?;
    print_accepted("Ontology generation", &task);
    let ontology = wait_for_task(&client, &task.task_id, config).await?;
    let project_id = project_id_of(&ontology)?;

    println!("{}", "Step 3/3: building graph".bold());
    let task = client
        .build_graph(&BuildGraph {
            project_id: project_id.clone(),
            graph_name,
        })
        .await
        .context("Failed to submit graph build")?;
    print_accepted("Graph build", &task);
    wait_for_task(&client, &task.task_id, config).await?;

    println!();
    println!(
        "{} Pipeline finished for project {}",
        "✓".green().bold(),
        project_id.cyan()
    );
    Ok(())
}

/// Project created by an ontology generation task
fn project_id_of(job: &JobSnapshot) -> Result<String> {
    job.result
        .as_ref()
        .and_then(|result| result.get("project_id"))
        .and_then(|id| id.as_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow!("Ontology task finished without a project_id"))
}
