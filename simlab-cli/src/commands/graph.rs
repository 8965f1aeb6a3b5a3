//! Graph command handlers
//!
//! Handles ontology generation, graph builds and graph task inspection.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use simlab_client::{SimlabClient, read_upload};
use simlab_core::domain::job::JobSnapshot;
use simlab_core::domain::upload::UploadFile;
use simlab_core::dto::graph::{BuildGraph, OntologyUpload, TaskAccepted};
use std::path::PathBuf;

use super::{print_job, print_json, print_progress};
use crate::config::Config;

/// Graph subcommands
#[derive(Subcommand)]
pub enum GraphCommands {
    /// Upload documents and generate an ontology
    Ontology {
        /// Document to upload (repeatable)
        #[arg(short, long = "file", required = true)]
        files: Vec<PathBuf>,

        /// What the simulation should explore
        #[arg(short, long)]
        requirement: String,

        /// Name of the project to create
        #[arg(short, long)]
        project_name: String,

        /// Extra context for the ontology generator
        #[arg(long)]
        context: Option<String>,

        /// Poll the task until it finishes
        #[arg(short, long)]
        wait: bool,
    },
    /// Build the graph of a project
    Build {
        /// Project whose ontology is ready
        project_id: String,

        /// Display name of the graph
        #[arg(short, long)]
        graph_name: Option<String>,

        /// Poll the task until it finishes
        #[arg(short, long)]
        wait: bool,
    },
    /// Show a graph task
    Task {
        /// Task ID returned by `ontology` or `build`
        task_id: String,

        /// Poll the task until it finishes
        #[arg(short, long)]
        wait: bool,
    },
    /// Show the nodes and edges of a graph
    Data {
        /// Graph ID
        graph_id: String,
    },
    /// Show a project
    Project {
        /// Project ID
        project_id: String,
    },
}

/// Handle graph commands
///
/// # Arguments
/// * `command` - The graph command to execute
/// * `config` - The CLI configuration
pub async fn handle_graph_command(command: GraphCommands, config: &Config) -> Result<()> {
    let client = config.client()?;

    match command {
        GraphCommands::Ontology {
            files,
            requirement,
            project_name,
            context,
            wait,
        } => {
            let upload = OntologyUpload {
                project_name,
                simulation_requirement: requirement,
                additional_context: context,
                files: read_files(&files).await?,
            };
            let task = client
                .generate_ontology(&upload)
                .await
                .context("Failed to submit ontology generation")?;
            print_accepted("Ontology generation", &task);
            if wait {
                wait_for_task(&client, &task.task_id, config).await?;
            }
            Ok(())
        }
        GraphCommands::Build {
            project_id,
            graph_name,
            wait,
        } => {
            let task = client
                .build_graph(&BuildGraph {
                    project_id,
                    graph_name,
                })
                .await
                .context("Failed to submit graph build")?;
            print_accepted("Graph build", &task);
            if wait {
                wait_for_task(&client, &task.task_id, config).await?;
            }
            Ok(())
        }
        GraphCommands::Task { task_id, wait } => {
            if wait {
                wait_for_task(&client, &task_id, config).await?;
            } else {
                let job = client.get_task_status(&task_id).await?;
                println!("{}", format!("Task {}:", task_id).bold());
                print_job(&job);
            }
            Ok(())
        }
        GraphCommands::Data { graph_id } => {
            print_json(&client.get_graph_data(&graph_id).await?);
            Ok(())
        }
        GraphCommands::Project { project_id } => {
            print_json(&client.get_project(&project_id).await?);
            Ok(())
        }
    }
}

/// Reads every document into memory
pub(super) async fn read_files(paths: &[PathBuf]) -> Result<Vec<UploadFile>> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let file = read_upload(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        files.push(file);
    }
    Ok(files)
}

pub(super) fn print_accepted(what: &str, task: &TaskAccepted) {
    println!(
        "{} {} submitted: task {}",
        "✓".green(),
        what,
        task.task_id.cyan()
    );
}

/// Polls a graph task, printing each snapshot, and prints the final state
pub(super) async fn wait_for_task(
    client: &SimlabClient,
    task_id: &str,
    config: &Config,
) -> Result<JobSnapshot> {
    println!("{}", format!("Waiting for task {}...", task_id).bold());
    let job = client
        .wait_for_task(task_id, &config.cancel, print_progress)
        .await
        .with_context(|| format!("Task {} did not complete", task_id))?;

    println!("{} Task {} completed", "✓".green(), task_id);
    if let Some(result) = &job.result {
        print_json(result);
    }
    Ok(job)
}
