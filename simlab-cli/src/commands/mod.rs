//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod graph;
mod pipeline;
mod report;
mod simulation;

pub use graph::GraphCommands;
pub use pipeline::PipelineCommands;
pub use report::ReportCommands;
pub use simulation::SimulationCommands;

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use serde_json::Value;
use simlab_core::domain::job::{JobSnapshot, JobStatus};

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Ontology generation and graph building
    Graph {
        #[command(subcommand)]
        command: GraphCommands,
    },
    /// Simulation lifecycle and interviews
    Simulation {
        #[command(subcommand)]
        command: SimulationCommands,
    },
    /// Report generation, logs and chat
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },
    /// Multi-step workflows
    Pipeline {
        #[command(subcommand)]
        command: PipelineCommands,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - The CLI configuration
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Graph { command } => graph::handle_graph_command(command, config).await,
        Commands::Simulation { command } => {
            simulation::handle_simulation_command(command, config).await
        }
        Commands::Report { command } => report::handle_report_command(command, config).await,
        Commands::Pipeline { command } => pipeline::handle_pipeline_command(command, config).await,
    }
}

/// Colorize job status for display
fn colorize_status(status: JobStatus) -> ColoredString {
    let status_str = status.to_string();
    match status {
        JobStatus::Pending => status_str.yellow(),
        JobStatus::Processing => status_str.cyan(),
        JobStatus::Completed => status_str.green(),
        JobStatus::Failed => status_str.red(),
    }
}

/// Print one line per status poll
fn print_progress(job: &JobSnapshot) {
    let step = job
        .current_step
        .as_deref()
        .or(job.message.as_deref())
        .unwrap_or("");
    println!(
        "  {} {:>3}% {} {}",
        "▸".cyan(),
        job.progress,
        colorize_status(job.status),
        step.dimmed()
    );
}

/// Print a job snapshot
fn print_job(job: &JobSnapshot) {
    println!("  Status:   {}", colorize_status(job.status));
    println!("  Progress: {}%", job.progress);
    if let Some(step) = &job.current_step {
        println!("  Step:     {}", step);
    }
    if let Some(message) = &job.message {
        println!("  Message:  {}", message.dimmed());
    }
    if let Some(error) = &job.error {
        println!("\n{}", "Error:".bold());
        println!("{}", error.red());
    }
    if let Some(result) = &job.result {
        println!("\n{}", "Result:".bold());
        print_json(result);
    }
}

/// Pretty-print a JSON payload
fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(pretty) => println!("{}", pretty),
        Err(_) => println!("{}", value),
    }
}
