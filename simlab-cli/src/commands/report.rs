//! Report command handlers
//!
//! Handles report generation, status, incremental logs and chat.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use simlab_client::{SimlabClient, WatchLogs, WatchObserver};
use simlab_core::domain::log::LogStreamKind;
use simlab_core::dto::report::{GenerateReport, ReportChat, ReportStatus};

use super::{print_job, print_json, print_progress};
use crate::config::Config;

/// Report subcommands
#[derive(Subcommand)]
pub enum ReportCommands {
    /// Start generating the report of a simulation
    Generate {
        /// Simulation to report on
        simulation_id: String,

        /// Regenerate even if a report exists
        #[arg(long)]
        force: bool,

        /// Follow status and both logs until the report is done
        #[arg(short, long)]
        follow: bool,
    },
    /// Show report generation status
    Status {
        /// Report ID
        report_id: String,

        /// Poll until generation finishes
        #[arg(short, long)]
        wait: bool,
    },
    /// Show report logs
    Logs {
        /// Report ID
        report_id: String,

        /// Read the console log instead of the agent log
        #[arg(long)]
        console: bool,

        /// First line to read
        #[arg(long, default_value_t = 0)]
        from_line: u64,

        /// Keep reading until the report is done
        #[arg(short, long)]
        follow: bool,
    },
    /// Show a finished report
    Show {
        /// Report ID
        report_id: String,
    },
    /// Ask the report agent a question
    Chat {
        /// Simulation the report belongs to
        simulation_id: String,

        /// Question to ask
        message: String,
    },
}

/// Handle report commands
///
/// # Arguments
/// * `command` - The report command to execute
/// * `config` - The CLI configuration
pub async fn handle_report_command(command: ReportCommands, config: &Config) -> Result<()> {
    let client = config.client()?;

    match command {
        ReportCommands::Generate {
            simulation_id,
            force,
            follow,
        } => {
            let accepted = client
                .generate_report(&GenerateReport {
                    simulation_id,
                    force_regenerate: force.then_some(true),
                })
                .await
                .context("Failed to submit report generation")?;
            println!(
                "{} Report generation submitted: report {}",
                "✓".green(),
                accepted.report_id.cyan()
            );
            if follow {
                let logs = WatchLogs::both();
                follow_report(&client, &accepted.report_id, logs, true, config).await?;
            }
            Ok(())
        }
        ReportCommands::Status { report_id, wait } => {
            if wait {
                let status = client
                    .wait_for_report(&report_id, &config.cancel, |s| print_progress(&s.job))
                    .await
                    .with_context(|| format!("Report {} did not complete", report_id))?;
                println!("{} Report {} completed", "✓".green(), report_id);
                print_job(&status.job);
            } else {
                let status = client.get_report_status(&report_id).await?;
                println!("{}", format!("Report {}:", report_id).bold());
                print_job(&status.job);
            }
            Ok(())
        }
        ReportCommands::Logs {
            report_id,
            console,
            from_line,
            follow,
        } => {
            let kind = if console {
                LogStreamKind::Console
            } else {
                LogStreamKind::Agent
            };
            if follow {
                let logs = WatchLogs::only(kind, from_line);
                follow_report(&client, &report_id, logs, false, config).await
            } else {
                let batch = client.get_report_log(&report_id, kind, from_line).await?;
                if batch.is_empty() {
                    println!("{}", format!("No {} log lines from line {}.", kind, from_line).yellow());
                } else {
                    for line in &batch.logs {
                        println!("{}", line);
                    }
                    println!(
                        "{}",
                        format!(
                            "-- lines {}..={} of {}{}",
                            batch.from_line,
                            batch.to_line,
                            batch.total_lines,
                            if batch.has_more { ", more available" } else { "" }
                        )
                        .dimmed()
                    );
                }
                Ok(())
            }
        }
        ReportCommands::Show { report_id } => {
            print_json(&client.get_report(&report_id).await?);
            Ok(())
        }
        ReportCommands::Chat {
            simulation_id,
            message,
        } => {
            let reply = client
                .chat_with_report(&ReportChat {
                    simulation_id,
                    message,
                    chat_history: Vec::new(),
                })
                .await?;
            println!("{}", reply.reply);
            Ok(())
        }
    }
}

/// Prints log lines as they arrive, and optionally progress
struct Printer {
    progress: bool,
}

impl WatchObserver for Printer {
    fn on_progress(&mut self, status: &ReportStatus) {
        if self.progress {
            print_progress(&status.job);
        }
    }

    fn on_log_lines(&mut self, kind: LogStreamKind, lines: &[String]) {
        let tag = match kind {
            LogStreamKind::Agent => "agent".magenta(),
            LogStreamKind::Console => "console".blue(),
        };
        for line in lines {
            println!("[{}] {}", tag, line);
        }
    }
}

/// Follows a report until it is done
async fn follow_report(
    client: &SimlabClient,
    report_id: &str,
    logs: WatchLogs,
    progress: bool,
    config: &Config,
) -> Result<()> {
    let mut printer = Printer { progress };
    let watch = client
        .watch_report_with(report_id, logs, &config.cancel, &mut printer)
        .await
        .with_context(|| format!("Report {} did not complete", report_id))?;

    println!(
        "{} Report {} completed ({} log line(s))",
        "✓".green(),
        report_id,
        watch.agent_log.len() + watch.console_log.len()
    );
    Ok(())
}
