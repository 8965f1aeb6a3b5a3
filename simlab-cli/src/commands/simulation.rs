//! Simulation command handlers
//!
//! Handles the simulation lifecycle (create, prepare, start, stop, close),
//! queries of the run and its output, and agent interviews.

use anyhow::{Context, Result, anyhow, bail};
use clap::Subcommand;
use colored::*;
use simlab_core::dto::simulation::{
    ActionsQuery, CloseEnv, CreateSimulation, Interview, InterviewBatch, Platform, PostsQuery,
    PrepareSimulation, PrepareStatus, PrepareStatusQuery, ProfilesQuery, SimulationAck,
    StartSimulation, TimelineQuery,
};

use super::{colorize_status, print_json, print_progress};
use crate::config::Config;

/// Simulation subcommands
#[derive(Subcommand)]
pub enum SimulationCommands {
    /// Create a simulation for a project
    Create {
        /// Project ID
        project_id: String,

        /// Graph to simulate on
        #[arg(long)]
        graph_id: Option<String>,

        /// Enable the Twitter-like platform
        #[arg(long)]
        twitter: bool,

        /// Enable the Reddit-like platform
        #[arg(long)]
        reddit: bool,
    },
    /// Prepare agent profiles and runtime config
    Prepare {
        /// Simulation ID
        simulation_id: String,

        /// Entity type to turn into agents (repeatable)
        #[arg(long = "entity-type")]
        entity_types: Vec<String>,

        /// Generate profiles with the LLM
        #[arg(long)]
        llm_profiles: bool,

        /// Profiles generated in parallel
        #[arg(long)]
        parallel: Option<u32>,

        /// Prepare again even if already prepared
        #[arg(long)]
        force: bool,

        /// Poll preparation until it finishes
        #[arg(short, long)]
        wait: bool,
    },
    /// Show preparation progress
    PrepareStatus {
        /// Preparation task ID (takes precedence)
        #[arg(long)]
        task_id: Option<String>,

        /// Simulation ID
        #[arg(long)]
        simulation_id: Option<String>,

        /// Poll until preparation finishes
        #[arg(short, long)]
        wait: bool,
    },
    /// Start a prepared simulation
    Start {
        /// Simulation ID
        simulation_id: String,

        /// Platform to run (twitter, reddit, parallel)
        #[arg(long)]
        platform: Option<String>,

        /// Stop after this many rounds
        #[arg(long)]
        max_rounds: Option<u32>,
    },
    /// Stop a running simulation
    Stop {
        /// Simulation ID
        simulation_id: String,
    },
    /// Shut down a simulation environment
    CloseEnv {
        /// Simulation ID
        simulation_id: String,

        /// Graceful shutdown budget in seconds
        #[arg(long)]
        timeout: Option<u32>,
    },
    /// Show the state of a simulation environment
    EnvStatus {
        /// Simulation ID
        simulation_id: String,
    },
    /// Show a simulation
    Get {
        /// Simulation ID
        simulation_id: String,
    },
    /// Show run progress
    RunStatus {
        /// Simulation ID
        simulation_id: String,

        /// Include the most recent agent actions
        #[arg(long)]
        detail: bool,
    },
    /// Show the agent profiles of one platform
    Profiles {
        /// Simulation ID
        simulation_id: String,

        /// Platform (reddit, twitter)
        #[arg(long, default_value_t = Platform::Reddit)]
        platform: Platform,

        /// Read profiles while preparation is still generating them
        #[arg(long)]
        realtime: bool,
    },
    /// Show the runtime configuration
    Config {
        /// Simulation ID
        simulation_id: String,

        /// Read the configuration while preparation is still writing it
        #[arg(long)]
        realtime: bool,
    },
    /// Show posts published during the run
    Posts {
        /// Simulation ID
        simulation_id: String,

        /// Platform (reddit, twitter)
        #[arg(long, default_value_t = Platform::Reddit)]
        platform: Platform,

        /// Posts per page
        #[arg(long, default_value_t = 50)]
        limit: u32,

        /// Posts to skip
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },
    /// Show activity per round
    Timeline {
        /// Simulation ID
        simulation_id: String,

        /// First round
        #[arg(long, default_value_t = 0)]
        start_round: u32,

        /// Last round (default: latest)
        #[arg(long)]
        end_round: Option<u32>,
    },
    /// Show activity totals per agent
    AgentStats {
        /// Simulation ID
        simulation_id: String,
    },
    /// Show agent actions
    Actions {
        /// Simulation ID
        simulation_id: String,

        /// Maximum number of actions
        #[arg(long)]
        limit: Option<u32>,

        /// Actions to skip
        #[arg(long)]
        offset: Option<u32>,

        /// Only actions on this platform
        #[arg(long)]
        platform: Option<Platform>,

        /// Only actions of this agent
        #[arg(long)]
        agent_id: Option<String>,

        /// Only actions of this round
        #[arg(long)]
        round: Option<u32>,
    },
    /// List simulations
    List {
        /// Only simulations of this project
        #[arg(long)]
        project_id: Option<String>,
    },
    /// Show recent simulations
    History {
        /// Number of entries
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    /// Ask agents of a running simulation questions
    Interview {
        /// Simulation ID
        simulation_id: String,

        /// Question as AGENT_ID=PROMPT (repeatable)
        #[arg(short = 'a', long = "ask", required = true, value_parser = parse_interview)]
        interviews: Vec<Interview>,
    },
}

/// Handle simulation commands
///
/// # Arguments
/// * `command` - The simulation command to execute
/// * `config` - The CLI configuration
pub async fn handle_simulation_command(command: SimulationCommands, config: &Config) -> Result<()> {
    let client = config.client()?;

    match command {
        SimulationCommands::Create {
            project_id,
            graph_id,
            twitter,
            reddit,
        } => {
            let ack = client
                .create_simulation(&CreateSimulation {
                    project_id,
                    graph_id,
                    enable_twitter: twitter.then_some(true),
                    enable_reddit: reddit.then_some(true),
                })
                .await
                .context("Failed to create simulation")?;
            print_ack("Created", &ack);
            Ok(())
        }
        SimulationCommands::Prepare {
            simulation_id,
            entity_types,
            llm_profiles,
            parallel,
            force,
            wait,
        } => {
            let ack = client
                .prepare_simulation(&PrepareSimulation {
                    simulation_id: simulation_id.clone(),
                    entity_types: (!entity_types.is_empty()).then_some(entity_types),
                    use_llm_for_profiles: llm_profiles.then_some(true),
                    parallel_profile_count: parallel,
                    force_regenerate: force.then_some(true),
                })
                .await
                .context("Failed to submit preparation")?;
            print_ack("Preparing", &ack);

            if wait {
                let query = PrepareStatusQuery::from_ids(ack.task_id, Some(simulation_id))
                    .ok_or_else(|| anyhow!("No task or simulation to poll"))?;
                wait_for_prepare(&client, query, config).await?;
            }
            Ok(())
        }
        SimulationCommands::PrepareStatus {
            task_id,
            simulation_id,
            wait,
        } => {
            if wait {
                let Some(query) = PrepareStatusQuery::from_ids(task_id, simulation_id) else {
                    bail!("Either --task-id or --simulation-id is required");
                };
                wait_for_prepare(&client, query, config).await
            } else {
                let status = client
                    .get_prepare_status_by_ids(task_id, simulation_id)
                    .await?;
                print_prepare_status(&status);
                Ok(())
            }
        }
        SimulationCommands::Start {
            simulation_id,
            platform,
            max_rounds,
        } => {
            let ack = client
                .start_simulation(&StartSimulation {
                    simulation_id,
                    platform,
                    max_rounds,
                    enable_graph_memory_update: None,
                })
                .await
                .context("Failed to start simulation")?;
            print_ack("Started", &ack);
            Ok(())
        }
        SimulationCommands::Stop { simulation_id } => {
            let ack = client
                .stop_simulation(&simulation_id)
                .await
                .context("Failed to stop simulation")?;
            print_ack("Stopped", &ack);
            Ok(())
        }
        SimulationCommands::CloseEnv {
            simulation_id,
            timeout,
        } => {
            let closed = client
                .close_simulation_env(&CloseEnv {
                    simulation_id: simulation_id.clone(),
                    timeout,
                })
                .await
                .context("Failed to close simulation environment")?;
            println!(
                "{} Environment of {} closed: {}",
                "✓".green(),
                simulation_id.cyan(),
                closed.status
            );
            if let Some(message) = &closed.message {
                println!("  {}", message.dimmed());
            }
            Ok(())
        }
        SimulationCommands::EnvStatus { simulation_id } => {
            print_json(&client.get_env_status(&simulation_id).await?);
            Ok(())
        }
        SimulationCommands::Get { simulation_id } => {
            print_json(&client.get_simulation(&simulation_id).await?);
            Ok(())
        }
        SimulationCommands::RunStatus {
            simulation_id,
            detail,
        } => {
            let status = if detail {
                client.get_run_status_detail(&simulation_id).await?
            } else {
                client.get_run_status(&simulation_id).await?
            };
            print_json(&status);
            Ok(())
        }
        SimulationCommands::Profiles {
            simulation_id,
            platform,
            realtime,
        } => {
            let query = ProfilesQuery { platform };
            let profiles = if realtime {
                client
                    .get_simulation_profiles_realtime(&simulation_id, &query)
                    .await?
            } else {
                client.get_simulation_profiles(&simulation_id, &query).await?
            };
            print_json(&profiles);
            Ok(())
        }
        SimulationCommands::Config {
            simulation_id,
            realtime,
        } => {
            let runtime = if realtime {
                client.get_simulation_config_realtime(&simulation_id).await?
            } else {
                client.get_simulation_config(&simulation_id).await?
            };
            print_json(&runtime);
            Ok(())
        }
        SimulationCommands::Posts {
            simulation_id,
            platform,
            limit,
            offset,
        } => {
            let query = PostsQuery {
                platform,
                limit,
                offset,
            };
            print_json(&client.get_simulation_posts(&simulation_id, &query).await?);
            Ok(())
        }
        SimulationCommands::Timeline {
            simulation_id,
            start_round,
            end_round,
        } => {
            let query = TimelineQuery {
                start_round,
                end_round,
            };
            print_json(&client.get_simulation_timeline(&simulation_id, &query).await?);
            Ok(())
        }
        SimulationCommands::AgentStats { simulation_id } => {
            print_json(&client.get_agent_stats(&simulation_id).await?);
            Ok(())
        }
        SimulationCommands::Actions {
            simulation_id,
            limit,
            offset,
            platform,
            agent_id,
            round,
        } => {
            let query = ActionsQuery {
                limit,
                offset,
                platform,
                agent_id,
                round_num: round,
            };
            print_json(&client.get_simulation_actions(&simulation_id, &query).await?);
            Ok(())
        }
        SimulationCommands::List { project_id } => {
            print_json(&client.list_simulations(project_id.as_deref()).await?);
            Ok(())
        }
        SimulationCommands::History { limit } => {
            print_json(&client.simulation_history(limit).await?);
            Ok(())
        }
        SimulationCommands::Interview {
            simulation_id,
            interviews,
        } => {
            let results = client
                .interview_agents(&InterviewBatch {
                    simulation_id,
                    interviews,
                })
                .await
                .context("Interview failed")?;

            for result in &results.results {
                let name = result.agent_name.as_deref().unwrap_or(&result.agent_id);
                println!("{} {}", "▸".cyan(), name.bold());
                match &result.response {
                    Some(response) => println!("  {}", response),
                    None => println!("  {}", "(no response)".dimmed()),
                }
            }
            println!(
                "{}",
                format!(
                    "{} of {} interview(s) succeeded",
                    results.successful, results.total
                )
                .dimmed()
            );
            Ok(())
        }
    }
}

/// Parses `AGENT_ID=PROMPT`
fn parse_interview(s: &str) -> std::result::Result<Interview, String> {
    let (agent_id, prompt) = s
        .split_once('=')
        .ok_or_else(|| format!("expected AGENT_ID=PROMPT, got '{}'", s))?;

    let agent_id = agent_id.trim();
    if agent_id.is_empty() || prompt.trim().is_empty() {
        return Err(format!("expected AGENT_ID=PROMPT, got '{}'", s));
    }

    Ok(Interview {
        agent_id: agent_id.to_string(),
        prompt: prompt.trim().to_string(),
    })
}

fn print_ack(verb: &str, ack: &SimulationAck) {
    println!(
        "{} {} simulation {}",
        "✓".green(),
        verb,
        ack.simulation_id.cyan()
    );
    if let Some(status) = &ack.status {
        println!("  Status:  {}", status);
    }
    if let Some(task_id) = &ack.task_id {
        println!("  Task:    {}", task_id.dimmed());
    }
    if let Some(message) = &ack.message {
        println!("  Message: {}", message.dimmed());
    }
}

fn print_prepare_status(status: &PrepareStatus) {
    println!("  Status:   {}", colorize_status(status.job.status));
    println!("  Progress: {}%", status.job.progress);
    if let (Some(done), Some(total)) = (status.profiles_generated, status.total_profiles) {
        println!("  Profiles: {}/{}", done, total);
    }
    if let Some(error) = &status.job.error {
        println!("  Error:    {}", error.red());
    }
}

async fn wait_for_prepare(
    client: &simlab_client::SimlabClient,
    query: PrepareStatusQuery,
    config: &Config,
) -> Result<()> {
    println!("{}", "Waiting for preparation...".bold());
    let status = client
        .wait_for_prepare(query, &config.cancel, |s| print_progress(&s.job))
        .await
        .context("Preparation did not complete")?;

    println!("{} Preparation completed", "✓".green());
    print_prepare_status(&status);
    Ok(())
}
