//! Simulation DTOs

use serde::{Deserialize, Serialize};

use crate::domain::job::{AsJobSnapshot, JobSnapshot};

/// Request to create a simulation for a project
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateSimulation {
    pub project_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_twitter: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_reddit: Option<bool>,
}

/// Request to prepare a simulation environment (agent profiles, config)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrepareSimulation {
    pub simulation_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_types: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_llm_for_profiles: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallel_profile_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force_regenerate: Option<bool>,
}

/// Request to start a prepared simulation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StartSimulation {
    pub simulation_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_rounds: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_graph_memory_update: Option<bool>,
}

/// Body for calls that only name a simulation (stop, env status)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationRef {
    pub simulation_id: String,
}

/// Request to shut down a simulation environment and free its resources
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloseEnv {
    pub simulation_id: String,
    /// Graceful shutdown budget in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,
}

/// Response of create / prepare / start / stop
///
/// `status` is the simulation's own lifecycle (created, preparing, running,
/// stopped, ...), which is not the job status domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationAck {
    pub simulation_id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response of closing an environment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvClosed {
    #[serde(default)]
    pub simulation_id: Option<String>,
    pub status: String,
    #[serde(default)]
    pub resources_freed: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Lookup key for the preparation status endpoint
///
/// Exactly one key is sent. When both a task id and a simulation id are
/// known, the task id wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrepareStatusQuery {
    #[serde(rename = "task_id")]
    Task(String),
    #[serde(rename = "simulation_id")]
    Simulation(String),
}

impl PrepareStatusQuery {
    /// Picks the lookup key, preferring the task id
    pub fn from_ids(task_id: Option<String>, simulation_id: Option<String>) -> Option<Self> {
        match (task_id, simulation_id) {
            (Some(task_id), _) => Some(Self::Task(task_id)),
            (None, Some(simulation_id)) => Some(Self::Simulation(simulation_id)),
            (None, None) => None,
        }
    }
}

/// Preparation progress
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepareStatus {
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub simulation_id: Option<String>,
    #[serde(default)]
    pub profiles_generated: Option<u32>,
    #[serde(default)]
    pub total_profiles: Option<u32>,
    #[serde(flatten)]
    pub job: JobSnapshot,
}

impl AsJobSnapshot for PrepareStatus {
    fn job(&self) -> &JobSnapshot {
        &self.job
    }
}

/// A single question for one agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interview {
    pub agent_id: String,
    pub prompt: String,
}

/// Batch of questions for agents of one simulation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewBatch {
    pub simulation_id: String,
    pub interviews: Vec<Interview>,
}

/// One agent's answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewResult {
    pub agent_id: String,
    #[serde(default)]
    pub agent_name: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub response: Option<String>,
}

/// Outcome of an interview batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewResults {
    #[serde(default)]
    pub results: Vec<InterviewResult>,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub successful: u32,
    #[serde(default)]
    pub failed: u32,
}

/// Social platform simulated by the engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Reddit,
    Twitter,
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::Reddit => write!(f, "reddit"),
            Platform::Twitter => write!(f, "twitter"),
        }
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "reddit" => Ok(Platform::Reddit),
            "twitter" => Ok(Platform::Twitter),
            other => Err(format!("unknown platform '{}' (expected reddit or twitter)", other)),
        }
    }
}

/// Query of the agent profile endpoints
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfilesQuery {
    pub platform: Platform,
}

/// Page of posts of one platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostsQuery {
    pub platform: Platform,
    pub limit: u32,
    pub offset: u32,
}

impl Default for PostsQuery {
    fn default() -> Self {
        Self {
            platform: Platform::default(),
            limit: 50,
            offset: 0,
        }
    }
}

/// Range of rounds for the timeline; an open end means up to the latest
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineQuery {
    pub start_round: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_round: Option<u32>,
}

/// Filters of the action history; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionsQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round_num: Option<u32>,
}
