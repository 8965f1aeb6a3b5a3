//! Simulation-related API endpoints

use crate::SimlabClient;
use crate::error::{ClientError, Result};
use serde_json::Value;
use simlab_core::dto::simulation::{
    ActionsQuery, CloseEnv, CreateSimulation, EnvClosed, InterviewBatch, InterviewResults,
    PostsQuery, PrepareSimulation, PrepareStatus, PrepareStatusQuery, ProfilesQuery,
    SimulationAck, SimulationRef, StartSimulation, TimelineQuery,
};
use tracing::info;

impl SimlabClient {
    // =============================================================================
    // Simulation Lifecycle
    // =============================================================================

    /// Create a simulation for a project's graph
    pub async fn create_simulation(&self, req: &CreateSimulation) -> Result<SimulationAck> {
        let ack: SimulationAck = self
            .post_json_with_retry("/api/simulation/create", req)
            .await?;

        info!(
            "Simulation {} created for project {}",
            ack.simulation_id, req.project_id
        );
        Ok(ack)
    }

    /// Start preparing a simulation (agent profiles, runtime config)
    ///
    /// # Returns
    /// The acknowledgement; its `task_id`, when present, tracks preparation
    pub async fn prepare_simulation(&self, req: &PrepareSimulation) -> Result<SimulationAck> {
        let ack: SimulationAck = self
            .post_json_with_retry("/api/simulation/prepare", req)
            .await?;

        info!(
            "Preparation of simulation {} submitted (task {})",
            req.simulation_id,
            ack.task_id.as_deref().unwrap_or("-")
        );
        Ok(ack)
    }

    /// Get preparation progress by task id or simulation id
    pub async fn get_prepare_status(&self, query: &PrepareStatusQuery) -> Result<PrepareStatus> {
        self.post_json("/api/simulation/prepare/status", query)
            .await
    }

    /// Get preparation progress from whichever ids are known
    ///
    /// The task id takes precedence; with neither id nothing is sent.
    pub async fn get_prepare_status_by_ids(
        &self,
        task_id: Option<String>,
        simulation_id: Option<String>,
    ) -> Result<PrepareStatus> {
        let query = PrepareStatusQuery::from_ids(task_id, simulation_id).ok_or_else(|| {
            ClientError::InvalidRequest(
                "preparation status needs a task_id or a simulation_id".to_string(),
            )
        })?;

        self.get_prepare_status(&query).await
    }

    /// Start running a prepared simulation
    pub async fn start_simulation(&self, req: &StartSimulation) -> Result<SimulationAck> {
        let ack: SimulationAck = self
            .post_json_with_retry("/api/simulation/start", req)
            .await?;

        info!("Simulation {} started", req.simulation_id);
        Ok(ack)
    }

    /// Stop a running simulation
    ///
    /// Sent exactly once: repeating a stop is not guaranteed to be harmless.
    pub async fn stop_simulation(&self, simulation_id: &str) -> Result<SimulationAck> {
        let req = SimulationRef {
            simulation_id: simulation_id.to_string(),
        };
        let ack: SimulationAck = self.post_json("/api/simulation/stop", &req).await?;

        info!("Simulation {} stopped", simulation_id);
        Ok(ack)
    }

    /// Shut down a simulation environment and free its resources
    ///
    /// Sent exactly once, like [`SimlabClient::stop_simulation`].
    pub async fn close_simulation_env(&self, req: &CloseEnv) -> Result<EnvClosed> {
        let closed: EnvClosed = self.post_json("/api/simulation/close-env", req).await?;

        info!(
            "Environment of simulation {} closed: {}",
            req.simulation_id, closed.status
        );
        Ok(closed)
    }

    /// Get the state of a simulation environment
    pub async fn get_env_status(&self, simulation_id: &str) -> Result<Value> {
        let req = SimulationRef {
            simulation_id: simulation_id.to_string(),
        };
        self.post_json("/api/simulation/env-status", &req).await
    }

    // =============================================================================
    // Interviews
    // =============================================================================

    /// Ask a batch of questions to agents of a running simulation
    pub async fn interview_agents(&self, req: &InterviewBatch) -> Result<InterviewResults> {
        let results: InterviewResults = self
            .post_json_with_retry("/api/simulation/interview/batch", req)
            .await?;

        info!(
            "Interviewed {} agent(s) of simulation {}: {} ok, {} failed",
            results.total, req.simulation_id, results.successful, results.failed
        );
        Ok(results)
    }

    // =============================================================================
    // Simulation Queries
    // =============================================================================

    /// Get a simulation's details
    pub async fn get_simulation(&self, simulation_id: &str) -> Result<Value> {
        self.get_json(self.api_url(&["simulation", simulation_id])?)
            .await
    }

    /// Get the run progress of a simulation (rounds, actions per platform)
    pub async fn get_run_status(&self, simulation_id: &str) -> Result<Value> {
        self.get_json(self.api_url(&["simulation", simulation_id, "run-status"])?)
            .await
    }

    /// Get the run progress including the most recent agent actions
    pub async fn get_run_status_detail(&self, simulation_id: &str) -> Result<Value> {
        self.get_json(self.api_url(&["simulation", simulation_id, "run-status", "detail"])?)
            .await
    }

    /// List simulations, optionally restricted to one project
    pub async fn list_simulations(&self, project_id: Option<&str>) -> Result<Value> {
        let url = self.url("/api/simulation/list");
        match project_id {
            Some(project_id) => {
                self.get_json_with_query(url, &[("project_id", project_id)])
                    .await
            }
            None => self.get_json(url).await,
        }
    }

    /// Get the most recent simulations
    pub async fn simulation_history(&self, limit: u32) -> Result<Value> {
        self.get_json_with_query(self.url("/api/simulation/history"), &[("limit", limit)])
            .await
    }

    // =============================================================================
    // Agents and Configuration
    // =============================================================================

    /// Get the saved agent profiles of one platform
    pub async fn get_simulation_profiles(
        &self,
        simulation_id: &str,
        query: &ProfilesQuery,
    ) -> Result<Value> {
        let url = self.api_url(&["simulation", simulation_id, "profiles"])?;
        self.get_json_with_query(url, query).await
    }

    /// Get the agent profiles generated so far, while preparation runs
    pub async fn get_simulation_profiles_realtime(
        &self,
        simulation_id: &str,
        query: &ProfilesQuery,
    ) -> Result<Value> {
        let url = self.api_url(&["simulation", simulation_id, "profiles", "realtime"])?;
        self.get_json_with_query(url, query).await
    }

    /// Get the runtime configuration of a prepared simulation
    pub async fn get_simulation_config(&self, simulation_id: &str) -> Result<Value> {
        self.get_json(self.api_url(&["simulation", simulation_id, "config"])?)
            .await
    }

    /// Get the runtime configuration as far as preparation has written it
    pub async fn get_simulation_config_realtime(&self, simulation_id: &str) -> Result<Value> {
        self.get_json(self.api_url(&["simulation", simulation_id, "config", "realtime"])?)
            .await
    }

    /// Get per-agent activity totals
    pub async fn get_agent_stats(&self, simulation_id: &str) -> Result<Value> {
        self.get_json(self.api_url(&["simulation", simulation_id, "agent-stats"])?)
            .await
    }

    // =============================================================================
    // Simulation Output
    // =============================================================================

    /// Get a page of posts published on one platform
    pub async fn get_simulation_posts(
        &self,
        simulation_id: &str,
        query: &PostsQuery,
    ) -> Result<Value> {
        let url = self.api_url(&["simulation", simulation_id, "posts"])?;
        self.get_json_with_query(url, query).await
    }

    /// Get per-round activity between two rounds
    pub async fn get_simulation_timeline(
        &self,
        simulation_id: &str,
        query: &TimelineQuery,
    ) -> Result<Value> {
        let url = self.api_url(&["simulation", simulation_id, "timeline"])?;
        self.get_json_with_query(url, query).await
    }

    /// Get agent actions matching the given filters
    pub async fn get_simulation_actions(
        &self,
        simulation_id: &str,
        query: &ActionsQuery,
    ) -> Result<Value> {
        let url = self.api_url(&["simulation", simulation_id, "actions"])?;
        self.get_json_with_query(url, query).await
    }
}
