//! Simlab HTTP Client
//!
//! A type-safe client for the simulation platform API. It submits
//! long-running jobs, polls them to a terminal state and tails their logs.
//!
//! Building blocks:
//! - [`retry::RetryPolicy`]: exponential backoff around a single call
//! - [`poller::TaskPoller`]: status polling state machine
//! - [`cursor::LogCursor`] / [`cursor::LogTail`]: resumable log reads
//! - [`watch::ReportWatch`]: report status and both logs followed together
//!
//! # Example
//!
//! ```no_run
//! use simlab_client::SimlabClient;
//! use simlab_core::dto::graph::BuildGraph;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> simlab_client::Result<()> {
//!     let client = SimlabClient::new("http://localhost:5001");
//!
//!     let task = client.build_graph(&BuildGraph {
//!         project_id: "proj_123".to_string(),
//!         graph_name: Some("shop".to_string()),
//!     }).await?;
//!
//!     let job = client
//!         .wait_for_task(&task.task_id, &CancellationToken::new(), |s| {
//!             println!("{}%", s.progress)
//!         })
//!         .await?;
//!     println!("result: {:?}", job.result);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod cursor;
pub mod error;
mod graph;
pub mod poller;
mod reports;
pub mod retry;
mod simulations;
pub mod watch;

// Re-export commonly used types
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use graph::read_upload;
pub use retry::RetryPolicy;
pub use watch::{ReportWatch, WatchLogs, WatchObserver};

use reqwest::{Client, IntoUrl, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::time::Duration;

/// HTTP client for the simulation platform API
///
/// Endpoint methods are organized into logical groups:
/// - Graph: ontology generation, graph build, task status
/// - Report: generation, status, incremental logs, chat
/// - Simulation: lifecycle, preparation status, interviews
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct SimlabClient {
    /// Base URL of the API (e.g., "http://localhost:5001")
    base_url: String,
    /// HTTP client instance
    client: Client,
    /// Schedule for retried submissions
    retry: RetryPolicy,
    poll_interval: Duration,
    log_interval: Duration,
}

impl SimlabClient {
    /// Create a new client with default settings
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the API (e.g., "http://localhost:5001")
    ///
    /// # Example
    /// ```
    /// use simlab_client::SimlabClient;
    ///
    /// let client = SimlabClient::new("http://localhost:5001");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let defaults = ClientConfig::default();
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            retry: RetryPolicy::default(),
            poll_interval: defaults.poll_interval,
            log_interval: defaults.log_interval,
        }
    }

    /// Create a client from a validated configuration
    ///
    /// The configured request timeout applies to every call.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        config.validate()?;

        let http_client = Client::builder().timeout(config.request_timeout).build()?;

        Ok(Self {
            retry: config.retry_policy()?,
            poll_interval: config.poll_interval,
            log_interval: config.log_interval,
            ..Self::with_client(config.base_url.as_str(), http_client)
        })
    }

    /// Replace the retry schedule used for submissions
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Replace the status poll and log tail cadences
    pub fn with_intervals(mut self, poll_interval: Duration, log_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self.log_interval = log_interval;
        self
    }

    /// Get the base URL of the API
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn log_interval(&self) -> Duration {
        self.log_interval
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// URL of `/api/<segments>`, each segment escaped on its own
    ///
    /// Server-assigned ids go through here so that `/`, `?` or `#` in an id
    /// cannot change the route.
    fn api_url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            ClientError::InvalidConfig(format!("Invalid base URL '{}': {}", self.base_url, e))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                ClientError::InvalidConfig(format!("Base URL '{}' cannot take a path", self.base_url))
            })?
            .pop_if_empty()
            .push("api")
            .extend(segments);
        Ok(url)
    }

    // =============================================================================
    // Request Helpers
    // =============================================================================

    async fn get_json<T: DeserializeOwned>(&self, url: impl IntoUrl) -> Result<T> {
        let response = self.client.get(url).send().await?;

        self.handle_response(response).await
    }

    async fn get_json_with_query<T, Q>(&self, url: impl IntoUrl, query: &Q) -> Result<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let response = self.client.get(url).query(query).send().await?;

        self.handle_response(response).await
    }

    async fn post_json<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self.client.post(self.url(path)).json(body).send().await?;

        self.handle_response(response).await
    }

    /// POST wrapped in the retry policy
    ///
    /// Only for calls that are safe to repeat; business failures are never
    /// retried.
    async fn post_json_with_retry<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + Sync + ?Sized,
    {
        self.retry
            .invoke_when(
                move || self.post_json(path, body),
                ClientError::is_retryable,
            )
            .await
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize its payload
    ///
    /// Non-2xx statuses become [`ClientError::ApiError`]; a body with
    /// `success=false` becomes [`ClientError::Business`]; otherwise the
    /// `data` member of the envelope (or the whole body when there is no
    /// envelope) is deserialized.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = error_message(&body)
                .or_else(|| status.canonical_reason().map(str::to_string))
                .unwrap_or_else(|| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), message));
        }

        decode_envelope(&body)
    }
}

/// Unwraps `{ success, data, error, message }` and deserializes the payload
fn decode_envelope<T: DeserializeOwned>(body: &str) -> Result<T> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))?;

    let payload = match value {
        Value::Object(mut map) if map.contains_key("success") => {
            if matches!(map.get("success"), Some(Value::Bool(false) | Value::Null)) {
                return Err(ClientError::business(
                    failure_message(&map).unwrap_or_else(|| "unknown error".to_string()),
                ));
            }
            match map.remove("data") {
                Some(data) => data,
                None => Value::Object(map),
            }
        }
        other => other,
    };

    serde_json::from_value(payload)
        .map_err(|e| ClientError::ParseError(format!("Unexpected response payload: {}", e)))
}

fn failure_message(map: &Map<String, Value>) -> Option<String> {
    ["error", "message"]
        .iter()
        .find_map(|key| map.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

/// Best-effort error text for a non-2xx response body
fn error_message(body: &str) -> Option<String> {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => failure_message(&map),
        _ if !body.trim().is_empty() => Some(body.trim().to_string()),
        _ => None,
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Payload {
        id: String,
    }

    #[test]
    fn test_client_creation() {
        let client = SimlabClient::new("http://localhost:5001");
        assert_eq!(client.base_url(), "http://localhost:5001");
        assert_eq!(client.retry_policy(), RetryPolicy::default());
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = SimlabClient::new("http://localhost:5001/");
        assert_eq!(client.base_url(), "http://localhost:5001");
    }

    #[test]
    fn test_client_from_config() {
        let config = ClientConfig::new("http://sim:9000/")
            .with_retry(5, Duration::from_millis(20))
            .with_poll_interval(Duration::from_millis(300));

        let client = SimlabClient::from_config(&config).unwrap();
        assert_eq!(client.base_url(), "http://sim:9000");
        assert_eq!(client.retry_policy().max_attempts(), 5);
        assert_eq!(client.poll_interval(), Duration::from_millis(300));
    }

    #[test]
    fn test_client_from_invalid_config() {
        let config = ClientConfig::default().with_retry(0, Duration::from_millis(20));
        assert!(matches!(
            SimlabClient::from_config(&config),
            Err(ClientError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_api_url_escapes_ids() {
        let client = SimlabClient::new("http://localhost:5001");
        let url = client.api_url(&["simulation", "sim/1?x#y", "posts"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:5001/api/simulation/sim%2F1%3Fx%23y/posts"
        );

        let client = SimlabClient::new("http://gateway:8080/simlab/");
        let url = client.api_url(&["report", "rep-1"]).unwrap();
        assert_eq!(url.as_str(), "http://gateway:8080/simlab/api/report/rep-1");
    }

    #[test]
    fn test_api_url_rejects_bad_base() {
        let client = SimlabClient::new("not a url");
        assert!(matches!(
            client.api_url(&["graph", "task", "t-1"]),
            Err(ClientError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_envelope_data_is_unwrapped() {
        let payload: Payload =
            decode_envelope(r#"{"success": true, "data": {"id": "t-1"}}"#).unwrap();
        assert_eq!(payload.id, "t-1");
    }

    #[test]
    fn test_bare_body_is_accepted() {
        let payload: Payload = decode_envelope(r#"{"id": "t-2"}"#).unwrap();
        assert_eq!(payload.id, "t-2");

        let payload: Payload = decode_envelope(r#"{"success": true, "id": "t-3"}"#).unwrap();
        assert_eq!(payload.id, "t-3");
    }

    #[test]
    fn test_success_false_is_business_failure() {
        let err = decode_envelope::<Payload>(
            r#"{"success": false, "error": "project not found", "message": "ignored"}"#,
        )
        .unwrap_err();
        match err {
            ClientError::Business { message } => assert_eq!(message, "project not found"),
            other => panic!("unexpected error: {other}"),
        }

        let err = decode_envelope::<Payload>(r#"{"success": false}"#).unwrap_err();
        assert!(err.is_business());
    }

    #[test]
    fn test_malformed_payload_is_parse_error() {
        assert!(matches!(
            decode_envelope::<Payload>("not json"),
            Err(ClientError::ParseError(_))
        ));
        assert!(matches!(
            decode_envelope::<Payload>(r#"{"success": true, "data": {"name": "x"}}"#),
            Err(ClientError::ParseError(_))
        ));
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(
            error_message(r#"{"error": "boom"}"#),
            Some("boom".to_string())
        );
        assert_eq!(error_message("Bad Gateway\n"), Some("Bad Gateway".to_string()));
        assert_eq!(error_message(""), None);
    }

    #[tokio::test]
    async fn test_non_2xx_is_api_error() {
        use axum::http::StatusCode;
        use axum::routing::get;

        let router = axum::Router::new().route(
            "/api/graph/task/{id}",
            get(|| async {
                (
                    StatusCode::NOT_FOUND,
                    axum::Json(json!({ "success": false, "error": "task not found" })),
                )
            }),
        );
        let base_url = test_support::serve(router).await;

        let err = test_support::client(&base_url)
            .get_task_status("missing")
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert!(err.to_string().contains("task not found"));
    }
}
