//! Report-related API endpoints

use crate::SimlabClient;
use crate::error::Result;
use serde_json::Value;
use simlab_core::domain::log::{LogBatch, LogStreamKind};
use simlab_core::dto::report::{ChatReply, GenerateReport, ReportAccepted, ReportChat, ReportStatus};
use tracing::info;

impl SimlabClient {
    // =============================================================================
    // Report Generation
    // =============================================================================

    /// Start generating the report of a finished simulation
    ///
    /// # Returns
    /// The report identifier used by the status and log endpoints
    pub async fn generate_report(&self, req: &GenerateReport) -> Result<ReportAccepted> {
        let accepted: ReportAccepted = self
            .post_json_with_retry("/api/report/generate", req)
            .await?;

        info!(
            "Report generation submitted for simulation {}: report {}",
            req.simulation_id, accepted.report_id
        );
        Ok(accepted)
    }

    /// Get the generation status of a report
    pub async fn get_report_status(&self, report_id: &str) -> Result<ReportStatus> {
        self.get_json_with_query(
            self.url("/api/report/generate/status"),
            &[("report_id", report_id)],
        )
            .await
    }

    /// Get the finished report
    pub async fn get_report(&self, report_id: &str) -> Result<Value> {
        self.get_json(self.api_url(&["report", report_id])?).await
    }

    // =============================================================================
    // Report Logs
    // =============================================================================

    /// Read one window of a report log
    ///
    /// # Arguments
    /// * `report_id` - Report whose log to read
    /// * `kind` - Agent or console stream
    /// * `from_line` - Index of the first line wanted
    pub async fn get_report_log(
        &self,
        report_id: &str,
        kind: LogStreamKind,
        from_line: u64,
    ) -> Result<LogBatch> {
        let url = self.api_url(&["report", report_id, kind.path_segment()])?;
        self.get_json_with_query(url, &[("from_line", from_line)])
            .await
    }

    /// Read one window of the agent log
    pub async fn get_agent_log(&self, report_id: &str, from_line: u64) -> Result<LogBatch> {
        self.get_report_log(report_id, LogStreamKind::Agent, from_line)
            .await
    }

    /// Read one window of the console log
    pub async fn get_console_log(&self, report_id: &str, from_line: u64) -> Result<LogBatch> {
        self.get_report_log(report_id, LogStreamKind::Console, from_line)
            .await
    }

    // =============================================================================
    // Report Chat
    // =============================================================================

    /// Ask the report agent a question
    ///
    /// Send the returned `chat_history` with the next question to keep the
    /// conversation going.
    pub async fn chat_with_report(&self, req: &ReportChat) -> Result<ChatReply> {
        self.post_json_with_retry("/api/report/chat", req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::LogCursor;
    use crate::error::ClientError;
    use crate::test_support;
    use axum::Router;
    use axum::extract::{Path, Query, State};
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use serde::Deserialize;
    use serde_json::json;
    use simlab_core::dto::report::ChatTurn;
    use std::sync::{Arc, Mutex};

    #[derive(Deserialize)]
    struct FromLine {
        from_line: u64,
    }

    /// Agent log of 12 lines served 10 at a time
    #[derive(Default)]
    struct MockLogApi {
        requests: Mutex<Vec<(String, u64)>>,
    }

    async fn report_log(
        State(api): State<Arc<MockLogApi>>,
        Path((report_id, stream)): Path<(String, String)>,
        Query(query): Query<FromLine>,
    ) -> axum::Json<Value> {
        assert_eq!(report_id, "rep-1");
        api.requests
            .lock()
            .unwrap()
            .push((stream, query.from_line));

        let total = 12u64;
        let start = query.from_line.min(total);
        let end = (start + 10).min(total);
        let logs: Vec<String> = (start..end).map(|i| format!("line {}", i)).collect();
        test_support::ok(json!({
            "logs": logs,
            "from_line": start,
            "to_line": end.saturating_sub(1),
            "total_lines": total,
            "has_more": end < total
        }))
    }

    fn log_router(api: Arc<MockLogApi>) -> Router {
        Router::new()
            .route("/api/report/{report_id}/{stream}", get(report_log))
            .with_state(api)
    }

    #[tokio::test]
    async fn test_agent_log_resumes_after_last_line() {
        let api = Arc::new(MockLogApi::default());
        let base_url = test_support::serve(log_router(Arc::clone(&api))).await;
        let client = test_support::client(&base_url);
        let source = client.report_log("rep-1", LogStreamKind::Agent);
        let mut cursor = LogCursor::new();

        let first = cursor.fetch_next(&source).await.unwrap();
        assert_eq!(first.logs.len(), 10);
        assert_eq!(first.to_line, 9);
        assert!(first.has_more);
        assert_eq!(cursor.from_line(), 10);

        let second = cursor.fetch_next(&source).await.unwrap();
        assert_eq!(second.logs, vec!["line 10", "line 11"]);
        assert!(!second.has_more);
        assert_eq!(cursor.lines().len(), 12);

        assert_eq!(
            *api.requests.lock().unwrap(),
            vec![("agent-log".to_string(), 0), ("agent-log".to_string(), 10)]
        );
    }

    #[tokio::test]
    async fn test_console_log_uses_its_own_path() {
        let api = Arc::new(MockLogApi::default());
        let base_url = test_support::serve(log_router(Arc::clone(&api))).await;
        let client = test_support::client(&base_url);

        let batch = client.get_console_log("rep-1", 11).await.unwrap();
        assert_eq!(batch.logs, vec!["line 11"]);
        assert_eq!(
            *api.requests.lock().unwrap(),
            vec![("console-log".to_string(), 11)]
        );
    }

    #[derive(Deserialize)]
    struct ReportIdQuery {
        report_id: String,
    }

    #[tokio::test]
    async fn test_report_status_and_generation() {
        let router = Router::new()
            .route(
                "/api/report/generate",
                post(|axum::Json(body): axum::Json<Value>| async move {
                    assert_eq!(body["simulation_id"], "sim-9");
                    test_support::ok(json!({ "report_id": "rep-1", "status": "pending" }))
                }),
            )
            .route(
                "/api/report/generate/status",
                get(|Query(q): Query<ReportIdQuery>| async move {
                    test_support::ok(json!({
                        "report_id": q.report_id,
                        "status": "processing",
                        "progress": 35,
                        "current_step": "interviewing agents"
                    }))
                }),
            );
        let base_url = test_support::serve(router).await;
        let client = test_support::client(&base_url);

        let accepted = client
            .generate_report(&GenerateReport {
                simulation_id: "sim-9".to_string(),
                force_regenerate: None,
            })
            .await
            .unwrap();
        assert_eq!(accepted.report_id, "rep-1");

        let status = client.get_report_status(&accepted.report_id).await.unwrap();
        assert_eq!(status.report_id.as_deref(), Some("rep-1"));
        assert_eq!(status.job.progress, 35);
        assert_eq!(status.job.current_step.as_deref(), Some("interviewing agents"));
    }

    #[tokio::test]
    async fn test_chat_business_failure_is_not_retried() {
        let calls = Arc::new(Mutex::new(0u32));
        let counter = Arc::clone(&calls);
        let router = Router::new().route(
            "/api/report/chat",
            post(move || {
                let counter = Arc::clone(&counter);
                async move {
                    *counter.lock().unwrap() += 1;
                    (
                        StatusCode::OK,
                        axum::Json(json!({ "success": false, "error": "report not ready" })),
                    )
                }
            }),
        );
        let base_url = test_support::serve(router).await;
        let client = test_support::client(&base_url);

        let err = client
            .chat_with_report(&ReportChat {
                simulation_id: "sim-9".to_string(),
                message: "who bought the most shoes?".to_string(),
                chat_history: vec![ChatTurn {
                    role: "user".to_string(),
                    content: "hello".to_string(),
                }],
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::Business { ref message } if message == "report not ready"));
        assert_eq!(*calls.lock().unwrap(), 1);
    }
}
