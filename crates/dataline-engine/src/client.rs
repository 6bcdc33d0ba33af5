// SPDX-FileCopyrightText: 2026 Dataline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the engine coordinator.
//!
//! Transport and coordinator-side errors surface as infrastructure errors;
//! engine-reported query failure is carried in the status payload, not an
//! HTTP error, so the orchestrator can distinguish the two.

use std::time::Duration;

use dataline_core::DatalineError;
use tracing::{debug, warn};

use crate::types::{
    EngineErrorResponse, ResultsResponse, StatusResponse, SubmitRequest, SubmitResponse,
};

/// HTTP client for the coordinator REST API.
#[derive(Debug, Clone)]
pub struct EngineClient {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
}

impl EngineClient {
    pub fn new(base_url: &str) -> Result<Self, DatalineError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| DatalineError::Internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_retries: 1,
        })
    }

    /// Submit a query for execution. Returns the execution id.
    pub async fn submit(&self, request: &SubmitRequest) -> Result<SubmitResponse, DatalineError> {
        let url = format!("{}/v1/executions", self.base_url);
        self.send_json(|| self.client.post(&url).json(request), "submit")
            .await
    }

    /// Fetch the current status of an execution.
    pub async fn status(&self, execution_id: &str) -> Result<StatusResponse, DatalineError> {
        let url = format!("{}/v1/executions/{execution_id}", self.base_url);
        self.send_json(|| self.client.get(&url), "status").await
    }

    /// Fetch up to `max_rows` rows of a succeeded execution's results.
    pub async fn results(
        &self,
        execution_id: &str,
        max_rows: u32,
    ) -> Result<ResultsResponse, DatalineError> {
        let url = format!(
            "{}/v1/executions/{execution_id}/results?max_rows={max_rows}",
            self.base_url
        );
        self.send_json(|| self.client.get(&url), "results").await
    }

    /// Send a request, retrying once on transient errors, and decode the
    /// JSON body.
    async fn send_json<T, F>(&self, build: F, operation: &str) -> Result<T, DatalineError>
    where
        T: serde::de::DeserializeOwned,
        F: Fn() -> reqwest::RequestBuilder,
    {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, operation, "retrying engine request after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = build().send().await.map_err(|e| {
                DatalineError::Internal(format!("engine {operation} request failed: {e}"))
            })?;

            let status = response.status();
            debug!(status = %status, attempt, operation, "engine response received");

            if status.is_success() {
                let body = response.text().await.map_err(|e| {
                    DatalineError::Internal(format!("failed to read engine response: {e}"))
                })?;
                return serde_json::from_str(&body).map_err(|e| {
                    DatalineError::Internal(format!("failed to parse engine response: {e}"))
                });
            }

            if is_transient_error(status) && attempt < self.max_retries {
                let body = response.text().await.unwrap_or_default();
                warn!(status = %status, body = %body, operation, "transient engine error, will retry");
                last_error = Some(DatalineError::Internal(format!(
                    "engine returned {status}: {body}"
                )));
                continue;
            }

            let body = response.text().await.unwrap_or_default();
            let message = if let Ok(err) = serde_json::from_str::<EngineErrorResponse>(&body) {
                format!("engine {operation} error: {}", err.message)
            } else {
                format!("engine returned {status}: {body}")
            };
            return Err(DatalineError::Internal(message));
        }

        Err(last_error
            .unwrap_or_else(|| DatalineError::Internal("engine request failed after retries".into())))
    }
}

/// Returns true for HTTP status codes that indicate transient errors worth retrying.
fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502 | 503)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn submit_request() -> SubmitRequest {
        SubmitRequest {
            query: "SELECT app_name FROM usage".into(),
            database: "analytics".into(),
            workgroup: "primary".into(),
            output_location: "athena-results/u1/c1/".into(),
        }
    }

    #[tokio::test]
    async fn submit_posts_execution_context() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/executions"))
            .and(body_partial_json(serde_json::json!({
                "database": "analytics",
                "workgroup": "primary"
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"execution_id": "exec-1"})),
            )
            .mount(&server)
            .await;

        let client = EngineClient::new(&server.uri()).unwrap();
        let response = client.submit(&submit_request()).await.unwrap();
        assert_eq!(response.execution_id, "exec-1");
    }

    #[tokio::test]
    async fn status_decodes_state_and_reason() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/executions/exec-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "state": "FAILED",
                "reason": "SYNTAX_ERROR: line 1"
            })))
            .mount(&server)
            .await;

        let client = EngineClient::new(&server.uri()).unwrap();
        let status = client.status("exec-1").await.unwrap();
        assert_eq!(status.state, "FAILED");
        assert_eq!(status.reason.as_deref(), Some("SYNTAX_ERROR: line 1"));
    }

    #[tokio::test]
    async fn results_passes_row_cap() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/executions/exec-1/results"))
            .and(query_param("max_rows", "1000"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "columns": [{"name": "app_name"}],
                "rows": [{"data": ["app_name"]}, {"data": ["maps"]}]
            })))
            .mount(&server)
            .await;

        let client = EngineClient::new(&server.uri()).unwrap();
        let results = client.results("exec-1", 1000).await.unwrap();
        assert_eq!(results.rows.len(), 2);
    }

    #[tokio::test]
    async fn transient_error_is_retried_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/executions/exec-9"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/executions/exec-9"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"state": "RUNNING"})),
            )
            .mount(&server)
            .await;

        let client = EngineClient::new(&server.uri()).unwrap();
        let status = client.status("exec-9").await.unwrap();
        assert_eq!(status.state, "RUNNING");
    }

    #[tokio::test]
    async fn coordinator_error_body_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/executions"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(serde_json::json!({"message": "unknown workgroup"})),
            )
            .mount(&server)
            .await;

        let client = EngineClient::new(&server.uri()).unwrap();
        let err = client.submit(&submit_request()).await.unwrap_err();
        assert!(err.to_string().contains("unknown workgroup"), "got: {err}");
    }
}
