// SPDX-FileCopyrightText: 2026 Dataline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! ExecutionAdapter implementation over the coordinator REST API.

use std::str::FromStr;

use async_trait::async_trait;

use dataline_config::model::EngineConfig;
use dataline_core::types::{
    AdapterType, ExecutionState, ExecutionStatus, HealthStatus, ResultSet,
};
use dataline_core::{DatalineError, ExecutionAdapter, PluginAdapter};

use crate::client::EngineClient;
use crate::types::SubmitRequest;

/// Execution adapter backed by an HTTP coordinator.
pub struct HttpQueryEngine {
    client: EngineClient,
    database: String,
    workgroup: String,
}

impl HttpQueryEngine {
    pub fn new(config: &EngineConfig) -> Result<Self, DatalineError> {
        Ok(Self {
            client: EngineClient::new(&config.base_url)?,
            database: config.database.clone(),
            workgroup: config.workgroup.clone(),
        })
    }
}

#[async_trait]
impl PluginAdapter for HttpQueryEngine {
    fn name(&self) -> &str {
        "http-engine"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Execution
    }

    async fn health_check(&self) -> Result<HealthStatus, DatalineError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), DatalineError> {
        Ok(())
    }
}

#[async_trait]
impl ExecutionAdapter for HttpQueryEngine {
    async fn submit(&self, sql: &str, output_location: &str) -> Result<String, DatalineError> {
        let request = SubmitRequest {
            query: sql.to_string(),
            database: self.database.clone(),
            workgroup: self.workgroup.clone(),
            output_location: output_location.to_string(),
        };
        let response = self.client.submit(&request).await?;
        Ok(response.execution_id)
    }

    async fn status(&self, execution_id: &str) -> Result<ExecutionStatus, DatalineError> {
        let response = self.client.status(execution_id).await?;
        let state = ExecutionState::from_str(&response.state).map_err(|_| {
            DatalineError::Internal(format!(
                "engine reported unknown execution state `{}`",
                response.state
            ))
        })?;
        Ok(ExecutionStatus {
            state,
            reason: response.reason,
        })
    }

    async fn fetch_results(
        &self,
        execution_id: &str,
        max_rows: u32,
    ) -> Result<ResultSet, DatalineError> {
        let response = self.client.results(execution_id, max_rows).await?;
        Ok(ResultSet {
            columns: response.columns.into_iter().map(|c| c.name).collect(),
            rows: response.rows.into_iter().map(|r| r.data).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn engine(base_url: &str) -> HttpQueryEngine {
        HttpQueryEngine::new(&EngineConfig {
            base_url: base_url.to_string(),
            ..EngineConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn status_maps_wire_state_to_enum() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/executions/e1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "state": "CANCELLED",
                "reason": "cancelled by operator"
            })))
            .mount(&server)
            .await;

        let status = engine(&server.uri()).status("e1").await.unwrap();
        assert_eq!(status.state, ExecutionState::Cancelled);
        assert_eq!(status.reason.as_deref(), Some("cancelled by operator"));
    }

    #[tokio::test]
    async fn unknown_state_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/executions/e1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"state": "EXPLODED"})),
            )
            .mount(&server)
            .await;

        let err = engine(&server.uri()).status("e1").await.unwrap_err();
        assert!(err.to_string().contains("EXPLODED"));
    }

    #[tokio::test]
    async fn fetch_results_flattens_wire_shape() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/executions/e1/results"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "columns": [{"name": "date"}, {"name": "event_count"}],
                "rows": [
                    {"data": ["date", "event_count"]},
                    {"data": ["01-08-2026", "12"]}
                ]
            })))
            .mount(&server)
            .await;

        let results = engine(&server.uri()).fetch_results("e1", 1000).await.unwrap();
        assert_eq!(results.columns, vec!["date", "event_count"]);
        assert_eq!(results.rows.len(), 2);
        assert_eq!(results.rows[1][0].as_deref(), Some("01-08-2026"));
    }
}
