// SPDX-FileCopyrightText: 2026 Dataline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scriptable mock execution engine.
//!
//! Status responses are scripted as a sequence; the final status repeats
//! once the script is exhausted, so a single `SUCCEEDED` entry models an
//! engine that finishes immediately, while a run of `RUNNING` entries
//! exercises the poll loop.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use dataline_core::types::{
    AdapterType, ExecutionState, ExecutionStatus, HealthStatus, ResultSet,
};
use dataline_core::{DatalineError, ExecutionAdapter, PluginAdapter};

struct EngineScript {
    statuses: VecDeque<ExecutionStatus>,
    last_status: ExecutionStatus,
    result: ResultSet,
    submissions: Vec<(String, String)>,
    next_execution: u64,
}

/// Mock execution engine with scripted statuses and a fixed result page.
pub struct MockEngine {
    script: Arc<Mutex<EngineScript>>,
}

impl MockEngine {
    /// Engine that reports `SUCCEEDED` on the first poll and returns an
    /// empty result page (header row only).
    pub fn new() -> Self {
        Self::with_statuses(vec![ExecutionStatus::new(ExecutionState::Succeeded)])
    }

    /// Engine that walks the given status sequence, repeating the final
    /// entry forever.
    pub fn with_statuses(statuses: Vec<ExecutionStatus>) -> Self {
        let last_status = statuses
            .last()
            .cloned()
            .unwrap_or_else(|| ExecutionStatus::new(ExecutionState::Succeeded));
        Self {
            script: Arc::new(Mutex::new(EngineScript {
                statuses: VecDeque::from(statuses),
                last_status,
                result: ResultSet {
                    columns: Vec::new(),
                    rows: Vec::new(),
                },
                submissions: Vec::new(),
                next_execution: 0,
            })),
        }
    }

    /// Set the result page returned by `fetch_results`. The first row is
    /// the header row, matching real engine output.
    pub async fn set_result(&self, columns: Vec<&str>, data_rows: Vec<Vec<&str>>) {
        let columns: Vec<String> = columns.into_iter().map(String::from).collect();
        let mut rows: Vec<Vec<Option<String>>> =
            vec![columns.iter().map(|c| Some(c.clone())).collect()];
        rows.extend(
            data_rows
                .into_iter()
                .map(|row| row.into_iter().map(|v| Some(v.to_string())).collect()),
        );
        let mut script = self.script.lock().await;
        script.result = ResultSet { columns, rows };
    }

    /// (sql, output_location) pairs submitted so far.
    pub async fn submissions(&self) -> Vec<(String, String)> {
        self.script.lock().await.submissions.clone()
    }

    /// Scripted statuses not yet consumed by polls.
    pub async fn remaining_statuses(&self) -> usize {
        self.script.lock().await.statuses.len()
    }
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockEngine {
    fn name(&self) -> &str {
        "mock-engine"
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
impl ExecutionAdapter for MockEngine {
    async fn submit(&self, sql: &str, output_location: &str) -> Result<String, DatalineError> {
        let mut script = self.script.lock().await;
        script
            .submissions
            .push((sql.to_string(), output_location.to_string()));
        script.next_execution += 1;
        Ok(format!("exec-{}", script.next_execution))
    }

    async fn status(&self, _execution_id: &str) -> Result<ExecutionStatus, DatalineError> {
        let mut script = self.script.lock().await;
        Ok(script
            .statuses
            .pop_front()
            .unwrap_or_else(|| script.last_status.clone()))
    }

    async fn fetch_results(
        &self,
        _execution_id: &str,
        max_rows: u32,
    ) -> Result<ResultSet, DatalineError> {
        let script = self.script.lock().await;
        let mut result = script.result.clone();
        result.rows.truncate(max_rows as usize);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn status_script_walks_then_repeats_last() {
        let engine = MockEngine::with_statuses(vec![
            ExecutionStatus::new(ExecutionState::Queued),
            ExecutionStatus::new(ExecutionState::Running),
            ExecutionStatus::new(ExecutionState::Succeeded),
        ]);
        assert_eq!(engine.status("e").await.unwrap().state, ExecutionState::Queued);
        assert_eq!(engine.status("e").await.unwrap().state, ExecutionState::Running);
        assert_eq!(engine.status("e").await.unwrap().state, ExecutionState::Succeeded);
        // Script exhausted: last entry repeats.
        assert_eq!(engine.status("e").await.unwrap().state, ExecutionState::Succeeded);
    }

    #[tokio::test]
    async fn result_page_includes_header_row() {
        let engine = MockEngine::new();
        engine
            .set_result(vec!["app_name"], vec![vec!["maps"], vec!["mail"]])
            .await;
        let result = engine.fetch_results("e", 1000).await.unwrap();
        assert_eq!(result.rows.len(), 3);
        assert_eq!(result.rows[0][0].as_deref(), Some("app_name"));
        assert_eq!(result.rows[1][0].as_deref(), Some("maps"));
    }

    #[tokio::test]
    async fn submissions_are_recorded_with_fresh_execution_ids() {
        let engine = MockEngine::new();
        let e1 = engine.submit("SELECT 1", "out/u/c1/").await.unwrap();
        let e2 = engine.submit("SELECT 2", "out/u/c2/").await.unwrap();
        assert_ne!(e1, e2);
        let submissions = engine.submissions().await;
        assert_eq!(submissions.len(), 2);
        assert_eq!(submissions[0].0, "SELECT 1");
        assert_eq!(submissions[1].1, "out/u/c2/");
    }
}
