// SPDX-FileCopyrightText: 2026 Dataline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Execution orchestrator: consumes dispatch messages, drives the engine
//! to completion, and hands successful results to the formatter.
//!
//! The poll loop is an explicit state machine with four terminal outcomes:
//! SUCCEEDED, FAILED, CANCELLED, and TIMEOUT. Both QUEUED and RUNNING
//! count against the same attempt budget, and exhausting the budget is a
//! distinct, reported timeout failure -- never a silent exit with stale
//! status.
//!
//! Duplicate delivery is guarded by the record's terminal status: a
//! message whose conversation already settled is skipped. A duplicate
//! caught mid-flight re-runs the query, re-writes the same blob key, and
//! re-invokes the formatter, all of which converge (last write wins).

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use dataline_config::model::PipelineConfig;
use dataline_core::types::{DispatchMessage, ExecutionState, RawResult, ResultSet};
use dataline_core::{BlobStore, DatalineError, ExecutionAdapter};

use crate::formatter::ResultFormatter;
use crate::memory::ConversationStore;

/// Terminal outcome of the poll loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Succeeded,
    Failed(String),
    Cancelled(String),
    /// The attempt budget ran out while the execution was still QUEUED or
    /// RUNNING.
    TimedOut,
}

/// Outcome of processing one dispatch message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Execution succeeded; results are formatted and cached.
    Completed { result_count: i64 },
    /// Execution settled as a failure; the record carries the reason.
    Failed { reason: String },
    /// The conversation already reached a terminal state (duplicate
    /// delivery); nothing was done.
    Skipped,
}

/// Blob path a conversation's raw result is written to. Deterministic so
/// duplicate processing re-writes the same object.
pub fn raw_result_path(user_id: &str, conversation_id: &str) -> String {
    format!("processed-results/{user_id}/{conversation_id}/result.json")
}

/// Drives one dispatch message through submission, polling, and result
/// persistence.
#[derive(Clone)]
pub struct ExecutionOrchestrator {
    engine: Arc<dyn ExecutionAdapter>,
    blob: Arc<dyn BlobStore>,
    store: ConversationStore,
    formatter: ResultFormatter,
    poll_interval: Duration,
    poll_max_attempts: u32,
    max_result_rows: u32,
    output_prefix: String,
}

impl ExecutionOrchestrator {
    pub fn new(
        engine: Arc<dyn ExecutionAdapter>,
        blob: Arc<dyn BlobStore>,
        store: ConversationStore,
        formatter: ResultFormatter,
        config: &PipelineConfig,
        output_prefix: impl Into<String>,
    ) -> Self {
        Self {
            engine,
            blob,
            store,
            formatter,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            poll_max_attempts: config.poll_max_attempts,
            max_result_rows: config.max_result_rows,
            output_prefix: output_prefix.into(),
        }
    }

    /// Process one dispatch message to a terminal outcome.
    ///
    /// Errors returned here are infrastructure failures (engine
    /// unreachable, storage down) and are retryable; engine-reported query
    /// failure and poll timeout settle the record as FAILED and return
    /// `Ok(ProcessOutcome::Failed)`.
    pub async fn process(
        &self,
        message: &DispatchMessage,
    ) -> Result<ProcessOutcome, DatalineError> {
        // Terminal guard: at-least-once delivery means the same
        // conversation can arrive twice.
        if let Some(existing) = self
            .store
            .get_one(&message.user_id, &message.conversation_id)
            .await?
        {
            if existing.is_terminal() {
                debug!(
                    user_id = %message.user_id,
                    conversation_id = %message.conversation_id,
                    "conversation already terminal; skipping duplicate delivery"
                );
                return Ok(ProcessOutcome::Skipped);
            }
        }

        let output_location = format!(
            "{}/{}/{}/",
            self.output_prefix, message.user_id, message.conversation_id
        );
        let execution_id = self
            .engine
            .submit(&message.sql_query, &output_location)
            .await?;
        info!(
            user_id = %message.user_id,
            conversation_id = %message.conversation_id,
            execution_id,
            "execution submitted"
        );

        match self.poll_to_completion(&execution_id).await? {
            PollOutcome::Succeeded => {
                let results = self
                    .engine
                    .fetch_results(&execution_id, self.max_result_rows)
                    .await?;
                let raw = normalize(message, &execution_id, results, Utc::now());
                let result_count = raw.result_count;

                let location =
                    raw_result_path(&message.user_id, &message.conversation_id);
                let bytes = serde_json::to_vec(&raw).map_err(|e| {
                    DatalineError::Internal(format!("failed to serialize raw result: {e}"))
                })?;
                self.blob.put(&location, &bytes).await?;
                debug!(location, result_count, "raw result persisted");

                self.formatter
                    .format(&message.user_id, &message.conversation_id, &location)
                    .await?;
                Ok(ProcessOutcome::Completed { result_count })
            }
            PollOutcome::Failed(reason) => {
                self.settle_failure(message, format!("execution failed: {reason}"))
                    .await
            }
            PollOutcome::Cancelled(reason) => {
                self.settle_failure(message, format!("execution cancelled: {reason}"))
                    .await
            }
            PollOutcome::TimedOut => {
                self.settle_failure(
                    message,
                    format!(
                        "execution timed out after {} status checks",
                        self.poll_max_attempts
                    ),
                )
                .await
            }
        }
    }

    /// Poll the engine until the execution settles or the attempt budget
    /// runs out. Non-busy: sleeps the configured interval before every
    /// status check.
    pub async fn poll_to_completion(
        &self,
        execution_id: &str,
    ) -> Result<PollOutcome, DatalineError> {
        let mut attempts = 0u32;
        while attempts < self.poll_max_attempts {
            tokio::time::sleep(self.poll_interval).await;
            let status = self.engine.status(execution_id).await?;
            attempts += 1;

            match status.state {
                ExecutionState::Succeeded => return Ok(PollOutcome::Succeeded),
                ExecutionState::Failed => {
                    return Ok(PollOutcome::Failed(
                        status.reason.unwrap_or_else(|| "no reason given".into()),
                    ));
                }
                ExecutionState::Cancelled => {
                    return Ok(PollOutcome::Cancelled(
                        status.reason.unwrap_or_else(|| "no reason given".into()),
                    ));
                }
                ExecutionState::Queued | ExecutionState::Running => {
                    debug!(execution_id, attempts, state = %status.state, "execution in flight");
                }
            }
        }
        Ok(PollOutcome::TimedOut)
    }

    async fn settle_failure(
        &self,
        message: &DispatchMessage,
        reason: String,
    ) -> Result<ProcessOutcome, DatalineError> {
        warn!(
            user_id = %message.user_id,
            conversation_id = %message.conversation_id,
            reason,
            "execution did not succeed"
        );
        self.store
            .fail(&message.user_id, &message.conversation_id, &reason)
            .await?;
        Ok(ProcessOutcome::Failed { reason })
    }
}

/// Shape an engine result page into a [`RawResult`].
///
/// The engine echoes the column header as the first row; it is split off
/// here, and the remaining rows become name-keyed mappings. Absent cell
/// values are omitted from their row rather than stored as empty strings.
fn normalize(
    message: &DispatchMessage,
    execution_id: &str,
    results: ResultSet,
    now: DateTime<Utc>,
) -> RawResult {
    let columns = results.columns;
    let rows: Vec<BTreeMap<String, String>> = results
        .rows
        .into_iter()
        .skip(1)
        .map(|row| {
            columns
                .iter()
                .zip(row)
                .filter_map(|(column, value)| value.map(|v| (column.clone(), v)))
                .collect()
        })
        .collect();

    RawResult {
        user_id: message.user_id.clone(),
        conversation_id: message.conversation_id.clone(),
        execution_id: execution_id.to_string(),
        result_count: rows.len() as i64,
        columns,
        rows,
        execution_time: now,
    }
}
