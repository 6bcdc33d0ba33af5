// SPDX-FileCopyrightText: 2026 Dataline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across pipeline stages and collaborator traits.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the role of an adapter in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
pub enum AdapterType {
    Translation,
    Execution,
    Queue,
    Blob,
    Cache,
    Storage,
}

/// Terminal outcome recorded on a conversation record once execution and
/// formatting settle. Absent while the query is still provisional.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
pub enum ResultStatus {
    #[strum(serialize = "PENDING")]
    #[serde(rename = "PENDING")]
    Pending,
    #[strum(serialize = "COMPLETED")]
    #[serde(rename = "COMPLETED")]
    Completed,
    #[strum(serialize = "FAILED")]
    #[serde(rename = "FAILED")]
    Failed,
}

/// Durable per-(user, conversation) entry tracking a query, its translation,
/// and execution outcome.
///
/// Keyed by the (user_id, conversation_id) composite. `expiration_time` is
/// fixed at creation (creation instant + the record TTL) and is never
/// mutated by later updates; an expired record is inert regardless of the
/// per-user retention cap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub user_id: String,
    pub conversation_id: String,
    /// Original natural-language question.
    pub query: String,
    /// Translated SQL; absent until translation completes.
    pub sql_query: Option<String>,
    /// Creation instant. Retention ordering key.
    pub timestamp: DateTime<Utc>,
    /// Terminal outcome; absent until execution settles.
    pub result_status: Option<ResultStatus>,
    pub result_count: Option<i64>,
    pub execution_time: Option<DateTime<Utc>>,
    /// Failure or cancellation reason, set with a FAILED status.
    pub error: Option<String>,
    /// Absolute expiry instant, set once at creation.
    pub expiration_time: DateTime<Utc>,
}

impl ConversationRecord {
    /// Build a provisional record at submission time. No result status yet.
    pub fn provisional(
        user_id: impl Into<String>,
        conversation_id: impl Into<String>,
        query: impl Into<String>,
        sql_query: impl Into<String>,
        now: DateTime<Utc>,
        ttl: chrono::Duration,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            conversation_id: conversation_id.into(),
            query: query.into(),
            sql_query: Some(sql_query.into()),
            timestamp: now,
            result_status: None,
            result_count: None,
            execution_time: None,
            error: None,
            expiration_time: now + ttl,
        }
    }

    /// Whether this record has passed its expiry instant.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiration_time <= now
    }

    /// Whether execution has settled (COMPLETED or FAILED).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.result_status,
            Some(ResultStatus::Completed) | Some(ResultStatus::Failed)
        )
    }
}

/// Transient unit of work carrying a translated query from submission to
/// execution. Serialized as the queue payload; not persisted beyond
/// delivery. Consumers must tolerate duplicate delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchMessage {
    pub user_id: String,
    pub conversation_id: String,
    pub query: String,
    pub sql_query: String,
    pub timestamp: DateTime<Utc>,
}

/// A dispatch message pulled off the queue, together with the receipt used
/// to acknowledge or release it.
#[derive(Debug, Clone)]
pub struct QueuedMessage {
    /// Opaque receipt handle for ack/fail.
    pub receipt: i64,
    pub message: DispatchMessage,
    /// Delivery attempts so far, including this one.
    pub attempts: i32,
}

/// One prior conversation turn, shaped for translation context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Engine-shaped tabular output persisted to the blob store before
/// formatting. Written exactly once per successful execution; read by the
/// result formatter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawResult {
    pub user_id: String,
    pub conversation_id: String,
    pub execution_id: String,
    pub columns: Vec<String>,
    pub rows: Vec<BTreeMap<String, String>>,
    pub result_count: i64,
    pub execution_time: DateTime<Utc>,
}

/// Presentation-shaped cache entry derived from a [`RawResult`].
///
/// Short-lived (cache TTL), a performance aid only: the blob store remains
/// the durable source of truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormattedResult {
    pub user_id: String,
    pub conversation_id: String,
    pub columns: Vec<String>,
    pub rows: Vec<BTreeMap<String, String>>,
    pub result_count: i64,
    pub execution_time: DateTime<Utc>,
    pub formatted_time: DateTime<Utc>,
}

impl FormattedResult {
    /// Cache key for a (user, conversation) pair.
    pub fn cache_key(user_id: &str, conversation_id: &str) -> String {
        format!("result:{user_id}:{conversation_id}")
    }

    pub fn from_raw(raw: RawResult, formatted_time: DateTime<Utc>) -> Self {
        Self {
            user_id: raw.user_id,
            conversation_id: raw.conversation_id,
            columns: raw.columns,
            rows: raw.rows,
            result_count: raw.result_count,
            execution_time: raw.execution_time,
            formatted_time,
        }
    }
}

/// Lifecycle state reported by the execution engine for an in-flight query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
pub enum ExecutionState {
    #[strum(serialize = "QUEUED")]
    #[serde(rename = "QUEUED")]
    Queued,
    #[strum(serialize = "RUNNING")]
    #[serde(rename = "RUNNING")]
    Running,
    #[strum(serialize = "SUCCEEDED")]
    #[serde(rename = "SUCCEEDED")]
    Succeeded,
    #[strum(serialize = "FAILED")]
    #[serde(rename = "FAILED")]
    Failed,
    #[strum(serialize = "CANCELLED")]
    #[serde(rename = "CANCELLED")]
    Cancelled,
}

impl ExecutionState {
    /// Whether the engine will make no further progress on this execution.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Cancelled)
    }
}

/// Point-in-time execution status: state plus the engine's failure or
/// cancellation reason, when it supplies one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionStatus {
    pub state: ExecutionState,
    pub reason: Option<String>,
}

impl ExecutionStatus {
    pub fn new(state: ExecutionState) -> Self {
        Self {
            state,
            reason: None,
        }
    }

    pub fn with_reason(state: ExecutionState, reason: impl Into<String>) -> Self {
        Self {
            state,
            reason: Some(reason.into()),
        }
    }
}

/// Raw tabular page fetched from the execution engine.
///
/// `rows` is positional, aligned to `columns`; engines that echo the column
/// header as the first row (the normalization the orchestrator performs)
/// leave it in place here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}
