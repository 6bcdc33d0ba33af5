// SPDX-FileCopyrightText: 2026 Dataline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable record store trait for conversation records.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::DatalineError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ConversationRecord, ResultStatus};

/// Adapter for the durable key-value store holding conversation records.
///
/// Records are partitioned by user id and ordered by creation timestamp.
/// Expired records (expiration_time at or before the query instant) are
/// invisible to reads but may still occupy storage until deleted.
#[async_trait]
pub trait RecordStore: PluginAdapter {
    /// Upsert a record by its (user_id, conversation_id) composite key.
    /// An upsert over an existing record never changes `expiration_time`.
    async fn put(&self, record: &ConversationRecord) -> Result<(), DatalineError>;

    /// Fetch one record by composite key, excluding expired records.
    async fn get(
        &self,
        user_id: &str,
        conversation_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<ConversationRecord>, DatalineError>;

    /// Fetch a user's records most-recent-first, excluding expired records.
    /// `limit: None` fetches all (used by prune).
    async fn get_for_user(
        &self,
        user_id: &str,
        limit: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<Vec<ConversationRecord>, DatalineError>;

    /// Set the terminal result fields on an existing record. Leaves
    /// `expiration_time` untouched.
    async fn update_result(
        &self,
        user_id: &str,
        conversation_id: &str,
        status: ResultStatus,
        result_count: Option<i64>,
        execution_time: Option<DateTime<Utc>>,
        error: Option<String>,
    ) -> Result<(), DatalineError>;

    /// Delete one record by composite key. Deleting a missing record is a
    /// no-op.
    async fn delete(&self, user_id: &str, conversation_id: &str) -> Result<(), DatalineError>;
}
