// SPDX-FileCopyrightText: 2026 Dataline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation store and retention policy.
//!
//! [`ConversationStore`] wraps the durable record store with the pipeline's
//! retention behavior: every successful store -- submission or completion --
//! triggers a prune that deletes records beyond the per-user cap, oldest
//! first. Pruning is best-effort: a failed prune is logged and never fails
//! the operation that triggered it. Concurrent prunes for the same user may
//! transiently overshoot the cap; they converge on the next store.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use dataline_core::types::ConversationRecord;
use dataline_core::{DatalineError, RecordStore, ResultStatus};

/// Durable conversation memory with bounded per-user retention.
#[derive(Clone)]
pub struct ConversationStore {
    records: Arc<dyn RecordStore>,
    max_conversations: usize,
}

impl ConversationStore {
    pub fn new(records: Arc<dyn RecordStore>, max_conversations: usize) -> Self {
        Self {
            records,
            max_conversations,
        }
    }

    /// The per-user retention cap.
    pub fn max_conversations(&self) -> usize {
        self.max_conversations
    }

    /// Fetch up to `limit` records for a user, most-recent-first.
    pub async fn get(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<ConversationRecord>, DatalineError> {
        self.records
            .get_for_user(user_id, Some(limit as i64), Utc::now())
            .await
    }

    /// Fetch one record by composite key.
    pub async fn get_one(
        &self,
        user_id: &str,
        conversation_id: &str,
    ) -> Result<Option<ConversationRecord>, DatalineError> {
        self.records.get(user_id, conversation_id, Utc::now()).await
    }

    /// Upsert a record, then prune the user's history (best-effort).
    pub async fn put(&self, record: &ConversationRecord) -> Result<(), DatalineError> {
        self.records.put(record).await?;
        self.prune_best_effort(&record.user_id).await;
        Ok(())
    }

    /// Mark a record COMPLETED with its result count and execution time,
    /// then prune (best-effort).
    pub async fn complete(
        &self,
        user_id: &str,
        conversation_id: &str,
        result_count: i64,
        execution_time: DateTime<Utc>,
    ) -> Result<(), DatalineError> {
        self.records
            .update_result(
                user_id,
                conversation_id,
                ResultStatus::Completed,
                Some(result_count),
                Some(execution_time),
                None,
            )
            .await?;
        self.prune_best_effort(user_id).await;
        Ok(())
    }

    /// Mark a record FAILED with the failure reason, then prune
    /// (best-effort).
    pub async fn fail(
        &self,
        user_id: &str,
        conversation_id: &str,
        reason: &str,
    ) -> Result<(), DatalineError> {
        self.records
            .update_result(
                user_id,
                conversation_id,
                ResultStatus::Failed,
                None,
                None,
                Some(reason.to_string()),
            )
            .await?;
        self.prune_best_effort(user_id).await;
        Ok(())
    }

    /// Delete every record beyond the retention cap, oldest first.
    ///
    /// Idempotent: at or below the cap this is a no-op. Returns the number
    /// of records deleted. Individual delete failures don't stop the pass;
    /// if any delete failed the call reports a retention error after
    /// finishing.
    pub async fn prune(&self, user_id: &str) -> Result<usize, DatalineError> {
        let records = self
            .records
            .get_for_user(user_id, None, Utc::now())
            .await?;
        if records.len() <= self.max_conversations {
            return Ok(0);
        }

        let mut deleted = 0;
        let mut failures = 0;
        for record in &records[self.max_conversations..] {
            match self
                .records
                .delete(user_id, &record.conversation_id)
                .await
            {
                Ok(()) => deleted += 1,
                Err(e) => {
                    warn!(
                        user_id,
                        conversation_id = %record.conversation_id,
                        error = %e,
                        "failed to delete record during prune"
                    );
                    failures += 1;
                }
            }
        }

        debug!(user_id, deleted, "pruned conversation history");
        if failures > 0 {
            return Err(DatalineError::Retention(format!(
                "{failures} of {} prune deletions failed for user {user_id}",
                deleted + failures
            )));
        }
        Ok(deleted)
    }

    async fn prune_best_effort(&self, user_id: &str) {
        if let Err(e) = self.prune(user_id).await {
            warn!(user_id, error = %e, "retention prune failed");
        }
    }
}
