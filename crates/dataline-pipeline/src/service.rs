// SPDX-FileCopyrightText: 2026 Dataline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query service: the three operations exposed to the transport layer.
//!
//! `submit_query` is fire-and-forget, `get_history` reads conversation
//! memory, and `poll_result` reports a conversation's current state. The
//! record's status is authoritative; the cache is consulted first for
//! completed results and a miss falls back to the durable blob.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use dataline_core::types::{ConversationRecord, FormattedResult, RawResult};
use dataline_core::{BlobStore, DatalineError, ResultCache, ResultStatus};

use crate::executor::raw_result_path;
use crate::memory::ConversationStore;
use crate::submit::TranslationRequester;

/// Caller-facing view of a conversation's current state.
#[derive(Debug, Clone, Serialize)]
pub struct PollResponse {
    pub status: ResultStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<Vec<BTreeMap<String, String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PollResponse {
    fn pending() -> Self {
        Self {
            status: ResultStatus::Pending,
            columns: None,
            rows: None,
            result_count: None,
            error: None,
        }
    }

    fn failed(error: String) -> Self {
        Self {
            status: ResultStatus::Failed,
            columns: None,
            rows: None,
            result_count: None,
            error: Some(error),
        }
    }

    fn completed(
        columns: Vec<String>,
        rows: Vec<BTreeMap<String, String>>,
        result_count: i64,
    ) -> Self {
        Self {
            status: ResultStatus::Completed,
            columns: Some(columns),
            rows: Some(rows),
            result_count: Some(result_count),
            error: None,
        }
    }
}

/// Facade over the pipeline for the gateway.
#[derive(Clone)]
pub struct QueryService {
    requester: TranslationRequester,
    store: ConversationStore,
    cache: Arc<dyn ResultCache>,
    blob: Arc<dyn BlobStore>,
}

impl QueryService {
    pub fn new(
        requester: TranslationRequester,
        store: ConversationStore,
        cache: Arc<dyn ResultCache>,
        blob: Arc<dyn BlobStore>,
    ) -> Self {
        Self {
            requester,
            store,
            cache,
            blob,
        }
    }

    /// Submit a question. Returns the conversation id immediately.
    pub async fn submit_query(
        &self,
        user_id: &str,
        query: &str,
    ) -> Result<String, DatalineError> {
        self.requester.submit(user_id, query).await
    }

    /// A user's retained conversations, most-recent-first.
    pub async fn get_history(
        &self,
        user_id: &str,
    ) -> Result<Vec<ConversationRecord>, DatalineError> {
        self.store
            .get(user_id, self.store.max_conversations())
            .await
    }

    /// Current state of one conversation.
    pub async fn poll_result(
        &self,
        user_id: &str,
        conversation_id: &str,
    ) -> Result<PollResponse, DatalineError> {
        let record = self
            .store
            .get_one(user_id, conversation_id)
            .await?
            .ok_or_else(|| {
                DatalineError::NotFound(format!("conversation {conversation_id}"))
            })?;

        match record.result_status {
            None | Some(ResultStatus::Pending) => Ok(PollResponse::pending()),
            Some(ResultStatus::Failed) => Ok(PollResponse::failed(
                record
                    .error
                    .unwrap_or_else(|| "execution failed".to_string()),
            )),
            Some(ResultStatus::Completed) => self.completed_result(user_id, conversation_id).await,
        }
    }

    /// Completed results come from the cache when it still holds them,
    /// from the durable blob otherwise.
    async fn completed_result(
        &self,
        user_id: &str,
        conversation_id: &str,
    ) -> Result<PollResponse, DatalineError> {
        let key = FormattedResult::cache_key(user_id, conversation_id);
        if let Some(value) = self.cache.get(&key).await? {
            match serde_json::from_str::<FormattedResult>(&value) {
                Ok(formatted) => {
                    return Ok(PollResponse::completed(
                        formatted.columns,
                        formatted.rows,
                        formatted.result_count,
                    ));
                }
                Err(e) => {
                    warn!(key, error = %e, "discarding malformed cache entry");
                }
            }
        }

        let location = raw_result_path(user_id, conversation_id);
        let bytes = self.blob.get(&location).await?;
        let raw: RawResult =
            serde_json::from_slice(&bytes).map_err(|e| DatalineError::Formatting {
                message: format!("malformed raw result at {location}: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(PollResponse::completed(
            raw.columns,
            raw.rows,
            raw.result_count,
        ))
    }
}
