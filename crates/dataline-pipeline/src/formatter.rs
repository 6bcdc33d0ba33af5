// SPDX-FileCopyrightText: 2026 Dataline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Result formatter: blob-stored raw results shaped for presentation,
//! cached, and stamped onto the conversation record.
//!
//! The cache write and the record update are independent calls with no
//! cross-store transaction. Partial completion -- cache written, record
//! update failed -- is a recoverable inconsistency: the record's status is
//! authoritative, and a cache miss falls back to the blob store. Both
//! effects are idempotent, so a duplicate invocation converges on the same
//! state (last write wins).

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info};

use dataline_core::types::{FormattedResult, RawResult};
use dataline_core::{BlobStore, DatalineError, ResultCache};

use crate::memory::ConversationStore;

/// Formats raw results and records completion.
#[derive(Clone)]
pub struct ResultFormatter {
    blob: Arc<dyn BlobStore>,
    cache: Arc<dyn ResultCache>,
    store: ConversationStore,
    cache_ttl: Duration,
}

impl ResultFormatter {
    pub fn new(
        blob: Arc<dyn BlobStore>,
        cache: Arc<dyn ResultCache>,
        store: ConversationStore,
        cache_ttl_secs: u64,
    ) -> Self {
        Self {
            blob,
            cache,
            store,
            cache_ttl: Duration::from_secs(cache_ttl_secs),
        }
    }

    /// Fetch the raw result at `location`, cache the formatted shape, and
    /// mark the conversation record COMPLETED.
    pub async fn format(
        &self,
        user_id: &str,
        conversation_id: &str,
        location: &str,
    ) -> Result<FormattedResult, DatalineError> {
        let bytes = self
            .blob
            .get(location)
            .await
            .map_err(|e| DatalineError::Formatting {
                message: format!("failed to fetch raw result at {location}: {e}"),
                source: Some(Box::new(e)),
            })?;
        let raw: RawResult =
            serde_json::from_slice(&bytes).map_err(|e| DatalineError::Formatting {
                message: format!("malformed raw result at {location}: {e}"),
                source: Some(Box::new(e)),
            })?;

        let formatted = FormattedResult::from_raw(raw, Utc::now());
        let key = FormattedResult::cache_key(user_id, conversation_id);
        let value =
            serde_json::to_string(&formatted).map_err(|e| DatalineError::Formatting {
                message: format!("failed to serialize formatted result: {e}"),
                source: Some(Box::new(e)),
            })?;

        self.cache
            .set(&key, &value, self.cache_ttl)
            .await
            .map_err(|e| DatalineError::Formatting {
                message: format!("failed to cache formatted result: {e}"),
                source: Some(Box::new(e)),
            })?;
        debug!(key, ttl_secs = self.cache_ttl.as_secs(), "formatted result cached");

        // Independent of the cache write above; if this fails the record
        // stays non-terminal while the cache entry lives out its TTL.
        self.store
            .complete(
                user_id,
                conversation_id,
                formatted.result_count,
                formatted.execution_time,
            )
            .await?;

        info!(
            user_id,
            conversation_id,
            result_count = formatted.result_count,
            "results formatted"
        );
        Ok(formatted)
    }
}
