// SPDX-FileCopyrightText: 2026 Dataline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! History assembler: recent conversation records shaped as translation
//! context.

use tracing::warn;

use dataline_core::types::HistoryEntry;

use crate::memory::ConversationStore;

/// Builds translation context from a user's recent conversation records.
///
/// Context is best-effort: a storage failure degrades to an empty history
/// with a warning and never fails the caller-visible flow.
#[derive(Clone)]
pub struct HistoryAssembler {
    store: ConversationStore,
    limit: usize,
}

impl HistoryAssembler {
    pub fn new(store: ConversationStore, limit: usize) -> Self {
        Self { store, limit }
    }

    /// Up to `limit` past questions, most-recent-first.
    pub async fn assemble(&self, user_id: &str) -> Vec<HistoryEntry> {
        match self.store.get(user_id, self.limit).await {
            Ok(records) => records
                .into_iter()
                .map(|record| HistoryEntry {
                    role: "user".to_string(),
                    content: record.query,
                    timestamp: record.timestamp,
                })
                .collect(),
            Err(e) => {
                warn!(user_id, error = %e, "failed to assemble history; continuing without context");
                Vec::new()
            }
        }
    }
}
