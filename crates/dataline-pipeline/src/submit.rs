// SPDX-FileCopyrightText: 2026 Dataline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Translation requester: the submission stage of the pipeline.
//!
//! Order matters here. The dispatch message is enqueued BEFORE the record
//! is persisted, so a failure can never leave a persisted record pointing
//! at a message that was never sent. The inverse window -- a queued message
//! whose record is not yet visible -- is safe: the orchestrator's terminal
//! guard treats a missing record as non-terminal and proceeds.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use dataline_core::types::{ConversationRecord, DispatchMessage};
use dataline_core::{DatalineError, DispatchQueue, TranslationAdapter};

use crate::history::HistoryAssembler;
use crate::memory::ConversationStore;

/// Accepts a natural-language question, translates it, and dispatches it
/// for asynchronous execution.
///
/// Fire-and-forget from the caller's perspective: returns the conversation
/// id immediately, never the SQL or the result.
#[derive(Clone)]
pub struct TranslationRequester {
    translator: Arc<dyn TranslationAdapter>,
    queue: Arc<dyn DispatchQueue>,
    store: ConversationStore,
    history: HistoryAssembler,
    record_ttl: chrono::Duration,
}

impl TranslationRequester {
    pub fn new(
        translator: Arc<dyn TranslationAdapter>,
        queue: Arc<dyn DispatchQueue>,
        store: ConversationStore,
        history: HistoryAssembler,
        record_ttl_days: i64,
    ) -> Self {
        Self {
            translator,
            queue,
            store,
            history,
            record_ttl: chrono::Duration::days(record_ttl_days),
        }
    }

    /// Submit a question for user `user_id`. Returns the new conversation id.
    ///
    /// On any failure nothing is persisted and nothing is enqueued -- the
    /// caller retries with a fresh submission.
    pub async fn submit(&self, user_id: &str, query: &str) -> Result<String, DatalineError> {
        if user_id.trim().is_empty() {
            return Err(DatalineError::Translation {
                message: "user id must be present".into(),
                source: None,
            });
        }
        if query.trim().is_empty() {
            return Err(DatalineError::Translation {
                message: "query must not be empty".into(),
                source: None,
            });
        }

        let history = self.history.assemble(user_id).await;
        let sql_query = self.translator.translate(query, &history).await?;

        let conversation_id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let record = ConversationRecord::provisional(
            user_id,
            conversation_id.clone(),
            query,
            sql_query.clone(),
            now,
            self.record_ttl,
        );
        let message = DispatchMessage {
            user_id: user_id.to_string(),
            conversation_id: conversation_id.clone(),
            query: query.to_string(),
            sql_query,
            timestamp: now,
        };

        // Enqueue first; persist only after the message is on the queue.
        self.queue.send(&message).await?;
        self.store.put(&record).await?;

        info!(user_id, conversation_id, "query submitted");
        Ok(conversation_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dataline_core::RecordStore;
    use dataline_test_utils::{MemoryQueue, MemoryRecordStore, MockTranslator};
    use std::sync::atomic::Ordering;

    struct Fixture {
        requester: TranslationRequester,
        translator: Arc<MockTranslator>,
        queue: Arc<MemoryQueue>,
        records: Arc<MemoryRecordStore>,
        store: ConversationStore,
    }

    fn fixture_with(translator: MockTranslator, cap: usize) -> Fixture {
        let translator = Arc::new(translator);
        let queue = Arc::new(MemoryQueue::new());
        let records = Arc::new(MemoryRecordStore::new());
        let store = ConversationStore::new(records.clone(), cap);
        let history = HistoryAssembler::new(store.clone(), 30);
        let requester = TranslationRequester::new(
            translator.clone(),
            queue.clone(),
            store.clone(),
            history,
            90,
        );
        Fixture {
            requester,
            translator,
            queue,
            records,
            store,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(MockTranslator::new(), 50)
    }

    #[tokio::test]
    async fn submit_persists_record_and_enqueues_message() {
        let f = fixture_with(
            MockTranslator::with_responses(vec![
                "SELECT app_name FROM usage WHERE date >= '27-07-2026'".into(),
            ]),
            50,
        );

        let conversation_id = f
            .requester
            .submit("U1", "show usage last week")
            .await
            .unwrap();

        let record = f.store.get_one("U1", &conversation_id).await.unwrap().unwrap();
        assert_eq!(record.query, "show usage last week");
        assert_eq!(
            record.sql_query.as_deref(),
            Some("SELECT app_name FROM usage WHERE date >= '27-07-2026'")
        );
        assert!(record.result_status.is_none(), "record is provisional");
        assert_eq!(
            record.expiration_time,
            record.timestamp + chrono::Duration::days(90)
        );

        assert_eq!(f.queue.pending_count().await, 1);
        let queued = f.queue.receive().await.unwrap().unwrap();
        assert_eq!(queued.message.conversation_id, conversation_id);
        assert_eq!(queued.message.sql_query, record.sql_query.unwrap());
    }

    #[tokio::test]
    async fn empty_query_fails_with_no_side_effects() {
        let f = fixture();
        let err = f.requester.submit("U1", "   ").await.unwrap_err();
        assert_eq!(err.kind(), "translation");
        assert_eq!(f.queue.pending_count().await, 0);
        assert_eq!(f.records.stored_count().await, 0);
        // The translation service was never called.
        assert!(f.translator.seen().await.is_empty());
    }

    #[tokio::test]
    async fn missing_user_fails_with_no_side_effects() {
        let f = fixture();
        let err = f.requester.submit("", "top apps").await.unwrap_err();
        assert_eq!(err.kind(), "translation");
        assert_eq!(f.records.stored_count().await, 0);
    }

    #[tokio::test]
    async fn translation_failure_persists_nothing() {
        let f = fixture();
        f.translator.fail_next();
        let err = f.requester.submit("U1", "top apps").await.unwrap_err();
        assert_eq!(err.kind(), "translation");
        assert_eq!(f.queue.pending_count().await, 0);
        assert_eq!(f.records.stored_count().await, 0);
    }

    #[tokio::test]
    async fn dispatch_failure_leaves_no_orphaned_record() {
        let f = fixture();
        f.queue.fail_sends.store(true, Ordering::SeqCst);
        let err = f.requester.submit("U1", "top apps").await.unwrap_err();
        assert_eq!(err.kind(), "dispatch");
        // Ordering invariant: enqueue failed, so nothing was persisted.
        assert_eq!(f.records.stored_count().await, 0);
    }

    #[tokio::test]
    async fn history_is_passed_to_translator() {
        let f = fixture();
        f.requester.submit("U1", "first").await.unwrap();
        f.requester.submit("U1", "second").await.unwrap();

        let seen = f.translator.seen().await;
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].history_len, 0);
        assert_eq!(seen[1].history_len, 1);
    }

    #[tokio::test]
    async fn submission_triggers_prune_to_cap() {
        let f = fixture_with(MockTranslator::new(), 5);
        // Seed 10 records directly, bypassing prune.
        for i in 0..10 {
            let record = ConversationRecord::provisional(
                "U2",
                format!("c{i:02}"),
                format!("question {i}"),
                "SELECT 1",
                Utc::now() - chrono::Duration::minutes(100 - i),
                chrono::Duration::days(90),
            );
            f.records.put(&record).await.unwrap();
        }
        assert_eq!(f.records.stored_count().await, 10);

        let conversation_id = f.requester.submit("U2", "one more").await.unwrap();

        let remaining = f.store.get("U2", 50).await.unwrap();
        assert_eq!(remaining.len(), 5, "prune leaves exactly the cap");
        assert!(
            remaining
                .iter()
                .any(|r| r.conversation_id == conversation_id),
            "the new record is among the survivors"
        );
    }

    #[tokio::test]
    async fn each_submission_gets_a_distinct_conversation_id() {
        let f = fixture();
        let c1 = f.requester.submit("U1", "q1").await.unwrap();
        let c2 = f.requester.submit("U1", "q2").await.unwrap();
        assert_ne!(c1, c2);
    }
}
