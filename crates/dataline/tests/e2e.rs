// SPDX-FileCopyrightText: 2026 Dataline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the complete query pipeline.
//!
//! Each test assembles an isolated stack: real SQLite storage and
//! filesystem blob store in a temp directory, the in-process cache, and
//! mock translation/execution services. The dispatch worker is driven
//! step-by-step, so tests are deterministic and order-insensitive.

use std::sync::Arc;

use chrono::Utc;
use dataline_config::model::{PipelineConfig, StorageConfig};
use dataline_core::types::{ConversationRecord, DispatchMessage, ExecutionStatus};
use dataline_core::{DispatchQueue, RecordStore, ResultCache, ResultStatus};
use dataline_pipeline::{
    ConversationStore, DispatchWorker, ExecutionOrchestrator, HistoryAssembler, QueryService,
    ResultFormatter, TranslationRequester,
};
use dataline_storage::{FsBlobStore, MemoryCache, SqliteStorage};
use dataline_test_utils::{MockEngine, MockTranslator};
use tokio_util::sync::CancellationToken;

struct Harness {
    service: QueryService,
    worker: DispatchWorker,
    translator: Arc<MockTranslator>,
    engine: Arc<MockEngine>,
    cache: Arc<MemoryCache>,
    storage: Arc<SqliteStorage>,
    store: ConversationStore,
    blob_root: std::path::PathBuf,
    _tmp: tempfile::TempDir,
}

async fn harness_with(engine: MockEngine, config: PipelineConfig) -> Harness {
    let tmp = tempfile::tempdir().unwrap();
    let blob_root = tmp.path().join("results");

    let storage = Arc::new(SqliteStorage::new(StorageConfig {
        database_path: tmp.path().join("dataline.db").to_string_lossy().into_owned(),
        wal_mode: true,
        blob_root: blob_root.to_string_lossy().into_owned(),
    }));
    storage.initialize().await.unwrap();

    let records: Arc<dyn RecordStore> = storage.clone();
    let queue: Arc<dyn DispatchQueue> = storage.clone();
    let blob = Arc::new(FsBlobStore::new(blob_root.clone()));
    let cache = Arc::new(MemoryCache::new());
    let translator = Arc::new(MockTranslator::new());
    let engine = Arc::new(engine);

    let store = ConversationStore::new(records, config.max_conversations);
    let history = HistoryAssembler::new(store.clone(), config.history_limit);
    let requester = TranslationRequester::new(
        translator.clone(),
        queue.clone(),
        store.clone(),
        history,
        config.record_ttl_days,
    );
    let formatter = ResultFormatter::new(
        blob.clone(),
        cache.clone(),
        store.clone(),
        config.cache_ttl_secs,
    );
    let orchestrator = ExecutionOrchestrator::new(
        engine.clone(),
        blob.clone(),
        store.clone(),
        formatter,
        &config,
        "athena-results",
    );
    let worker = DispatchWorker::new(
        queue,
        orchestrator,
        &config,
        CancellationToken::new(),
    );
    let service = QueryService::new(requester, store.clone(), cache.clone(), blob);

    Harness {
        service,
        worker,
        translator,
        engine,
        cache,
        storage,
        store,
        blob_root,
        _tmp: tmp,
    }
}

fn fast_config(max_conversations: usize) -> PipelineConfig {
    PipelineConfig {
        max_conversations,
        poll_interval_ms: 5,
        worker_idle_ms: 5,
        ..PipelineConfig::default()
    }
}

async fn harness() -> Harness {
    harness_with(MockEngine::new(), fast_config(50)).await
}

impl Harness {
    /// Drive the worker until the queue is empty.
    async fn drain(&self) {
        while self.worker.step().await.expect("worker step") {}
    }
}

// ---- Scenario: successful submission end to end ----

#[tokio::test]
async fn submit_execute_format_poll_round_trip() {
    let h = harness().await;
    h.engine
        .set_result(
            vec!["date", "duration_sum"],
            vec![
                vec!["27-07-2026", "3600"],
                vec!["28-07-2026", "1800"],
                vec!["29-07-2026", "900"],
                vec!["30-07-2026", "2700"],
                vec!["31-07-2026", "600"],
            ],
        )
        .await;

    let conversation_id = h
        .service
        .submit_query("U1", "show usage last week")
        .await
        .unwrap();

    // Record is provisional: created, no status yet.
    let record = h.store.get_one("U1", &conversation_id).await.unwrap().unwrap();
    assert!(record.result_status.is_none());
    assert!(record.sql_query.is_some());
    assert_eq!(
        record.expiration_time,
        record.timestamp + chrono::Duration::days(90)
    );

    h.drain().await;

    // Raw result landed in the blob store at the deterministic path.
    let blob_path = h.blob_root.join(format!(
        "processed-results/U1/{conversation_id}/result.json"
    ));
    assert!(blob_path.exists(), "raw result blob should exist");

    // Cache entry under result:{user}:{conversation}.
    let cached = h
        .cache
        .get(&format!("result:U1:{conversation_id}"))
        .await
        .unwrap();
    assert!(cached.is_some(), "formatted result should be cached");

    // Record reached COMPLETED with the row count.
    let record = h.store.get_one("U1", &conversation_id).await.unwrap().unwrap();
    assert_eq!(record.result_status, Some(ResultStatus::Completed));
    assert_eq!(record.result_count, Some(5));

    // The poll operation returns the full tabular result.
    let poll = h.service.poll_result("U1", &conversation_id).await.unwrap();
    assert_eq!(poll.status, ResultStatus::Completed);
    assert_eq!(poll.result_count, Some(5));
    assert_eq!(poll.columns.unwrap(), vec!["date", "duration_sum"]);
    let rows = poll.rows.unwrap();
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[0]["date"], "27-07-2026");

    // The translator saw the question; the engine got the staged output
    // location for this conversation.
    assert_eq!(h.translator.seen().await[0].query, "show usage last week");
    let submissions = h.engine.submissions().await;
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].1, format!("athena-results/U1/{conversation_id}/"));
}

// ---- Scenario: retention prune on submission ----

#[tokio::test]
async fn submission_prunes_history_to_cap() {
    let h = harness_with(MockEngine::new(), fast_config(5)).await;

    // Ten pre-existing records, written directly to the store.
    let records: Arc<dyn RecordStore> = h.storage.clone();
    for i in 0..10 {
        let record = ConversationRecord::provisional(
            "U2",
            format!("old-{i:02}"),
            format!("question {i}"),
            "SELECT 1",
            Utc::now() - chrono::Duration::minutes(100 - i),
            chrono::Duration::days(90),
        );
        records.put(&record).await.unwrap();
    }

    let conversation_id = h.service.submit_query("U2", "one more").await.unwrap();

    let history = h.service.get_history("U2").await.unwrap();
    assert_eq!(history.len(), 5, "prune leaves exactly the cap");
    assert_eq!(history[0].conversation_id, conversation_id);
    // Survivors are the most recent: old-09, old-08, old-07, old-06 plus
    // the new submission.
    let ids: Vec<&str> = history[1..]
        .iter()
        .map(|r| r.conversation_id.as_str())
        .collect();
    assert_eq!(ids, vec!["old-09", "old-08", "old-07", "old-06"]);
}

// ---- Scenario: cancelled execution ----

#[tokio::test]
async fn cancelled_execution_fails_record_without_blob_or_cache_writes() {
    let engine = MockEngine::with_statuses(vec![ExecutionStatus::with_reason(
        dataline_core::types::ExecutionState::Cancelled,
        "cancelled by operator",
    )]);
    let h = harness_with(engine, fast_config(50)).await;

    let conversation_id = h.service.submit_query("U1", "slow question").await.unwrap();
    h.drain().await;

    let poll = h.service.poll_result("U1", &conversation_id).await.unwrap();
    assert_eq!(poll.status, ResultStatus::Failed);
    assert!(
        poll.error.as_deref().unwrap().contains("cancelled by operator"),
        "cancellation reason should surface in the poll response"
    );

    // No blob or cache writes occurred.
    assert!(
        !h.blob_root.exists() || std::fs::read_dir(&h.blob_root).unwrap().next().is_none(),
        "no blob objects should be written"
    );
    assert!(h.cache.is_empty().await);
}

// ---- Scenario: poll budget exhaustion ----

#[tokio::test]
async fn stuck_execution_times_out_and_fails_the_record() {
    let engine = MockEngine::with_statuses(vec![ExecutionStatus::new(
        dataline_core::types::ExecutionState::Running,
    )]);
    let mut config = fast_config(50);
    config.poll_max_attempts = 3;
    let h = harness_with(engine, config).await;

    let conversation_id = h.service.submit_query("U1", "never finishes").await.unwrap();
    h.drain().await;

    let poll = h.service.poll_result("U1", &conversation_id).await.unwrap();
    assert_eq!(poll.status, ResultStatus::Failed);
    assert!(
        poll.error.as_deref().unwrap().contains("timed out after 3"),
        "timeout must be reported, not silent: {:?}",
        poll.error
    );
}

// ---- Scenario: duplicate delivery ----

#[tokio::test]
async fn duplicate_dispatch_message_settles_once() {
    let h = harness().await;
    h.engine.set_result(vec!["n"], vec![vec!["1"]]).await;

    let conversation_id = h.service.submit_query("U1", "count rows").await.unwrap();

    // Simulate at-least-once delivery: a second copy of the message.
    let record = h.store.get_one("U1", &conversation_id).await.unwrap().unwrap();
    let queue: Arc<dyn DispatchQueue> = h.storage.clone();
    queue
        .send(&DispatchMessage {
            user_id: record.user_id.clone(),
            conversation_id: record.conversation_id.clone(),
            query: record.query.clone(),
            sql_query: record.sql_query.clone().unwrap(),
            timestamp: record.timestamp,
        })
        .await
        .unwrap();

    h.drain().await;

    // One engine execution; the duplicate was skipped by the terminal
    // guard. The record settled exactly once.
    assert_eq!(h.engine.submissions().await.len(), 1);
    let record = h.store.get_one("U1", &conversation_id).await.unwrap().unwrap();
    assert_eq!(record.result_status, Some(ResultStatus::Completed));
    assert_eq!(record.result_count, Some(1));
}

// ---- Scenario: rejected submissions leave no trace ----

#[tokio::test]
async fn empty_query_leaves_no_record_and_no_message() {
    let h = harness().await;

    let err = h.service.submit_query("U1", "   ").await.unwrap_err();
    assert_eq!(err.kind(), "translation");

    assert!(h.service.get_history("U1").await.unwrap().is_empty());
    let queue: Arc<dyn DispatchQueue> = h.storage.clone();
    assert!(queue.receive().await.unwrap().is_none());
}

#[tokio::test]
async fn translation_failure_leaves_no_record_and_no_message() {
    let h = harness().await;
    h.translator.fail_next();

    let err = h.service.submit_query("U1", "top apps").await.unwrap_err();
    assert_eq!(err.kind(), "translation");
    assert!(h.service.get_history("U1").await.unwrap().is_empty());
}

// ---- Scenario: history feeds translation context ----

#[tokio::test]
async fn later_submissions_carry_history_context() {
    let h = harness().await;
    h.engine.set_result(vec!["n"], vec![vec!["1"]]).await;

    h.service.submit_query("U1", "show usage last week").await.unwrap();
    h.drain().await;
    h.service.submit_query("U1", "and the week before?").await.unwrap();

    let seen = h.translator.seen().await;
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].history_len, 0);
    assert_eq!(seen[1].history_len, 1);
}
