// SPDX-FileCopyrightText: 2026 Dataline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory implementations of the storage-shaped collaborator traits:
//! record store, dispatch queue, blob store, and result cache.
//!
//! Semantics mirror the production backends -- partition-ordered reads,
//! expiry filtering, at-least-once queue delivery -- without touching disk.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use dataline_core::types::{
    AdapterType, ConversationRecord, DispatchMessage, HealthStatus, QueuedMessage, ResultStatus,
};
use dataline_core::{
    BlobStore, DatalineError, DispatchQueue, PluginAdapter, RecordStore, ResultCache,
};

fn healthy() -> Result<HealthStatus, DatalineError> {
    Ok(HealthStatus::Healthy)
}

macro_rules! plugin_adapter {
    ($ty:ident, $name:literal, $kind:ident) => {
        #[async_trait]
        impl PluginAdapter for $ty {
            fn name(&self) -> &str {
                $name
            }
            fn version(&self) -> semver::Version {
                semver::Version::new(0, 1, 0)
            }
            fn adapter_type(&self) -> AdapterType {
                AdapterType::$kind
            }
            async fn health_check(&self) -> Result<HealthStatus, DatalineError> {
                healthy()
            }
            async fn shutdown(&self) -> Result<(), DatalineError> {
                Ok(())
            }
        }
    };
}

// ---- Record store ----

/// In-memory record store keyed by (user_id, conversation_id).
///
/// `fail_deletes` turns every delete into an error, for exercising the
/// best-effort retention path.
#[derive(Default)]
pub struct MemoryRecordStore {
    records: Mutex<BTreeMap<(String, String), ConversationRecord>>,
    pub fail_deletes: AtomicBool,
    pub fail_updates: AtomicBool,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total stored records, expired ones included.
    pub async fn stored_count(&self) -> usize {
        self.records.lock().await.len()
    }
}

plugin_adapter!(MemoryRecordStore, "memory-records", Storage);

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn put(&self, record: &ConversationRecord) -> Result<(), DatalineError> {
        let key = (record.user_id.clone(), record.conversation_id.clone());
        let mut records = self.records.lock().await;
        let mut stored = record.clone();
        if let Some(existing) = records.get(&key) {
            // Expiry is fixed at creation; upserts never move it.
            stored.expiration_time = existing.expiration_time;
        }
        records.insert(key, stored);
        Ok(())
    }

    async fn get(
        &self,
        user_id: &str,
        conversation_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<ConversationRecord>, DatalineError> {
        let records = self.records.lock().await;
        Ok(records
            .get(&(user_id.to_string(), conversation_id.to_string()))
            .filter(|r| !r.is_expired(now))
            .cloned())
    }

    async fn get_for_user(
        &self,
        user_id: &str,
        limit: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<Vec<ConversationRecord>, DatalineError> {
        let records = self.records.lock().await;
        let mut matching: Vec<ConversationRecord> = records
            .values()
            .filter(|r| r.user_id == user_id && !r.is_expired(now))
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then_with(|| b.conversation_id.cmp(&a.conversation_id))
        });
        if let Some(limit) = limit {
            matching.truncate(limit as usize);
        }
        Ok(matching)
    }

    async fn update_result(
        &self,
        user_id: &str,
        conversation_id: &str,
        status: ResultStatus,
        result_count: Option<i64>,
        execution_time: Option<DateTime<Utc>>,
        error: Option<String>,
    ) -> Result<(), DatalineError> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(DatalineError::Storage {
                source: "mock update failure".into(),
            });
        }
        let mut records = self.records.lock().await;
        if let Some(record) =
            records.get_mut(&(user_id.to_string(), conversation_id.to_string()))
        {
            record.result_status = Some(status);
            record.result_count = result_count;
            record.execution_time = execution_time;
            record.error = error;
        }
        Ok(())
    }

    async fn delete(&self, user_id: &str, conversation_id: &str) -> Result<(), DatalineError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(DatalineError::Storage {
                source: "mock delete failure".into(),
            });
        }
        self.records
            .lock()
            .await
            .remove(&(user_id.to_string(), conversation_id.to_string()));
        Ok(())
    }
}

// ---- Dispatch queue ----

/// In-memory dispatch queue with at-least-once semantics.
///
/// `fail_sends` turns every send into an error, for exercising the
/// enqueue-before-persist ordering invariant.
#[derive(Default)]
pub struct MemoryQueue {
    pending: Mutex<VecDeque<(i64, DispatchMessage)>>,
    in_flight: Mutex<HashMap<i64, (DispatchMessage, i32)>>,
    attempts: Mutex<HashMap<i64, i32>>,
    next_id: AtomicI64,
    pub fail_sends: AtomicBool,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages waiting for delivery.
    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }

    /// Re-enqueue a copy of a message, simulating duplicate delivery.
    pub async fn duplicate(&self, message: &DispatchMessage) {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.pending.lock().await.push_back((id, message.clone()));
    }
}

plugin_adapter!(MemoryQueue, "memory-queue", Queue);

#[async_trait]
impl DispatchQueue for MemoryQueue {
    async fn send(&self, message: &DispatchMessage) -> Result<(), DatalineError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(DatalineError::Dispatch {
                message: "mock queue unavailable".into(),
                source: None,
            });
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.pending.lock().await.push_back((id, message.clone()));
        Ok(())
    }

    async fn receive(&self) -> Result<Option<QueuedMessage>, DatalineError> {
        let mut pending = self.pending.lock().await;
        match pending.pop_front() {
            None => Ok(None),
            Some((id, message)) => {
                let mut attempts = self.attempts.lock().await;
                let count = attempts.entry(id).or_insert(0);
                *count += 1;
                let delivery = *count;
                self.in_flight
                    .lock()
                    .await
                    .insert(id, (message.clone(), delivery));
                Ok(Some(QueuedMessage {
                    receipt: id,
                    message,
                    attempts: delivery,
                }))
            }
        }
    }

    async fn ack(&self, receipt: i64) -> Result<(), DatalineError> {
        self.in_flight.lock().await.remove(&receipt);
        Ok(())
    }

    async fn fail(&self, receipt: i64) -> Result<(), DatalineError> {
        if let Some((message, _)) = self.in_flight.lock().await.remove(&receipt) {
            self.pending.lock().await.push_back((receipt, message));
        }
        Ok(())
    }
}

// ---- Blob store ----

/// In-memory blob store keyed by object path.
#[derive(Default)]
pub struct MemoryBlobStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn object_count(&self) -> usize {
        self.objects.lock().await.len()
    }

    pub async fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.objects.lock().await.keys().cloned().collect();
        paths.sort();
        paths
    }
}

plugin_adapter!(MemoryBlobStore, "memory-blob", Blob);

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, path: &str, bytes: &[u8]) -> Result<(), DatalineError> {
        self.objects
            .lock()
            .await
            .insert(path.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Vec<u8>, DatalineError> {
        self.objects
            .lock()
            .await
            .get(path)
            .cloned()
            .ok_or_else(|| DatalineError::NotFound(format!("blob {path}")))
    }
}

// ---- Result cache ----

/// In-memory result cache that records each entry's TTL instead of
/// enforcing it; tests assert on the recorded value.
#[derive(Default)]
pub struct MemoryResultCache {
    entries: Mutex<HashMap<String, (String, Duration)>>,
}

impl MemoryResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The TTL the entry was stored with, if present.
    pub async fn ttl_of(&self, key: &str) -> Option<Duration> {
        self.entries.lock().await.get(key).map(|(_, ttl)| *ttl)
    }

    pub async fn entry_count(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Drop an entry, simulating TTL expiry.
    pub async fn evict(&self, key: &str) {
        self.entries.lock().await.remove(key);
    }
}

plugin_adapter!(MemoryResultCache, "memory-cache", Cache);

#[async_trait]
impl ResultCache for MemoryResultCache {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DatalineError> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), (value.to_string(), ttl));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, DatalineError> {
        Ok(self
            .entries
            .lock()
            .await
            .get(key)
            .map(|(value, _)| value.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(user: &str, conversation: &str, created: &str) -> ConversationRecord {
        ConversationRecord::provisional(
            user,
            conversation,
            "q",
            "SELECT 1",
            DateTime::parse_from_rfc3339(created)
                .unwrap()
                .with_timezone(&Utc),
            chrono::Duration::days(90),
        )
    }

    fn message(conversation: &str) -> DispatchMessage {
        DispatchMessage {
            user_id: "u".into(),
            conversation_id: conversation.into(),
            query: "q".into(),
            sql_query: "SELECT 1".into(),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn record_store_orders_and_filters_like_sqlite() {
        let store = MemoryRecordStore::new();
        store.put(&record("u", "c1", "2026-08-01T10:00:00Z")).await.unwrap();
        store.put(&record("u", "c2", "2026-08-01T12:00:00Z")).await.unwrap();
        store.put(&record("v", "c3", "2026-08-01T11:00:00Z")).await.unwrap();

        let now = DateTime::parse_from_rfc3339("2026-08-01T13:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let records = store.get_for_user("u", None, now).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].conversation_id, "c2");
    }

    #[tokio::test]
    async fn queue_failed_message_redelivers() {
        let queue = MemoryQueue::new();
        queue.send(&message("c1")).await.unwrap();

        let first = queue.receive().await.unwrap().unwrap();
        assert_eq!(first.attempts, 1);
        queue.fail(first.receipt).await.unwrap();

        let second = queue.receive().await.unwrap().unwrap();
        assert_eq!(second.receipt, first.receipt);
        assert_eq!(second.attempts, 2);
        queue.ack(second.receipt).await.unwrap();
        assert!(queue.receive().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn blob_store_round_trips() {
        let blob = MemoryBlobStore::new();
        blob.put("a/b.json", b"data").await.unwrap();
        assert_eq!(blob.get("a/b.json").await.unwrap(), b"data");
        assert_eq!(blob.get("missing").await.unwrap_err().kind(), "not_found");
    }

    #[tokio::test]
    async fn cache_records_ttl() {
        let cache = MemoryResultCache::new();
        cache
            .set("result:u:c", "{}", Duration::from_secs(3600))
            .await
            .unwrap();
        assert_eq!(
            cache.ttl_of("result:u:c").await,
            Some(Duration::from_secs(3600))
        );
        cache.evict("result:u:c").await;
        assert!(cache.get("result:u:c").await.unwrap().is_none());
    }
}
