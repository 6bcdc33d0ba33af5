// SPDX-FileCopyrightText: 2026 Dataline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock translation adapter for deterministic testing.
//!
//! Returns pre-configured SQL strings from a FIFO queue and records every
//! translation request, enabling fast, CI-runnable tests without external
//! API calls.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use dataline_core::types::{AdapterType, HealthStatus, HistoryEntry};
use dataline_core::{DatalineError, PluginAdapter, TranslationAdapter};

/// A recorded translation request: the question and the history length
/// that accompanied it.
#[derive(Debug, Clone)]
pub struct SeenTranslation {
    pub query: String,
    pub history_len: usize,
}

/// A mock translator that returns pre-configured SQL.
///
/// SQL strings are popped from a FIFO queue; when the queue is empty a
/// default `SELECT 1` is returned. Set `fail_next` to make the next call
/// fail with a translation error.
pub struct MockTranslator {
    responses: Arc<Mutex<VecDeque<String>>>,
    seen: Arc<Mutex<Vec<SeenTranslation>>>,
    fail_next: AtomicBool,
}

impl MockTranslator {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            seen: Arc::new(Mutex::new(Vec::new())),
            fail_next: AtomicBool::new(false),
        }
    }

    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::from(responses))),
            seen: Arc::new(Mutex::new(Vec::new())),
            fail_next: AtomicBool::new(false),
        }
    }

    /// Make the next `translate` call fail.
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Requests observed so far.
    pub async fn seen(&self) -> Vec<SeenTranslation> {
        self.seen.lock().await.clone()
    }
}

impl Default for MockTranslator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockTranslator {
    fn name(&self) -> &str {
        "mock-translator"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Translation
    }

    async fn health_check(&self) -> Result<HealthStatus, DatalineError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), DatalineError> {
        Ok(())
    }
}

#[async_trait]
impl TranslationAdapter for MockTranslator {
    async fn translate(
        &self,
        query: &str,
        history: &[HistoryEntry],
    ) -> Result<String, DatalineError> {
        self.seen.lock().await.push(SeenTranslation {
            query: query.to_string(),
            history_len: history.len(),
        });
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(DatalineError::Translation {
                message: "mock translation failure".into(),
                source: None,
            });
        }
        Ok(self
            .responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| "SELECT 1".to_string()))
    }
}
