// SPDX-FileCopyrightText: 2026 Dataline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Result cache trait for short-lived formatted results.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::DatalineError;
use crate::traits::adapter::PluginAdapter;

/// Adapter for the short-lived result cache.
///
/// Entries expire after their TTL regardless of record retention. The
/// cache is a performance aid, not a source of truth: consumers fall back
/// to the blob store on a miss. Writes are last-writer-wins with no
/// locking.
#[async_trait]
pub trait ResultCache: PluginAdapter {
    /// Store `value` under `key` with the given time-to-live.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DatalineError>;

    /// Fetch the value under `key`, or `None` if absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>, DatalineError>;
}
