// SPDX-FileCopyrightText: 2026 Dataline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Blob store trait for durable raw-result objects.

use async_trait::async_trait;

use crate::error::DatalineError;
use crate::traits::adapter::PluginAdapter;

/// Adapter for the durable blob store holding raw execution results.
///
/// Paths are deterministic, keyed by user and conversation, so re-writing
/// the same path for a duplicate delivery is safe (last write wins).
#[async_trait]
pub trait BlobStore: PluginAdapter {
    /// Write `bytes` at `path`, overwriting any existing object.
    async fn put(&self, path: &str, bytes: &[u8]) -> Result<(), DatalineError>;

    /// Read the object at `path`.
    async fn get(&self, path: &str) -> Result<Vec<u8>, DatalineError>;
}
