// SPDX-FileCopyrightText: 2026 Dataline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dispatch queue trait decoupling translation from execution.

use async_trait::async_trait;

use crate::error::DatalineError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{DispatchMessage, QueuedMessage};

/// Adapter for the dispatch queue carrying one message per submitted query.
///
/// Delivery is at-least-once with no ordering guarantee across different
/// conversations: consumers must tolerate duplicate delivery of the same
/// conversation id.
#[async_trait]
pub trait DispatchQueue: PluginAdapter {
    /// Enqueue one message. Must either fully succeed or leave no trace.
    async fn send(&self, message: &DispatchMessage) -> Result<(), DatalineError>;

    /// Pull the next available message, or `None` if the queue is empty.
    /// The message stays invisible to other consumers until acked, failed,
    /// or its visibility lock lapses.
    async fn receive(&self) -> Result<Option<QueuedMessage>, DatalineError>;

    /// Acknowledge successful processing; the message will not redeliver.
    async fn ack(&self, receipt: i64) -> Result<(), DatalineError>;

    /// Release a message after a processing failure. Redelivers until the
    /// queue's per-message attempt budget runs out.
    async fn fail(&self, receipt: i64) -> Result<(), DatalineError>;
}
