// SPDX-FileCopyrightText: 2026 Dataline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dispatch worker: the long-running queue consumer.
//!
//! One message at a time: receive, orchestrate, then ack or release. A
//! settled execution -- success or recorded failure -- is acked; only
//! infrastructure errors release the message for redelivery, bounded by
//! the queue's per-message attempt budget. The worker never retries
//! anything itself.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use dataline_config::model::PipelineConfig;
use dataline_core::{DatalineError, DispatchQueue};

use crate::executor::{ExecutionOrchestrator, ProcessOutcome};

/// Consumes the dispatch queue and drives the orchestrator.
pub struct DispatchWorker {
    queue: Arc<dyn DispatchQueue>,
    orchestrator: ExecutionOrchestrator,
    idle: Duration,
    shutdown: CancellationToken,
}

impl DispatchWorker {
    pub fn new(
        queue: Arc<dyn DispatchQueue>,
        orchestrator: ExecutionOrchestrator,
        config: &PipelineConfig,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            queue,
            orchestrator,
            idle: Duration::from_millis(config.worker_idle_ms),
            shutdown,
        }
    }

    /// Receive and process at most one message.
    ///
    /// Returns `Ok(true)` if a message was processed (and acked),
    /// `Ok(false)` if the queue was empty. On an infrastructure error the
    /// message is released for redelivery and the error propagates.
    pub async fn step(&self) -> Result<bool, DatalineError> {
        let Some(queued) = self.queue.receive().await? else {
            return Ok(false);
        };

        match self.orchestrator.process(&queued.message).await {
            Ok(outcome) => {
                self.queue.ack(queued.receipt).await?;
                match outcome {
                    ProcessOutcome::Completed { result_count } => {
                        debug!(
                            conversation_id = %queued.message.conversation_id,
                            result_count,
                            "dispatch completed"
                        );
                    }
                    ProcessOutcome::Failed { reason } => {
                        debug!(
                            conversation_id = %queued.message.conversation_id,
                            reason,
                            "dispatch settled as failure"
                        );
                    }
                    ProcessOutcome::Skipped => {
                        debug!(
                            conversation_id = %queued.message.conversation_id,
                            "duplicate dispatch skipped"
                        );
                    }
                }
                Ok(true)
            }
            Err(e) => {
                if let Err(release_err) = self.queue.fail(queued.receipt).await {
                    warn!(
                        receipt = queued.receipt,
                        error = %release_err,
                        "failed to release message after processing error"
                    );
                }
                Err(e)
            }
        }
    }

    /// Run until the shutdown token fires, sleeping between receive
    /// attempts while the queue is empty.
    pub async fn run(&self) {
        info!("dispatch worker started");
        loop {
            let worked = tokio::select! {
                _ = self.shutdown.cancelled() => break,
                result = self.step() => match result {
                    Ok(worked) => worked,
                    Err(e) => {
                        warn!(error = %e, "dispatch processing failed; message released for redelivery");
                        false
                    }
                },
            };
            if !worked {
                tokio::select! {
                    _ = self.shutdown.cancelled() => break,
                    _ = tokio::time::sleep(self.idle) => {}
                }
            }
        }
        info!("dispatch worker stopped");
    }
}
