// SPDX-FileCopyrightText: 2026 Dataline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Execution adapter trait for the tabular query engine.

use async_trait::async_trait;

use crate::error::DatalineError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ExecutionStatus, ResultSet};

/// Adapter for the external query execution engine.
///
/// The engine accepts a SQL string, returns an opaque execution handle, and
/// is polled for status until it reaches a terminal state. Result pages are
/// positional rows aligned to the column list; engines that echo the header
/// as the first data row leave it in place -- normalization is the
/// orchestrator's job.
#[async_trait]
pub trait ExecutionAdapter: PluginAdapter {
    /// Submit a query for asynchronous execution. Returns the execution id.
    ///
    /// `output_location` is the engine-side path prefix where it stages its
    /// own output (distinct from the pipeline's blob store).
    async fn submit(&self, sql: &str, output_location: &str) -> Result<String, DatalineError>;

    /// Fetch the current status of an execution.
    async fn status(&self, execution_id: &str) -> Result<ExecutionStatus, DatalineError>;

    /// Fetch up to `max_rows` result rows for a succeeded execution.
    async fn fetch_results(
        &self,
        execution_id: &str,
        max_rows: u32,
    ) -> Result<ResultSet, DatalineError>;
}
