// SPDX-FileCopyrightText: 2026 Dataline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire types for the engine coordinator REST API.

use serde::{Deserialize, Serialize};

/// Request body for POST /v1/executions.
#[derive(Debug, Clone, Serialize)]
pub struct SubmitRequest {
    pub query: String,
    pub database: String,
    pub workgroup: String,
    /// Engine-side staging prefix for this execution's output.
    pub output_location: String,
}

/// Response body for a submitted execution.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitResponse {
    pub execution_id: String,
}

/// Response body for GET /v1/executions/{id}.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    /// QUEUED, RUNNING, SUCCEEDED, FAILED, or CANCELLED.
    pub state: String,
    /// State change reason on FAILED/CANCELLED.
    #[serde(default)]
    pub reason: Option<String>,
}

/// One column descriptor in a result page.
#[derive(Debug, Clone, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
}

/// One positional row in a result page.
#[derive(Debug, Clone, Deserialize)]
pub struct ResultRow {
    pub data: Vec<Option<String>>,
}

/// Response body for GET /v1/executions/{id}/results.
///
/// The engine echoes the column header as the first row, the same way it
/// stages its own CSV output.
#[derive(Debug, Clone, Deserialize)]
pub struct ResultsResponse {
    pub columns: Vec<ColumnInfo>,
    pub rows: Vec<ResultRow>,
}

/// Error envelope returned by the coordinator on failure.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineErrorResponse {
    pub message: String,
}
