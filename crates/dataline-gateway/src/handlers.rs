// SPDX-FileCopyrightText: 2026 Dataline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway REST API.
//!
//! Handles POST /v1/queries, GET /v1/history/{user_id},
//! GET /v1/results/{user_id}/{conversation_id}, GET /v1/health.
//! Pipeline errors become structured `{kind, error}` bodies; raw internal
//! errors never cross the wire.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use dataline_core::types::ConversationRecord;
use dataline_core::DatalineError;

use crate::server::GatewayState;

/// Request body for POST /v1/queries.
#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub user_id: String,
    pub query: String,
}

/// Response body for POST /v1/queries.
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub conversation_id: String,
}

/// Response body for GET /v1/history/{user_id}.
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub conversations: Vec<ConversationRecord>,
    pub count: usize,
}

/// Response body for GET /v1/health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Stable failure kind (translation, dispatch, not_found, ...).
    pub kind: String,
    /// Human-readable description.
    pub error: String,
}

/// POST /v1/queries
///
/// Submits a question for asynchronous processing. Returns 202 with the
/// conversation id; the caller polls /v1/results for the outcome.
pub async fn post_query(
    State(state): State<GatewayState>,
    Json(body): Json<SubmitRequest>,
) -> Response {
    match state.service.submit_query(&body.user_id, &body.query).await {
        Ok(conversation_id) => (
            StatusCode::ACCEPTED,
            Json(SubmitResponse { conversation_id }),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /v1/history/{user_id}
///
/// Returns the user's retained conversations, most-recent-first.
pub async fn get_history(
    State(state): State<GatewayState>,
    Path(user_id): Path<String>,
) -> Response {
    match state.service.get_history(&user_id).await {
        Ok(conversations) => {
            let count = conversations.len();
            (
                StatusCode::OK,
                Json(HistoryResponse {
                    conversations,
                    count,
                }),
            )
                .into_response()
        }
        Err(e) => error_response(e),
    }
}

/// GET /v1/results/{user_id}/{conversation_id}
///
/// Returns the conversation's current status, with columns and rows once
/// it completed and the failure reason if it failed.
pub async fn get_result(
    State(state): State<GatewayState>,
    Path((user_id, conversation_id)): Path<(String, String)>,
) -> Response {
    match state.service.poll_result(&user_id, &conversation_id).await {
        Ok(poll) => (StatusCode::OK, Json(poll)).into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /v1/health
pub async fn get_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Map a pipeline error onto an HTTP status plus a structured body.
fn error_response(error: DatalineError) -> Response {
    let status = match &error {
        DatalineError::Translation { .. } => StatusCode::BAD_REQUEST,
        DatalineError::Dispatch { .. } => StatusCode::SERVICE_UNAVAILABLE,
        DatalineError::NotFound(_) => StatusCode::NOT_FOUND,
        DatalineError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let body = ErrorResponse {
        kind: error.kind().to_string(),
        error: error.to_string(),
    };
    (status, Json(body)).into_response()
}
