// SPDX-FileCopyrightText: 2026 Dataline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Dataline query pipeline.

use thiserror::Error;

/// The primary error type used across all Dataline collaborator traits and
/// pipeline stages.
///
/// Each variant corresponds to one stage of the pipeline, so callers can
/// tell where a request died without parsing message strings.
#[derive(Debug, Error)]
pub enum DatalineError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Durable store errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Translation stage errors (service failure, malformed response, empty input).
    /// Nothing is persisted and nothing is enqueued when this is raised.
    #[error("translation error: {message}")]
    Translation {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Dispatch queue errors (enqueue or receive failure).
    #[error("dispatch error: {message}")]
    Dispatch {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Execution engine reported a terminal failure, or the poll budget ran
    /// out while the query was still in flight.
    #[error("execution error: {message}")]
    Execution {
        message: String,
        /// Engine-supplied failure or cancellation reason, when available.
        reason: Option<String>,
    },

    /// Result formatting errors (blob fetch, deserialization, cache write).
    #[error("formatting error: {message}")]
    Formatting {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Retention prune errors. Best-effort: never fatal to the triggering
    /// operation.
    #[error("retention error: {0}")]
    Retention(String),

    /// A requested record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DatalineError {
    /// Stable machine-readable kind, used by the gateway when shaping
    /// structured failure responses.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Storage { .. } => "storage",
            Self::Translation { .. } => "translation",
            Self::Dispatch { .. } => "dispatch",
            Self::Execution { .. } => "execution",
            Self::Formatting { .. } => "formatting",
            Self::Retention(_) => "retention",
            Self::NotFound(_) => "not_found",
            Self::Timeout { .. } => "timeout",
            Self::Internal(_) => "internal",
        }
    }
}
