// SPDX-FileCopyrightText: 2026 Dataline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration error types and terminal rendering.

use thiserror::Error;

/// A configuration problem surfaced at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML/env layer could not be parsed or extracted.
    #[error("config parse error: {message}")]
    Parse { message: String },

    /// The config parsed but a semantic constraint failed.
    #[error("config validation error: {message}")]
    Validation { message: String },
}

/// Convert a figment extraction error into configuration errors.
pub fn figment_to_config_errors(err: figment::Error) -> Vec<ConfigError> {
    err.into_iter()
        .map(|e| ConfigError::Parse {
            message: e.to_string(),
        })
        .collect()
}

/// Render configuration errors to stderr, one per line.
pub fn render_errors(errors: &[ConfigError]) {
    for error in errors {
        eprintln!("dataline: {error}");
    }
}
