// SPDX-FileCopyrightText: 2026 Dataline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./dataline.toml` > `~/.config/dataline/dataline.toml`
//! > `/etc/dataline/dataline.toml` with environment variable overrides via
//! the `DATALINE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::DatalineConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/dataline/dataline.toml` (system-wide)
/// 3. `~/.config/dataline/dataline.toml` (user XDG config)
/// 4. `./dataline.toml` (local directory)
/// 5. `DATALINE_*` environment variables
pub fn load_config() -> Result<DatalineConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(DatalineConfig::default()))
        .merge(Toml::file("/etc/dataline/dataline.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("dataline/dataline.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("dataline.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<DatalineConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(DatalineConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<DatalineConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(DatalineConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `DATALINE_PIPELINE_MAX_CONVERSATIONS`
/// must map to `pipeline.max_conversations`, not `pipeline.max.conversations`.
fn env_provider() -> Env {
    Env::prefixed("DATALINE_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: DATALINE_PIPELINE_POLL_INTERVAL_MS -> "pipeline_poll_interval_ms"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("service_", "service.", 1)
            .replacen("pipeline_", "pipeline.", 1)
            .replacen("translation_", "translation.", 1)
            .replacen("engine_", "engine.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("server_", "server.", 1);
        mapped.into()
    })
}
