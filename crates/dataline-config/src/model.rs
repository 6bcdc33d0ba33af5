// SPDX-FileCopyrightText: 2026 Dataline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Dataline query pipeline.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Dataline configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DatalineConfig {
    /// Service identity and logging settings.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Pipeline tunables: retention, history, polling, result caps.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Translation service (Anthropic Messages API) settings.
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Execution engine coordinator settings.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Durable storage settings (records, queue, blobs).
    #[serde(default)]
    pub storage: StorageConfig,

    /// Gateway HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
}

/// Service identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Display name of the service.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_service_name() -> String {
    "dataline".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Pipeline tunables.
///
/// These are the policy knobs of the core: retention cap, history context
/// limit, poll cadence and budget, result row cap, and TTLs.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Maximum conversation records retained per user. Older records are
    /// pruned after every successful store.
    #[serde(default = "default_max_conversations")]
    pub max_conversations: usize,

    /// Maximum past conversations assembled as translation context.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Delay between execution status polls, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Maximum number of status polls before an in-flight execution is
    /// reported as timed out.
    #[serde(default = "default_poll_max_attempts")]
    pub poll_max_attempts: u32,

    /// Maximum result rows fetched from the engine per execution.
    #[serde(default = "default_max_result_rows")]
    pub max_result_rows: u32,

    /// Conversation record time-to-live, in days. Fixed at creation.
    #[serde(default = "default_record_ttl_days")]
    pub record_ttl_days: i64,

    /// Formatted-result cache time-to-live, in seconds.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Worker sleep between receive attempts when the queue is empty, in
    /// milliseconds.
    #[serde(default = "default_worker_idle_ms")]
    pub worker_idle_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_conversations: default_max_conversations(),
            history_limit: default_history_limit(),
            poll_interval_ms: default_poll_interval_ms(),
            poll_max_attempts: default_poll_max_attempts(),
            max_result_rows: default_max_result_rows(),
            record_ttl_days: default_record_ttl_days(),
            cache_ttl_secs: default_cache_ttl_secs(),
            worker_idle_ms: default_worker_idle_ms(),
        }
    }
}

fn default_max_conversations() -> usize {
    50
}

fn default_history_limit() -> usize {
    30
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_poll_max_attempts() -> u32 {
    20
}

fn default_max_result_rows() -> u32 {
    1000
}

fn default_record_ttl_days() -> i64 {
    90
}

fn default_cache_ttl_secs() -> u64 {
    3600
}

fn default_worker_idle_ms() -> u64 {
    250
}

/// Translation service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TranslationConfig {
    /// Anthropic API key. `None` requires the environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model to use for SQL generation.
    #[serde(default = "default_translation_model")]
    pub model: String,

    /// Maximum tokens to generate per translation.
    #[serde(default = "default_translation_max_tokens")]
    pub max_tokens: u32,

    /// Anthropic API version string.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Description of the tabular dataset schema embedded in the
    /// translation prompt.
    #[serde(default = "default_table_schema")]
    pub table_schema: String,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_translation_model(),
            max_tokens: default_translation_max_tokens(),
            api_version: default_api_version(),
            table_schema: default_table_schema(),
        }
    }
}

fn default_translation_model() -> String {
    "claude-haiku-4-5-20250901".to_string()
}

fn default_translation_max_tokens() -> u32 {
    1024
}

fn default_api_version() -> String {
    "2023-06-01".to_string()
}

fn default_table_schema() -> String {
    "\
- vtionid: string (user identifier)
- package: string (app package name)
- date: string (format: DD-MM-YYYY)
- duration_sum: integer (total duration in seconds)
- event_count: integer (number of events)
- event_time_range: string (time range format: HH:MM - HH:MM)
- day_of_week: string (e.g., Monday, Tuesday)
- app_name: string (application name)
- cat: string (category)
- genre: string (genre or type)"
        .to_string()
}

/// Execution engine coordinator configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Base URL of the engine coordinator REST API.
    #[serde(default = "default_engine_base_url")]
    pub base_url: String,

    /// Dataset (database) identifier queries run against.
    #[serde(default = "default_engine_database")]
    pub database: String,

    /// Engine workgroup used for execution.
    #[serde(default = "default_engine_workgroup")]
    pub workgroup: String,

    /// Path prefix for engine-side staged output, per user/conversation.
    #[serde(default = "default_output_prefix")]
    pub output_prefix: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: default_engine_base_url(),
            database: default_engine_database(),
            workgroup: default_engine_workgroup(),
            output_prefix: default_output_prefix(),
        }
    }
}

fn default_engine_base_url() -> String {
    "http://127.0.0.1:8191".to_string()
}

fn default_engine_database() -> String {
    "analytics".to_string()
}

fn default_engine_workgroup() -> String {
    "primary".to_string()
}

fn default_output_prefix() -> String {
    "athena-results".to_string()
}

/// Durable storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file (records + dispatch queue).
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,

    /// Root directory of the filesystem blob store.
    #[serde(default = "default_blob_root")]
    pub blob_root: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
            blob_root: default_blob_root(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("dataline").join("dataline.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("dataline.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

fn default_blob_root() -> String {
    dirs::data_dir()
        .map(|p| p.join("dataline").join("results"))
        .unwrap_or_else(|| std::path::PathBuf::from("results"))
        .to_string_lossy()
        .into_owned()
}

/// Gateway HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind the gateway to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// TCP port for the gateway.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8190
}
