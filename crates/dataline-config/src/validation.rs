// SPDX-FileCopyrightText: 2026 Dataline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as positive poll budgets and non-empty paths.

use crate::diagnostic::ConfigError;
use crate::model::DatalineConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &DatalineConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.pipeline.max_conversations == 0 {
        errors.push(ConfigError::Validation {
            message: "pipeline.max_conversations must be at least 1".to_string(),
        });
    }

    if config.pipeline.history_limit == 0 {
        errors.push(ConfigError::Validation {
            message: "pipeline.history_limit must be at least 1".to_string(),
        });
    }

    if config.pipeline.poll_interval_ms == 0 {
        errors.push(ConfigError::Validation {
            message: "pipeline.poll_interval_ms must be positive".to_string(),
        });
    }

    if config.pipeline.poll_max_attempts == 0 {
        errors.push(ConfigError::Validation {
            message: "pipeline.poll_max_attempts must be at least 1".to_string(),
        });
    }

    if config.pipeline.max_result_rows == 0 {
        errors.push(ConfigError::Validation {
            message: "pipeline.max_result_rows must be at least 1".to_string(),
        });
    }

    if config.pipeline.record_ttl_days <= 0 {
        errors.push(ConfigError::Validation {
            message: format!(
                "pipeline.record_ttl_days must be positive, got {}",
                config.pipeline.record_ttl_days
            ),
        });
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.storage.blob_root.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.blob_root must not be empty".to_string(),
        });
    }

    if config.engine.base_url.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "engine.base_url must not be empty".to_string(),
        });
    } else if !config.engine.base_url.starts_with("http://")
        && !config.engine.base_url.starts_with("https://")
    {
        errors.push(ConfigError::Validation {
            message: format!(
                "engine.base_url must be an http(s) URL, got `{}`",
                config.engine.base_url
            ),
        });
    }

    let addr = config.server.bind_address.trim();
    if addr.is_empty() {
        errors.push(ConfigError::Validation {
            message: "server.bind_address must not be empty".to_string(),
        });
    } else {
        let is_valid_ip = addr.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = addr
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!(
                    "server.bind_address `{addr}` is not a valid IP address or hostname"
                ),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = DatalineConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn zero_poll_attempts_rejected() {
        let mut config = DatalineConfig::default();
        config.pipeline.poll_max_attempts = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("poll_max_attempts"));
    }

    #[test]
    fn multiple_errors_collected_without_fail_fast() {
        let mut config = DatalineConfig::default();
        config.pipeline.max_conversations = 0;
        config.pipeline.record_ttl_days = -1;
        config.storage.database_path = "  ".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn non_http_engine_url_rejected() {
        let mut config = DatalineConfig::default();
        config.engine.base_url = "ftp://engine.internal".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].to_string().contains("engine.base_url"));
    }

    #[test]
    fn garbage_bind_address_rejected() {
        let mut config = DatalineConfig::default();
        config.server.bind_address = "not valid!".to_string();
        assert!(validate_config(&config).is_err());
    }
}
