// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as ordered delay bounds and non-zero timer intervals.

use crate::diagnostic::ConfigError;
use crate::model::OpsdeskConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &OpsdeskConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.app.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "app.log_level `{}` is not one of {}",
                config.app.log_level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.storage.history_key.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.history_key must not be empty".to_string(),
        });
    }

    if config.inbox.sla_at_risk_minutes < 0 {
        errors.push(ConfigError::Validation {
            message: format!(
                "inbox.sla_at_risk_minutes must be non-negative, got {}",
                config.inbox.sla_at_risk_minutes
            ),
        });
    }

    if config.keyboard.chord_window_ms == 0 {
        errors.push(ConfigError::Validation {
            message: "keyboard.chord_window_ms must be greater than 0".to_string(),
        });
    }

    let insights = &config.insights;
    if insights.thinking_min_ms > insights.thinking_max_ms {
        errors.push(ConfigError::Validation {
            message: format!(
                "insights.thinking_min_ms ({}) must not exceed insights.thinking_max_ms ({})",
                insights.thinking_min_ms, insights.thinking_max_ms
            ),
        });
    }

    if insights.history_cap == 0 {
        errors.push(ConfigError::Validation {
            message: "insights.history_cap must be at least 1".to_string(),
        });
    }

    if insights.countdown_tick_ms == 0 {
        errors.push(ConfigError::Validation {
            message: "insights.countdown_tick_ms must be greater than 0".to_string(),
        });
    }

    if insights.title_max_chars == 0 {
        errors.push(ConfigError::Validation {
            message: "insights.title_max_chars must be at least 1".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
