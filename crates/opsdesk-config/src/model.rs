// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Opsdesk engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level Opsdesk configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to the prototype's timing constants.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OpsdeskConfig {
    /// Process identity and logging.
    #[serde(default)]
    pub app: AppConfig,

    /// Durable storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Inbox queue store settings.
    #[serde(default)]
    pub inbox: InboxConfig,

    /// Keyboard dispatcher settings.
    #[serde(default)]
    pub keyboard: KeyboardConfig,

    /// Insights chat engine settings.
    #[serde(default)]
    pub insights: InsightsConfig,
}

/// Process identity configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Display name of the workspace.
    #[serde(default = "default_app_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Display name stamped on replies sent from the inbox.
    #[serde(default = "default_agent_name")]
    pub agent_name: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            log_level: default_log_level(),
            agent_name: default_agent_name(),
        }
    }
}

fn default_app_name() -> String {
    "opsdesk".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_agent_name() -> String {
    "You".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file holding the key-value slots.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,

    /// Key under which the insights conversation history is stored.
    #[serde(default = "default_history_key")]
    pub history_key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
            history_key: default_history_key(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("opsdesk").join("opsdesk.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("opsdesk.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

fn default_history_key() -> String {
    "insights-conversations".to_string()
}

/// Inbox queue store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct InboxConfig {
    /// Simulated backend latency for archive requests, in milliseconds.
    #[serde(default = "default_mutation_latency_ms")]
    pub archive_latency_ms: u64,

    /// Simulated backend latency for reply requests, in milliseconds.
    #[serde(default = "default_mutation_latency_ms")]
    pub reply_latency_ms: u64,

    /// Remaining time before an SLA deadline at which a conversation counts as at risk.
    #[serde(default = "default_sla_at_risk_minutes")]
    pub sla_at_risk_minutes: i64,
}

impl Default for InboxConfig {
    fn default() -> Self {
        Self {
            archive_latency_ms: default_mutation_latency_ms(),
            reply_latency_ms: default_mutation_latency_ms(),
            sla_at_risk_minutes: default_sla_at_risk_minutes(),
        }
    }
}

impl InboxConfig {
    pub fn archive_latency(&self) -> Duration {
        Duration::from_millis(self.archive_latency_ms)
    }

    pub fn reply_latency(&self) -> Duration {
        Duration::from_millis(self.reply_latency_ms)
    }
}

fn default_mutation_latency_ms() -> u64 {
    200
}

fn default_sla_at_risk_minutes() -> i64 {
    60
}

/// Keyboard dispatcher configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct KeyboardConfig {
    /// How long a chord prefix stays armed, in milliseconds.
    #[serde(default = "default_chord_window_ms")]
    pub chord_window_ms: u64,
}

impl Default for KeyboardConfig {
    fn default() -> Self {
        Self {
            chord_window_ms: default_chord_window_ms(),
        }
    }
}

impl KeyboardConfig {
    pub fn chord_window(&self) -> Duration {
        Duration::from_millis(self.chord_window_ms)
    }
}

fn default_chord_window_ms() -> u64 {
    1000
}

/// Insights chat engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct InsightsConfig {
    /// Lower bound of the simulated thinking delay, in milliseconds.
    #[serde(default = "default_thinking_min_ms")]
    pub thinking_min_ms: u64,

    /// Upper bound of the simulated thinking delay, in milliseconds.
    #[serde(default = "default_thinking_max_ms")]
    pub thinking_max_ms: u64,

    /// Maximum number of conversations retained in durable storage.
    #[serde(default = "default_history_cap")]
    pub history_cap: usize,

    /// Interval of the cosmetic "time remaining" countdown, in milliseconds.
    #[serde(default = "default_countdown_tick_ms")]
    pub countdown_tick_ms: u64,

    /// Maximum characters of the first user message kept in a thread title.
    #[serde(default = "default_title_max_chars")]
    pub title_max_chars: usize,
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            thinking_min_ms: default_thinking_min_ms(),
            thinking_max_ms: default_thinking_max_ms(),
            history_cap: default_history_cap(),
            countdown_tick_ms: default_countdown_tick_ms(),
            title_max_chars: default_title_max_chars(),
        }
    }
}

impl InsightsConfig {
    pub fn countdown_tick(&self) -> Duration {
        Duration::from_millis(self.countdown_tick_ms)
    }
}

fn default_thinking_min_ms() -> u64 {
    800
}

fn default_thinking_max_ms() -> u64 {
    1500
}

fn default_history_cap() -> usize {
    20
}

fn default_countdown_tick_ms() -> u64 {
    100
}

fn default_title_max_chars() -> usize {
    50
}
