// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./opsdesk.toml` > `~/.config/opsdesk/opsdesk.toml` > `/etc/opsdesk/opsdesk.toml`
//! with environment variable overrides via `OPSDESK_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::OpsdeskConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/opsdesk/opsdesk.toml` (system-wide)
/// 3. `~/.config/opsdesk/opsdesk.toml` (user XDG config)
/// 4. `./opsdesk.toml` (local directory)
/// 5. `OPSDESK_*` environment variables
pub fn load_config() -> Result<OpsdeskConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<OpsdeskConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(OpsdeskConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<OpsdeskConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(OpsdeskConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(OpsdeskConfig::default()))
        .merge(Toml::file("/etc/opsdesk/opsdesk.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("opsdesk/opsdesk.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("opsdesk.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `OPSDESK_INSIGHTS_HISTORY_CAP` must map to
/// `insights.history_cap`, not `insights.history.cap`.
fn env_provider() -> Env {
    Env::prefixed("OPSDESK_").map(|key| map_env_key(key.as_str()).into())
}

/// Maps a lowercased, prefix-stripped env var name onto its dotted config path.
pub(crate) fn map_env_key(key: &str) -> String {
    const SECTIONS: &[&str] = &["app", "storage", "inbox", "keyboard", "insights"];

    for section in SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_sections() {
        assert_eq!(map_env_key("insights_history_cap"), "insights.history_cap");
        assert_eq!(map_env_key("keyboard_chord_window_ms"), "keyboard.chord_window_ms");
        assert_eq!(map_env_key("app_log_level"), "app.log_level");
        assert_eq!(map_env_key("storage_database_path"), "storage.database_path");
    }

    #[test]
    fn unknown_env_keys_pass_through() {
        assert_eq!(map_env_key("unrelated"), "unrelated");
    }
}
