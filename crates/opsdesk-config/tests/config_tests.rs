// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Opsdesk configuration system.

use opsdesk_config::diagnostic::{suggest_key, ConfigError};
use opsdesk_config::model::OpsdeskConfig;
use opsdesk_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_config() {
    let toml = r#"
[app]
name = "night-shift"
log_level = "debug"
agent_name = "Priya"

[storage]
database_path = "/tmp/opsdesk-test.db"
wal_mode = false
history_key = "threads"

[inbox]
archive_latency_ms = 50
reply_latency_ms = 75
sla_at_risk_minutes = 30

[keyboard]
chord_window_ms = 750

[insights]
thinking_min_ms = 100
thinking_max_ms = 200
history_cap = 5
countdown_tick_ms = 250
title_max_chars = 40
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.app.name, "night-shift");
    assert_eq!(config.app.log_level, "debug");
    assert_eq!(config.app.agent_name, "Priya");
    assert_eq!(config.storage.database_path, "/tmp/opsdesk-test.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.storage.history_key, "threads");
    assert_eq!(config.inbox.archive_latency_ms, 50);
    assert_eq!(config.inbox.reply_latency_ms, 75);
    assert_eq!(config.inbox.sla_at_risk_minutes, 30);
    assert_eq!(config.keyboard.chord_window_ms, 750);
    assert_eq!(config.insights.thinking_min_ms, 100);
    assert_eq!(config.insights.thinking_max_ms, 200);
    assert_eq!(config.insights.history_cap, 5);
    assert_eq!(config.insights.countdown_tick_ms, 250);
    assert_eq!(config.insights.title_max_chars, 40);
}

/// Missing optional sections use the prototype's constants.
#[test]
fn missing_optional_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");

    assert_eq!(config.app.name, "opsdesk");
    assert_eq!(config.app.log_level, "info");
    assert_eq!(config.app.agent_name, "You");
    assert!(config.storage.wal_mode);
    assert_eq!(config.storage.history_key, "insights-conversations");
    assert_eq!(config.inbox.archive_latency_ms, 200);
    assert_eq!(config.inbox.reply_latency_ms, 200);
    assert_eq!(config.keyboard.chord_window_ms, 1000);
    assert_eq!(config.insights.thinking_min_ms, 800);
    assert_eq!(config.insights.thinking_max_ms, 1500);
    assert_eq!(config.insights.history_cap, 20);
    assert_eq!(config.insights.countdown_tick_ms, 100);
}

/// Unknown field in [insights] produces an error naming the field.
#[test]
fn unknown_field_in_insights_produces_error() {
    let toml = r#"
[insights]
histroy_cap = 3
"#;

    let err = load_config_from_str(toml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("histroy_cap"),
        "error should mention unknown field, got: {err_str}"
    );
}

/// Unexpected top-level section is rejected by deny_unknown_fields.
#[test]
fn deny_unknown_fields_at_top_level() {
    let toml = r#"
[billing]
plan = "pro"
"#;

    let err = load_config_from_str(toml).expect_err("unknown top-level section should be rejected");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("billing"),
        "error should mention unknown field, got: {err_str}"
    );
}

/// A dotted override layered after TOML wins, as the env provider does.
#[test]
fn dotted_override_wins_over_toml() {
    use figment::{
        providers::{Format, Serialized, Toml},
        Figment,
    };

    let toml_content = r#"
[insights]
history_cap = 7
"#;

    let config: OpsdeskConfig = Figment::new()
        .merge(Serialized::defaults(OpsdeskConfig::default()))
        .merge(Toml::string(toml_content))
        .merge(("insights.history_cap", 12))
        .extract()
        .expect("should merge override");

    assert_eq!(config.insights.history_cap, 12);
}

/// Missing config files are silently skipped (Figment's Toml::file() behavior).
#[test]
fn missing_config_files_silently_skipped() {
    use figment::{
        providers::{Format, Serialized, Toml},
        Figment,
    };

    let config: OpsdeskConfig = Figment::new()
        .merge(Serialized::defaults(OpsdeskConfig::default()))
        .merge(Toml::file("/nonexistent/path/opsdesk.toml"))
        .extract()
        .expect("missing file should be silently skipped");

    assert_eq!(config.app.name, "opsdesk");
}

#[test]
fn diagnostic_error_includes_unknown_key_and_suggestion() {
    let toml = r#"
[keyboard]
chord_windw_ms = 500
"#;

    let errors = load_and_validate_str(toml).expect_err("should produce errors");
    let has_unknown_key = errors.iter().any(|e| {
        matches!(e, ConfigError::UnknownKey { section, key, suggestion, valid_keys, .. } if {
            section == "keyboard"
                && key == "chord_windw_ms"
                && suggestion.as_deref() == Some("chord_window_ms")
                && valid_keys.contains("chord_window_ms")
        })
    });
    assert!(
        has_unknown_key,
        "should suggest chord_window_ms, got: {errors:?}"
    );
}

#[test]
fn diagnostic_invalid_type_message() {
    let toml = r#"
[insights]
history_cap = "twenty"
"#;

    let err = load_config_from_str(toml).expect_err("should reject invalid type");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("invalid type") || err_str.contains("history_cap"),
        "error should mention type mismatch, got: {err_str}"
    );

    let errors = load_and_validate_str(toml).expect_err("should produce errors");
    assert!(
        errors.iter().any(|e| matches!(
            e,
            ConfigError::WrongType { key, .. } if key == "insights.history_cap"
        )),
        "should report the dotted key, got: {errors:?}"
    );
}

#[test]
fn suggest_key_is_reexported() {
    assert_eq!(
        suggest_key("agnt_name", &["name", "log_level", "agent_name"]),
        Some("agent_name".to_string())
    );
}

#[test]
fn config_error_renders_with_miette() {
    use miette::{Diagnostic, GraphicalReportHandler};

    let error = ConfigError::UnknownKey {
        section: "insights".to_string(),
        key: "histroy_cap".to_string(),
        suggestion: Some("history_cap".to_string()),
        valid_keys: "thinking_min_ms, thinking_max_ms, history_cap".to_string(),
        span: None,
        src: None,
    };

    assert!(error.code().is_some());
    let help = error.help().expect("help text").to_string();
    assert!(help.contains("did you mean `history_cap`"));
    assert!(help.contains("[insights] accepts:"));
    assert_eq!(error.to_string(), "unknown key `histroy_cap` in [insights]");

    let handler = GraphicalReportHandler::new();
    let mut buf = String::new();
    handler
        .render_report(&mut buf, &error)
        .expect("should render without error");
    assert!(buf.contains("histroy_cap"));
}

#[test]
fn validation_catches_inverted_delays() {
    let toml = r#"
[insights]
thinking_min_ms = 900
thinking_max_ms = 10
"#;

    let errors = load_and_validate_str(toml).expect_err("inverted bounds should fail");
    assert!(errors.iter().any(|e| {
        matches!(e, ConfigError::Validation { message } if message.contains("thinking_min_ms"))
    }));
}

#[test]
fn load_and_validate_path_reads_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("opsdesk.toml");
    std::fs::write(&path, "[insights]\nhistory_cap = 3\n").unwrap();

    let config = load_and_validate_path(&path).expect("file config should validate");
    assert_eq!(config.insights.history_cap, 3);
}
