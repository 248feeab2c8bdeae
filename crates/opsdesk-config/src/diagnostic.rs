// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Miette diagnostics for configuration errors.
//!
//! Figment failures are turned into [`ConfigError`]s that point at the
//! offending line of `opsdesk.toml` and, for misspelled keys, suggest the
//! closest key of the same section.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use std::path::Path;

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Jaro-Winkler score a known key needs before it is offered as a correction.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A configuration error ready for miette rendering.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// A key (or, at the top level, a section) that the config does not have.
    #[error("unknown key `{key}` {}", describe_section(.section))]
    #[diagnostic(
        code(opsdesk::config::unknown_key),
        help("{}", unknown_key_help(section, suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        /// Enclosing section, empty for the top level.
        section: String,
        key: String,
        suggestion: Option<String>,
        valid_keys: String,
        #[label("not a key of this section")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A value of the wrong TOML type, e.g. a string for `history_cap`.
    #[error("`{key}` expects {expected}, found {found}")]
    #[diagnostic(code(opsdesk::config::wrong_type))]
    WrongType {
        /// Dotted path of the key, e.g. `insights.history_cap`.
        key: String,
        found: String,
        expected: String,
        #[label("expected {expected}")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A value that parsed but breaks a semantic rule.
    #[error("validation error: {message}")]
    #[diagnostic(code(opsdesk::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(opsdesk::config::other))]
    Other(String),
}

fn describe_section(section: &str) -> String {
    if section.is_empty() {
        "at the top level".to_string()
    } else {
        format!("in [{section}]")
    }
}

fn unknown_key_help(section: &str, suggestion: Option<&str>, valid_keys: &str) -> String {
    let known = if section.is_empty() {
        format!("sections are: {valid_keys}")
    } else {
        format!("[{section}] accepts: {valid_keys}")
    };
    match suggestion {
        Some(s) => format!("did you mean `{s}`? {known}"),
        None => known,
    }
}

/// Converts every error inside a `figment::Error` into a [`ConfigError`].
///
/// `sources` pairs a file path (or `<inline>`) with its TOML text and is
/// used to attach source spans.
pub fn figment_to_config_errors(
    err: figment::Error,
    sources: &[(String, String)],
) -> Vec<ConfigError> {
    use figment::error::Kind;

    err.into_iter()
        .map(|error| {
            let path: Vec<String> = error.path.clone();
            match &error.kind {
                Kind::UnknownField(field, expected) => {
                    let section = path.join(".");
                    let (span, src) =
                        span_for(&error, sources, path.first().map(String::as_str), field);
                    ConfigError::UnknownKey {
                        suggestion: suggest_key(field, expected),
                        valid_keys: expected.join(", "),
                        section,
                        key: field.clone(),
                        span,
                        src,
                    }
                }
                Kind::InvalidType(found, expected) => {
                    let (section, key) = match path.split_last() {
                        Some((key, parents)) => (parents.first().map(String::as_str), key.as_str()),
                        None => (None, ""),
                    };
                    let (span, src) = span_for(&error, sources, section, key);
                    ConfigError::WrongType {
                        key: path.join("."),
                        found: found.to_string(),
                        expected: expected.clone(),
                        span,
                        src,
                    }
                }
                _ => ConfigError::Other(error.to_string()),
            }
        })
        .collect()
}

/// Picks the TOML text the error came from and locates `key` in it.
///
/// Errors raised by the environment provider have no TOML line to point at.
fn span_for(
    error: &figment::Error,
    sources: &[(String, String)],
    section: Option<&str>,
    key: &str,
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let from_env = error
        .metadata
        .as_ref()
        .is_some_and(|m| m.name.contains("environment"));
    if from_env {
        return (None, None);
    }

    let file = error
        .metadata
        .as_ref()
        .and_then(|m| m.source.as_ref())
        .and_then(|s| match s {
            figment::Source::File(path) => Some(path.as_path()),
            _ => None,
        });
    let source = match file {
        Some(file) => sources.iter().find(|(p, _)| Path::new(p) == file),
        None if sources.len() == 1 => sources.first(),
        None => None,
    };

    source
        .and_then(|(name, content)| {
            let offset = locate_key(content, section, key)?;
            Some((
                Some(SourceSpan::new(offset.into(), key.len())),
                Some(NamedSource::new(name, content.clone())),
            ))
        })
        .unwrap_or((None, None))
}

/// Byte offset of `key = ...` inside `[section]` (or before any header when
/// `section` is `None`).
fn locate_key(content: &str, section: Option<&str>, key: &str) -> Option<usize> {
    let mut current: Option<&str> = None;
    let mut offset = 0;
    for line in content.split_inclusive('\n') {
        let trimmed = line.trim_start();
        if let Some(header) = trimmed.strip_prefix('[') {
            current = header.split(']').next().map(str::trim);
        } else if current == section
            && trimmed
                .strip_prefix(key)
                .is_some_and(|rest| rest.trim_start().starts_with('='))
        {
            return Some(offset + line.len() - trimmed.len());
        }
        offset += line.len();
    }
    None
}

/// The closest of `valid_keys` to `unknown`, if any is close enough.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|&key| (key, strsim::jaro_winkler(unknown, key)))
        .filter(|&(_, score)| score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(key, _)| key.to_string())
}

/// Renders each error to stderr through miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    use miette::GraphicalReportHandler;

    let handler = GraphicalReportHandler::new();
    for error in errors {
        let mut buf = String::new();
        let diagnostic: &dyn Diagnostic = error;
        if handler.render_report(&mut buf, diagnostic).is_ok() {
            eprint!("{buf}");
        } else {
            eprintln!("Error: {error}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggests_nearest_key() {
        let valid = &["thinking_min_ms", "thinking_max_ms", "history_cap"];
        assert_eq!(suggest_key("histroy_cap", valid), Some("history_cap".to_string()));
        assert_eq!(
            suggest_key("chord_windw_ms", &["chord_window_ms"]),
            Some("chord_window_ms".to_string())
        );
        assert_eq!(suggest_key("zzzzzz", &["name", "log_level", "agent_name"]), None);
    }

    #[test]
    fn locates_key_only_inside_its_section() {
        let content = "[inbox]\nhistory_cap = 1\n\n[insights]\n  history_cap = 5\n";
        let offset = locate_key(content, Some("insights"), "history_cap").expect("offset");
        assert_eq!(&content[offset..offset + 11], "history_cap");
        assert!(offset > content.find("[insights]").unwrap());

        assert!(locate_key(content, Some("keyboard"), "history_cap").is_none());
        assert!(locate_key(content, None, "history_cap").is_none());
    }

    #[test]
    fn key_prefix_is_not_a_match() {
        let content = "[insights]\nhistory_cap_extra = 1\nhistory_cap = 2\n";
        let offset = locate_key(content, Some("insights"), "history_cap").unwrap();
        assert_eq!(&content[offset..], "history_cap = 2\n");
    }

    #[test]
    fn unknown_key_names_its_section() {
        let errors = crate::load_and_validate_str("[keyboard]\nchord_windw_ms = 500\n").unwrap_err();
        let [ConfigError::UnknownKey { section, key, suggestion, span, .. }] = errors.as_slice()
        else {
            panic!("unexpected errors: {errors:?}");
        };
        assert_eq!(section, "keyboard");
        assert_eq!(key, "chord_windw_ms");
        assert_eq!(suggestion.as_deref(), Some("chord_window_ms"));
        assert!(span.is_some());
        assert!(errors[0].to_string().contains("in [keyboard]"));
    }

    #[test]
    fn wrong_type_points_at_the_value_key() {
        let errors = crate::load_and_validate_str("[insights]\nhistory_cap = \"twenty\"\n").unwrap_err();
        match &errors[0] {
            ConfigError::WrongType { key, span, .. } => {
                assert_eq!(key, "insights.history_cap");
                assert!(span.is_some());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
