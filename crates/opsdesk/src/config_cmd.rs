// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `opsdesk config` command implementation.

use opsdesk_config::model::OpsdeskConfig;
use opsdesk_core::OpsdeskError;

/// Prints the effective configuration after files and env overrides merge.
pub fn run_config(config: &OpsdeskConfig, json: bool) -> Result<(), OpsdeskError> {
    let rendered = render(config, json)?;
    println!("{rendered}");
    Ok(())
}

fn render(config: &OpsdeskConfig, json: bool) -> Result<String, OpsdeskError> {
    if json {
        Ok(serde_json::to_string_pretty(config)?)
    } else {
        toml::to_string_pretty(config).map_err(|e| OpsdeskError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_output_round_trips_through_the_loader() {
        let mut config = OpsdeskConfig::default();
        config.insights.history_cap = 7;
        let text = render(&config, false).unwrap();
        assert!(text.contains("[insights]"));

        let parsed = opsdesk_config::load_and_validate_str(&text).unwrap();
        assert_eq!(parsed.insights.history_cap, 7);
    }

    #[test]
    fn json_output_has_every_section() {
        let text = render(&OpsdeskConfig::default(), true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        for section in ["app", "storage", "inbox", "keyboard", "insights"] {
            assert!(value.get(section).is_some(), "missing {section}");
        }
    }
}
