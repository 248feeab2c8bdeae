// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Terminal formatting shared by the subcommands.

use std::io::IsTerminal;

use chrono::{DateTime, Utc};
use colored::Colorize;

use opsdesk_inbox::SlaStatus;

/// Colors are used only on a terminal and never with `--plain`.
pub fn use_color(plain: bool) -> bool {
    !plain && std::io::stdout().is_terminal()
}

pub fn heading(title: &str, use_color: bool) {
    println!();
    if use_color {
        println!("  {}", title.bold());
    } else {
        println!("  {title}");
    }
    println!("  {}", "-".repeat(40));
}

pub fn sla_label(status: SlaStatus, use_color: bool) -> String {
    let label = status.to_string();
    if !use_color {
        return format!("[{label}]");
    }
    match status {
        SlaStatus::Healthy => label.green().to_string(),
        SlaStatus::AtRisk => label.yellow().to_string(),
        SlaStatus::Breached => label.red().bold().to_string(),
    }
}

pub fn check_mark(done: bool, use_color: bool) -> String {
    match (done, use_color) {
        (true, true) => "✓".green().to_string(),
        (true, false) => "[x]".to_string(),
        (false, true) => "·".dimmed().to_string(),
        (false, false) => "[ ]".to_string(),
    }
}

/// Formats the time since `then` as a short "5m ago" style string.
pub fn ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - then).num_seconds().max(0);
    let days = secs / 86400;
    let hours = (secs % 86400) / 3600;
    let minutes = (secs % 3600) / 60;

    if days > 0 {
        format!("{days}d ago")
    } else if hours > 0 {
        format!("{hours}h {minutes}m ago")
    } else if minutes > 0 {
        format!("{minutes}m ago")
    } else {
        "just now".to_string()
    }
}

/// A horizontal bar scaled so that `max` fills `width` cells.
pub fn bar(value: f64, max: f64, width: usize) -> String {
    if max <= 0.0 || !value.is_finite() {
        return String::new();
    }
    let cells = ((value / max) * width as f64).round().clamp(0.0, width as f64) as usize;
    "█".repeat(cells)
}
