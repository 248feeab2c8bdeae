// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `opsdesk status` command implementation.
//!
//! Opens the configured storage backend, runs its health check and reports
//! how many insights threads are saved. Falls back gracefully when the
//! backend cannot be opened.

use serde::Serialize;

use opsdesk_config::model::OpsdeskConfig;
use opsdesk_core::{HealthStatus, OpsdeskError};
use opsdesk_storage::ConversationHistory;

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub backend: String,
    pub healthy: bool,
    pub detail: Option<String>,
    pub database_path: Option<String>,
    pub saved_threads: usize,
}

/// Run the `opsdesk status` command.
pub async fn run_status(
    config: &OpsdeskConfig,
    ephemeral: bool,
    json: bool,
    use_color: bool,
) -> Result<(), OpsdeskError> {
    let database_path = (!ephemeral).then(|| config.storage.database_path.clone());

    let response = match opsdesk_storage::open_storage(&config.storage, ephemeral).await {
        Ok(storage) => {
            let health = storage.health_check().await?;
            let history = ConversationHistory::new(
                storage.clone(),
                config.storage.history_key.clone(),
                config.insights.history_cap,
            );
            let saved_threads = history.load().await.conversations.len();
            storage.close().await?;
            let (healthy, detail) = match health {
                HealthStatus::Healthy => (true, None),
                HealthStatus::Degraded(d) => (true, Some(d)),
                HealthStatus::Unhealthy(d) => (false, Some(d)),
            };
            StatusResponse {
                backend: storage.name().to_string(),
                healthy,
                detail,
                database_path,
                saved_threads,
            }
        }
        Err(e) => StatusResponse {
            backend: (if ephemeral { "memory" } else { "sqlite" }).to_string(),
            healthy: false,
            detail: Some(e.to_string()),
            database_path,
            saved_threads: 0,
        },
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print_status(&response, use_color);
    }
    Ok(())
}

fn print_status(status: &StatusResponse, use_color: bool) {
    println!();
    println!("  opsdesk status");
    println!("  {}", "-".repeat(35));

    let state = if status.healthy { "healthy" } else { "unavailable" };
    if use_color {
        use colored::Colorize;
        if status.healthy {
            println!("    Storage:  {} {} ({})", "✓".green(), state.green(), status.backend);
        } else {
            println!("    Storage:  {} {} ({})", "✗".red(), state.red(), status.backend);
        }
    } else {
        let tag = if status.healthy { "[OK]" } else { "[FAIL]" };
        println!("    Storage:  {tag} {state} ({})", status.backend);
    }

    if let Some(detail) = &status.detail {
        println!("    Detail:   {detail}");
    }
    if let Some(path) = &status.database_path {
        println!("    Database: {path}");
    }
    println!("    Threads:  {}", status.saved_threads);
    println!();
}
