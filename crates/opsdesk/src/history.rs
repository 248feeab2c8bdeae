// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `opsdesk history` command implementation.

use std::sync::Arc;

use chrono::Utc;
use colored::Colorize;

use opsdesk_config::model::OpsdeskConfig;
use opsdesk_core::{OpsdeskError, StorageAdapter};
use opsdesk_insights::InsightsStore;
use opsdesk_storage::ConversationHistory;

use crate::ask::into_opsdesk;
use crate::output;
use crate::HistoryArgs;

/// Run the `opsdesk history` command.
///
/// Lists saved insights threads, most recent first. `--delete` and `--clear`
/// go through the insights store so the active thread stays consistent.
pub async fn run_history(
    config: &OpsdeskConfig,
    storage: Arc<dyn StorageAdapter>,
    args: HistoryArgs,
    use_color: bool,
) -> Result<(), OpsdeskError> {
    let history = ConversationHistory::new(
        storage,
        config.storage.history_key.clone(),
        config.insights.history_cap,
    );
    let store = InsightsStore::load(history, config.insights.clone()).await;

    if args.clear {
        store.clear_history().await.map_err(into_opsdesk)?;
        println!("history cleared");
        return Ok(());
    }
    if let Some(id) = &args.delete {
        store.delete_conversation(id).await.map_err(into_opsdesk)?;
        println!("deleted {id}");
        return Ok(());
    }

    let conversations = store.conversations();
    let active = store.active_id();

    if args.json {
        let value = serde_json::json!({
            "activeId": active,
            "conversations": conversations,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    output::heading("opsdesk history", use_color);
    if conversations.is_empty() {
        println!("    (no saved threads)");
    }
    let now = Utc::now();
    for conversation in &conversations {
        let marker = if active.as_deref() == Some(conversation.id.as_str()) {
            "*"
        } else {
            " "
        };
        let title = if use_color {
            conversation.title.bold().to_string()
        } else {
            conversation.title.clone()
        };
        println!("  {marker} {title}");
        println!(
            "      {} messages, {}  id {}",
            conversation.messages.len(),
            output::ago(conversation.updated_at, now),
            conversation.id
        );
    }
    println!();
    Ok(())
}
