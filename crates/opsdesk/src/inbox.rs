// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `opsdesk inbox` command implementation.
//!
//! Builds an inbox over the seed conversations, optionally replays a string
//! of keys through the inbox shortcuts, and prints the resulting view.

use std::sync::Arc;

use chrono::Utc;
use colored::Colorize;
use tokio::time::Instant;
use tracing::{info, warn};

use opsdesk_config::model::OpsdeskConfig;
use opsdesk_core::OpsdeskError;
use opsdesk_inbox::{seed_conversations, InboxStore, Queue, SimulatedBackend};
use opsdesk_keyboard::{inbox_keymap, Dispatcher, IntentOutcome, KeyInput};

use crate::output;
use crate::InboxArgs;

/// Run the `opsdesk inbox` command.
pub async fn run_inbox(
    config: &OpsdeskConfig,
    args: InboxArgs,
    use_color: bool,
) -> Result<(), OpsdeskError> {
    let store = InboxStore::new(
        seed_conversations(Utc::now()),
        Arc::new(SimulatedBackend::from_config(&config.inbox)),
        &config.inbox,
        config.app.agent_name.clone(),
    );
    store.set_current_queue(args.queue);
    if let Some(search) = &args.search {
        store.set_search_query(search.as_str());
    }

    if let Some(keys) = &args.keys {
        replay_keys(&store, config, keys).await?;
    }

    if args.json {
        print_json(&store)
    } else {
        print_view(&store, use_color);
        Ok(())
    }
}

/// Feeds each character of `keys` through the inbox shortcuts, applying the
/// resulting intents in order.
async fn replay_keys(
    store: &InboxStore,
    config: &OpsdeskConfig,
    keys: &str,
) -> Result<(), OpsdeskError> {
    let keymap = inbox_keymap().map_err(|e| OpsdeskError::Internal(e.to_string()))?;
    let mut dispatcher = Dispatcher::from_config(keymap, &config.keyboard);

    for c in keys.chars() {
        let Some(intent) = dispatcher.dispatch(&KeyInput::char(c), Instant::now()) else {
            continue;
        };
        match intent.apply(store).await {
            Ok(IntentOutcome::Applied) => info!(key = %c, %intent, "shortcut applied"),
            Ok(IntentOutcome::NoTarget) => info!(key = %c, %intent, "shortcut had no target"),
            Ok(IntentOutcome::Ui(intent)) => info!(key = %c, %intent, "view-only shortcut"),
            Err(e) => warn!(key = %c, %intent, error = %e, "shortcut failed"),
        }
    }
    Ok(())
}

fn print_view(store: &InboxStore, use_color: bool) {
    let queue = store.current_queue();
    let counts = store.queue_counts();
    let now = Utc::now();

    output::heading(&format!("opsdesk inbox: {queue}"), use_color);
    let tabs: Vec<String> = [Queue::Urgent, Queue::Open, Queue::Pending, Queue::Done]
        .into_iter()
        .map(|q| {
            let tab = format!("{q} ({})", counts.get(q));
            if q == queue && use_color {
                tab.bold().underline().to_string()
            } else if q == queue {
                format!("*{tab}")
            } else {
                tab
            }
        })
        .collect();
    println!("    {}", tabs.join("   "));
    if !store.search_query().is_empty() {
        println!("    search: {}", store.search_query());
    }
    println!();

    let visible = store.filtered_conversations();
    if visible.is_empty() {
        println!("    (no conversations)");
    }
    let selected = store.selected_id();
    let checked = store.checked_ids();
    for conversation in &visible {
        let cursor = if selected.as_deref() == Some(conversation.id.as_str()) {
            ">"
        } else {
            " "
        };
        let check = if checked.contains(&conversation.id) {
            "[x]"
        } else {
            "   "
        };
        let unread = if conversation.unread { "*" } else { " " };
        let sla = store
            .sla_status(&conversation.id, now)
            .map(|s| output::sla_label(s, use_color))
            .unwrap_or_default();
        let name = if use_color && conversation.unread {
            conversation.customer.name.bold().to_string()
        } else {
            conversation.customer.name.clone()
        };
        println!(
            "  {cursor} {check} {unread} {name:<18} {channel:<10} {subject}",
            channel = conversation.channel.to_string(),
            subject = conversation.subject,
        );
        println!(
            "           {sla} {} {}",
            output::ago(conversation.updated_at, now),
            conversation
                .assignee
                .as_deref()
                .map(|a| format!("assigned to {a}"))
                .unwrap_or_default()
        );
    }
    println!();
}

fn print_json(store: &InboxStore) -> Result<(), OpsdeskError> {
    let counts = store.queue_counts();
    let value = serde_json::json!({
        "queue": store.current_queue(),
        "search": store.search_query(),
        "selected": store.selected_id(),
        "checked": store.checked_ids(),
        "counts": {
            "urgent": counts.urgent,
            "open": counts.open,
            "pending": counts.pending,
            "done": counts.done,
        },
        "conversations": store.filtered_conversations(),
    });
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
