// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `opsdesk ask` command implementation.
//!
//! Runs one insights turn against the persisted history and prints the
//! answer. Deep-dive answers are followed step by step until their result is
//! revealed, unless `--no-wait` is given; an unfinished deep dive resumes the
//! next time the thread is opened.

use std::sync::Arc;

use colored::Colorize;

use opsdesk_config::model::OpsdeskConfig;
use opsdesk_core::{AiContent, ChartData, DeepDive, DeepDiveResult, OpsdeskError, StepStatus, StorageAdapter};
use opsdesk_insights::{InsightsError, InsightsStore};
use opsdesk_storage::ConversationHistory;

use crate::output;
use crate::AskArgs;

/// Run the `opsdesk ask` command.
pub async fn run_ask(
    config: &OpsdeskConfig,
    storage: Arc<dyn StorageAdapter>,
    args: AskArgs,
    use_color: bool,
) -> Result<(), OpsdeskError> {
    let history = ConversationHistory::new(
        storage,
        config.storage.history_key.clone(),
        config.insights.history_cap,
    );
    let store = InsightsStore::load(history, config.insights.clone()).await;
    if args.new {
        store.create_new_chat().await;
    }

    let question = args.question.join(" ");
    let answer = store.send_message(&question).await.map_err(into_opsdesk)?;

    println!();
    if use_color {
        println!("  {} {}", "assistant".cyan().bold(), answer.content);
    } else {
        println!("  assistant: {}", answer.content);
    }

    match &answer.body {
        AiContent::Simple => {}
        AiContent::Chart { chart } => print_chart(chart, use_color),
        AiContent::DeepDive(dive) if args.no_wait => {
            println!(
                "\n  Deep dive started ({} steps, ~{:.0}s). It resumes the next time this thread is opened.",
                dive.steps.len(),
                dive.estimated_time_secs
            );
        }
        AiContent::DeepDive(dive) => {
            println!(
                "\n  Running {} steps (~{:.0}s)",
                dive.steps.len(),
                dive.estimated_time_secs
            );
            let finished = follow_deep_dive(&store, &answer.id, use_color).await?;
            if let Some(result) = &finished.result {
                print_result(result, use_color);
            }
        }
    }
    println!();
    Ok(())
}

/// Prints each step as it completes and returns the finished deep dive.
async fn follow_deep_dive(
    store: &InsightsStore,
    message_id: &str,
    use_color: bool,
) -> Result<DeepDive, OpsdeskError> {
    let mut revision = store.subscribe();
    let mut reported = 0;
    let wait = store.wait_for_deep_dive(message_id);
    tokio::pin!(wait);

    let finished = loop {
        tokio::select! {
            finished = &mut wait => break finished.map_err(into_opsdesk)?,
            changed = revision.changed() => {
                if changed.is_ok() {
                    reported = report_steps(store, message_id, reported, use_color);
                }
            }
        }
    };
    report_steps(store, message_id, reported, use_color);
    Ok(finished)
}

/// Prints steps `reported..` that have completed; returns the new count.
fn report_steps(store: &InsightsStore, message_id: &str, reported: usize, use_color: bool) -> usize {
    let messages = store.messages();
    let Some(dive) = messages
        .iter()
        .find(|m| m.id() == message_id)
        .and_then(|m| m.as_deep_dive())
    else {
        return reported;
    };
    let done: Vec<_> = dive
        .steps
        .iter()
        .take_while(|s| s.status == StepStatus::Complete)
        .collect();
    for step in done.iter().skip(reported) {
        println!("    {} {}", output::check_mark(true, use_color), step.label);
    }
    done.len().max(reported)
}

fn print_chart(chart: &ChartData, use_color: bool) {
    let (title, points) = match chart {
        ChartData::Bar { title, bars } => (title, bars),
        ChartData::Line { title, points } => (title, points),
    };
    output::heading(title, use_color);
    let max = points.iter().map(|p| p.value).fold(0.0_f64, f64::max);
    for point in points {
        let bar = output::bar(point.value, max, 30);
        let bar = if use_color { bar.blue().to_string() } else { bar };
        println!("    {:<12} {bar} {:.2}", point.label, point.value);
    }
}

fn print_result(result: &DeepDiveResult, use_color: bool) {
    match result {
        DeepDiveResult::Table { title, products } => {
            output::heading(title, use_color);
            for (rank, product) in products.iter().enumerate() {
                println!(
                    "    {}. {} ({}) match {:.0}%, ~${:.0}/mo",
                    rank + 1,
                    product.name,
                    product.sku,
                    product.match_score * 100.0,
                    product.projected_monthly_revenue
                );
                println!("       {}", product.rationale);
            }
        }
        DeepDiveResult::Sentiment {
            score,
            positive_pct,
            neutral_pct,
            negative_pct,
            themes,
        } => {
            output::heading("Customer sentiment", use_color);
            println!("    score {score:.2}");
            println!(
                "    positive {positive_pct}%   neutral {neutral_pct}%   negative {negative_pct}%"
            );
            for theme in themes {
                println!("    - {theme}");
            }
        }
    }
}

/// Maps an insights failure onto the process-level error.
pub(crate) fn into_opsdesk(error: InsightsError) -> OpsdeskError {
    match error {
        InsightsError::Storage(e) => e,
        other => OpsdeskError::Internal(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_errors_pass_through() {
        let err = into_opsdesk(InsightsError::Storage(OpsdeskError::storage(
            std::io::Error::other("disk"),
        )));
        assert!(matches!(err, OpsdeskError::Storage { .. }));

        let err = into_opsdesk(InsightsError::TurnInProgress);
        assert!(err.to_string().contains("already being generated"));
    }
}
