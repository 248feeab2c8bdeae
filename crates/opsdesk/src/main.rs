// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Opsdesk - operations desk for e-commerce support teams.
//!
//! This is the binary entry point. Each subcommand drives one of the engine
//! crates from the terminal.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod ask;
mod config_cmd;
mod history;
mod inbox;
mod output;
mod status;

use std::path::PathBuf;
use std::str::FromStr;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;

use opsdesk_config::model::OpsdeskConfig;
use opsdesk_core::OpsdeskError;
use opsdesk_inbox::Queue;

/// Opsdesk - inbox queues, keyboard shortcuts and an insights assistant.
#[derive(Parser, Debug)]
#[command(name = "opsdesk", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Keep insights history in memory only for this run.
    #[arg(long, global = true)]
    ephemeral: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    plain: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// List a queue of the seeded inbox, optionally replaying shortcuts.
    Inbox(InboxArgs),
    /// Ask the insights assistant a question.
    Ask(AskArgs),
    /// List, delete or clear saved insights threads.
    History(HistoryArgs),
    /// Print the effective configuration.
    Config {
        /// Emit JSON instead of TOML.
        #[arg(long)]
        json: bool,
    },
    /// Check the storage backend.
    Status {
        /// Emit JSON for scripting.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
pub struct InboxArgs {
    /// Queue to show.
    #[arg(long, default_value = "urgent", value_parser = parse_queue)]
    pub queue: Queue,

    /// Only show conversations matching this text.
    #[arg(long)]
    pub search: Option<String>,

    /// Keys to replay through the inbox shortcuts, e.g. "jjx" or "go".
    #[arg(long)]
    pub keys: Option<String>,

    /// Emit JSON for scripting.
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct AskArgs {
    /// The question.
    #[arg(required = true, num_args = 1..)]
    pub question: Vec<String>,

    /// Start a new thread instead of continuing the active one.
    #[arg(long)]
    pub new: bool,

    /// Return as soon as a deep dive starts instead of waiting for its result.
    #[arg(long)]
    pub no_wait: bool,
}

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Delete the thread with this id.
    #[arg(long, conflicts_with = "clear")]
    pub delete: Option<String>,

    /// Forget every saved thread.
    #[arg(long)]
    pub clear: bool,

    /// Emit JSON for scripting.
    #[arg(long)]
    pub json: bool,
}

fn parse_queue(value: &str) -> Result<Queue, String> {
    Queue::from_str(value).map_err(|_| {
        format!("unknown queue `{value}` (expected urgent, open, pending or done)")
    })
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => opsdesk_config::load_and_validate_path(path),
        None => opsdesk_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            opsdesk_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.app.log_level);
    tracing::debug!(app = %config.app.name, "config loaded");

    let use_color = output::use_color(cli.plain);
    if let Err(e) = run(cli, config, use_color).await {
        if use_color {
            eprintln!("{}: {e}", "error".red());
        } else {
            eprintln!("error: {e}");
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: OpsdeskConfig, use_color: bool) -> Result<(), OpsdeskError> {
    match cli.command {
        Some(Commands::Inbox(args)) => inbox::run_inbox(&config, args, use_color).await,
        Some(Commands::Ask(args)) => {
            let storage = opsdesk_storage::open_storage(&config.storage, cli.ephemeral).await?;
            let result = ask::run_ask(&config, storage.clone(), args, use_color).await;
            storage.close().await?;
            result
        }
        Some(Commands::History(args)) => {
            let storage = opsdesk_storage::open_storage(&config.storage, cli.ephemeral).await?;
            let result = history::run_history(&config, storage.clone(), args, use_color).await;
            storage.close().await?;
            result
        }
        Some(Commands::Config { json }) => config_cmd::run_config(&config, json),
        Some(Commands::Status { json }) => {
            status::run_status(&config, cli.ephemeral, json, use_color).await
        }
        None => {
            println!("opsdesk: use --help for available commands");
            Ok(())
        }
    }
}

/// Initializes the tracing subscriber with the given log level.
///
/// Logs go to stderr so command output on stdout stays machine-readable.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "opsdesk={log_level},opsdesk_inbox={log_level},opsdesk_insights={log_level},\
             opsdesk_storage={log_level},opsdesk_keyboard={log_level},warn"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
