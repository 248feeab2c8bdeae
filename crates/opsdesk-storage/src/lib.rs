// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable storage for the Opsdesk engine.
//!
//! Provides a WAL-mode SQLite key-value store with embedded migrations and a
//! single-writer concurrency model via `tokio-rusqlite`, an in-memory
//! equivalent, and the conversation history adapter that sits on top of
//! either.

pub mod adapter;
pub mod database;
pub mod history;
pub mod memory;
pub mod migrations;

use std::sync::Arc;

use opsdesk_config::model::StorageConfig;
use opsdesk_core::{OpsdeskError, StorageAdapter};

pub use adapter::SqliteStorage;
pub use database::Database;
pub use history::{retain_most_recent, ConversationHistory, PersistedHistory};
pub use memory::MemoryStorage;

/// Opens the configured backend: SQLite at `config.database_path`, or an
/// in-memory map when `ephemeral` is set.
pub async fn open_storage(
    config: &StorageConfig,
    ephemeral: bool,
) -> Result<Arc<dyn StorageAdapter>, OpsdeskError> {
    let storage: Arc<dyn StorageAdapter> = if ephemeral {
        Arc::new(MemoryStorage::new())
    } else {
        Arc::new(SqliteStorage::new(config.clone()))
    };
    storage.initialize().await?;
    Ok(storage)
}
