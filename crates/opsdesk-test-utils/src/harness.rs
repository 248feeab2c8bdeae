// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles an inbox store over the seeded conversations and a
//! storage backend (in-memory, temp SQLite, or a failing adapter) from which
//! insights stores can be opened and reopened to observe persistence.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use opsdesk_config::model::{OpsdeskConfig, StorageConfig};
use opsdesk_core::{OpsdeskError, StorageAdapter};
use opsdesk_inbox::{seed_conversations, Conversation, InboxStore};
use opsdesk_insights::InsightsStore;
use opsdesk_storage::{ConversationHistory, MemoryStorage, SqliteStorage};

use crate::failing_storage::FailingStorage;
use crate::mock_backend::MockBackend;

enum StorageKind {
    Memory,
    Sqlite,
    Failing,
}

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    storage: StorageKind,
    backend: MockBackend,
    conversations: Option<Vec<Conversation>>,
    config: OpsdeskConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            storage: StorageKind::Memory,
            backend: MockBackend::new(),
            conversations: None,
            config: fast_config(),
        }
    }

    /// Back the harness with a SQLite database in a temp directory.
    pub fn with_sqlite(mut self) -> Self {
        self.storage = StorageKind::Sqlite;
        self
    }

    /// Back the harness with a [`FailingStorage`] the test can break.
    pub fn with_failing_storage(mut self) -> Self {
        self.storage = StorageKind::Failing;
        self
    }

    /// Use a specific inbox backend.
    pub fn with_backend(mut self, backend: MockBackend) -> Self {
        self.backend = backend;
        self
    }

    /// Start the inbox from these conversations instead of the seed data.
    pub fn with_conversations(mut self, conversations: Vec<Conversation>) -> Self {
        self.conversations = Some(conversations);
        self
    }

    /// Adjust the configuration before the stores are built.
    pub fn with_config(mut self, adjust: impl FnOnce(&mut OpsdeskConfig)) -> Self {
        adjust(&mut self.config);
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, OpsdeskError> {
        let mut config = self.config;
        let mut temp_dir = None;
        let mut failing = None;

        let storage: Arc<dyn StorageAdapter> = match self.storage {
            StorageKind::Memory => Arc::new(MemoryStorage::new()),
            StorageKind::Sqlite => {
                let dir = tempfile::TempDir::new().map_err(OpsdeskError::storage)?;
                config.storage = StorageConfig {
                    database_path: dir.path().join("test.db").to_string_lossy().into_owned(),
                    ..config.storage
                };
                temp_dir = Some(dir);
                Arc::new(SqliteStorage::new(config.storage.clone()))
            }
            StorageKind::Failing => {
                let storage = Arc::new(FailingStorage::new());
                failing = Some(Arc::clone(&storage));
                storage
            }
        };
        storage.initialize().await?;

        let backend = Arc::new(self.backend);
        let conversations = self
            .conversations
            .unwrap_or_else(|| seed_conversations(Utc::now()));
        let inbox = InboxStore::new(
            conversations,
            backend.clone(),
            &config.inbox,
            config.app.agent_name.clone(),
        );

        Ok(TestHarness {
            config,
            storage,
            failing,
            backend,
            inbox,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with a mock backend and scratch storage.
pub struct TestHarness {
    /// Configuration the stores were built with.
    pub config: OpsdeskConfig,
    /// Storage shared by every insights store opened from this harness.
    pub storage: Arc<dyn StorageAdapter>,
    /// Handle to the failing adapter, when the harness was built with one.
    pub failing: Option<Arc<FailingStorage>>,
    /// The inbox backend, for inspecting recorded requests.
    pub backend: Arc<MockBackend>,
    /// Inbox store over the seeded conversations.
    pub inbox: InboxStore,
    _temp_dir: Option<tempfile::TempDir>,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// The history adapter over this harness's storage.
    pub fn history(&self) -> ConversationHistory {
        ConversationHistory::new(
            self.storage.clone(),
            self.config.storage.history_key.clone(),
            self.config.insights.history_cap,
        )
    }

    /// Open an insights store from whatever is currently persisted.
    ///
    /// Calling this twice simulates a restart.
    pub async fn insights(&self) -> InsightsStore {
        InsightsStore::load(self.history(), self.config.insights.clone()).await
    }
}

/// Defaults with the simulated delays shortened for tests.
pub fn fast_config() -> OpsdeskConfig {
    let mut config = OpsdeskConfig::default();
    config.inbox.archive_latency_ms = 0;
    config.inbox.reply_latency_ms = 0;
    config.insights.thinking_min_ms = 10;
    config.insights.thinking_max_ms = 20;
    config.insights.countdown_tick_ms = 50;
    config
}

/// Polls `check` every few milliseconds until it holds or `timeout` passes.
pub async fn wait_until(timeout: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    check()
}
