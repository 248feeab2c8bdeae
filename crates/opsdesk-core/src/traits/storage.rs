// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable key-value storage trait.

use async_trait::async_trait;

use crate::error::OpsdeskError;
use crate::types::HealthStatus;

/// Adapter for a durable string key-value slot store.
///
/// The engine only ever needs whole-value reads and writes of a few well-known
/// keys, so the surface mirrors a browser-style local storage: get, set,
/// remove. Writes are last-write-wins; there is no merge or conflict
/// detection.
#[async_trait]
pub trait StorageAdapter: Send + Sync + 'static {
    /// Returns the human-readable name of this backend (e.g. "sqlite").
    fn name(&self) -> &str;

    /// Opens underlying resources. Called once before any other operation.
    async fn initialize(&self) -> Result<(), OpsdeskError> {
        Ok(())
    }

    /// Flushes and releases underlying resources.
    async fn close(&self) -> Result<(), OpsdeskError> {
        Ok(())
    }

    /// Performs a health check and returns the backend's current status.
    async fn health_check(&self) -> Result<HealthStatus, OpsdeskError>;

    /// Reads the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, OpsdeskError>;

    /// Replaces the value stored under `key`.
    async fn set(&self, key: &str, value: &str) -> Result<(), OpsdeskError>;

    /// Removes `key`. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), OpsdeskError>;
}
