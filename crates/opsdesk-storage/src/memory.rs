// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process key-value storage.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use opsdesk_core::{HealthStatus, OpsdeskError, StorageAdapter};

/// A [`StorageAdapter`] that keeps every slot in a map. Nothing survives
/// the process; used for `--ephemeral` runs and tests.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slots: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.read().is_empty()
    }
}

#[async_trait]
impl StorageAdapter for MemoryStorage {
    fn name(&self) -> &str {
        "memory"
    }

    async fn health_check(&self) -> Result<HealthStatus, OpsdeskError> {
        Ok(HealthStatus::Healthy)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, OpsdeskError> {
        Ok(self.slots.read().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), OpsdeskError> {
        self.slots.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), OpsdeskError> {
        self.slots.write().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn last_write_wins() {
        let storage = MemoryStorage::new();
        assert!(storage.is_empty());

        storage.set("a", "1").await.unwrap();
        storage.set("a", "2").await.unwrap();
        assert_eq!(storage.get("a").await.unwrap().as_deref(), Some("2"));
        assert_eq!(storage.len(), 1);

        storage.remove("a").await.unwrap();
        assert_eq!(storage.get("a").await.unwrap(), None);
    }
}
