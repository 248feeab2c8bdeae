// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter whose writes can be switched off.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use opsdesk_core::{HealthStatus, OpsdeskError, StorageAdapter};

/// In-memory slots that reject writes (and optionally reads) on request.
///
/// Used to check that the stores keep working from memory when the durable
/// layer is unavailable.
#[derive(Default)]
pub struct FailingStorage {
    slots: Mutex<HashMap<String, String>>,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
    rejected: AtomicUsize,
}

impl FailingStorage {
    /// Starts healthy; call [`fail_writes`](Self::fail_writes) to break it.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Number of operations rejected so far.
    pub fn rejected(&self) -> usize {
        self.rejected.load(Ordering::SeqCst)
    }

    /// Seeds a slot directly, bypassing the failure switches.
    pub async fn put_raw(&self, key: &str, value: &str) {
        self.slots
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
    }

    fn reject(&self, operation: &str) -> OpsdeskError {
        self.rejected.fetch_add(1, Ordering::SeqCst);
        OpsdeskError::storage(std::io::Error::other(format!("{operation} rejected")))
    }
}

#[async_trait]
impl StorageAdapter for FailingStorage {
    fn name(&self) -> &str {
        "failing"
    }

    async fn health_check(&self) -> Result<HealthStatus, OpsdeskError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Ok(HealthStatus::Degraded("writes rejected".to_string()))
        } else {
            Ok(HealthStatus::Healthy)
        }
    }

    async fn get(&self, key: &str) -> Result<Option<String>, OpsdeskError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(self.reject("read"));
        }
        Ok(self.slots.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), OpsdeskError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(self.reject("write"));
        }
        self.slots
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), OpsdeskError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(self.reject("remove"));
        }
        self.slots.lock().await.remove(key);
        Ok(())
    }
}
