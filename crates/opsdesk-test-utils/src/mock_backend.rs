// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recording inbox backend for deterministic testing.
//!
//! `MockBackend` implements `InboxBackend`, records every request it sees,
//! and can be told to reject requests for particular conversations so tests
//! can observe the store's rollback path.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use opsdesk_core::OpsdeskError;
use opsdesk_inbox::{InboxBackend, Message};

/// An inbox backend that records requests and fails on demand.
pub struct MockBackend {
    latency: Duration,
    fail_all: bool,
    fail_ids: Mutex<HashSet<String>>,
    archived: Mutex<Vec<String>>,
    replies: Mutex<Vec<(String, Message)>>,
}

impl MockBackend {
    /// A backend that accepts everything immediately.
    pub fn new() -> Self {
        Self {
            latency: Duration::ZERO,
            fail_all: false,
            fail_ids: Mutex::new(HashSet::new()),
            archived: Mutex::new(Vec::new()),
            replies: Mutex::new(Vec::new()),
        }
    }

    /// A backend that rejects every request.
    pub fn failing() -> Self {
        Self {
            fail_all: true,
            ..Self::new()
        }
    }

    /// Delay each request by `latency` before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Reject requests that target `conversation_id`.
    pub async fn fail_on(&self, conversation_id: &str) {
        self.fail_ids.lock().await.insert(conversation_id.to_string());
    }

    /// Conversation ids of accepted archive requests, in order.
    pub async fn archived(&self) -> Vec<String> {
        self.archived.lock().await.clone()
    }

    /// Accepted replies, in order.
    pub async fn replies(&self) -> Vec<(String, Message)> {
        self.replies.lock().await.clone()
    }

    async fn check(&self, operation: &str, conversation_id: &str) -> Result<(), OpsdeskError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.fail_all || self.fail_ids.lock().await.contains(conversation_id) {
            return Err(OpsdeskError::Internal(format!(
                "mock backend rejected {operation} for {conversation_id}"
            )));
        }
        Ok(())
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InboxBackend for MockBackend {
    async fn archive(&self, conversation_id: &str) -> Result<(), OpsdeskError> {
        self.check("archive", conversation_id).await?;
        self.archived.lock().await.push(conversation_id.to_string());
        Ok(())
    }

    async fn reply(&self, conversation_id: &str, message: &Message) -> Result<(), OpsdeskError> {
        self.check("reply", conversation_id).await?;
        self.replies
            .lock()
            .await
            .push((conversation_id.to_string(), message.clone()));
        Ok(())
    }
}
