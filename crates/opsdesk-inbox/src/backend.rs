// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The request seam behind optimistic inbox mutations.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use opsdesk_config::model::InboxConfig;
use opsdesk_core::OpsdeskError;

use crate::model::Message;

/// Confirms inbox mutations with whatever owns the canonical data.
///
/// The store applies each change locally first and calls the backend
/// afterwards. An error makes the store roll its local change back.
#[async_trait]
pub trait InboxBackend: Send + Sync + 'static {
    async fn archive(&self, conversation_id: &str) -> Result<(), OpsdeskError>;

    async fn reply(&self, conversation_id: &str, message: &Message) -> Result<(), OpsdeskError>;
}

/// A backend that waits a fixed latency and then accepts every request.
#[derive(Debug, Clone)]
pub struct SimulatedBackend {
    archive_latency: Duration,
    reply_latency: Duration,
}

impl SimulatedBackend {
    pub fn new(archive_latency: Duration, reply_latency: Duration) -> Self {
        Self {
            archive_latency,
            reply_latency,
        }
    }

    pub fn from_config(config: &InboxConfig) -> Self {
        Self::new(config.archive_latency(), config.reply_latency())
    }
}

impl Default for SimulatedBackend {
    fn default() -> Self {
        Self::from_config(&InboxConfig::default())
    }
}

#[async_trait]
impl InboxBackend for SimulatedBackend {
    async fn archive(&self, conversation_id: &str) -> Result<(), OpsdeskError> {
        tokio::time::sleep(self.archive_latency).await;
        debug!(conversation_id, "archive acknowledged");
        Ok(())
    }

    async fn reply(&self, conversation_id: &str, message: &Message) -> Result<(), OpsdeskError> {
        tokio::time::sleep(self.reply_latency).await;
        debug!(conversation_id, message_id = %message.id, "reply acknowledged");
        Ok(())
    }
}
