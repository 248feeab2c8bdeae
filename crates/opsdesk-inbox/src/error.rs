// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use opsdesk_core::OpsdeskError;
use thiserror::Error;

/// Errors returned by [`InboxStore`](crate::InboxStore) operations.
#[derive(Debug, Error)]
pub enum InboxError {
    #[error("conversation not found: {0}")]
    ConversationNotFound(String),

    #[error("reply content must not be empty")]
    EmptyReply,

    /// The backend rejected a mutation. The optimistic change has already
    /// been rolled back when this is returned.
    #[error("{operation} failed for conversation {id}: {source}")]
    Backend {
        operation: &'static str,
        id: String,
        #[source]
        source: OpsdeskError,
    },
}
