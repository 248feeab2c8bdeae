// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbox conversation-queue store for the Opsdesk engine.
//!
//! Conversations are filed under exactly one [`Queue`]. The [`InboxStore`]
//! filters, searches and orders them for display, tracks focus and bulk
//! selection, and applies archive and reply mutations optimistically
//! through an [`InboxBackend`].

pub mod backend;
pub mod error;
pub mod filter;
pub mod model;
pub mod seed;
pub mod store;

pub use backend::{InboxBackend, SimulatedBackend};
pub use error::InboxError;
pub use filter::{visible_conversations, QueueCounts};
pub use model::{
    AiDraft, Author, Channel, Conversation, CustomerRef, Message, Queue, SlaStatus,
};
pub use seed::seed_conversations;
pub use store::{BulkArchiveReport, InboxStore, MutationStatus};
