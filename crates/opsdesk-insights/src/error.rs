// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use opsdesk_core::{OpsdeskError, StepStatus};
use thiserror::Error;

/// Errors returned by [`InsightsStore`](crate::InsightsStore) operations.
#[derive(Debug, Error)]
pub enum InsightsError {
    #[error("message must not be empty")]
    EmptyMessage,

    /// A reply is still being generated for the active thread.
    #[error("a response is already being generated")]
    TurnInProgress,

    /// The thread changed while the reply was being generated.
    #[error("the conversation changed before the response was ready")]
    TurnCancelled,

    #[error("conversation not found: {0}")]
    ConversationNotFound(String),

    #[error("message not found: {0}")]
    MessageNotFound(String),

    #[error("message {0} is not a deep dive")]
    NotDeepDive(String),

    #[error("step {step_id} not found in message {message_id}")]
    StepNotFound { message_id: String, step_id: String },

    #[error("step {step_id} cannot move from {from} to {to}")]
    InvalidTransition {
        step_id: String,
        from: StepStatus,
        to: StepStatus,
    },

    #[error("deep dive {0} still has unfinished steps")]
    IncompleteSteps(String),

    #[error("deep dive {0} already has a result")]
    AlreadyComplete(String),

    #[error(transparent)]
    Storage(#[from] OpsdeskError),
}
