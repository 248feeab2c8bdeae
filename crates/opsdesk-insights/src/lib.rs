// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Insights chat engine for the Opsdesk dashboard.
//!
//! [`InsightsStore`] runs question/answer turns against the canned
//! [`ResponseEngine`], keeps saved threads in a
//! [`ConversationHistory`](opsdesk_storage::ConversationHistory), and drives
//! deep-dive answers through the [`DeepDiveOrchestrator`].

pub mod deep_dive;
pub mod error;
pub mod responses;
pub mod store;

pub use deep_dive::{DeepDiveOrchestrator, DeepDiveSink};
pub use error::InsightsError;
pub use responses::{analysis_result, Response, ResponseEngine};
pub use store::{InsightsState, InsightsStore};
