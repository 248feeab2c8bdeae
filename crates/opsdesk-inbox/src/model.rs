// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbox entities: conversations, their messages and AI reply drafts.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use opsdesk_core::types::new_id;

/// Where a conversation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Channel {
    Email,
    Chat,
    Instagram,
    Facebook,
    Sms,
    TikTok,
    Shopify,
}

/// The view a conversation is filed under.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, EnumIter,
    Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Queue {
    Urgent,
    Open,
    Pending,
    Done,
}

/// Service-level standing of a conversation relative to its deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum SlaStatus {
    Healthy,
    AtRisk,
    Breached,
}

impl SlaStatus {
    /// Breached once `now` reaches the deadline; at risk when no more than
    /// `at_risk_window` remains.
    pub fn evaluate(deadline: DateTime<Utc>, now: DateTime<Utc>, at_risk_window: Duration) -> Self {
        if now >= deadline {
            SlaStatus::Breached
        } else if deadline - now <= at_risk_window {
            SlaStatus::AtRisk
        } else {
            SlaStatus::Healthy
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRef {
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Author {
    Customer,
    Agent,
    System,
}

/// One entry in a conversation thread. Never edited after it is appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    pub author: Author,
    pub author_name: String,
    pub body: String,
    pub timestamp: DateTime<Utc>,
    pub channel: Channel,
}

impl Message {
    pub fn new(
        conversation_id: impl Into<String>,
        author: Author,
        author_name: impl Into<String>,
        body: impl Into<String>,
        channel: Channel,
    ) -> Self {
        Self {
            id: new_id(),
            conversation_id: conversation_id.into(),
            author,
            author_name: author_name.into(),
            body: body.into(),
            timestamp: Utc::now(),
            channel,
        }
    }
}

/// A suggested reply. Confidence is kept within `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiDraft {
    pub id: String,
    pub conversation_id: String,
    pub body: String,
    pub confidence: f64,
    pub reasoning: String,
}

impl AiDraft {
    pub fn new(
        conversation_id: impl Into<String>,
        body: impl Into<String>,
        confidence: f64,
        reasoning: impl Into<String>,
    ) -> Self {
        let confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
        Self {
            id: new_id(),
            conversation_id: conversation_id.into(),
            body: body.into(),
            confidence,
            reasoning: reasoning.into(),
        }
    }
}

/// A customer conversation. `queue` alone decides which view shows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub customer: CustomerRef,
    pub subject: String,
    pub preview: String,
    pub channel: Channel,
    pub queue: Queue,
    pub sla_deadline: DateTime<Utc>,
    pub messages: Vec<Message>,
    pub ai_draft: Option<AiDraft>,
    pub unread: bool,
    pub assignee: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn sla_status(&self, now: DateTime<Utc>, at_risk_window: Duration) -> SlaStatus {
        SlaStatus::evaluate(self.sla_deadline, now, at_risk_window)
    }

    /// Case-insensitive substring match over customer name, subject and
    /// preview. `needle` must already be lowercased.
    pub(crate) fn matches_lowercase(&self, needle: &str) -> bool {
        [&self.customer.name, &self.subject, &self.preview]
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn sla_boundaries() {
        let now = Utc::now();
        let window = Duration::minutes(60);

        assert_eq!(SlaStatus::evaluate(now, now, window), SlaStatus::Breached);
        assert_eq!(
            SlaStatus::evaluate(now - Duration::minutes(5), now, window),
            SlaStatus::Breached
        );
        assert_eq!(
            SlaStatus::evaluate(now + Duration::minutes(60), now, window),
            SlaStatus::AtRisk
        );
        assert_eq!(
            SlaStatus::evaluate(now + Duration::minutes(61), now, window),
            SlaStatus::Healthy
        );
        assert_eq!(SlaStatus::AtRisk.to_string(), "at-risk");
    }

    #[test]
    fn draft_confidence_is_clamped() {
        assert_eq!(AiDraft::new("c", "hi", 1.7, "").confidence, 1.0);
        assert_eq!(AiDraft::new("c", "hi", -0.2, "").confidence, 0.0);
        assert_eq!(AiDraft::new("c", "hi", f64::NAN, "").confidence, 0.0);
        assert_eq!(AiDraft::new("c", "hi", 0.82, "").confidence, 0.82);
    }

    #[test]
    fn queue_parses_case_insensitively() {
        assert_eq!(Queue::from_str("URGENT").unwrap(), Queue::Urgent);
        assert_eq!(Queue::from_str("done").unwrap(), Queue::Done);
        assert!(Queue::from_str("archived").is_err());
        assert_eq!(Queue::Pending.to_string(), "pending");
    }

    #[test]
    fn channel_serializes_lowercase() {
        let json = serde_json::to_string(&Channel::TikTok).unwrap();
        assert_eq!(json, "\"tiktok\"");
    }
}
