// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared between the insights engine and the persistence layer.
//!
//! The chat transcript model lives here (rather than in `opsdesk-insights`)
//! because the history adapter in `opsdesk-storage` serializes it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Generates a fresh opaque identifier.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// A single entry in an insights transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum ChatMessage {
    /// Free text typed by the operator.
    User(UserMessage),
    /// A generated answer.
    Assistant(AiMessage),
}

impl ChatMessage {
    pub fn id(&self) -> &str {
        match self {
            ChatMessage::User(m) => &m.id,
            ChatMessage::Assistant(m) => &m.id,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            ChatMessage::User(m) => &m.content,
            ChatMessage::Assistant(m) => &m.content,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            ChatMessage::User(m) => m.timestamp,
            ChatMessage::Assistant(m) => m.timestamp,
        }
    }

    /// Returns the deep-dive payload if this is a deep-dive answer.
    pub fn as_deep_dive(&self) -> Option<&DeepDive> {
        match self {
            ChatMessage::Assistant(AiMessage {
                body: AiContent::DeepDive(dive),
                ..
            }) => Some(dive),
            _ => None,
        }
    }

    pub fn as_deep_dive_mut(&mut self) -> Option<&mut DeepDive> {
        match self {
            ChatMessage::Assistant(AiMessage {
                body: AiContent::DeepDive(dive),
                ..
            }) => Some(dive),
            _ => None,
        }
    }
}

/// A message authored by the operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserMessage {
    pub id: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl UserMessage {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// A generated answer. The `type` tag of [`AiContent`] is flattened into the
/// message object so the persisted shape is `{ role, type, id, content, ... }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiMessage {
    pub id: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub body: AiContent,
}

impl AiMessage {
    pub fn new(content: impl Into<String>, body: AiContent) -> Self {
        Self {
            id: new_id(),
            content: content.into(),
            timestamp: Utc::now(),
            body,
        }
    }

    /// The variant name as persisted (`simple`, `chart`, `deepDive`).
    pub fn kind(&self) -> &'static str {
        match self.body {
            AiContent::Simple => "simple",
            AiContent::Chart { .. } => "chart",
            AiContent::DeepDive(_) => "deepDive",
        }
    }
}

/// Variant-specific payload of an [`AiMessage`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AiContent {
    /// Plain text answer.
    Simple,
    /// Text plus a chart.
    Chart { chart: ChartData },
    /// A timed multi-step analysis that reveals a result when every step completes.
    DeepDive(DeepDive),
}

/// Chart payloads, one variant per chart shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ChartData {
    Bar { title: String, bars: Vec<ChartPoint> },
    Line { title: String, points: Vec<ChartPoint> },
}

/// A labelled numeric value in a chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub label: String,
    pub value: f64,
}

/// Lifecycle of one deep-dive step. Ordering follows the allowed direction
/// of travel: a step may only move to a greater status.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString, Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StepStatus {
    Pending,
    Running,
    Complete,
}

impl StepStatus {
    /// Whether moving from `self` to `next` keeps the step monotonic.
    /// Re-applying the current status is allowed.
    pub fn can_advance_to(self, next: StepStatus) -> bool {
        next >= self
    }
}

/// One named step of a deep dive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeepDiveStep {
    pub id: String,
    pub label: String,
    pub status: StepStatus,
    #[serde(rename = "duration")]
    pub duration_secs: f64,
}

impl DeepDiveStep {
    pub fn pending(id: impl Into<String>, label: impl Into<String>, duration_secs: f64) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            status: StepStatus::Pending,
            duration_secs,
        }
    }
}

/// Which analysis a deep dive runs. Decides the result revealed at the end.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum AnalysisKind {
    #[default]
    ProductLaunch,
    Sentiment,
}

/// The step list and (eventual) result of a deep-dive message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeepDive {
    #[serde(default)]
    pub analysis: AnalysisKind,
    pub steps: Vec<DeepDiveStep>,
    #[serde(default)]
    pub result: Option<DeepDiveResult>,
    #[serde(rename = "estimatedTime")]
    pub estimated_time_secs: f64,
}

impl DeepDive {
    /// Builds a fresh deep dive; the estimate is the sum of step durations.
    pub fn new(analysis: AnalysisKind, steps: Vec<DeepDiveStep>) -> Self {
        let estimated_time_secs = steps.iter().map(|s| s.duration_secs).sum();
        Self {
            analysis,
            steps,
            result: None,
            estimated_time_secs,
        }
    }

    /// Total duration of the steps that have not completed.
    pub fn remaining_secs(&self) -> f64 {
        self.steps
            .iter()
            .filter(|s| s.status != StepStatus::Complete)
            .map(|s| s.duration_secs)
            .sum()
    }

    pub fn is_complete(&self) -> bool {
        self.result.is_some()
    }

    pub fn all_steps_complete(&self) -> bool {
        self.steps.iter().all(|s| s.status == StepStatus::Complete)
    }

    /// Index of the first step that has not completed yet.
    pub fn first_unfinished(&self) -> Option<usize> {
        self.steps
            .iter()
            .position(|s| s.status != StepStatus::Complete)
    }
}

/// Terminal payloads revealed when a deep dive finishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum DeepDiveResult {
    /// Ranked product recommendations.
    Table {
        title: String,
        products: Vec<ProductRecommendation>,
    },
    /// Aggregate customer sentiment.
    Sentiment {
        score: f64,
        positive_pct: u8,
        neutral_pct: u8,
        negative_pct: u8,
        themes: Vec<String>,
    },
}

/// One row of a product recommendation table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecommendation {
    pub name: String,
    pub sku: String,
    pub match_score: f64,
    pub projected_monthly_revenue: f64,
    pub rationale: String,
}

/// A persisted insights thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatConversation {
    pub id: String,
    pub title: String,
    pub messages: Vec<ChatMessage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChatConversation {
    /// Starts a thread titled from its first user message.
    pub fn new(first_message: &str, title_max_chars: usize) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            title: derive_title(first_message, title_max_chars),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Truncates `text` to `max_chars` characters, appending `...` when cut.
pub fn derive_title(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut title: String = text.chars().take(max_chars).collect();
    title.push_str("...");
    title
}
