// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Opsdesk workspace.
//!
//! This crate provides the shared error type, the insights chat model that
//! crosses the persistence boundary, and the [`StorageAdapter`] trait every
//! durable backend implements.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::OpsdeskError;
pub use traits::StorageAdapter;
pub use types::{
    AiContent, AiMessage, AnalysisKind, ChartData, ChartPoint, ChatConversation, ChatMessage, DeepDive,
    DeepDiveResult, DeepDiveStep, HealthStatus, ProductRecommendation, StepStatus, UserMessage,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::derive_title;

    fn sample_deep_dive() -> ChatMessage {
        ChatMessage::Assistant(AiMessage::new(
            "Running the analysis",
            AiContent::DeepDive(DeepDive::new(AnalysisKind::ProductLaunch, vec![
                DeepDiveStep::pending("s1", "Collect", 1.5),
                DeepDiveStep::pending("s2", "Rank", 2.0),
            ])),
        ))
    }

    #[test]
    fn error_variants_render() {
        let config = OpsdeskError::Config("bad".into());
        assert_eq!(config.to_string(), "configuration error: bad");

        let storage = OpsdeskError::storage(std::io::Error::other("disk full"));
        assert_eq!(storage.to_string(), "storage error: disk full");

        let internal = OpsdeskError::Internal("oops".into());
        assert!(internal.to_string().contains("oops"));
    }

    #[test]
    fn step_status_display_and_parse() {
        use std::str::FromStr;

        for status in [StepStatus::Pending, StepStatus::Running, StepStatus::Complete] {
            let s = status.to_string();
            assert_eq!(StepStatus::from_str(&s).unwrap(), status);
        }
        assert_eq!(StepStatus::Running.to_string(), "running");
    }

    #[test]
    fn step_status_only_moves_forward() {
        assert!(StepStatus::Pending.can_advance_to(StepStatus::Running));
        assert!(StepStatus::Running.can_advance_to(StepStatus::Complete));
        assert!(StepStatus::Pending.can_advance_to(StepStatus::Complete));
        assert!(StepStatus::Running.can_advance_to(StepStatus::Running));
        assert!(!StepStatus::Complete.can_advance_to(StepStatus::Running));
        assert!(!StepStatus::Running.can_advance_to(StepStatus::Pending));
    }

    #[test]
    fn deep_dive_estimate_is_sum_of_durations() {
        let msg = sample_deep_dive();
        let dive = msg.as_deep_dive().unwrap();
        assert_eq!(dive.estimated_time_secs, 3.5);
        assert!(!dive.is_complete());
        assert_eq!(dive.first_unfinished(), Some(0));
        assert_eq!(dive.remaining_secs(), 3.5);
    }

    #[test]
    fn chat_message_wire_shape() {
        let msg = sample_deep_dive();
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["role"], "assistant");
        assert_eq!(value["type"], "deepDive");
        assert_eq!(value["analysis"], "productLaunch");
        assert_eq!(value["estimatedTime"], 3.5);
        assert_eq!(value["steps"][0]["status"], "pending");
        assert_eq!(value["steps"][1]["duration"], 2.0);

        let user = ChatMessage::User(UserMessage::new("hello"));
        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value["role"], "user");
        assert_eq!(value["content"], "hello");
    }

    #[test]
    fn chat_message_decodes_tagged_variants() {
        let json = r#"{
            "role": "assistant",
            "type": "chart",
            "id": "m1",
            "content": "Channel split",
            "timestamp": "2026-03-01T12:00:00Z",
            "chart": { "kind": "bar", "title": "Revenue", "bars": [{ "label": "Shopify", "value": 10.5 }] }
        }"#;
        let msg: ChatMessage = serde_json::from_str(json).unwrap();
        match msg {
            ChatMessage::Assistant(ai) => {
                assert_eq!(ai.kind(), "chart");
                match ai.body {
                    AiContent::Chart {
                        chart: ChartData::Bar { bars, .. },
                    } => assert_eq!(bars[0].label, "Shopify"),
                    other => panic!("unexpected body: {other:?}"),
                }
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn title_truncates_on_char_boundary() {
        assert_eq!(derive_title("  short  ", 50), "short");
        let long = "é".repeat(60);
        let title = derive_title(&long, 50);
        assert_eq!(title.chars().count(), 53);
        assert!(title.ends_with("..."));
    }

    proptest::proptest! {
        #[test]
        fn title_never_exceeds_limit(text in "\\PC{0,120}", max in 1usize..80) {
            let title = derive_title(&text, max);
            proptest::prop_assert!(title.chars().count() <= max + 3);
        }
    }
}
