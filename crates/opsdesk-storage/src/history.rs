// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence of the insights conversation history.
//!
//! The whole history lives in a single durable slot as JSON:
//! `{ "conversations": [...], "activeId": "..." | null }`. Every write keeps
//! only the most recently updated conversations, up to the configured cap.
//! Reads never fail: a missing, unreadable or malformed slot loads as an
//! empty history.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use opsdesk_core::{ChatConversation, OpsdeskError, StorageAdapter};

/// The persisted payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedHistory {
    #[serde(default)]
    pub conversations: Vec<ChatConversation>,
    #[serde(default)]
    pub active_id: Option<String>,
}

/// Sorts `conversations` most recently updated first and drops everything
/// past `cap`. Ties keep their relative order. The conversation named by
/// `keep` survives even when it is older than the cutoff; it takes the last
/// slot. Returns how many were dropped.
pub fn retain_most_recent(
    conversations: &mut Vec<ChatConversation>,
    cap: usize,
    keep: Option<&str>,
) -> usize {
    conversations.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    if conversations.len() <= cap {
        return 0;
    }
    let pinned = keep.and_then(|id| conversations.iter().position(|c| c.id == id));
    if let Some(index) = pinned.filter(|&i| cap > 0 && i >= cap) {
        let active = conversations.remove(index);
        conversations.insert(cap - 1, active);
    }
    let dropped = conversations.len() - cap;
    conversations.truncate(cap);
    dropped
}

/// Reads and writes [`PersistedHistory`] through a [`StorageAdapter`].
#[derive(Clone)]
pub struct ConversationHistory {
    storage: Arc<dyn StorageAdapter>,
    key: String,
    cap: usize,
}

impl ConversationHistory {
    pub fn new(storage: Arc<dyn StorageAdapter>, key: impl Into<String>, cap: usize) -> Self {
        Self {
            storage,
            key: key.into(),
            cap,
        }
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Loads the stored history, falling back to empty on any failure.
    pub async fn load(&self) -> PersistedHistory {
        let raw = match self.storage.get(&self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key = %self.key, "no stored conversation history");
                return PersistedHistory::default();
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "failed to read conversation history");
                return PersistedHistory::default();
            }
        };

        match serde_json::from_str::<PersistedHistory>(&raw) {
            Ok(mut history) => {
                // Drop a dangling active id rather than pointing at nothing.
                let dangling = history
                    .active_id
                    .as_ref()
                    .filter(|active| !history.conversations.iter().any(|c| &c.id == *active))
                    .cloned();
                if let Some(active) = dangling {
                    warn!(active_id = %active, "stored active conversation is missing");
                    history.active_id = None;
                }
                debug!(
                    key = %self.key,
                    conversations = history.conversations.len(),
                    "conversation history loaded"
                );
                history
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "stored conversation history is malformed, starting empty");
                PersistedHistory::default()
            }
        }
    }

    /// Writes the history, capped to the most recent conversations.
    ///
    /// Returns the number of conversations dropped by the cap.
    pub async fn save(
        &self,
        conversations: &[ChatConversation],
        active_id: Option<&str>,
    ) -> Result<usize, OpsdeskError> {
        let mut conversations = conversations.to_vec();
        let dropped = retain_most_recent(&mut conversations, self.cap, active_id);
        if dropped > 0 {
            info!(dropped, cap = self.cap, "conversation history capped");
        }

        let payload = PersistedHistory {
            conversations,
            active_id: active_id.map(str::to_string),
        };
        let raw = serde_json::to_string(&payload)?;
        self.storage.set(&self.key, &raw).await?;
        debug!(
            key = %self.key,
            conversations = payload.conversations.len(),
            "conversation history saved"
        );
        Ok(dropped)
    }

    /// Removes the stored history entirely.
    pub async fn clear(&self) -> Result<(), OpsdeskError> {
        self.storage.remove(&self.key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStorage;
    use chrono::{Duration, Utc};
    use tracing_test::traced_test;

    const KEY: &str = "insights-conversations";

    fn conversation(title: &str, minutes_ago: i64) -> ChatConversation {
        let mut c = ChatConversation::new(title, 50);
        c.updated_at = Utc::now() - Duration::minutes(minutes_ago);
        c
    }

    fn history(cap: usize) -> (Arc<MemoryStorage>, ConversationHistory) {
        let storage = Arc::new(MemoryStorage::new());
        let history = ConversationHistory::new(storage.clone(), KEY, cap);
        (storage, history)
    }

    #[tokio::test]
    async fn missing_slot_loads_empty() {
        let (_, history) = history(20);
        assert_eq!(history.load().await, PersistedHistory::default());
    }

    #[traced_test]
    #[tokio::test]
    async fn malformed_slot_loads_empty_and_warns() {
        let (storage, history) = history(20);
        storage.set(KEY, "{not json").await.unwrap();

        let loaded = history.load().await;
        assert!(loaded.conversations.is_empty());
        assert!(loaded.active_id.is_none());
        assert!(logs_contain("malformed"));
    }

    #[tokio::test]
    async fn round_trip_preserves_conversations_and_active_id() {
        let (_, history) = history(20);
        let a = conversation("first", 5);
        let b = conversation("second", 1);

        history.save(&[a.clone(), b.clone()], Some(a.id.as_str())).await.unwrap();
        let loaded = history.load().await;

        assert_eq!(loaded.conversations, vec![b, a.clone()]);
        assert_eq!(loaded.active_id.as_deref(), Some(a.id.as_str()));
    }

    #[tokio::test]
    async fn save_keeps_only_most_recent() {
        let (_, history) = history(20);
        let all: Vec<_> = (0..25).map(|i| conversation(&format!("c{i}"), i)).collect();

        let dropped = history.save(&all, None).await.unwrap();
        assert_eq!(dropped, 5);

        let loaded = history.load().await;
        assert_eq!(loaded.conversations.len(), 20);
        // c0 is newest, c19 the oldest survivor.
        assert_eq!(loaded.conversations[0].title, "c0");
        assert_eq!(loaded.conversations[19].title, "c19");
    }

    #[tokio::test]
    async fn save_keeps_the_active_conversation_past_the_cap() {
        let (_, history) = history(3);
        let all: Vec<_> = (0..5).map(|i| conversation(&format!("c{i}"), i)).collect();
        let oldest = all[4].id.clone();

        let dropped = history.save(&all, Some(oldest.as_str())).await.unwrap();
        assert_eq!(dropped, 2);

        let loaded = history.load().await;
        let titles: Vec<_> = loaded.conversations.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, ["c0", "c1", "c4"]);
        assert_eq!(loaded.active_id.as_deref(), Some(oldest.as_str()));
    }

    #[tokio::test]
    async fn dangling_active_id_is_cleared() {
        let (storage, history) = history(20);
        let payload = serde_json::json!({ "conversations": [], "activeId": "gone" });
        storage.set(KEY, &payload.to_string()).await.unwrap();

        assert!(history.load().await.active_id.is_none());
    }

    #[tokio::test]
    async fn wire_shape_uses_camel_case() {
        let (storage, history) = history(20);
        let c = conversation("hello", 0);
        history.save(&[c.clone()], Some(c.id.as_str())).await.unwrap();

        let raw = storage.get(KEY).await.unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["activeId"], c.id.as_str());
        assert!(value["conversations"][0]["createdAt"].is_string());
        assert!(value["conversations"][0]["updatedAt"].is_string());
    }

    #[test]
    fn retain_most_recent_is_stable_on_ties() {
        let now = Utc::now();
        let mut list: Vec<_> = ["a", "b", "c"]
            .iter()
            .map(|t| {
                let mut c = ChatConversation::new(t, 50);
                c.updated_at = now;
                c
            })
            .collect();
        assert_eq!(retain_most_recent(&mut list, 2, None), 1);
        let titles: Vec<_> = list.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, ["a", "b"]);
    }
}
