// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The inbox queue store.
//!
//! Owns every conversation plus the view state (queue, search, focus and
//! bulk selection). Mutations that need backend confirmation are applied
//! locally first, then confirmed or rolled back when the backend answers.
//! The state lock is never held across an `.await`.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use parking_lot::RwLock;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use opsdesk_config::model::InboxConfig;

use crate::backend::InboxBackend;
use crate::error::InboxError;
use crate::filter::{visible_conversations, QueueCounts};
use crate::model::{AiDraft, Author, Conversation, Message, Queue, SlaStatus};

/// Progress of the most recent backend-confirmed mutation on a conversation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MutationStatus {
    #[default]
    Idle,
    Pending,
    Confirmed,
    Failed,
}

/// Outcome of [`InboxStore::archive_checked`].
#[derive(Debug, Default)]
pub struct BulkArchiveReport {
    pub archived: Vec<String>,
    pub failed: Vec<(String, InboxError)>,
}

#[derive(Debug)]
struct InboxState {
    conversations: Vec<Conversation>,
    selected_id: Option<String>,
    current_queue: Queue,
    search_query: String,
    checked: BTreeSet<String>,
    archive_status: HashMap<String, MutationStatus>,
    reply_status: HashMap<String, MutationStatus>,
}

impl InboxState {
    fn find_mut(&mut self, id: &str) -> Result<&mut Conversation, InboxError> {
        self.conversations
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| InboxError::ConversationNotFound(id.to_string()))
    }

    fn find(&self, id: &str) -> Result<&Conversation, InboxError> {
        self.conversations
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| InboxError::ConversationNotFound(id.to_string()))
    }

    fn visible(&self) -> Vec<Conversation> {
        visible_conversations(&self.conversations, self.current_queue, &self.search_query)
    }
}

struct Inner {
    state: RwLock<InboxState>,
    backend: Arc<dyn InboxBackend>,
    at_risk_window: chrono::Duration,
    agent_name: String,
    revision: watch::Sender<u64>,
}

/// Cheaply cloneable handle to one inbox.
#[derive(Clone)]
pub struct InboxStore {
    inner: Arc<Inner>,
}

impl InboxStore {
    /// Creates a store over `conversations`, showing the urgent queue with
    /// nothing selected.
    pub fn new(
        conversations: Vec<Conversation>,
        backend: Arc<dyn InboxBackend>,
        config: &InboxConfig,
        agent_name: impl Into<String>,
    ) -> Self {
        let (revision, _) = watch::channel(0);
        debug!(conversations = conversations.len(), "inbox store created");
        Self {
            inner: Arc::new(Inner {
                state: RwLock::new(InboxState {
                    conversations,
                    selected_id: None,
                    current_queue: Queue::Urgent,
                    search_query: String::new(),
                    checked: BTreeSet::new(),
                    archive_status: HashMap::new(),
                    reply_status: HashMap::new(),
                }),
                backend,
                at_risk_window: chrono::Duration::minutes(config.sla_at_risk_minutes),
                agent_name: agent_name.into(),
                revision,
            }),
        }
    }

    /// Observe state changes. The value is a counter bumped on every mutation.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.revision.subscribe()
    }

    fn bump(&self) {
        self.inner.revision.send_modify(|r| *r += 1);
    }

    // --- View state ---

    /// Focuses a conversation (or clears focus). Focusing marks it read.
    pub fn set_selected_conversation(&self, id: Option<&str>) -> Result<(), InboxError> {
        {
            let mut state = self.inner.state.write();
            if let Some(id) = id {
                state.find_mut(id)?.unread = false;
            }
            state.selected_id = id.map(str::to_string);
        }
        debug!(selected = ?id, "selection changed");
        self.bump();
        Ok(())
    }

    pub fn set_current_queue(&self, queue: Queue) {
        self.inner.state.write().current_queue = queue;
        debug!(%queue, "queue changed");
        self.bump();
    }

    pub fn set_search_query(&self, query: impl Into<String>) {
        self.inner.state.write().search_query = query.into();
        self.bump();
    }

    pub fn current_queue(&self) -> Queue {
        self.inner.state.read().current_queue
    }

    pub fn search_query(&self) -> String {
        self.inner.state.read().search_query.clone()
    }

    pub fn selected_id(&self) -> Option<String> {
        self.inner.state.read().selected_id.clone()
    }

    // --- Queries ---

    /// Conversations in the current queue matching the search, newest first.
    pub fn filtered_conversations(&self) -> Vec<Conversation> {
        self.inner.state.read().visible()
    }

    pub fn queue_counts(&self) -> QueueCounts {
        QueueCounts::tally(&self.inner.state.read().conversations)
    }

    pub fn selected_conversation(&self) -> Option<Conversation> {
        let state = self.inner.state.read();
        let id = state.selected_id.as_deref()?;
        state.find(id).ok().cloned()
    }

    pub fn conversation(&self, id: &str) -> Option<Conversation> {
        self.inner.state.read().find(id).ok().cloned()
    }

    pub fn conversations(&self) -> Vec<Conversation> {
        self.inner.state.read().conversations.clone()
    }

    pub fn sla_status(&self, id: &str, now: DateTime<Utc>) -> Result<SlaStatus, InboxError> {
        let state = self.inner.state.read();
        Ok(state.find(id)?.sla_status(now, self.inner.at_risk_window))
    }

    pub fn archive_status(&self, id: &str) -> MutationStatus {
        self.inner
            .state
            .read()
            .archive_status
            .get(id)
            .copied()
            .unwrap_or_default()
    }

    pub fn reply_status(&self, id: &str) -> MutationStatus {
        self.inner
            .state
            .read()
            .reply_status
            .get(id)
            .copied()
            .unwrap_or_default()
    }

    // --- Keyboard navigation ---

    /// Moves focus to the next visible conversation. With nothing focused
    /// the first one is chosen; focus stays put at the end of the list.
    pub fn select_next(&self) -> Option<String> {
        self.step_selection(|index, len| match index {
            None => 0,
            Some(i) => (i + 1).min(len - 1),
        })
    }

    /// Moves focus to the previous visible conversation. With nothing
    /// focused the last one is chosen.
    pub fn select_previous(&self) -> Option<String> {
        self.step_selection(|index, len| match index {
            None => len - 1,
            Some(i) => i.saturating_sub(1),
        })
    }

    fn step_selection(&self, next_index: impl Fn(Option<usize>, usize) -> usize) -> Option<String> {
        let selected = {
            let mut state = self.inner.state.write();
            let visible = state.visible();
            if visible.is_empty() {
                return None;
            }
            let current = state
                .selected_id
                .as_deref()
                .and_then(|id| visible.iter().position(|c| c.id == id));
            let target = visible[next_index(current, visible.len())].id.clone();
            if let Ok(conversation) = state.find_mut(&target) {
                conversation.unread = false;
            }
            state.selected_id = Some(target.clone());
            target
        };
        self.bump();
        Some(selected)
    }

    // --- Simple mutations ---

    pub fn assign_conversation(
        &self,
        id: &str,
        agent: impl Into<String>,
    ) -> Result<(), InboxError> {
        let agent = agent.into();
        self.inner.state.write().find_mut(id)?.assignee = Some(agent.clone());
        info!(conversation_id = id, %agent, "conversation assigned");
        self.bump();
        Ok(())
    }

    pub fn mark_read(&self, id: &str) -> Result<(), InboxError> {
        self.inner.state.write().find_mut(id)?.unread = false;
        self.bump();
        Ok(())
    }

    // --- Bulk selection ---

    /// Flips the checked flag of a conversation; returns the new value.
    pub fn toggle_checked(&self, id: &str) -> Result<bool, InboxError> {
        let checked = {
            let mut state = self.inner.state.write();
            state.find(id)?;
            if state.checked.remove(id) {
                false
            } else {
                state.checked.insert(id.to_string());
                true
            }
        };
        self.bump();
        Ok(checked)
    }

    /// Checks every conversation in the current view; returns how many are checked.
    pub fn select_all_visible(&self) -> usize {
        let count = {
            let mut state = self.inner.state.write();
            let ids: Vec<String> = state.visible().into_iter().map(|c| c.id).collect();
            state.checked.extend(ids);
            state.checked.len()
        };
        self.bump();
        count
    }

    pub fn clear_checked(&self) {
        self.inner.state.write().checked.clear();
        self.bump();
    }

    pub fn checked_ids(&self) -> Vec<String> {
        self.inner.state.read().checked.iter().cloned().collect()
    }

    // --- Backend-confirmed mutations ---

    /// Moves a conversation to [`Queue::Done`].
    ///
    /// The move and the cleared selection are visible immediately. If the
    /// backend then rejects the request, the previous queue is restored and
    /// the error is returned. Archiving a conversation that is already done
    /// succeeds without contacting the backend.
    pub async fn archive_conversation(&self, id: &str) -> Result<(), InboxError> {
        let previous = {
            let mut state = self.inner.state.write();
            let conversation = state.find_mut(id)?;
            let previous = conversation.queue;
            conversation.queue = Queue::Done;
            state.selected_id = None;
            state.checked.remove(id);
            if previous == Queue::Done {
                None
            } else {
                state
                    .archive_status
                    .insert(id.to_string(), MutationStatus::Pending);
                Some(previous)
            }
        };
        self.bump();

        let Some(previous) = previous else {
            debug!(conversation_id = id, "already archived");
            return Ok(());
        };

        match self.inner.backend.archive(id).await {
            Ok(()) => {
                self.inner
                    .state
                    .write()
                    .archive_status
                    .insert(id.to_string(), MutationStatus::Confirmed);
                info!(conversation_id = id, from = %previous, "conversation archived");
                self.bump();
                Ok(())
            }
            Err(source) => {
                {
                    let mut state = self.inner.state.write();
                    if let Ok(conversation) = state.find_mut(id) {
                        // Only undo our own move.
                        if conversation.queue == Queue::Done {
                            conversation.queue = previous;
                        }
                    }
                    state
                        .archive_status
                        .insert(id.to_string(), MutationStatus::Failed);
                }
                warn!(conversation_id = id, error = %source, "archive rejected, restored queue");
                self.bump();
                Err(InboxError::Backend {
                    operation: "archive",
                    id: id.to_string(),
                    source,
                })
            }
        }
    }

    /// Archives every checked conversation concurrently and clears the
    /// checked set.
    pub async fn archive_checked(&self) -> BulkArchiveReport {
        let ids: Vec<String> = {
            let mut state = self.inner.state.write();
            std::mem::take(&mut state.checked).into_iter().collect()
        };
        self.bump();

        let results = join_all(ids.iter().map(|id| self.archive_conversation(id))).await;

        let mut report = BulkArchiveReport::default();
        for (id, result) in ids.into_iter().zip(results) {
            match result {
                Ok(()) => report.archived.push(id),
                Err(e) => report.failed.push((id, e)),
            }
        }
        report
    }

    /// Appends an agent reply and discards the AI draft.
    ///
    /// Blank content is rejected before anything changes. If the backend
    /// rejects the reply, the message is removed and the draft and
    /// `updated_at` are restored, unless another reply was appended since.
    pub async fn reply_to_conversation(
        &self,
        id: &str,
        content: &str,
    ) -> Result<Message, InboxError> {
        let body = content.trim();
        if body.is_empty() {
            return Err(InboxError::EmptyReply);
        }

        let (message, snapshot) = {
            let mut state = self.inner.state.write();
            let conversation = state.find_mut(id)?;
            let message = Message::new(
                id,
                Author::Agent,
                self.inner.agent_name.clone(),
                body,
                conversation.channel,
            );
            let snapshot: (Option<AiDraft>, DateTime<Utc>) =
                (conversation.ai_draft.take(), conversation.updated_at);
            conversation.messages.push(message.clone());
            conversation.updated_at = message.timestamp;
            state
                .reply_status
                .insert(id.to_string(), MutationStatus::Pending);
            (message, snapshot)
        };
        self.bump();

        match self.inner.backend.reply(id, &message).await {
            Ok(()) => {
                self.inner
                    .state
                    .write()
                    .reply_status
                    .insert(id.to_string(), MutationStatus::Confirmed);
                info!(conversation_id = id, message_id = %message.id, "reply sent");
                self.bump();
                Ok(message)
            }
            Err(source) => {
                {
                    let mut state = self.inner.state.write();
                    if let Ok(conversation) = state.find_mut(id) {
                        undo_reply(conversation, &message, snapshot);
                    }
                    state
                        .reply_status
                        .insert(id.to_string(), MutationStatus::Failed);
                }
                warn!(conversation_id = id, error = %source, "reply rejected, rolled back");
                self.bump();
                Err(InboxError::Backend {
                    operation: "reply",
                    id: id.to_string(),
                    source,
                })
            }
        }
    }
}

/// Removes a rejected reply. Anything appended after it is left alone: a
/// later reply has already consumed the draft and owns `updated_at`.
fn undo_reply(
    conversation: &mut Conversation,
    message: &Message,
    (draft, updated_at): (Option<AiDraft>, DateTime<Utc>),
) {
    let Some(index) = conversation.messages.iter().position(|m| m.id == message.id) else {
        return;
    };
    let superseded = index + 1 < conversation.messages.len();
    conversation.messages.remove(index);

    if !superseded && conversation.ai_draft.is_none() {
        conversation.ai_draft = draft;
    }
    if conversation.updated_at == message.timestamp {
        let newest = conversation.messages.iter().map(|m| m.timestamp).max();
        conversation.updated_at = newest.map_or(updated_at, |t| t.max(updated_at));
    }
}
