// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The insights chat store.
//!
//! Holds the active thread, the list of saved threads and the typing flag.
//! A turn appends the user's message, waits a short "thinking" delay, then
//! appends the matched answer. Deep-dive answers are handed to the
//! [`DeepDiveOrchestrator`], which reports step progress back here.
//!
//! Every thread owns a cancellation token. Switching threads or starting a
//! new one cancels it, which aborts an in-flight turn and stops the thread's
//! deep-dive runs.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use rand::Rng;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use opsdesk_config::model::InsightsConfig;
use opsdesk_core::{
    AiMessage, ChatConversation, ChatMessage, DeepDive, DeepDiveResult, StepStatus, UserMessage,
};
use opsdesk_storage::{retain_most_recent, ConversationHistory};

use crate::deep_dive::{DeepDiveOrchestrator, DeepDiveSink};
use crate::error::InsightsError;
use crate::responses::ResponseEngine;

/// A point-in-time copy of the store's state.
#[derive(Debug, Clone, PartialEq)]
pub struct InsightsState {
    pub messages: Vec<ChatMessage>,
    pub is_typing: bool,
    pub show_suggestions: bool,
    pub conversations: Vec<ChatConversation>,
    pub active_id: Option<String>,
}

impl Default for InsightsState {
    fn default() -> Self {
        Self {
            messages: Vec::new(),
            is_typing: false,
            show_suggestions: true,
            conversations: Vec::new(),
            active_id: None,
        }
    }
}

impl InsightsState {
    /// Copies the working transcript into the active saved thread.
    fn sync_active(&mut self) {
        let Some(active) = self.active_id.as_deref() else {
            return;
        };
        let messages = &self.messages;
        if let Some(conversation) = self
            .conversations
            .iter_mut()
            .find(|c| c.id == active && c.messages != *messages)
        {
            conversation.messages = messages.clone();
            conversation.updated_at = Utc::now();
        }
    }

    fn start_blank_thread(&mut self) {
        self.messages.clear();
        self.active_id = None;
        self.is_typing = false;
        self.show_suggestions = true;
    }

    fn find_message_mut(&mut self, message_id: &str) -> Result<&mut ChatMessage, InsightsError> {
        self.messages
            .iter_mut()
            .find(|m| m.id() == message_id)
            .ok_or_else(|| InsightsError::MessageNotFound(message_id.to_string()))
    }

    fn pending_deep_dives(&self) -> Vec<(String, DeepDive)> {
        self.messages
            .iter()
            .filter_map(|m| {
                m.as_deep_dive()
                    .filter(|dive| !dive.is_complete())
                    .map(|dive| (m.id().to_string(), dive.clone()))
            })
            .collect()
    }
}

/// A random delay within the configured thinking bounds. Inverted bounds
/// collapse to the minimum.
fn thinking_delay(config: &InsightsConfig) -> Duration {
    let min = config.thinking_min_ms;
    let max = config.thinking_max_ms.max(min);
    Duration::from_millis(rand::thread_rng().gen_range(min..=max))
}

struct Inner {
    state: RwLock<InsightsState>,
    history: ConversationHistory,
    config: InsightsConfig,
    engine: &'static ResponseEngine,
    orchestrator: DeepDiveOrchestrator,
    root: CancellationToken,
    thread: Mutex<CancellationToken>,
    save_lock: tokio::sync::Mutex<()>,
    revision: watch::Sender<u64>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.root.cancel();
    }
}

impl Inner {
    fn bump(&self) {
        self.revision.send_modify(|r| *r += 1);
    }

    /// Cancels the current thread's token and installs a fresh one.
    fn reset_thread(&self) -> CancellationToken {
        let mut thread = self.thread.lock();
        thread.cancel();
        *thread = self.root.child_token();
        thread.clone()
    }

    /// Writes the saved threads through the history adapter. Failures are
    /// logged; the in-memory state stays authoritative.
    async fn persist(&self) {
        let _guard = self.save_lock.lock().await;
        let (conversations, active_id) = {
            let mut locked = self.state.write();
            let state = &mut *locked;
            state.sync_active();
            let dropped = retain_most_recent(
                &mut state.conversations,
                self.config.history_cap,
                state.active_id.as_deref(),
            );
            if dropped > 0 {
                info!(dropped, "oldest conversations dropped");
            }
            (state.conversations.clone(), state.active_id.clone())
        };
        if let Err(e) = self.history.save(&conversations, active_id.as_deref()).await {
            warn!(error = %e, "failed to persist conversations");
        }
    }

    fn apply_step(
        &self,
        message_id: &str,
        step_id: &str,
        status: StepStatus,
    ) -> Result<(), InsightsError> {
        {
            let mut state = self.state.write();
            let message = state.find_message_mut(message_id)?;
            let dive = message
                .as_deep_dive_mut()
                .ok_or_else(|| InsightsError::NotDeepDive(message_id.to_string()))?;
            let step = dive
                .steps
                .iter_mut()
                .find(|s| s.id == step_id)
                .ok_or_else(|| InsightsError::StepNotFound {
                    message_id: message_id.to_string(),
                    step_id: step_id.to_string(),
                })?;
            if !step.status.can_advance_to(status) {
                return Err(InsightsError::InvalidTransition {
                    step_id: step_id.to_string(),
                    from: step.status,
                    to: status,
                });
            }
            step.status = status;
        }
        debug!(message_id, step_id, %status, "deep dive step updated");
        self.bump();
        Ok(())
    }

    fn apply_completion(
        &self,
        message_id: &str,
        result: DeepDiveResult,
    ) -> Result<(), InsightsError> {
        {
            let mut state = self.state.write();
            let message = state.find_message_mut(message_id)?;
            let dive = message
                .as_deep_dive_mut()
                .ok_or_else(|| InsightsError::NotDeepDive(message_id.to_string()))?;
            if dive.is_complete() {
                return Err(InsightsError::AlreadyComplete(message_id.to_string()));
            }
            if !dive.all_steps_complete() {
                return Err(InsightsError::IncompleteSteps(message_id.to_string()));
            }
            dive.result = Some(result);
        }
        debug!(message_id, "deep dive result revealed");
        self.bump();
        Ok(())
    }
}

#[async_trait]
impl DeepDiveSink for Inner {
    async fn step_changed(
        &self,
        message_id: &str,
        step_id: &str,
        status: StepStatus,
    ) -> Result<(), InsightsError> {
        self.apply_step(message_id, step_id, status)?;
        if status == StepStatus::Complete {
            self.persist().await;
        }
        Ok(())
    }

    async fn completed(
        &self,
        message_id: &str,
        result: DeepDiveResult,
    ) -> Result<(), InsightsError> {
        self.apply_completion(message_id, result)?;
        self.persist().await;
        Ok(())
    }
}

/// Cheaply cloneable handle to the insights chat state.
#[derive(Clone)]
pub struct InsightsStore {
    inner: Arc<Inner>,
}

impl InsightsStore {
    /// Creates an empty store that saves through `history`.
    pub fn new(history: ConversationHistory, config: InsightsConfig) -> Self {
        let root = CancellationToken::new();
        let thread = root.child_token();
        let (revision, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                state: RwLock::new(InsightsState::default()),
                orchestrator: DeepDiveOrchestrator::new(config.countdown_tick()),
                history,
                config,
                engine: ResponseEngine::standard(),
                root,
                thread: Mutex::new(thread),
                save_lock: tokio::sync::Mutex::new(()),
                revision,
            }),
        }
    }

    /// Creates a store from the persisted history, reopening the thread that
    /// was active and resuming any of its unfinished deep dives.
    pub async fn load(history: ConversationHistory, config: InsightsConfig) -> Self {
        let persisted = history.load().await;
        let store = Self::new(history, config);
        {
            let mut state = store.inner.state.write();
            state.conversations = persisted.conversations;
            state.active_id = persisted.active_id;
            let restored = state.active_id.as_deref().and_then(|active| {
                state
                    .conversations
                    .iter()
                    .find(|c| c.id == active)
                    .map(|c| c.messages.clone())
            });
            state.messages = restored.unwrap_or_default();
            state.show_suggestions = state.messages.is_empty();
            info!(
                conversations = state.conversations.len(),
                active = ?state.active_id,
                "insights history restored"
            );
        }
        store.resume_deep_dives();
        store
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.revision.subscribe()
    }

    // --- Queries ---

    pub fn snapshot(&self) -> InsightsState {
        self.inner.state.read().clone()
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.inner.state.read().messages.clone()
    }

    pub fn is_typing(&self) -> bool {
        self.inner.state.read().is_typing
    }

    pub fn show_suggestions(&self) -> bool {
        self.inner.state.read().show_suggestions
    }

    pub fn active_id(&self) -> Option<String> {
        self.inner.state.read().active_id.clone()
    }

    /// Saved threads, most recently updated first.
    pub fn conversations(&self) -> Vec<ChatConversation> {
        let mut conversations = self.inner.state.read().conversations.clone();
        conversations.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        conversations
    }

    pub fn is_deep_dive_running(&self, message_id: &str) -> bool {
        self.inner.orchestrator.is_running(message_id)
    }

    /// Estimated time left for an active deep dive.
    pub fn deep_dive_remaining(&self, message_id: &str) -> Option<watch::Receiver<Duration>> {
        self.inner.orchestrator.remaining(message_id)
    }

    // --- Turns ---

    /// Runs one conversational turn and returns the assistant's answer.
    ///
    /// Only one turn may be in flight; a second call while the assistant is
    /// typing is rejected with [`InsightsError::TurnInProgress`].
    pub async fn send_message(&self, content: &str) -> Result<AiMessage, InsightsError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(InsightsError::EmptyMessage);
        }

        let token = {
            let mut state = self.inner.state.write();
            if state.is_typing {
                return Err(InsightsError::TurnInProgress);
            }
            if state.active_id.is_none() {
                let conversation = ChatConversation::new(content, self.inner.config.title_max_chars);
                debug!(conversation_id = %conversation.id, title = %conversation.title, "conversation created");
                state.active_id = Some(conversation.id.clone());
                state.conversations.push(conversation);
            }
            state
                .messages
                .push(ChatMessage::User(UserMessage::new(content)));
            state.show_suggestions = false;
            state.is_typing = true;
            self.inner.thread.lock().clone()
        };
        self.inner.bump();
        self.inner.persist().await;

        let delay = thinking_delay(&self.inner.config);
        tokio::select! {
            _ = token.cancelled() => {
                debug!("turn cancelled while thinking");
                return Err(InsightsError::TurnCancelled);
            }
            _ = tokio::time::sleep(delay) => {}
        }

        let response = self.inner.engine.respond(content);
        {
            let mut state = self.inner.state.write();
            if token.is_cancelled() {
                return Err(InsightsError::TurnCancelled);
            }
            state
                .messages
                .push(ChatMessage::Assistant(response.message.clone()));
            state.is_typing = false;
        }
        info!(rule = response.rule, kind = response.message.kind(), "turn answered");
        self.inner.bump();
        self.inner.persist().await;

        if let opsdesk_core::AiContent::DeepDive(dive) = &response.message.body {
            self.inner.orchestrator.start(
                Arc::downgrade(&self.inner),
                &response.message.id,
                dive,
                &token,
            );
        }
        Ok(response.message)
    }

    // --- Threads ---

    /// Saves the active thread and the thread list.
    pub async fn save_current_conversation(&self) {
        self.inner.persist().await;
    }

    /// Saves the active thread and starts a blank one.
    pub async fn create_new_chat(&self) {
        {
            let mut state = self.inner.state.write();
            state.sync_active();
            state.start_blank_thread();
            self.inner.reset_thread();
        }
        debug!("new chat started");
        self.inner.bump();
        self.inner.persist().await;
    }

    /// Makes a saved thread the active one.
    pub async fn switch_conversation(&self, id: &str) -> Result<(), InsightsError> {
        {
            let mut state = self.inner.state.write();
            if state.active_id.as_deref() == Some(id) {
                return Ok(());
            }
            let messages = state
                .conversations
                .iter()
                .find(|c| c.id == id)
                .map(|c| c.messages.clone())
                .ok_or_else(|| InsightsError::ConversationNotFound(id.to_string()))?;
            state.sync_active();
            state.show_suggestions = messages.is_empty();
            state.messages = messages;
            state.active_id = Some(id.to_string());
            state.is_typing = false;
            self.inner.reset_thread();
        }
        debug!(conversation_id = id, "switched conversation");
        self.inner.bump();
        self.inner.persist().await;
        self.resume_deep_dives();
        Ok(())
    }

    /// Removes a saved thread. Deleting the active thread starts a blank one.
    pub async fn delete_conversation(&self, id: &str) -> Result<(), InsightsError> {
        {
            let mut state = self.inner.state.write();
            let index = state
                .conversations
                .iter()
                .position(|c| c.id == id)
                .ok_or_else(|| InsightsError::ConversationNotFound(id.to_string()))?;
            state.conversations.remove(index);
            if state.active_id.as_deref() == Some(id) {
                state.start_blank_thread();
                self.inner.reset_thread();
            }
        }
        info!(conversation_id = id, "conversation deleted");
        self.inner.bump();
        self.inner.persist().await;
        Ok(())
    }

    /// Forgets every thread, in memory and in storage.
    pub async fn clear_history(&self) -> Result<(), InsightsError> {
        {
            let mut state = self.inner.state.write();
            *state = InsightsState::default();
            self.inner.reset_thread();
        }
        self.inner.bump();
        let _guard = self.inner.save_lock.lock().await;
        self.inner.history.clear().await?;
        info!("conversation history cleared");
        Ok(())
    }

    // --- Deep dives ---

    /// Moves one step of a deep dive forward. Steps never move backwards.
    pub fn update_deep_dive_step(
        &self,
        message_id: &str,
        step_id: &str,
        status: StepStatus,
    ) -> Result<(), InsightsError> {
        self.inner.apply_step(message_id, step_id, status)
    }

    /// Attaches the result to a deep dive whose steps are all complete.
    pub fn complete_deep_dive(
        &self,
        message_id: &str,
        result: DeepDiveResult,
    ) -> Result<(), InsightsError> {
        self.inner.apply_completion(message_id, result)
    }

    /// Waits until the deep dive in `message_id` has its result or stops
    /// running, and returns its latest state.
    pub async fn wait_for_deep_dive(&self, message_id: &str) -> Result<DeepDive, InsightsError> {
        let mut revision = self.subscribe();
        loop {
            let dive = {
                let state = self.inner.state.read();
                let message = state
                    .messages
                    .iter()
                    .find(|m| m.id() == message_id)
                    .ok_or_else(|| InsightsError::MessageNotFound(message_id.to_string()))?;
                message
                    .as_deep_dive()
                    .cloned()
                    .ok_or_else(|| InsightsError::NotDeepDive(message_id.to_string()))?
            };
            if dive.is_complete() || !self.inner.orchestrator.is_running(message_id) {
                return Ok(dive);
            }
            // Re-check on a timer too: a cancelled run leaves without a revision bump.
            let _ = tokio::time::timeout(self.inner.config.countdown_tick(), revision.changed()).await;
        }
    }

    fn resume_deep_dives(&self) {
        let (pending, token) = {
            let state = self.inner.state.read();
            (state.pending_deep_dives(), self.inner.thread.lock().clone())
        };
        for (message_id, dive) in pending {
            if self
                .inner
                .orchestrator
                .start(Arc::downgrade(&self.inner), &message_id, &dive, &token)
            {
                info!(message_id = %message_id, "resumed unfinished deep dive");
            }
        }
    }
}
