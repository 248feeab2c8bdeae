// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The shortcut sets shipped for the inbox and orders views, and the bridge
//! from inbox intents onto [`InboxStore`] operations.

use crossterm::event::KeyCode;
use strum::Display;
use tracing::debug;

use opsdesk_inbox::{InboxError, InboxStore, Queue};

use crate::keymap::{KeyStroke, Keymap, KeymapError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum InboxIntent {
    NextConversation,
    PreviousConversation,
    Archive,
    FocusReply,
    Assign,
    ToggleChecked,
    SelectAll,
    CommandPalette,
    ShowHelp,
    FocusSearch,
    ClearSelection,
    SendReply,
    GoToQueue(Queue),
}

/// Result of applying an [`InboxIntent`] to a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentOutcome {
    /// The store changed.
    Applied,
    /// The intent needs a focused or checked conversation and there was none.
    NoTarget,
    /// The intent is presentation-only (overlays, focus moves, text entry)
    /// and is handed back to the view.
    Ui(InboxIntent),
}

impl InboxIntent {
    /// Performs the store side of this intent.
    ///
    /// Archive acts on the checked conversations when any are checked and
    /// on the focused conversation otherwise.
    pub async fn apply(self, store: &InboxStore) -> Result<IntentOutcome, InboxError> {
        debug!(intent = ?self, "applying inbox intent");
        let outcome = match self {
            InboxIntent::NextConversation => match store.select_next() {
                Some(_) => IntentOutcome::Applied,
                None => IntentOutcome::NoTarget,
            },
            InboxIntent::PreviousConversation => match store.select_previous() {
                Some(_) => IntentOutcome::Applied,
                None => IntentOutcome::NoTarget,
            },
            InboxIntent::Archive => {
                if !store.checked_ids().is_empty() {
                    let report = store.archive_checked().await;
                    if let Some((_, err)) = report.failed.into_iter().next() {
                        return Err(err);
                    }
                    IntentOutcome::Applied
                } else if let Some(id) = store.selected_id() {
                    store.archive_conversation(&id).await?;
                    IntentOutcome::Applied
                } else {
                    IntentOutcome::NoTarget
                }
            }
            InboxIntent::ToggleChecked => match store.selected_id() {
                Some(id) => {
                    store.toggle_checked(&id)?;
                    IntentOutcome::Applied
                }
                None => IntentOutcome::NoTarget,
            },
            InboxIntent::SelectAll => {
                store.select_all_visible();
                IntentOutcome::Applied
            }
            InboxIntent::ClearSelection => {
                store.clear_checked();
                store.set_selected_conversation(None)?;
                IntentOutcome::Applied
            }
            InboxIntent::GoToQueue(queue) => {
                store.set_current_queue(queue);
                IntentOutcome::Applied
            }
            InboxIntent::FocusReply
            | InboxIntent::Assign
            | InboxIntent::CommandPalette
            | InboxIntent::ShowHelp
            | InboxIntent::FocusSearch
            | InboxIntent::SendReply => IntentOutcome::Ui(self),
        };
        Ok(outcome)
    }
}

/// Shortcuts for the inbox view.
pub fn inbox_keymap() -> Result<Keymap<InboxIntent>, KeymapError> {
    Keymap::builder()
        .bind(KeyStroke::char('j'), InboxIntent::NextConversation)
        .bind(KeyStroke::key(KeyCode::Down), InboxIntent::NextConversation)
        .bind(KeyStroke::char('k'), InboxIntent::PreviousConversation)
        .bind(KeyStroke::key(KeyCode::Up), InboxIntent::PreviousConversation)
        .bind(KeyStroke::char('e'), InboxIntent::Archive)
        .bind(KeyStroke::char('r'), InboxIntent::FocusReply)
        .bind(KeyStroke::char('a'), InboxIntent::Assign)
        .bind(KeyStroke::char('x'), InboxIntent::ToggleChecked)
        .bind(KeyStroke::command(KeyCode::Char('a')), InboxIntent::SelectAll)
        .bind(KeyStroke::command(KeyCode::Char('k')), InboxIntent::CommandPalette)
        .bind(KeyStroke::char('?'), InboxIntent::ShowHelp)
        .bind(KeyStroke::char('/'), InboxIntent::FocusSearch)
        .bind(KeyStroke::key(KeyCode::Esc), InboxIntent::ClearSelection)
        .bind_in_composer(KeyStroke::command(KeyCode::Enter), InboxIntent::SendReply)
        .chord(KeyStroke::char('u'), InboxIntent::GoToQueue(Queue::Urgent))
        .chord(KeyStroke::char('o'), InboxIntent::GoToQueue(Queue::Open))
        .chord(KeyStroke::char('p'), InboxIntent::GoToQueue(Queue::Pending))
        .chord(KeyStroke::char('d'), InboxIntent::GoToQueue(Queue::Done))
        .build()
}

/// Tabs of the orders view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum OrderView {
    All,
    Unfulfilled,
    Fulfilled,
    Shipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum OrdersIntent {
    NextOrder,
    PreviousOrder,
    ToggleChecked,
    SelectAll,
    FocusSearch,
    ShowHelp,
    CommandPalette,
    Fulfil,
    GoToView(OrderView),
}

/// Shortcuts for the orders view.
pub fn orders_keymap() -> Result<Keymap<OrdersIntent>, KeymapError> {
    Keymap::builder()
        .bind(KeyStroke::char('j'), OrdersIntent::NextOrder)
        .bind(KeyStroke::char('k'), OrdersIntent::PreviousOrder)
        .bind(KeyStroke::char('x'), OrdersIntent::ToggleChecked)
        .bind(KeyStroke::command(KeyCode::Char('a')), OrdersIntent::SelectAll)
        .bind(KeyStroke::char('/'), OrdersIntent::FocusSearch)
        .bind(KeyStroke::char('?'), OrdersIntent::ShowHelp)
        .bind(KeyStroke::command(KeyCode::Char('k')), OrdersIntent::CommandPalette)
        .bind(KeyStroke::char('f'), OrdersIntent::Fulfil)
        .chord(KeyStroke::char('a'), OrdersIntent::GoToView(OrderView::All))
        .chord(KeyStroke::char('u'), OrdersIntent::GoToView(OrderView::Unfulfilled))
        .chord(KeyStroke::char('f'), OrdersIntent::GoToView(OrderView::Fulfilled))
        .chord(KeyStroke::char('s'), OrdersIntent::GoToView(OrderView::Shipped))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::{Dispatcher, KeyInput};
    use crossterm::event::KeyModifiers;
    use std::time::Duration;
    use tokio::time::Instant;

    #[test]
    fn shipped_keymaps_build() {
        assert!(inbox_keymap().is_ok());
        assert!(orders_keymap().is_ok());
    }

    #[test]
    fn inbox_chords_route_to_queues() {
        let mut d = Dispatcher::new(inbox_keymap().unwrap(), Duration::from_secs(1));
        let now = Instant::now();
        for (key, queue) in [
            ('u', Queue::Urgent),
            ('o', Queue::Open),
            ('p', Queue::Pending),
            ('d', Queue::Done),
        ] {
            assert_eq!(d.dispatch(&KeyInput::char('g'), now), None);
            assert_eq!(
                d.dispatch(&KeyInput::char(key), now),
                Some(InboxIntent::GoToQueue(queue))
            );
        }
    }

    #[test]
    fn orders_chord_beats_fulfil() {
        let mut d = Dispatcher::new(orders_keymap().unwrap(), Duration::from_secs(1));
        let now = Instant::now();
        assert_eq!(d.dispatch(&KeyInput::char('f'), now), Some(OrdersIntent::Fulfil));
        d.dispatch(&KeyInput::char('g'), now);
        assert_eq!(
            d.dispatch(&KeyInput::char('f'), now),
            Some(OrdersIntent::GoToView(OrderView::Fulfilled))
        );
    }

    #[test]
    fn command_a_selects_all_but_plain_a_assigns() {
        let mut d = Dispatcher::new(inbox_keymap().unwrap(), Duration::from_secs(1));
        let now = Instant::now();
        assert_eq!(d.dispatch(&KeyInput::char('a'), now), Some(InboxIntent::Assign));
        let select_all = KeyInput::char('a').with_modifiers(KeyModifiers::SUPER);
        assert_eq!(d.dispatch(&select_all, now), Some(InboxIntent::SelectAll));
    }

    #[test]
    fn intent_names() {
        assert_eq!(InboxIntent::NextConversation.to_string(), "next-conversation");
        assert_eq!(InboxIntent::GoToQueue(Queue::Done).to_string(), "go-to-queue");
        assert_eq!(OrderView::Shipped.to_string(), "shipped");
    }
}
