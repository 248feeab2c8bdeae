// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key event to intent routing.
//!
//! The dispatcher is a small state machine: `Idle`, or `Armed` after the
//! chord prefix was pressed. While armed, a recognized follow-up resolves
//! the chord; anything else disarms and is then handled as an ordinary key.
//! The armed window expires on its own after the configured duration.

use std::time::Duration;

use crossterm::event::{KeyCode, KeyModifiers};
use tokio::time::Instant;
use tracing::{debug, trace};

use opsdesk_config::model::KeyboardConfig;

use crate::keymap::{KeyStroke, Keymap};

/// What currently has keyboard focus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FocusTarget {
    /// Nothing editable; every binding is live.
    #[default]
    None,
    /// A text input or textarea.
    TextInput,
    /// A text input marked as a message composer.
    Composer,
}

impl FocusTarget {
    pub fn is_editable(self) -> bool {
        !matches!(self, FocusTarget::None)
    }
}

/// A raw key press together with the focus it happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInput {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
    pub focus: FocusTarget,
}

impl KeyInput {
    pub fn new(code: KeyCode, modifiers: KeyModifiers, focus: FocusTarget) -> Self {
        Self {
            code,
            modifiers,
            focus,
        }
    }

    /// An unmodified character typed with nothing focused.
    pub fn char(c: char) -> Self {
        Self::new(KeyCode::Char(c), KeyModifiers::NONE, FocusTarget::None)
    }

    pub fn key(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::NONE, FocusTarget::None)
    }

    pub fn with_modifiers(mut self, modifiers: KeyModifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn in_focus(mut self, focus: FocusTarget) -> Self {
        self.focus = focus;
        self
    }

    pub fn stroke(&self) -> KeyStroke {
        KeyStroke::new(self.code, self.modifiers)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChordState {
    Idle,
    Armed { since: Instant },
}

/// Routes key input through a [`Keymap`].
#[derive(Debug, Clone)]
pub struct Dispatcher<I> {
    keymap: Keymap<I>,
    window: Duration,
    state: ChordState,
}

impl<I: Clone> Dispatcher<I> {
    pub fn new(keymap: Keymap<I>, window: Duration) -> Self {
        Self {
            keymap,
            window,
            state: ChordState::Idle,
        }
    }

    pub fn from_config(keymap: Keymap<I>, config: &KeyboardConfig) -> Self {
        Self::new(keymap, config.chord_window())
    }

    /// The chord state as of `now`, accounting for window expiry.
    pub fn state(&self, now: Instant) -> ChordState {
        match self.state {
            ChordState::Armed { since } if now.duration_since(since) >= self.window => {
                ChordState::Idle
            }
            state => state,
        }
    }

    pub fn is_armed(&self, now: Instant) -> bool {
        matches!(self.state(now), ChordState::Armed { .. })
    }

    /// Resolves one key press into at most one intent.
    pub fn dispatch(&mut self, input: &KeyInput, now: Instant) -> Option<I> {
        let stroke = input.stroke();

        if input.focus.is_editable() {
            return self.dispatch_in_input(input.focus, &stroke);
        }

        if let ChordState::Armed { .. } = self.state(now) {
            self.state = ChordState::Idle;
            if let Some(intent) = self.keymap.chord(&stroke) {
                debug!(key = %stroke, "chord resolved");
                return Some(intent.clone());
            }
            if stroke == self.keymap.prefix() {
                trace!("chord prefix re-armed");
                self.state = ChordState::Armed { since: now };
                return None;
            }
            trace!(key = %stroke, "unrecognized chord follow-up");
        } else {
            self.state = ChordState::Idle;
        }

        if stroke == self.keymap.prefix() && self.keymap.has_chords() {
            trace!("chord prefix armed");
            self.state = ChordState::Armed { since: now };
            return None;
        }

        let intent = self.keymap.binding(&stroke).map(|b| b.intent.clone());
        if intent.is_some() {
            debug!(key = %stroke, "shortcut resolved");
        }
        intent
    }

    fn dispatch_in_input(&self, focus: FocusTarget, stroke: &KeyStroke) -> Option<I> {
        if focus != FocusTarget::Composer || !stroke.has_command_modifier() {
            return None;
        }
        self.keymap
            .binding(stroke)
            .filter(|b| b.composer_allowed)
            .map(|b| b.intent.clone())
    }
}
