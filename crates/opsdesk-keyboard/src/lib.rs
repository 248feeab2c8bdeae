// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keyboard shortcut handling for Opsdesk views.
//!
//! A [`Keymap`] binds normalized [`KeyStroke`]s to view-specific intents, a
//! [`Dispatcher`] routes key input through it (chords, focus suppression),
//! and a [`KeyboardListener`] drives a dispatcher from a key event channel.

pub mod dispatcher;
pub mod intents;
pub mod keymap;
pub mod listener;

pub use dispatcher::{ChordState, Dispatcher, FocusTarget, KeyInput};
pub use intents::{
    inbox_keymap, orders_keymap, InboxIntent, IntentOutcome, OrderView, OrdersIntent,
};
pub use keymap::{KeyStroke, Keymap, KeymapBuilder, KeymapError};
pub use listener::KeyboardListener;
