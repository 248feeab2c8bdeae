// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key strokes and the binding tables the dispatcher routes through.

use std::collections::HashMap;
use std::fmt;

use crossterm::event::{KeyCode, KeyModifiers};
use thiserror::Error;

/// A normalized key press.
///
/// Super (Cmd) is folded into Control so one binding serves both platforms,
/// and Shift is dropped for character keys because the character already
/// carries it (`?` rather than `shift+/`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyStroke {
    code: KeyCode,
    modifiers: KeyModifiers,
}

impl KeyStroke {
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        let mut modifiers = modifiers
            & (KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SHIFT | KeyModifiers::SUPER);
        if modifiers.contains(KeyModifiers::SUPER) {
            modifiers.remove(KeyModifiers::SUPER);
            modifiers.insert(KeyModifiers::CONTROL);
        }
        if matches!(code, KeyCode::Char(_)) {
            modifiers.remove(KeyModifiers::SHIFT);
        }
        Self { code, modifiers }
    }

    /// An unmodified character key.
    pub fn char(c: char) -> Self {
        Self::new(KeyCode::Char(c), KeyModifiers::NONE)
    }

    /// An unmodified non-character key.
    pub fn key(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::NONE)
    }

    /// Ctrl (or Cmd) plus `code`.
    pub fn command(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::CONTROL)
    }

    pub fn code(&self) -> KeyCode {
        self.code
    }

    /// Whether Ctrl or Cmd was held.
    pub fn has_command_modifier(&self) -> bool {
        self.modifiers.contains(KeyModifiers::CONTROL)
    }
}

impl fmt::Display for KeyStroke {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.contains(KeyModifiers::CONTROL) {
            f.write_str("ctrl+")?;
        }
        if self.modifiers.contains(KeyModifiers::ALT) {
            f.write_str("alt+")?;
        }
        if self.modifiers.contains(KeyModifiers::SHIFT) {
            f.write_str("shift+")?;
        }
        match self.code {
            KeyCode::Char(c) => write!(f, "{c}"),
            KeyCode::Up => f.write_str("up"),
            KeyCode::Down => f.write_str("down"),
            KeyCode::Left => f.write_str("left"),
            KeyCode::Right => f.write_str("right"),
            KeyCode::Enter => f.write_str("enter"),
            KeyCode::Esc => f.write_str("esc"),
            KeyCode::Tab => f.write_str("tab"),
            KeyCode::Backspace => f.write_str("backspace"),
            other => write!(f, "{other:?}"),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeymapError {
    #[error("duplicate binding for '{0}'")]
    DuplicateBinding(String),

    #[error("duplicate chord '{prefix} {key}'")]
    DuplicateChord { prefix: String, key: String },

    #[error("binding '{0}' shadows the chord prefix")]
    ShadowsPrefix(String),
}

#[derive(Debug, Clone)]
pub(crate) struct Binding<I> {
    pub(crate) intent: I,
    pub(crate) composer_allowed: bool,
}

/// Single-key bindings plus chord follow-ups behind one prefix key.
#[derive(Debug, Clone)]
pub struct Keymap<I> {
    prefix: KeyStroke,
    bindings: HashMap<KeyStroke, Binding<I>>,
    chords: HashMap<KeyStroke, I>,
}

impl<I: Clone> Keymap<I> {
    pub fn builder() -> KeymapBuilder<I> {
        KeymapBuilder {
            prefix: KeyStroke::char('g'),
            bindings: Vec::new(),
            chords: Vec::new(),
        }
    }

    pub fn prefix(&self) -> KeyStroke {
        self.prefix
    }

    pub fn has_chords(&self) -> bool {
        !self.chords.is_empty()
    }

    pub(crate) fn binding(&self, stroke: &KeyStroke) -> Option<&Binding<I>> {
        self.bindings.get(stroke)
    }

    pub(crate) fn chord(&self, stroke: &KeyStroke) -> Option<&I> {
        self.chords.get(stroke)
    }
}

/// Collects bindings and checks them for conflicts in [`build`](Self::build).
#[derive(Debug)]
pub struct KeymapBuilder<I> {
    prefix: KeyStroke,
    bindings: Vec<(KeyStroke, Binding<I>)>,
    chords: Vec<(KeyStroke, I)>,
}

impl<I: Clone> KeymapBuilder<I> {
    pub fn prefix(mut self, prefix: KeyStroke) -> Self {
        self.prefix = prefix;
        self
    }

    pub fn bind(mut self, stroke: KeyStroke, intent: I) -> Self {
        self.bindings.push((
            stroke,
            Binding {
                intent,
                composer_allowed: false,
            },
        ));
        self
    }

    /// A binding that still fires while a composer has focus, provided the
    /// stroke carries Ctrl or Cmd.
    pub fn bind_in_composer(mut self, stroke: KeyStroke, intent: I) -> Self {
        self.bindings.push((
            stroke,
            Binding {
                intent,
                composer_allowed: true,
            },
        ));
        self
    }

    /// A follow-up key resolved while the prefix is armed.
    pub fn chord(mut self, stroke: KeyStroke, intent: I) -> Self {
        self.chords.push((stroke, intent));
        self
    }

    pub fn build(self) -> Result<Keymap<I>, KeymapError> {
        let mut bindings = HashMap::new();
        for (stroke, binding) in self.bindings {
            if stroke == self.prefix && !self.chords.is_empty() {
                return Err(KeymapError::ShadowsPrefix(stroke.to_string()));
            }
            if bindings.insert(stroke, binding).is_some() {
                return Err(KeymapError::DuplicateBinding(stroke.to_string()));
            }
        }

        let mut chords = HashMap::new();
        for (stroke, intent) in self.chords {
            if chords.insert(stroke, intent).is_some() {
                return Err(KeymapError::DuplicateChord {
                    prefix: self.prefix.to_string(),
                    key: stroke.to_string(),
                });
            }
        }

        Ok(Keymap {
            prefix: self.prefix,
            bindings,
            chords,
        })
    }
}
