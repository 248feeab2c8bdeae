// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Binds a [`Dispatcher`] to a stream of key events for the lifetime of a view.

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::dispatcher::{Dispatcher, KeyInput};

/// A running keyboard listener. Dropping it stops the listener, so at most
/// one listener per view is ever active.
#[derive(Debug)]
pub struct KeyboardListener {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl KeyboardListener {
    /// Spawns a task that feeds every event from `events` through
    /// `dispatcher` and hands resolved intents to `on_intent`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn attach<I, F>(
        mut events: broadcast::Receiver<KeyInput>,
        mut dispatcher: Dispatcher<I>,
        mut on_intent: F,
    ) -> Self
    where
        I: Clone + Send + 'static,
        F: FnMut(I) + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            debug!("keyboard listener attached");
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    event = events.recv() => match event {
                        Ok(input) => {
                            if let Some(intent) = dispatcher.dispatch(&input, Instant::now()) {
                                on_intent(intent);
                            }
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "keyboard listener lagged, dropped key events");
                        }
                        Err(RecvError::Closed) => break,
                    },
                }
            }
            debug!("keyboard listener detached");
        });

        Self {
            cancel,
            handle: Some(handle),
        }
    }

    /// Whether the listener task is still running.
    pub fn is_active(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stops the listener and waits for its task to exit.
    pub async fn detach(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for KeyboardListener {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
