// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key events flowing through a listener into an inbox store.

use std::time::Duration;

use crossterm::event::{KeyCode, KeyModifiers};
use tokio::sync::{broadcast, mpsc};

use opsdesk_inbox::Queue;
use opsdesk_keyboard::{
    inbox_keymap, Dispatcher, FocusTarget, InboxIntent, IntentOutcome, KeyInput, KeyboardListener,
};
use opsdesk_test_utils::TestHarness;

struct Rig {
    keys: broadcast::Sender<KeyInput>,
    intents: mpsc::UnboundedReceiver<InboxIntent>,
    listener: KeyboardListener,
}

fn rig(window: Duration) -> Rig {
    let (keys, events) = broadcast::channel(16);
    let (tx, intents) = mpsc::unbounded_channel();
    let dispatcher = Dispatcher::new(inbox_keymap().unwrap(), window);
    let listener = KeyboardListener::attach(events, dispatcher, move |intent| {
        let _ = tx.send(intent);
    });
    Rig {
        keys,
        intents,
        listener,
    }
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

fn drain(rx: &mut mpsc::UnboundedReceiver<InboxIntent>) -> Vec<InboxIntent> {
    let mut out = Vec::new();
    while let Ok(intent) = rx.try_recv() {
        out.push(intent);
    }
    out
}

#[tokio::test(start_paused = true)]
async fn keys_drive_the_inbox() {
    let harness = TestHarness::builder().build().await.unwrap();
    let mut rig = rig(Duration::from_secs(1));

    for c in ['j', 'j', 'g', 'o'] {
        rig.keys.send(KeyInput::char(c)).unwrap();
    }
    settle().await;

    let intents = drain(&mut rig.intents);
    assert_eq!(
        intents,
        vec![
            InboxIntent::NextConversation,
            InboxIntent::NextConversation,
            InboxIntent::GoToQueue(Queue::Open),
        ]
    );

    let mut outcomes = Vec::new();
    for intent in intents {
        outcomes.push(intent.apply(&harness.inbox).await.unwrap());
    }
    assert!(outcomes.iter().all(|o| *o == IntentOutcome::Applied));
    assert_eq!(harness.inbox.selected_id().as_deref(), Some("conv-2"));
    assert_eq!(harness.inbox.current_queue(), Queue::Open);
}

#[tokio::test(start_paused = true)]
async fn expired_chord_falls_through() {
    let mut rig = rig(Duration::from_secs(1));

    rig.keys.send(KeyInput::char('g')).unwrap();
    settle().await;
    tokio::time::sleep(Duration::from_millis(1100)).await;
    // 'd' has no plain binding, so nothing fires once the chord lapses.
    rig.keys.send(KeyInput::char('d')).unwrap();
    settle().await;
    assert!(drain(&mut rig.intents).is_empty());

    rig.keys.send(KeyInput::char('g')).unwrap();
    tokio::time::sleep(Duration::from_millis(900)).await;
    rig.keys.send(KeyInput::char('d')).unwrap();
    settle().await;
    assert_eq!(
        drain(&mut rig.intents),
        vec![InboxIntent::GoToQueue(Queue::Done)]
    );
}

#[tokio::test(start_paused = true)]
async fn focused_inputs_swallow_plain_shortcuts() {
    let mut rig = rig(Duration::from_secs(1));

    rig.keys
        .send(KeyInput::char('e').in_focus(FocusTarget::TextInput))
        .unwrap();
    rig.keys
        .send(KeyInput::char('j').in_focus(FocusTarget::Composer))
        .unwrap();
    rig.keys
        .send(
            KeyInput::key(KeyCode::Enter)
                .with_modifiers(KeyModifiers::CONTROL)
                .in_focus(FocusTarget::Composer),
        )
        .unwrap();
    settle().await;

    assert_eq!(drain(&mut rig.intents), vec![InboxIntent::SendReply]);
}

#[tokio::test(start_paused = true)]
async fn archive_shortcut_uses_checked_set_first() {
    let harness = TestHarness::builder().build().await.unwrap();
    let inbox = &harness.inbox;
    inbox.set_current_queue(Queue::Open);
    inbox.set_selected_conversation(Some("conv-3")).unwrap();
    inbox.toggle_checked("conv-4").unwrap();
    inbox.toggle_checked("conv-5").unwrap();

    let outcome = InboxIntent::Archive.apply(inbox).await.unwrap();
    assert_eq!(outcome, IntentOutcome::Applied);

    let mut archived = harness.backend.archived().await;
    archived.sort();
    assert_eq!(archived, vec!["conv-4".to_string(), "conv-5".to_string()]);
    assert_eq!(inbox.conversation("conv-3").unwrap().queue, Queue::Open);
}

#[tokio::test(start_paused = true)]
async fn detached_listener_stops_dispatching() {
    let rig = rig(Duration::from_secs(1));
    let Rig {
        keys,
        mut intents,
        listener,
    } = rig;
    assert!(listener.is_active());

    listener.detach().await;
    let _ = keys.send(KeyInput::char('j'));
    settle().await;
    assert!(drain(&mut intents).is_empty());
}
