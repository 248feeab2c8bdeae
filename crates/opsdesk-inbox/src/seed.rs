// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A small starter inbox spread across every queue and channel.

use chrono::{DateTime, Duration, Utc};

use crate::model::{AiDraft, Author, Channel, Conversation, CustomerRef, Message, Queue};

struct SeedRow {
    id: &'static str,
    name: &'static str,
    email: &'static str,
    subject: &'static str,
    body: &'static str,
    channel: Channel,
    queue: Queue,
    /// Minutes until the SLA deadline; negative means already breached.
    sla_minutes: i64,
    /// Minutes since the last activity.
    idle_minutes: i64,
    unread: bool,
    draft: Option<(&'static str, f64, &'static str)>,
}

const ROWS: &[SeedRow] = &[
    SeedRow {
        id: "conv-1",
        name: "Sarah Chen",
        email: "sarah.chen@example.com",
        subject: "Order #4521 arrived damaged",
        body: "The ceramic vase in my order arrived cracked. Can I get a replacement?",
        channel: Channel::Email,
        queue: Queue::Urgent,
        sla_minutes: 20,
        idle_minutes: 4,
        unread: true,
        draft: Some((
            "I'm so sorry about the damaged vase, Sarah. I've started a free replacement that ships today.",
            0.92,
            "Damage claim with photo evidence on a first order; replacement policy applies.",
        )),
    },
    SeedRow {
        id: "conv-2",
        name: "Diego Alvarez",
        email: "diego.alvarez@example.com",
        subject: "Wrong size shipped",
        body: "I ordered a medium hoodie but received a small.",
        channel: Channel::Instagram,
        queue: Queue::Urgent,
        sla_minutes: -10,
        idle_minutes: 35,
        unread: true,
        draft: None,
    },
    SeedRow {
        id: "conv-3",
        name: "Marcus Johnson",
        email: "marcus.j@example.com",
        subject: "Where is my order?",
        body: "Tracking hasn't updated in three days. Is my package lost?",
        channel: Channel::Chat,
        queue: Queue::Open,
        sla_minutes: 180,
        idle_minutes: 8,
        unread: true,
        draft: Some((
            "Hi Marcus, your package is at the regional hub and should move within 24 hours.",
            0.78,
            "Carrier scan shows a hub delay rather than a loss.",
        )),
    },
    SeedRow {
        id: "conv-4",
        name: "Aiko Tanaka",
        email: "aiko.tanaka@example.com",
        subject: "Is the glow serum vegan?",
        body: "Saw your video! Is the glow serum vegan and cruelty free?",
        channel: Channel::TikTok,
        queue: Queue::Open,
        sla_minutes: 300,
        idle_minutes: 22,
        unread: false,
        draft: None,
    },
    SeedRow {
        id: "conv-5",
        name: "Priya Patel",
        email: "priya.patel@example.com",
        subject: "Discount code not applying",
        body: "The code SPRING20 says it's invalid at checkout.",
        channel: Channel::Shopify,
        queue: Queue::Open,
        sla_minutes: 45,
        idle_minutes: 50,
        unread: true,
        draft: None,
    },
    SeedRow {
        id: "conv-6",
        name: "Liam O'Brien",
        email: "liam.obrien@example.com",
        subject: "Refund status",
        body: "I returned my boots two weeks ago. When will the refund land?",
        channel: Channel::Email,
        queue: Queue::Pending,
        sla_minutes: 1440,
        idle_minutes: 120,
        unread: false,
        draft: None,
    },
    SeedRow {
        id: "conv-7",
        name: "Fatima Noor",
        email: "fatima.noor@example.com",
        subject: "Change shipping address",
        body: "Can you send order #4610 to my office instead?",
        channel: Channel::Sms,
        queue: Queue::Pending,
        sla_minutes: 2880,
        idle_minutes: 240,
        unread: false,
        draft: None,
    },
    SeedRow {
        id: "conv-8",
        name: "Emma Wilson",
        email: "emma.wilson@example.com",
        subject: "Thanks for the quick help",
        body: "Got the replacement today, thank you!",
        channel: Channel::Facebook,
        queue: Queue::Done,
        sla_minutes: 600,
        idle_minutes: 600,
        unread: false,
        draft: None,
    },
];

/// Builds the starter conversations with deadlines relative to `now`.
pub fn seed_conversations(now: DateTime<Utc>) -> Vec<Conversation> {
    ROWS.iter().map(|row| build(row, now)).collect()
}

fn build(row: &SeedRow, now: DateTime<Utc>) -> Conversation {
    let updated_at = now - Duration::minutes(row.idle_minutes);
    let mut opening = Message::new(row.id, Author::Customer, row.name, row.body, row.channel);
    opening.timestamp = updated_at;

    Conversation {
        id: row.id.to_string(),
        customer: CustomerRef {
            id: format!("cust-{}", &row.id["conv-".len()..]),
            name: row.name.to_string(),
            email: row.email.to_string(),
        },
        subject: row.subject.to_string(),
        preview: row.body.to_string(),
        channel: row.channel,
        queue: row.queue,
        sla_deadline: now + Duration::minutes(row.sla_minutes),
        messages: vec![opening],
        ai_draft: row
            .draft
            .map(|(body, confidence, reasoning)| AiDraft::new(row.id, body, confidence, reasoning)),
        unread: row.unread,
        assignee: None,
        created_at: updated_at,
        updated_at,
    }
}
