// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! View selection: queue filter, text search and recency ordering.

use crate::model::{Conversation, Queue};

/// Returns the conversations visible in `queue` for `query`, newest first.
///
/// A blank query matches everything. The sort is stable, so conversations
/// with equal `updated_at` keep their input order.
pub fn visible_conversations(
    conversations: &[Conversation],
    queue: Queue,
    query: &str,
) -> Vec<Conversation> {
    let needle = query.trim().to_lowercase();
    let mut visible: Vec<Conversation> = conversations
        .iter()
        .filter(|c| c.queue == queue)
        .filter(|c| needle.is_empty() || c.matches_lowercase(&needle))
        .cloned()
        .collect();
    visible.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    visible
}

/// Per-queue totals, ignoring any search query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueCounts {
    pub urgent: usize,
    pub open: usize,
    pub pending: usize,
    pub done: usize,
}

impl QueueCounts {
    pub fn tally(conversations: &[Conversation]) -> Self {
        let mut counts = Self::default();
        for c in conversations {
            *counts.slot_mut(c.queue) += 1;
        }
        counts
    }

    pub fn get(&self, queue: Queue) -> usize {
        match queue {
            Queue::Urgent => self.urgent,
            Queue::Open => self.open,
            Queue::Pending => self.pending,
            Queue::Done => self.done,
        }
    }

    pub fn total(&self) -> usize {
        self.urgent + self.open + self.pending + self.done
    }

    fn slot_mut(&mut self, queue: Queue) -> &mut usize {
        match queue {
            Queue::Urgent => &mut self.urgent,
            Queue::Open => &mut self.open,
            Queue::Pending => &mut self.pending,
            Queue::Done => &mut self.done,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::seed_conversations;
    use chrono::{Duration, Utc};
    use proptest::prelude::*;
    use strum::IntoEnumIterator;

    #[test]
    fn search_is_case_insensitive_across_fields() {
        let all = seed_conversations(Utc::now());
        let by_name = visible_conversations(&all, Queue::Open, "MARCUS");
        assert!(by_name.iter().all(|c| c.customer.name.contains("Marcus")));
        assert!(!by_name.is_empty());

        let none = visible_conversations(&all, Queue::Open, "zzz-no-match");
        assert!(none.is_empty());
    }

    #[test]
    fn blank_query_matches_everything_in_queue() {
        let all = seed_conversations(Utc::now());
        let open_count = all.iter().filter(|c| c.queue == Queue::Open).count();
        assert_eq!(visible_conversations(&all, Queue::Open, "   ").len(), open_count);
    }

    #[test]
    fn counts_cover_every_conversation() {
        let all = seed_conversations(Utc::now());
        let counts = QueueCounts::tally(&all);
        assert_eq!(counts.total(), all.len());
        for queue in Queue::iter() {
            assert_eq!(
                counts.get(queue),
                all.iter().filter(|c| c.queue == queue).count()
            );
        }
    }

    fn queue_strategy() -> impl Strategy<Value = Queue> {
        prop_oneof![
            Just(Queue::Urgent),
            Just(Queue::Open),
            Just(Queue::Pending),
            Just(Queue::Done),
        ]
    }

    proptest! {
        #[test]
        fn filtered_view_is_sorted_and_in_queue(
            shape in prop::collection::vec((queue_strategy(), 0i64..5), 0..30),
            target in queue_strategy(),
        ) {
            let now = Utc::now();
            let template = seed_conversations(now).remove(0);
            let conversations: Vec<Conversation> = shape
                .iter()
                .enumerate()
                .map(|(i, (queue, age))| {
                    let mut c = template.clone();
                    c.id = format!("c{i}");
                    c.queue = *queue;
                    c.updated_at = now - Duration::minutes(*age);
                    c
                })
                .collect();

            let visible = visible_conversations(&conversations, target, "");
            prop_assert!(visible.iter().all(|c| c.queue == target));
            prop_assert!(visible.windows(2).all(|w| w[0].updated_at >= w[1].updated_at));

            // Ties keep input order.
            for w in visible.windows(2) {
                if w[0].updated_at == w[1].updated_at {
                    let a: usize = w[0].id[1..].parse().unwrap();
                    let b: usize = w[1].id[1..].parse().unwrap();
                    prop_assert!(a < b);
                }
            }
        }
    }
}
