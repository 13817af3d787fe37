//! Property tests for the progress math and the message-log merge rules.

use std::collections::HashMap;

use proptest::prelude::*;
use uuid::Uuid;

use compass::domain::models::{MessageDraft, MessageLog, NextCategory};
use compass::services::progress;
use compass::{Category, Message, QuestionBank};

fn counts_from(raw: [u32; 4]) -> HashMap<Category, u32> {
    Category::ALL.iter().copied().zip(raw).collect()
}

proptest! {
    /// The recommendation trigger and the question cursor must agree: the
    /// interview is ready for analysis exactly when no category is left to ask.
    #[test]
    fn trigger_agrees_with_cursor(raw in prop::array::uniform4(0u32..10)) {
        let bank = QuestionBank::default();
        let counts = counts_from(raw);
        let ready = progress::recommendation_ready(&bank, &counts);
        let cursor = progress::current_category(&bank, &counts);
        prop_assert_eq!(ready, cursor == NextCategory::Complete);
    }

    #[test]
    fn progress_is_bounded(raw in prop::array::uniform4(0u32..1000)) {
        let bank = QuestionBank::default();
        let counts = counts_from(raw);
        prop_assert!(progress::overall_progress(&bank, &counts) <= 100);
        for (_, percent) in progress::progress_snapshot(&bank, &counts) {
            prop_assert!(percent <= 100);
        }
    }

    /// Crediting one more answer to any category never moves progress backward.
    #[test]
    fn progress_is_monotone(raw in prop::array::uniform4(0u32..10), which in 0usize..4) {
        let bank = QuestionBank::default();
        let before = counts_from(raw);
        let mut after = before.clone();
        *after.entry(Category::ALL[which]).or_insert(0) += 1;
        prop_assert!(
            progress::overall_progress(&bank, &after)
                >= progress::overall_progress(&bank, &before)
        );
        let category = Category::ALL[which];
        prop_assert!(
            progress::category_progress(&bank, category, &after)
                >= progress::category_progress(&bank, category, &before)
        );
    }

    /// 100% overall and the recommendation trigger are the same condition.
    #[test]
    fn full_progress_means_ready(raw in prop::array::uniform4(0u32..10)) {
        let bank = QuestionBank::default();
        let counts = counts_from(raw);
        prop_assert_eq!(
            progress::overall_progress(&bank, &counts) == 100,
            progress::recommendation_ready(&bank, &counts)
        );
    }

    /// Overcounting a finished category never unlocks the trigger early.
    #[test]
    fn surplus_in_one_category_does_not_compensate(extra in 1u32..100) {
        let bank = QuestionBank::default();
        let mut counts = HashMap::new();
        counts.insert(Category::Education, bank.threshold(Category::Education) + extra);
        prop_assert!(!progress::recommendation_ready(&bank, &counts));
        prop_assert_eq!(
            progress::current_category(&bank, &counts),
            NextCategory::Ask(Category::Skills)
        );
    }

    /// Merging feed deliveries is idempotent and order-independent: any
    /// permutation, with arbitrary replays, converges to the same log.
    #[test]
    fn merge_converges_regardless_of_order(
        order in Just(8usize).prop_flat_map(|n| {
            (proptest::sample::subsequence((0..n).collect::<Vec<_>>(), 0..=n), Just(n))
        }),
    ) {
        let (replays, n) = order;
        let session_id = Uuid::new_v4();
        let messages: Vec<Message> = (0..n)
            .map(|i| {
                let mut message =
                    Message::from_draft(MessageDraft::user(format!("turn {i}")), session_id, i as u32);
                message.mark_sent();
                message
            })
            .collect();

        let mut forward = MessageLog::default();
        for message in &messages {
            prop_assert!(forward.merge_persisted(message.clone()));
        }
        let mut reversed = MessageLog::default();
        for message in messages.iter().rev() {
            prop_assert!(reversed.merge_persisted(message.clone()));
        }
        // Replays report "no change" and leave the log untouched.
        for &i in &replays {
            prop_assert!(!reversed.merge_persisted(messages[i].clone()));
        }

        let forward_ids: Vec<Uuid> = forward.iter().map(|m| m.id).collect();
        let reversed_ids: Vec<Uuid> = reversed.iter().map(|m| m.id).collect();
        prop_assert_eq!(forward_ids, reversed_ids);
        prop_assert_eq!(reversed.next_index(), n as u32);
    }
}
