//! Progress calculator and recommendation trigger.
//!
//! Pure, total functions mapping a session's per-category answer counts to a
//! current category, completion percentages, and the stop-asking predicate.
//! Counts above a category's threshold are capped so progress can never
//! exceed 100 and the trigger agrees with `current_category` by construction.

use std::collections::HashMap;

use crate::domain::models::{Category, NextCategory, QuestionBank};

fn count_for(counts: &HashMap<Category, u32>, category: Category) -> u32 {
    counts.get(&category).copied().unwrap_or(0)
}

/// First category (in fixed enumeration order) still below its threshold,
/// or `Complete` when every category has met it.
pub fn current_category(bank: &QuestionBank, counts: &HashMap<Category, u32>) -> NextCategory {
    for entry in bank.entries() {
        if count_for(counts, entry.category) < entry.threshold {
            return NextCategory::Ask(entry.category);
        }
    }
    NextCategory::Complete
}

/// Overall completion percentage: answered (capped per category) over the
/// total threshold, rounded, clamped to 100.
pub fn overall_progress(bank: &QuestionBank, counts: &HashMap<Category, u32>) -> u8 {
    let total = bank.total_threshold();
    if total == 0 {
        return 100;
    }
    let answered: u32 = bank
        .entries()
        .iter()
        .map(|e| count_for(counts, e.category).min(e.threshold))
        .sum();
    let percent = (f64::from(answered) * 100.0 / f64::from(total)).round() as u8;
    percent.min(100)
}

/// Completion percentage scoped to one category.
pub fn category_progress(
    bank: &QuestionBank,
    category: Category,
    counts: &HashMap<Category, u32>,
) -> u8 {
    let threshold = bank.threshold(category);
    if threshold == 0 {
        return 100;
    }
    let answered = count_for(counts, category).min(threshold);
    let percent = (f64::from(answered) * 100.0 / f64::from(threshold)).round() as u8;
    percent.min(100)
}

/// Per-category percentage snapshot, persisted as the session's
/// `progress_data`.
pub fn progress_snapshot(
    bank: &QuestionBank,
    counts: &HashMap<Category, u32>,
) -> HashMap<Category, u8> {
    bank.entries()
        .iter()
        .map(|e| (e.category, category_progress(bank, e.category, counts)))
        .collect()
}

/// The recommendation trigger: true once every category's count has reached
/// its threshold, guaranteeing the downstream recommendation has signal from
/// all dimensions, not just the ones answered first.
pub fn recommendation_ready(bank: &QuestionBank, counts: &HashMap<Category, u32>) -> bool {
    bank.entries()
        .iter()
        .all(|e| count_for(counts, e.category) >= e.threshold)
}
