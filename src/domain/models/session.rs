//! Domain model for interview sessions.
//!
//! A session is one ownership-scoped, time-bounded instance of the
//! questionnaire conversation. Exactly one session per owner is active at a
//! time; `is_complete` and `status == Completed` always agree.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use super::question_bank::{Category, NextCategory, QuestionBank};

/// Session lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Session is active and accepting answers.
    Active,
    /// Interview finished and recommendation delivered.
    Completed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Completed => "completed",
        }
    }
}

impl std::str::FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(SessionStatus::Active),
            "completed" => Ok(SessionStatus::Completed),
            other => Err(format!("unknown session status: {other}")),
        }
    }
}

/// Interview bookkeeping persisted with the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMetadata {
    /// Accepted answers per category.
    pub question_counts: HashMap<Category, u32>,

    /// Overall completion percentage, 0..=100.
    pub overall_progress: u8,

    /// Category the next question should come from, or `complete`.
    pub last_category: NextCategory,

    pub is_complete: bool,

    /// Optional user-assigned title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    pub started_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Conversation session with progress metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,

    /// The interviewee who owns this session.
    pub owner_id: String,

    pub status: SessionStatus,

    pub metadata: SessionMetadata,

    /// Per-category completion percentage snapshot, persisted independently
    /// of metadata for durability.
    pub progress_data: HashMap<Category, u8>,

    /// Monotonically non-decreasing count of persisted messages.
    pub total_messages: u32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Creates a fresh active session with zeroed counts, cursor on the
    /// bank's first category.
    pub fn new(owner_id: impl Into<String>, bank: &QuestionBank) -> Self {
        let now = Utc::now();
        let question_counts = Category::ALL.iter().map(|c| (*c, 0)).collect();
        let progress_data = Category::ALL.iter().map(|c| (*c, 0)).collect();
        Self {
            id: Uuid::new_v4(),
            owner_id: owner_id.into(),
            status: SessionStatus::Active,
            metadata: SessionMetadata {
                question_counts,
                overall_progress: 0,
                last_category: NextCategory::Ask(bank.first_category()),
                is_complete: false,
                title: None,
                started_at: now,
                completed_at: None,
            },
            progress_data,
            total_messages: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    /// Records one accepted answer against a category.
    pub fn record_answer(&mut self, category: Category) {
        *self.metadata.question_counts.entry(category).or_insert(0) += 1;
        self.touch();
    }

    /// Marks the session completed. Idempotent; keeps `is_complete` and
    /// `status` in agreement.
    pub fn mark_complete(&mut self) {
        if self.status == SessionStatus::Completed {
            return;
        }
        self.status = SessionStatus::Completed;
        self.metadata.is_complete = true;
        self.metadata.overall_progress = 100;
        self.metadata.last_category = NextCategory::Complete;
        self.metadata.completed_at = Some(Utc::now());
        for value in self.progress_data.values_mut() {
            *value = 100;
        }
        self.touch();
    }

    pub fn rename(&mut self, title: impl Into<String>) {
        self.metadata.title = Some(title.into());
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
