//! Domain model for conversation messages and the per-session ordered log.
//!
//! Messages are append-only: content is immutable once sent, and only
//! `status`/`delivery` bookkeeping changes afterwards. `index` is assigned
//! once at the authoritative append and is the single source of truth for
//! display order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::question_bank::Category;
use crate::domain::errors::{DomainError, DomainResult};

/// One turn in the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    System,
    User,
    Bot,
    Recommendation,
    SessionEnd,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::System => "system",
            MessageKind::User => "user",
            MessageKind::Bot => "bot",
            MessageKind::Recommendation => "recommendation",
            MessageKind::SessionEnd => "session_end",
        }
    }
}

impl std::str::FromStr for MessageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "system" => Ok(MessageKind::System),
            "user" => Ok(MessageKind::User),
            "bot" => Ok(MessageKind::Bot),
            "recommendation" => Ok(MessageKind::Recommendation),
            "session_end" => Ok(MessageKind::SessionEnd),
            other => Err(format!("unknown message kind: {other}")),
        }
    }
}

/// Persistence outcome of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Sending,
    Sent,
    Failed,
    Seen,
}

impl MessageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageStatus::Sending => "sending",
            MessageStatus::Sent => "sent",
            MessageStatus::Failed => "failed",
            MessageStatus::Seen => "seen",
        }
    }
}

impl std::str::FromStr for MessageStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sending" => Ok(MessageStatus::Sending),
            "sent" => Ok(MessageStatus::Sent),
            "failed" => Ok(MessageStatus::Failed),
            "seen" => Ok(MessageStatus::Seen),
            other => Err(format!("unknown message status: {other}")),
        }
    }
}

/// Delivery bookkeeping tracking a message's persistence outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delivery {
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_attempt_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Free-form message metadata: suggestion chips, category tag, and the
/// structured payload attached by the advisor.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MessageMetadata {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl MessageMetadata {
    pub fn for_category(category: Category) -> Self {
        Self {
            category: Some(category),
            ..Self::default()
        }
    }
}

/// A message awaiting its authoritative append: no index yet, and the id is
/// only generated if the client did not supply one.
#[derive(Debug, Clone)]
pub struct MessageDraft {
    pub id: Option<Uuid>,
    pub kind: MessageKind,
    pub content: String,
    pub metadata: MessageMetadata,
}

impl MessageDraft {
    pub fn new(kind: MessageKind, content: impl Into<String>) -> Self {
        Self {
            id: None,
            kind,
            content: content.into(),
            metadata: MessageMetadata::default(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageKind::User, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageKind::System, content)
    }

    pub fn bot(content: impl Into<String>) -> Self {
        Self::new(MessageKind::Bot, content)
    }

    pub fn with_metadata(mut self, metadata: MessageMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }
}

/// One persisted (or persisting) turn in a session's conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub session_id: Uuid,

    /// Position in the session log; unique, gapless, assigned once.
    pub index: u32,

    pub kind: MessageKind,
    pub content: String,
    pub metadata: MessageMetadata,
    pub status: MessageStatus,
    pub delivery: Delivery,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Materializes a draft at a concrete log position, entering the
    /// optimistic `Sending` state with the first delivery attempt recorded.
    pub fn from_draft(draft: MessageDraft, session_id: Uuid, index: u32) -> Self {
        let now = Utc::now();
        Self {
            id: draft.id.unwrap_or_else(Uuid::new_v4),
            session_id,
            index,
            kind: draft.kind,
            content: draft.content,
            metadata: draft.metadata,
            status: MessageStatus::Sending,
            delivery: Delivery {
                attempts: 1,
                last_attempt_at: Some(now),
                received_at: None,
                error: None,
            },
            created_at: now,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == MessageStatus::Sending
    }

    pub fn mark_sent(&mut self) {
        self.status = MessageStatus::Sent;
        self.delivery.received_at = Some(Utc::now());
        self.delivery.error = None;
    }

    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.status = MessageStatus::Failed;
        self.delivery.error = Some(error.into());
    }

    /// Transitions a failed message back to `Sending` for a retry attempt.
    /// Content is untouched so retries cannot drift.
    pub fn begin_retry(&mut self) -> DomainResult<()> {
        if self.status != MessageStatus::Failed {
            return Err(DomainError::invalid_state(
                "retry",
                format!("message {} is {}, not failed", self.id, self.status.as_str()),
            ));
        }
        self.status = MessageStatus::Sending;
        self.delivery.attempts += 1;
        self.delivery.last_attempt_at = Some(Utc::now());
        self.delivery.error = None;
        Ok(())
    }
}

/// The ordered, append-only message log for one session.
///
/// Both the optimistic append path and the realtime merge path flow through
/// this structure, unified by the id-based dedup rule, so replaying the same
/// remote event any number of times leaves the log unchanged.
#[derive(Debug, Default, Clone)]
pub struct MessageLog {
    messages: Vec<Message>,
}

impl MessageLog {
    pub fn from_messages(mut messages: Vec<Message>) -> Self {
        messages.sort_by_key(|m| m.index);
        Self { messages }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.messages.iter().any(|m| m.id == id)
    }

    pub fn get(&self, id: Uuid) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    /// The next index to assign at append time.
    pub fn next_index(&self) -> u32 {
        self.messages.len() as u32
    }

    /// An unsent message with identical content and kind, if any. Guards
    /// against double-submission from rapid repeated calls.
    pub fn find_pending_duplicate(&self, content: &str, kind: MessageKind) -> Option<&Message> {
        self.messages
            .iter()
            .find(|m| m.is_pending() && m.kind == kind && m.content == content)
    }

    /// Appends a locally-created message. The caller assigns indices via
    /// `next_index`, so entries always arrive in order.
    pub fn push(&mut self, message: Message) {
        debug_assert_eq!(message.index as usize, self.messages.len());
        self.messages.push(message);
    }

    /// Merges an already-persisted message delivered by the realtime feed.
    /// Returns `false` (no change) when the id is already present; inserts
    /// in index order otherwise.
    pub fn merge_persisted(&mut self, message: Message) -> bool {
        if self.contains(message.id) {
            return false;
        }
        let position = self
            .messages
            .iter()
            .position(|m| m.index > message.index)
            .unwrap_or(self.messages.len());
        self.messages.insert(position, message);
        true
    }

    /// Replaces the entry with the same id, used to reconcile the optimistic
    /// record with the canonical persisted one.
    pub fn reconcile(&mut self, message: Message) {
        if let Some(entry) = self.messages.iter_mut().find(|m| m.id == message.id) {
            *entry = message;
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }
}
