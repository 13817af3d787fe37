//! Message store: the single authoritative append path for session logs.
//!
//! Appends are two-phase: phase 1 mutates the local ordered log synchronously
//! with `status = sending` (visible to readers immediately); phase 2 persists
//! through the repository and reconciles the local entry with the canonical
//! record. Failures mark the entry `failed` and leave it in the log so the
//! user can retry or see the failure; nothing is rolled back or silently
//! dropped.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Message, MessageDraft, MessageLog, MessageStatus};
use crate::domain::ports::{MessageFeed, MessageRepository, SessionRepository};

/// Append-only message store over the per-session in-memory logs.
///
/// Index assignment happens under the log's write lock, so concurrent
/// appends on one session always produce a gapless 0..n-1 sequence matching
/// creation order.
pub struct MessageStore {
    sessions: Arc<dyn SessionRepository>,
    messages: Arc<dyn MessageRepository>,
    feed: Arc<dyn MessageFeed>,
    logs: RwLock<HashMap<Uuid, MessageLog>>,
}

impl MessageStore {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        messages: Arc<dyn MessageRepository>,
        feed: Arc<dyn MessageFeed>,
    ) -> Self {
        Self {
            sessions,
            messages,
            feed,
            logs: RwLock::new(HashMap::new()),
        }
    }

    /// Loads the persisted log for a session into memory (resume path),
    /// replacing any stale local copy. Returns the ordered messages.
    #[instrument(skip(self), err)]
    pub async fn hydrate(&self, session_id: Uuid) -> DomainResult<Vec<Message>> {
        let persisted = self.messages.list_by_session(session_id).await?;
        let log = MessageLog::from_messages(persisted);
        let snapshot = log.messages().to_vec();
        self.logs.write().await.insert(session_id, log);
        Ok(snapshot)
    }

    /// Current local log for a session, in index order. Empty if the session
    /// has never been hydrated or appended to.
    pub async fn log_snapshot(&self, session_id: Uuid) -> Vec<Message> {
        self.logs
            .read()
            .await
            .get(&session_id)
            .map(|log| log.messages().to_vec())
            .unwrap_or_default()
    }

    /// Drops the local log for a session (session deleted or switched away).
    pub async fn evict(&self, session_id: Uuid) {
        self.logs.write().await.remove(&session_id);
    }

    /// Appends a draft to a session's log: optimistic insert, then persist.
    ///
    /// Returns the reconciled message; its `status` tells the caller whether
    /// persistence succeeded (`Sent`) or is awaiting a retry (`Failed`).
    /// A pending message with identical content and kind makes the append a
    /// no-op that returns the existing entry.
    ///
    /// # Errors
    /// `SessionNotFound` if the session id does not resolve.
    #[instrument(skip(self, draft), fields(kind = draft.kind.as_str()), err)]
    pub async fn append(&self, session_id: Uuid, draft: MessageDraft) -> DomainResult<Message> {
        let mut session = self
            .sessions
            .get(session_id)
            .await?
            .ok_or(DomainError::SessionNotFound(session_id))?;

        // Phase 1: optimistic insert under the write lock; the index is
        // assigned here and never renumbered.
        let message = {
            let mut logs = self.logs.write().await;
            let log = logs.entry(session_id).or_default();
            if let Some(existing) = log.find_pending_duplicate(&draft.content, draft.kind) {
                debug!(message_id = %existing.id, "duplicate pending append ignored");
                return Ok(existing.clone());
            }
            let message = Message::from_draft(draft, session_id, log.next_index());
            log.push(message.clone());
            message
        };

        // Phase 2: persist and reconcile.
        match self.messages.upsert(&message).await {
            Ok(()) => {
                let mut sent = message;
                sent.mark_sent();
                self.reconcile(sent.clone()).await;

                session.total_messages += 1;
                session.touch();
                self.sessions.update(&session).await?;

                self.feed.publish(&sent);
                Ok(sent)
            }
            Err(err) => {
                warn!(message_id = %message.id, error = %err, "message persistence failed");
                let mut failed = message;
                failed.mark_failed(err.to_string());
                self.reconcile(failed.clone()).await;
                Ok(failed)
            }
        }
    }

    /// Retries a failed message: increments attempts, clears the error, and
    /// re-persists under the original id (upsert semantics, so no duplicate
    /// row can appear).
    ///
    /// # Errors
    /// `MessageNotFound` if the id is not in the session's log;
    /// `InvalidState` if the message is not in the `Failed` state.
    #[instrument(skip(self), err)]
    pub async fn retry(&self, session_id: Uuid, message_id: Uuid) -> DomainResult<Message> {
        let mut session = self
            .sessions
            .get(session_id)
            .await?
            .ok_or(DomainError::SessionNotFound(session_id))?;

        let mut message = {
            let logs = self.logs.read().await;
            logs.get(&session_id)
                .and_then(|log| log.get(message_id))
                .cloned()
                .ok_or(DomainError::MessageNotFound(message_id))?
        };

        message.begin_retry()?;
        self.reconcile(message.clone()).await;

        match self.messages.upsert(&message).await {
            Ok(()) => {
                message.mark_sent();
                self.reconcile(message.clone()).await;

                session.total_messages += 1;
                session.touch();
                self.sessions.update(&session).await?;

                self.feed.publish(&message);
                Ok(message)
            }
            Err(err) => {
                warn!(message_id = %message.id, error = %err, "retry persistence failed");
                message.mark_failed(err.to_string());
                self.reconcile(message.clone()).await;
                Ok(message)
            }
        }
    }

    /// Marks a delivered message as seen. Status-only mutation; a message
    /// already seen is a no-op, so re-rendering a log is harmless.
    ///
    /// # Errors
    /// `MessageNotFound` if the id is not in the session's log;
    /// `InvalidState` if the message was never delivered (`Sending`/`Failed`).
    pub async fn mark_seen(&self, session_id: Uuid, message_id: Uuid) -> DomainResult<Message> {
        let mut message = {
            let logs = self.logs.read().await;
            logs.get(&session_id)
                .and_then(|log| log.get(message_id))
                .cloned()
                .ok_or(DomainError::MessageNotFound(message_id))?
        };
        if message.status == MessageStatus::Seen {
            return Ok(message);
        }
        if message.status != MessageStatus::Sent {
            return Err(DomainError::invalid_state(
                "mark_seen",
                format!("message {message_id} is not sent"),
            ));
        }
        message.status = MessageStatus::Seen;
        self.messages.upsert(&message).await?;
        self.reconcile(message.clone()).await;
        Ok(message)
    }

    /// Merges an externally-persisted message delivered by the realtime
    /// feed. Idempotent by id: returns `false` when it was already present.
    pub async fn merge_remote(&self, message: Message) -> bool {
        let mut logs = self.logs.write().await;
        let log = logs.entry(message.session_id).or_default();
        log.merge_persisted(message)
    }

    async fn reconcile(&self, message: Message) {
        let mut logs = self.logs.write().await;
        if let Some(log) = logs.get_mut(&message.session_id) {
            log.reconcile(message);
        }
    }
}
