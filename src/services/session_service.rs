//! Session lifecycle: start, resume, finalize, rename, delete, history.

use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    Message, MessageDraft, MessageKind, QuestionBank, Session, SessionStatus,
};
use crate::domain::ports::{MessageRepository, SessionRepository};
use crate::services::{progress, MessageStore};

const GREETING: &str = "Welcome! I'll ask you a few questions about your education, skills, \
work style, and goals, then suggest career paths that fit you. Ready when you are.";

const SESSION_END: &str = "That wraps up your assessment. You can explore any of the \
recommendations above or start a new assessment whenever you like.";

/// Service owning session lifecycle and session-level metadata.
///
/// Message persistence goes through the [`MessageStore`] so the greeting and
/// session-end turns flow down the same authoritative append path as
/// everything else.
pub struct SessionService {
    sessions: Arc<dyn SessionRepository>,
    messages: Arc<dyn MessageRepository>,
    store: Arc<MessageStore>,
    bank: Arc<QuestionBank>,
}

impl SessionService {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        messages: Arc<dyn MessageRepository>,
        store: Arc<MessageStore>,
        bank: Arc<QuestionBank>,
    ) -> Self {
        Self {
            sessions,
            messages,
            store,
            bank,
        }
    }

    /// Starts an assessment for an owner. Idempotent: an existing active
    /// session is resumed (hydrated) instead of creating a second one, so at
    /// most one session per owner is ever active.
    ///
    /// Returns the session and whether it was newly created.
    #[instrument(skip(self), err)]
    pub async fn start(&self, owner_id: &str) -> DomainResult<(Session, bool)> {
        if owner_id.trim().is_empty() {
            return Err(DomainError::ValidationFailed(
                "owner id cannot be empty".to_string(),
            ));
        }

        if let Some(existing) = self.sessions.find_active_by_owner(owner_id).await? {
            self.store.hydrate(existing.id).await?;
            info!(session_id = %existing.id, "resuming active session");
            return Ok((existing, false));
        }

        let session = Session::new(owner_id, &self.bank);
        self.sessions.insert(&session).await?;
        self.store.hydrate(session.id).await?;
        self.store
            .append(session.id, MessageDraft::system(GREETING))
            .await?;

        // Pick up the greeting's counter bump.
        let session = self.require(session.id).await?;
        info!(session_id = %session.id, "created new session");
        Ok((session, true))
    }

    /// Loads a session and its ordered message log.
    ///
    /// # Errors
    /// `SessionNotFound` if the session does not exist or does not belong to
    /// the caller.
    #[instrument(skip(self), err)]
    pub async fn resume(
        &self,
        session_id: Uuid,
        owner_id: &str,
    ) -> DomainResult<(Session, Vec<Message>)> {
        let session = self.require_owned(session_id, owner_id).await?;
        let messages = self.store.hydrate(session_id).await?;
        Ok((session, messages))
    }

    /// Finalizes a session: appends the session-end turn and marks the
    /// session completed with progress 100. A no-op on an already-completed
    /// session.
    #[instrument(skip(self), err)]
    pub async fn finalize(&self, session_id: Uuid) -> DomainResult<Session> {
        let session = self.require(session_id).await?;
        if session.status == SessionStatus::Completed {
            return Ok(session);
        }

        self.store
            .append(
                session_id,
                MessageDraft::new(MessageKind::SessionEnd, SESSION_END),
            )
            .await?;

        // Re-read: the append bumped total_messages.
        let mut session = self.require(session_id).await?;
        session.mark_complete();
        self.sessions.update(&session).await?;
        info!(session_id = %session_id, "session finalized");
        Ok(session)
    }

    /// Sets the session title.
    ///
    /// # Errors
    /// `SessionNotFound` if the session does not exist or does not belong to
    /// the caller.
    #[instrument(skip(self), err)]
    pub async fn rename(
        &self,
        session_id: Uuid,
        owner_id: &str,
        title: &str,
    ) -> DomainResult<Session> {
        if title.trim().is_empty() {
            return Err(DomainError::ValidationFailed(
                "title cannot be empty".to_string(),
            ));
        }
        let mut session = self.require_owned(session_id, owner_id).await?;
        session.rename(title.trim());
        self.sessions.update(&session).await?;
        Ok(session)
    }

    /// Deletes a session and everything it owns: messages first (referential
    /// cleanup), then the session row, then the local log.
    ///
    /// # Errors
    /// `SessionNotFound` if the session does not exist or does not belong to
    /// the caller.
    #[instrument(skip(self), err)]
    pub async fn delete(&self, session_id: Uuid, owner_id: &str) -> DomainResult<()> {
        self.require_owned(session_id, owner_id).await?;
        let removed = self.messages.delete_by_session(session_id).await?;
        self.sessions.delete(session_id).await?;
        self.store.evict(session_id).await;
        info!(session_id = %session_id, removed_messages = removed, "session deleted");
        Ok(())
    }

    /// All of an owner's sessions, most recently active first.
    #[instrument(skip(self), err)]
    pub async fn list_past(&self, owner_id: &str) -> DomainResult<Vec<Session>> {
        self.sessions.list_by_owner(owner_id).await
    }

    /// Fetches a session, failing with `SessionNotFound` when absent.
    pub async fn get(&self, session_id: Uuid) -> DomainResult<Session> {
        self.require(session_id).await
    }

    /// Credits one accepted answer to a category and recomputes the derived
    /// progress fields (cursor, overall percentage, per-category snapshot)
    /// in a single read-modify-write.
    #[instrument(skip(self), err)]
    pub async fn record_answer(
        &self,
        session_id: Uuid,
        category: crate::domain::models::Category,
    ) -> DomainResult<Session> {
        let mut session = self.require(session_id).await?;
        if !session.is_active() {
            return Err(DomainError::invalid_state(
                "record_answer",
                "session is already completed",
            ));
        }
        session.record_answer(category);

        let counts = session.metadata.question_counts.clone();
        session.metadata.last_category = progress::current_category(&self.bank, &counts);
        session.metadata.overall_progress = progress::overall_progress(&self.bank, &counts);
        session.progress_data = progress::progress_snapshot(&self.bank, &counts);

        self.sessions.update(&session).await?;
        Ok(session)
    }

    async fn require(&self, session_id: Uuid) -> DomainResult<Session> {
        self.sessions
            .get(session_id)
            .await?
            .ok_or(DomainError::SessionNotFound(session_id))
    }

    /// `require` plus an ownership check. A foreign session presents as
    /// not-found, not forbidden, so ids cannot be probed.
    async fn require_owned(&self, session_id: Uuid, owner_id: &str) -> DomainResult<Session> {
        let session = self.require(session_id).await?;
        if session.owner_id != owner_id {
            return Err(DomainError::SessionNotFound(session_id));
        }
        Ok(session)
    }
}
