//! Message repository port (trait) for dependency injection.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::Message;

/// Repository trait for the append-only message log.
///
/// `upsert` carries both the first persistence of an optimistic append and
/// the re-persistence of a retried message: conflicts on id update only
/// status/delivery bookkeeping, never content, so a retry cannot create a
/// duplicate row or drift what was originally written.
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Inserts a message, or refreshes its status/delivery fields when the
    /// id already exists.
    async fn upsert(&self, message: &Message) -> DomainResult<()>;

    /// Retrieves a message by id.
    async fn get(&self, id: Uuid) -> DomainResult<Option<Message>>;

    /// All messages for a session, ordered by index.
    async fn list_by_session(&self, session_id: Uuid) -> DomainResult<Vec<Message>>;

    /// Deletes all messages for a session; returns how many were removed.
    async fn delete_by_session(&self, session_id: Uuid) -> DomainResult<u64>;

    /// Persisted message count for a session.
    async fn count_by_session(&self, session_id: Uuid) -> DomainResult<u32>;
}
