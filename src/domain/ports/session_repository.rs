//! Session repository port (trait) for dependency injection.
//!
//! Services depend on this trait, not on the SQLite adapter.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::Session;

/// Repository trait for session persistence.
///
/// Implementations handle JSON serialization of metadata/progress snapshots
/// and keep `updated_at` ordering usable for history listings.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Inserts a new session.
    ///
    /// # Errors
    /// Fails if the id already exists or the database is unreachable.
    async fn insert(&self, session: &Session) -> DomainResult<()>;

    /// Updates an existing session's metadata, progress, counters, and status.
    ///
    /// # Errors
    /// Returns `SessionNotFound` if no row matches.
    async fn update(&self, session: &Session) -> DomainResult<()>;

    /// Retrieves a session by id.
    async fn get(&self, id: Uuid) -> DomainResult<Option<Session>>;

    /// The owner's current active session, if any. At most one session per
    /// owner is active at a time.
    async fn find_active_by_owner(&self, owner_id: &str) -> DomainResult<Option<Session>>;

    /// All sessions for an owner, most recently active first.
    async fn list_by_owner(&self, owner_id: &str) -> DomainResult<Vec<Session>>;

    /// Deletes a session row. Callers delete messages first.
    async fn delete(&self, id: Uuid) -> DomainResult<()>;
}
