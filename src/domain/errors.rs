//! Domain errors for the compass interview engine.

use thiserror::Error;
use uuid::Uuid;

/// Domain-level errors that can occur in the interview engine.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),

    #[error("Message not found: {0}")]
    MessageNotFound(Uuid),

    #[error("Invalid state for {action}: {reason}")]
    InvalidState { action: String, reason: String },

    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),

    #[error("Advisor failure: {0}")]
    CollaboratorFailure(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    /// Shorthand for rejected actions that would violate the state machine.
    pub fn invalid_state(action: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidState {
            action: action.into(),
            reason: reason.into(),
        }
    }
}

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::PersistenceFailure(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}
