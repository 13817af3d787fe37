//! Error classification for the advisor HTTP API.

use thiserror::Error;

use crate::domain::errors::DomainError;

/// Errors from the advisor service, split into transient (retryable) and
/// permanent classes.
#[derive(Error, Debug)]
pub enum AdvisorError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Advisor server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Malformed advisor response: {0}")]
    MalformedResponse(String),

    #[error("Timeout waiting for advisor")]
    Timeout,
}

impl AdvisorError {
    /// Transient errors are worth retrying with backoff; everything else
    /// fails immediately.
    pub fn is_transient(&self) -> bool {
        match self {
            AdvisorError::RateLimitExceeded
            | AdvisorError::ServerError(_)
            | AdvisorError::Timeout => true,
            AdvisorError::NetworkError(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Maps an HTTP status code to an error variant.
    pub fn from_status(status: reqwest::StatusCode, body: String) -> Self {
        match status.as_u16() {
            400 | 404 | 422 => AdvisorError::InvalidRequest(body),
            401 | 403 => AdvisorError::AuthenticationFailed(body),
            429 => AdvisorError::RateLimitExceeded,
            500..=599 => AdvisorError::ServerError(body),
            _ => AdvisorError::MalformedResponse(format!("HTTP {status}: {body}")),
        }
    }
}

impl From<AdvisorError> for DomainError {
    fn from(err: AdvisorError) -> Self {
        DomainError::CollaboratorFailure(err.to_string())
    }
}
