//! Port trait for the external recommendation collaborator ("advisor").
//!
//! The advisor is invoked through a narrow request/response contract: it
//! phrases the next interview question and, once the trigger fires, turns the
//! transcript into career recommendations. Both calls are fallible and must
//! be bounded by a timeout; the orchestrator substitutes deterministic local
//! fallbacks on failure rather than stalling the conversation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::Category;

/// One transcript entry forwarded to the advisor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    /// "user" or "assistant"
    pub role: String,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Request for the next interview question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionRequest {
    pub session_id: Uuid,
    pub history: Vec<ChatTurn>,
    /// Category to probe; `None` for free-form follow-ups after completion.
    pub category: Option<Category>,
    /// 1-based turn number within the session.
    pub turn: u32,
}

/// The advisor's phrased question with optional suggestion chips.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionResponse {
    pub question: String,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub category: Option<Category>,
}

/// Request to turn a finished transcript into recommendations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationRequest {
    pub session_id: Uuid,
    pub history: Vec<ChatTurn>,
}

/// A single recommended career path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub title: String,
    pub summary: String,
}

/// The advisor's full recommendation payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub recommendations: Vec<Recommendation>,
    pub narrative: String,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

/// Port trait for the advisor service.
///
/// Implementations must be `Send + Sync`; the HTTP adapter layers retry and
/// timeout handling underneath this interface.
#[async_trait]
pub trait AdvisorClient: Send + Sync {
    /// Asks the advisor to phrase the next question for a category.
    async fn ask_question(&self, request: QuestionRequest) -> DomainResult<QuestionResponse>;

    /// Asks the advisor to generate recommendations from the transcript.
    async fn recommend(
        &self,
        request: RecommendationRequest,
    ) -> DomainResult<RecommendationResponse>;

    /// Whether the advisor is reachable and configured. Consumed once per
    /// session start; a `false` routes the caller to a degraded presentation.
    async fn health_check(&self) -> DomainResult<bool>;
}
