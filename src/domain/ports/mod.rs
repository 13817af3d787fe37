//! Port traits (hexagonal architecture) for the compass engine.

pub mod advisor_client;
pub mod message_feed;
pub mod message_repository;
pub mod session_repository;

pub use advisor_client::{
    AdvisorClient, ChatTurn, QuestionRequest, QuestionResponse, Recommendation,
    RecommendationRequest, RecommendationResponse,
};
pub use message_feed::{FeedSubscription, MessageFeed};
pub use message_repository::MessageRepository;
pub use session_repository::SessionRepository;
