//! Domain models for the compass interview engine.

pub mod config;
pub mod message;
pub mod question_bank;
pub mod session;

pub use config::{AdvisorConfig, Config, DatabaseConfig, InterviewConfig, LoggingConfig, RetryConfig};
pub use message::{
    Delivery, Message, MessageDraft, MessageKind, MessageLog, MessageMetadata, MessageStatus,
};
pub use question_bank::{Category, CategoryEntry, NextCategory, Question, QuestionBank};
pub use session::{Session, SessionMetadata, SessionStatus};
