//! Compass - Guided Career-Assessment Chat Engine
//!
//! Compass runs a structured career interview: a fixed question bank spanning
//! education, skills, work style, and goals; an append-only per-session
//! message log with optimistic persistence; and an external "advisor" service
//! that phrases questions and turns the finished transcript into career
//! recommendations.
//!
//! # Architecture
//!
//! The crate follows Hexagonal Architecture:
//!
//! - **Domain Layer** (`domain`): models, port traits, and domain errors
//! - **Service Layer** (`services`): progress math, the message store,
//!   realtime sync, session lifecycle, and the interview orchestrator
//! - **Adapters** (`adapters`): SQLite repositories and the in-process feed
//! - **Infrastructure** (`infrastructure`): advisor HTTP client, config
//!   loading, logging setup
//! - **CLI Layer** (`cli`): command-line interface

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types for convenience
pub use domain::models::{
    Category, Config, DatabaseConfig, LoggingConfig, Message, MessageDraft, MessageKind,
    MessageStatus, NextCategory, QuestionBank, Session, SessionStatus,
};
pub use domain::ports::{AdvisorClient, MessageFeed, MessageRepository, SessionRepository};
pub use domain::{DomainError, DomainResult};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{
    AssessmentOrchestrator, AssessmentState, MessageStore, SessionService, StartOutcome,
    TurnOutcome,
};
