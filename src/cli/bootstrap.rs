//! Wires repositories, services, and the orchestrator for CLI commands.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::adapters::feed::BroadcastFeed;
use crate::adapters::sqlite::{
    initialize_database, SqliteMessageRepository, SqliteSessionRepository,
};
use crate::domain::models::{Config, QuestionBank};
use crate::domain::ports::{AdvisorClient, MessageFeed, MessageRepository, SessionRepository};
use crate::infrastructure::advisor::HttpAdvisorClient;
use crate::services::{AssessmentOrchestrator, MessageStore, SessionService};

/// Fully wired application: one database pool, one feed, one orchestrator.
pub struct Engine {
    pub orchestrator: Arc<AssessmentOrchestrator>,
    pub sessions: Arc<SessionService>,
    pub store: Arc<MessageStore>,
}

pub async fn build(config: &Config) -> Result<Engine> {
    let pool = initialize_database(&config.database)
        .await
        .context("Failed to initialize database. Run 'compass init' first.")?;

    let session_repo: Arc<dyn SessionRepository> =
        Arc::new(SqliteSessionRepository::new(pool.clone()));
    let message_repo: Arc<dyn MessageRepository> = Arc::new(SqliteMessageRepository::new(pool));
    let feed: Arc<dyn MessageFeed> = Arc::new(BroadcastFeed::default());
    let bank = Arc::new(QuestionBank::with_threshold(
        config.interview.per_category_minimum,
    ));

    let store = Arc::new(MessageStore::new(
        session_repo.clone(),
        message_repo.clone(),
        feed.clone(),
    ));
    let sessions = Arc::new(SessionService::new(
        session_repo,
        message_repo,
        store.clone(),
        bank.clone(),
    ));

    let advisor: Arc<dyn AdvisorClient> = Arc::new(
        HttpAdvisorClient::new(&config.advisor).context("Failed to build advisor client")?,
    );
    let orchestrator = Arc::new(AssessmentOrchestrator::new(
        sessions.clone(),
        store.clone(),
        advisor,
        feed,
        bank,
        Duration::from_secs(config.advisor.timeout_secs),
    ));

    Ok(Engine {
        orchestrator,
        sessions,
        store,
    })
}
