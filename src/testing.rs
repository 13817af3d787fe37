//! In-memory mock implementations of the ports, shared by service unit
//! tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Message, Session, SessionStatus};
use crate::domain::ports::{
    AdvisorClient, MessageRepository, QuestionRequest, QuestionResponse, Recommendation,
    RecommendationRequest, RecommendationResponse, SessionRepository,
};

/// Mutex-guarded map standing in for the sessions table.
#[derive(Default)]
pub struct MockSessionRepository {
    sessions: Mutex<HashMap<Uuid, Session>>,
}

impl MockSessionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionRepository for MockSessionRepository {
    async fn insert(&self, session: &Session) -> DomainResult<()> {
        let mut sessions = self.sessions.lock().unwrap();
        if sessions.contains_key(&session.id) {
            return Err(DomainError::PersistenceFailure(format!(
                "session {} already exists",
                session.id
            )));
        }
        sessions.insert(session.id, session.clone());
        Ok(())
    }

    async fn update(&self, session: &Session) -> DomainResult<()> {
        let mut sessions = self.sessions.lock().unwrap();
        if !sessions.contains_key(&session.id) {
            return Err(DomainError::SessionNotFound(session.id));
        }
        sessions.insert(session.id, session.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> DomainResult<Option<Session>> {
        Ok(self.sessions.lock().unwrap().get(&id).cloned())
    }

    async fn find_active_by_owner(&self, owner_id: &str) -> DomainResult<Option<Session>> {
        let sessions = self.sessions.lock().unwrap();
        Ok(sessions
            .values()
            .filter(|s| s.owner_id == owner_id && s.status == SessionStatus::Active)
            .max_by_key(|s| s.updated_at)
            .cloned())
    }

    async fn list_by_owner(&self, owner_id: &str) -> DomainResult<Vec<Session>> {
        let sessions = self.sessions.lock().unwrap();
        let mut results: Vec<Session> = sessions
            .values()
            .filter(|s| s.owner_id == owner_id)
            .cloned()
            .collect();
        results.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(results)
    }

    async fn delete(&self, id: Uuid) -> DomainResult<()> {
        self.sessions
            .lock()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or(DomainError::SessionNotFound(id))
    }
}

/// Mutex-guarded map standing in for the messages table, with a countdown
/// switch to make the next N upserts fail (persistence-failure paths).
#[derive(Default)]
pub struct MockMessageRepository {
    messages: Mutex<HashMap<Uuid, Message>>,
    failures_remaining: AtomicU32,
}

impl MockMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next `n` upserts return a persistence failure.
    pub fn fail_next(&self, n: u32) {
        self.failures_remaining.store(n, Ordering::SeqCst);
    }

    fn should_fail(&self) -> bool {
        self.failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl MessageRepository for MockMessageRepository {
    async fn upsert(&self, message: &Message) -> DomainResult<()> {
        if self.should_fail() {
            return Err(DomainError::PersistenceFailure(
                "injected write failure".to_string(),
            ));
        }
        self.messages
            .lock()
            .unwrap()
            .insert(message.id, message.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> DomainResult<Option<Message>> {
        Ok(self.messages.lock().unwrap().get(&id).cloned())
    }

    async fn list_by_session(&self, session_id: Uuid) -> DomainResult<Vec<Message>> {
        let messages = self.messages.lock().unwrap();
        let mut results: Vec<Message> = messages
            .values()
            .filter(|m| m.session_id == session_id)
            .cloned()
            .collect();
        results.sort_by_key(|m| m.index);
        Ok(results)
    }

    async fn delete_by_session(&self, session_id: Uuid) -> DomainResult<u64> {
        let mut messages = self.messages.lock().unwrap();
        let before = messages.len();
        messages.retain(|_, m| m.session_id != session_id);
        Ok((before - messages.len()) as u64)
    }

    async fn count_by_session(&self, session_id: Uuid) -> DomainResult<u32> {
        let messages = self.messages.lock().unwrap();
        Ok(messages.values().filter(|m| m.session_id == session_id).count() as u32)
    }
}

/// Scripted advisor: serves canned questions/recommendations and can be told
/// to fail specific calls.
pub struct MockAdvisor {
    pub healthy: bool,
    question_failures: AtomicU32,
    recommend_failures: AtomicU32,
    recommend_delay_ms: AtomicU32,
    questions_served: AtomicU32,
}

impl Default for MockAdvisor {
    fn default() -> Self {
        Self {
            healthy: true,
            question_failures: AtomicU32::new(0),
            recommend_failures: AtomicU32::new(0),
            recommend_delay_ms: AtomicU32::new(0),
            questions_served: AtomicU32::new(0),
        }
    }
}

impl MockAdvisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// An advisor whose health probe reports it unreachable.
    pub fn unhealthy() -> Self {
        Self {
            healthy: false,
            ..Self::default()
        }
    }

    /// The next `n` `ask_question` calls fail.
    pub fn fail_next_questions(&self, n: u32) {
        self.question_failures.store(n, Ordering::SeqCst);
    }

    /// The next `n` `recommend` calls fail.
    pub fn fail_next_recommendations(&self, n: u32) {
        self.recommend_failures.store(n, Ordering::SeqCst);
    }

    /// Every `recommend` call sleeps this long before answering.
    pub fn delay_recommendations(&self, ms: u32) {
        self.recommend_delay_ms.store(ms, Ordering::SeqCst);
    }

    pub fn questions_served(&self) -> u32 {
        self.questions_served.load(Ordering::SeqCst)
    }

    fn take_failure(counter: &AtomicU32) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl AdvisorClient for MockAdvisor {
    async fn ask_question(&self, request: QuestionRequest) -> DomainResult<QuestionResponse> {
        if Self::take_failure(&self.question_failures) {
            return Err(DomainError::CollaboratorFailure(
                "injected advisor outage".to_string(),
            ));
        }
        let n = self.questions_served.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(QuestionResponse {
            question: format!("advisor question {n}"),
            suggestions: vec!["Option A".to_string(), "Option B".to_string()],
            category: request.category,
        })
    }

    async fn recommend(
        &self,
        _request: RecommendationRequest,
    ) -> DomainResult<RecommendationResponse> {
        let delay = self.recommend_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(u64::from(delay))).await;
        }
        if Self::take_failure(&self.recommend_failures) {
            return Err(DomainError::CollaboratorFailure(
                "injected advisor outage".to_string(),
            ));
        }
        Ok(RecommendationResponse {
            recommendations: vec![
                Recommendation {
                    title: "Data Analyst".to_string(),
                    summary: "Works with data to answer business questions.".to_string(),
                },
                Recommendation {
                    title: "UX Designer".to_string(),
                    summary: "Designs usable, human-centered products.".to_string(),
                },
            ],
            narrative: "Based on your answers, analytical and creative roles fit you best."
                .to_string(),
            suggestions: vec!["Tell me more about Data Analyst".to_string()],
        })
    }

    async fn health_check(&self) -> DomainResult<bool> {
        Ok(self.healthy)
    }
}
