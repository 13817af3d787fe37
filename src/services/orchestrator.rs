//! Assessment orchestrator: the state machine driving a guided interview.
//!
//! The machine is `Idle -> Active -> Analyzing -> Completed`. `Active` turns
//! append the user's answer, credit the current category, recompute progress,
//! and either ask the next question or (once every category has met its
//! threshold) enter `Analyzing` and call the advisor for recommendations.
//! Advisor failures never stall the machine: question failures fall back to
//! the local catalog and recommendation failures return the machine to
//! `Active` with an apology turn so the user can try again.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    Category, Message, MessageDraft, MessageKind, MessageMetadata, NextCategory, QuestionBank,
    Session,
};
use crate::domain::ports::{
    AdvisorClient, ChatTurn, MessageFeed, QuestionRequest, Recommendation, RecommendationRequest,
    RecommendationResponse,
};
use crate::services::{progress, MessageStore, RealtimeSynchronizer, SessionService};

const RECOMMEND_FALLBACK: &str = "I have everything I need, but I couldn't reach the \
recommendation service just now. Send any message and I'll try again.";

const EXPLORE_FALLBACK: &str = "I can't pull up more detail on that right now. \
Please try again in a moment.";

const COMPLETED_GUIDANCE: &str = "Your assessment is complete. You can ask about any of \
the recommendations above, or say \"start a new assessment\" to begin again.";

/// Where the machine currently is. `Active` carries the interview cursor and
/// overall progress so callers can render state without re-deriving it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssessmentState {
    Idle,
    Active { cursor: NextCategory, progress: u8 },
    Analyzing,
    Completed,
}

/// Result of binding the orchestrator to a session (start or resume).
#[derive(Debug, Clone)]
pub struct StartOutcome {
    pub session: Session,
    /// The full ordered log, hydrated from persistence.
    pub messages: Vec<Message>,
    /// Whether a new session was created (vs. an existing one resumed).
    pub created: bool,
    /// Advisor health probe result; `false` means fallback questions ahead.
    pub advisor_ready: bool,
}

/// What one submitted turn produced.
#[derive(Debug)]
pub enum TurnOutcome {
    /// The interview continues: the next question, persisted and tagged.
    NextQuestion(Message),
    /// The trigger fired and recommendations landed; session finalized.
    Completed {
        recommendation: Message,
        session: Box<Session>,
    },
    /// A post-completion exploration answer.
    Reply(Message),
    /// Input after completion that matched nothing actionable.
    Guidance(Message),
    /// The user asked to start over; the orchestrator rebound itself.
    NewSession(Box<StartOutcome>),
}

struct Inner {
    state: AssessmentState,
    session_id: Option<Uuid>,
    owner_id: Option<String>,
    sync: Option<RealtimeSynchronizer>,
    recommendations: Vec<Recommendation>,
}

/// Clears the analyzing flag on every exit path of the recommendation run,
/// including early `?` returns.
struct AnalyzingFlag<'a>(&'a AtomicBool);

impl Drop for AnalyzingFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Drives the interview state machine for one session at a time.
///
/// All turn handling runs under one async mutex, so a second `submit_answer`
/// arriving while a turn (or the recommendation call) is in flight waits its
/// turn instead of interleaving.
pub struct AssessmentOrchestrator {
    lifecycle: Arc<SessionService>,
    store: Arc<MessageStore>,
    advisor: Arc<dyn AdvisorClient>,
    feed: Arc<dyn MessageFeed>,
    bank: Arc<QuestionBank>,
    advisor_timeout: Duration,
    /// Set for the duration of a recommendation run. Checked before the turn
    /// lock so concurrent input fails fast instead of queueing behind the
    /// advisor call.
    analyzing: AtomicBool,
    inner: Mutex<Inner>,
}

impl AssessmentOrchestrator {
    pub fn new(
        lifecycle: Arc<SessionService>,
        store: Arc<MessageStore>,
        advisor: Arc<dyn AdvisorClient>,
        feed: Arc<dyn MessageFeed>,
        bank: Arc<QuestionBank>,
        advisor_timeout: Duration,
    ) -> Self {
        Self {
            lifecycle,
            store,
            advisor,
            feed,
            bank,
            advisor_timeout,
            analyzing: AtomicBool::new(false),
            inner: Mutex::new(Inner {
                state: AssessmentState::Idle,
                session_id: None,
                owner_id: None,
                sync: None,
                recommendations: Vec::new(),
            }),
        }
    }

    /// Starts (or resumes the owner's active) assessment and binds the
    /// orchestrator to it.
    #[instrument(skip(self), err)]
    pub async fn start(&self, owner_id: &str) -> DomainResult<StartOutcome> {
        let mut inner = self.inner.lock().await;
        self.bind(&mut inner, owner_id, None).await
    }

    /// Rebinds the orchestrator to a specific past session.
    #[instrument(skip(self), err)]
    pub async fn resume(&self, session_id: Uuid, owner_id: &str) -> DomainResult<StartOutcome> {
        let mut inner = self.inner.lock().await;
        self.bind(&mut inner, owner_id, Some(session_id)).await
    }

    /// Handles one user turn according to the current state.
    ///
    /// # Errors
    /// `InvalidState` when no session is bound or a recommendation run is in
    /// flight; `ValidationFailed` on empty input.
    #[instrument(skip(self, text), err)]
    pub async fn submit_answer(&self, text: &str) -> DomainResult<TurnOutcome> {
        let text = text.trim();
        if text.is_empty() {
            return Err(DomainError::ValidationFailed(
                "answer cannot be empty".to_string(),
            ));
        }

        // Turns serialize on the inner lock, so a concurrent submit would
        // otherwise block for the whole recommendation run and then land in
        // the just-completed session. Reject it up front instead.
        if self.analyzing.load(Ordering::Acquire) {
            return Err(DomainError::invalid_state(
                "submit_answer",
                "recommendations are being prepared; please wait",
            ));
        }

        let mut inner = self.inner.lock().await;
        match inner.state {
            AssessmentState::Idle => Err(DomainError::invalid_state(
                "submit_answer",
                "no session bound; start or resume first",
            )),
            AssessmentState::Analyzing => Err(DomainError::invalid_state(
                "submit_answer",
                "recommendations are being prepared; please wait",
            )),
            AssessmentState::Active { cursor, .. } => {
                self.active_turn(&mut inner, cursor, text).await
            }
            AssessmentState::Completed => self.completed_turn(&mut inner, text).await,
        }
    }

    /// Re-attempts persistence of a failed message in the bound session.
    pub async fn retry_message(&self, message_id: Uuid) -> DomainResult<Message> {
        let inner = self.inner.lock().await;
        let session_id = Self::bound_session(&inner)?;
        self.store.retry(session_id, message_id).await
    }

    pub async fn state(&self) -> AssessmentState {
        self.inner.lock().await.state
    }

    pub async fn session_id(&self) -> Option<Uuid> {
        self.inner.lock().await.session_id
    }

    /// Recommendations from the bound session's completion, if any.
    pub async fn recommendations(&self) -> Vec<Recommendation> {
        self.inner.lock().await.recommendations.clone()
    }

    async fn bind(
        &self,
        inner: &mut Inner,
        owner_id: &str,
        session_id: Option<Uuid>,
    ) -> DomainResult<StartOutcome> {
        let advisor_ready = self.advisor.health_check().await.unwrap_or(false);
        if !advisor_ready {
            warn!("advisor health check failed; catalog fallbacks will be used");
        }

        let (session, messages, created) = match session_id {
            Some(id) => {
                let (session, messages) = self.lifecycle.resume(id, owner_id).await?;
                (session, messages, false)
            }
            None => {
                let (session, created) = self.lifecycle.start(owner_id).await?;
                let messages = self.store.log_snapshot(session.id).await;
                (session, messages, created)
            }
        };

        // Old synchronizer (if any) is dropped here, tearing down its task.
        inner.sync = Some(RealtimeSynchronizer::spawn(
            &self.feed,
            self.store.clone(),
            session.id,
        ));
        inner.session_id = Some(session.id);
        inner.owner_id = Some(owner_id.to_string());
        inner.recommendations = Self::rehydrate_recommendations(&messages);
        inner.state = if session.is_active() {
            AssessmentState::Active {
                cursor: session.metadata.last_category,
                progress: session.metadata.overall_progress,
            }
        } else {
            AssessmentState::Completed
        };

        info!(session_id = %session.id, created, advisor_ready, "session bound");
        Ok(StartOutcome {
            session,
            messages,
            created,
            advisor_ready,
        })
    }

    /// One interview turn: persist the answer, credit progress, then either
    /// run the recommendation phase or ask the next question.
    async fn active_turn(
        &self,
        inner: &mut Inner,
        cursor: NextCategory,
        text: &str,
    ) -> DomainResult<TurnOutcome> {
        let session_id = Self::bound_session(inner)?;

        // The kick-off turn (no question asked yet) opens the interview but
        // is not an answer to anything, so it earns no category credit.
        let answered_a_question = self
            .store
            .log_snapshot(session_id)
            .await
            .iter()
            .any(|m| m.kind == MessageKind::Bot);

        self.store
            .append(session_id, MessageDraft::user(text))
            .await?;

        let session = match cursor.category() {
            Some(category) if answered_a_question => {
                self.lifecycle.record_answer(session_id, category).await?
            }
            // Kick-off, or a re-trigger after a failed recommendation run.
            _ => self.lifecycle.get(session_id).await?,
        };

        let counts = session.metadata.question_counts.clone();
        if progress::recommendation_ready(&self.bank, &counts) {
            return self.analyze(inner, session).await;
        }

        let next = session
            .metadata
            .last_category
            .category()
            .ok_or_else(|| {
                DomainError::invalid_state("active_turn", "cursor complete but trigger not ready")
            })?;
        let asked_so_far = counts.get(&next).copied().unwrap_or(0);
        let question = self.next_question(session_id, next, asked_so_far).await?;

        inner.state = AssessmentState::Active {
            cursor: NextCategory::Ask(next),
            progress: session.metadata.overall_progress,
        };
        Ok(TurnOutcome::NextQuestion(question))
    }

    /// Recommendation phase: `Analyzing` until the advisor answers (or the
    /// timeout fires). Success finalizes the session; failure appends an
    /// apology and returns to `Active` so the next turn re-triggers.
    async fn analyze(&self, inner: &mut Inner, session: Session) -> DomainResult<TurnOutcome> {
        inner.state = AssessmentState::Analyzing;
        self.analyzing.store(true, Ordering::Release);
        let _flag = AnalyzingFlag(&self.analyzing);
        info!(session_id = %session.id, "all categories met threshold; requesting recommendations");

        let request = RecommendationRequest {
            session_id: session.id,
            history: self.transcript(session.id).await,
        };
        match self.bounded(self.advisor.recommend(request)).await {
            Ok(response) => {
                let metadata = MessageMetadata {
                    suggestions: response.suggestions.clone(),
                    category: None,
                    payload: Some(serde_json::to_value(&response)?),
                };
                let recommendation = self
                    .store
                    .append(
                        session.id,
                        MessageDraft::new(MessageKind::Recommendation, response.narrative.clone())
                            .with_metadata(metadata),
                    )
                    .await?;
                let finalized = self.lifecycle.finalize(session.id).await?;

                inner.recommendations = response.recommendations;
                inner.state = AssessmentState::Completed;
                Ok(TurnOutcome::Completed {
                    recommendation,
                    session: Box::new(finalized),
                })
            }
            Err(err) => {
                warn!(session_id = %session.id, error = %err, "recommendation call failed");
                let apology = self
                    .store
                    .append(session.id, MessageDraft::bot(RECOMMEND_FALLBACK))
                    .await?;
                inner.state = AssessmentState::Active {
                    cursor: NextCategory::Complete,
                    progress: session.metadata.overall_progress,
                };
                Ok(TurnOutcome::NextQuestion(apology))
            }
        }
    }

    /// Asks the advisor to phrase the next question for a category, falling
    /// back to the catalog when it is unreachable. Always persists the
    /// resulting bot turn tagged with the category.
    async fn next_question(
        &self,
        session_id: Uuid,
        category: Category,
        asked_so_far: u32,
    ) -> DomainResult<Message> {
        let history = self.transcript(session_id).await;
        let turn = u32::try_from(history.len()).unwrap_or(u32::MAX) + 1;
        let request = QuestionRequest {
            session_id,
            history,
            category: Some(category),
            turn,
        };

        let (content, suggestions) = match self.bounded(self.advisor.ask_question(request)).await {
            Ok(response) => (response.question, response.suggestions),
            Err(err) => {
                warn!(%category, error = %err, "advisor question failed; using catalog fallback");
                let fallback = self.bank.fallback_question(category, asked_so_far);
                (fallback.text.clone(), fallback.options.clone())
            }
        };

        let metadata = MessageMetadata {
            suggestions,
            ..MessageMetadata::for_category(category)
        };
        self.store
            .append(
                session_id,
                MessageDraft::bot(content).with_metadata(metadata),
            )
            .await
    }

    /// Post-completion input: explore a recommendation, start over, or get
    /// pointed back at those two options.
    async fn completed_turn(&self, inner: &mut Inner, text: &str) -> DomainResult<TurnOutcome> {
        let session_id = Self::bound_session(inner)?;
        let lowered = text.to_lowercase();

        if lowered.contains("new assessment") || lowered.contains("start over") {
            let owner = inner
                .owner_id
                .clone()
                .ok_or_else(|| DomainError::invalid_state("completed_turn", "no owner bound"))?;
            let outcome = self.bind(inner, &owner, None).await?;
            return Ok(TurnOutcome::NewSession(Box::new(outcome)));
        }

        let explores_recommendation = inner
            .recommendations
            .iter()
            .any(|r| lowered.contains(&r.title.to_lowercase()));
        if explores_recommendation {
            self.store
                .append(session_id, MessageDraft::user(text))
                .await?;
            let history = self.transcript(session_id).await;
            let turn = u32::try_from(history.len()).unwrap_or(u32::MAX) + 1;
            let request = QuestionRequest {
                session_id,
                history,
                category: None,
                turn,
            };
            let content = match self.bounded(self.advisor.ask_question(request)).await {
                Ok(response) => response.question,
                Err(err) => {
                    warn!(error = %err, "explore follow-up failed");
                    EXPLORE_FALLBACK.to_string()
                }
            };
            let reply = self
                .store
                .append(session_id, MessageDraft::bot(content))
                .await?;
            return Ok(TurnOutcome::Reply(reply));
        }

        // Not actionable: persist the guidance so the conversation shows it
        // rather than silently swallowing the input.
        self.store
            .append(session_id, MessageDraft::user(text))
            .await?;
        let guidance = self
            .store
            .append(session_id, MessageDraft::bot(COMPLETED_GUIDANCE))
            .await?;
        Ok(TurnOutcome::Guidance(guidance))
    }

    /// The log as advisor chat turns: user messages keep their role, every
    /// bot-authored kind is presented as the assistant.
    async fn transcript(&self, session_id: Uuid) -> Vec<ChatTurn> {
        self.store
            .log_snapshot(session_id)
            .await
            .iter()
            .map(|m| match m.kind {
                MessageKind::User => ChatTurn::user(m.content.clone()),
                _ => ChatTurn::assistant(m.content.clone()),
            })
            .collect()
    }

    async fn bounded<T>(
        &self,
        call: impl std::future::Future<Output = DomainResult<T>>,
    ) -> DomainResult<T> {
        match tokio::time::timeout(self.advisor_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(DomainError::CollaboratorFailure(
                "advisor call timed out".to_string(),
            )),
        }
    }

    fn bound_session(inner: &Inner) -> DomainResult<Uuid> {
        inner
            .session_id
            .ok_or_else(|| DomainError::invalid_state("submit_answer", "no session bound"))
    }

    /// On resume of a completed session, recover the recommendation list
    /// from the persisted recommendation turn's payload.
    fn rehydrate_recommendations(messages: &[Message]) -> Vec<Recommendation> {
        messages
            .iter()
            .rev()
            .find(|m| m.kind == MessageKind::Recommendation)
            .and_then(|m| m.metadata.payload.clone())
            .and_then(|payload| serde_json::from_value::<RecommendationResponse>(payload).ok())
            .map(|response| response.recommendations)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::feed::BroadcastFeed;
    use crate::domain::models::{MessageStatus, SessionStatus};
    use crate::testing::{MockAdvisor, MockMessageRepository, MockSessionRepository};

    fn orchestrator() -> (AssessmentOrchestrator, Arc<MockAdvisor>) {
        let sessions = Arc::new(MockSessionRepository::new());
        let messages = Arc::new(MockMessageRepository::new());
        let feed: Arc<dyn MessageFeed> = Arc::new(BroadcastFeed::default());
        let bank = Arc::new(QuestionBank::default());
        let store = Arc::new(MessageStore::new(
            sessions.clone(),
            messages.clone(),
            feed.clone(),
        ));
        let lifecycle = Arc::new(SessionService::new(
            sessions,
            messages,
            store.clone(),
            bank.clone(),
        ));
        let advisor = Arc::new(MockAdvisor::new());
        let orchestrator = AssessmentOrchestrator::new(
            lifecycle,
            store,
            advisor.clone(),
            feed,
            bank,
            Duration::from_secs(5),
        );
        (orchestrator, advisor)
    }

    async fn expect_question(orchestrator: &AssessmentOrchestrator, text: &str) -> Message {
        match orchestrator.submit_answer(text).await.unwrap() {
            TurnOutcome::NextQuestion(message) => message,
            other => panic!("expected NextQuestion, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_submit_before_start_is_rejected() {
        let (orchestrator, _) = orchestrator();
        assert!(matches!(
            orchestrator.submit_answer("hello").await,
            Err(DomainError::InvalidState { .. })
        ));
    }

    #[tokio::test]
    async fn test_start_binds_active_state_with_greeting() {
        let (orchestrator, _) = orchestrator();
        let outcome = orchestrator.start("alice").await.unwrap();

        assert!(outcome.created);
        assert!(outcome.advisor_ready);
        assert_eq!(outcome.messages.len(), 1);
        assert_eq!(outcome.messages[0].kind, MessageKind::System);
        assert_eq!(
            orchestrator.state().await,
            AssessmentState::Active {
                cursor: NextCategory::Ask(Category::Education),
                progress: 0,
            }
        );
    }

    #[tokio::test]
    async fn test_kick_off_turn_earns_no_category_credit() {
        let (orchestrator, _) = orchestrator();
        let outcome = orchestrator.start("alice").await.unwrap();
        let session_id = outcome.session.id;

        let question = expect_question(&orchestrator, "Begin Assessment").await;
        assert_eq!(question.kind, MessageKind::Bot);
        assert_eq!(question.metadata.category, Some(Category::Education));

        // Still zero answers recorded and the cursor has not moved.
        assert_eq!(
            orchestrator.state().await,
            AssessmentState::Active {
                cursor: NextCategory::Ask(Category::Education),
                progress: 0,
            }
        );
        let session = orchestrator.lifecycle.get(session_id).await.unwrap();
        assert!(session.metadata.question_counts.values().all(|&c| c == 0));
    }

    #[tokio::test]
    async fn test_answers_advance_cursor_through_categories() {
        let (orchestrator, _) = orchestrator();
        orchestrator.start("alice").await.unwrap();
        expect_question(&orchestrator, "Begin Assessment").await;

        expect_question(&orchestrator, "Bachelor's degree").await;
        let question = expect_question(&orchestrator, "Science and math").await;

        // Two education answers: cursor moves to skills, 25% overall.
        assert_eq!(question.metadata.category, Some(Category::Skills));
        assert_eq!(
            orchestrator.state().await,
            AssessmentState::Active {
                cursor: NextCategory::Ask(Category::Skills),
                progress: 25,
            }
        );
    }

    #[tokio::test]
    async fn test_full_interview_completes_with_recommendations() {
        let (orchestrator, _) = orchestrator();
        let start = orchestrator.start("alice").await.unwrap();
        expect_question(&orchestrator, "Begin Assessment").await;

        // Seven scored answers keep the interview going.
        for i in 0..7 {
            expect_question(&orchestrator, &format!("answer {i}")).await;
        }

        // The eighth satisfies every category and fires the trigger.
        let (recommendation, session) =
            match orchestrator.submit_answer("final answer").await.unwrap() {
                TurnOutcome::Completed {
                    recommendation,
                    session,
                } => (recommendation, session),
                other => panic!("expected Completed, got {other:?}"),
            };

        assert_eq!(recommendation.kind, MessageKind::Recommendation);
        assert!(recommendation.metadata.payload.is_some());
        assert_eq!(session.status, SessionStatus::Completed);
        assert_eq!(session.metadata.overall_progress, 100);
        assert_eq!(orchestrator.state().await, AssessmentState::Completed);

        let titles: Vec<String> = orchestrator
            .recommendations()
            .await
            .iter()
            .map(|r| r.title.clone())
            .collect();
        assert_eq!(titles, vec!["Data Analyst", "UX Designer"]);

        // Log ends with the recommendation then the session-end turn.
        let log = orchestrator.store.log_snapshot(start.session.id).await;
        let kinds: Vec<MessageKind> = log.iter().rev().take(2).map(|m| m.kind).collect();
        assert_eq!(kinds, vec![MessageKind::SessionEnd, MessageKind::Recommendation]);
    }

    #[tokio::test]
    async fn test_question_failure_falls_back_to_catalog() {
        let (orchestrator, advisor) = orchestrator();
        orchestrator.start("alice").await.unwrap();
        expect_question(&orchestrator, "Begin Assessment").await;

        advisor.fail_next_questions(1);
        let question = expect_question(&orchestrator, "Bachelor's degree").await;

        // Catalog question for education, with its options as suggestions.
        let bank = QuestionBank::default();
        let expected = bank.fallback_question(Category::Education, 1);
        assert_eq!(question.content, expected.text);
        assert_eq!(question.metadata.suggestions, expected.options);
        assert_eq!(question.metadata.category, Some(Category::Education));
        assert!(matches!(
            orchestrator.state().await,
            AssessmentState::Active { .. }
        ));
    }

    #[tokio::test]
    async fn test_recommendation_failure_returns_to_active_and_retriggers() {
        let (orchestrator, advisor) = orchestrator();
        orchestrator.start("alice").await.unwrap();
        expect_question(&orchestrator, "Begin Assessment").await;
        for i in 0..7 {
            expect_question(&orchestrator, &format!("answer {i}")).await;
        }

        advisor.fail_next_recommendations(1);
        let apology = expect_question(&orchestrator, "final answer").await;
        assert_eq!(apology.kind, MessageKind::Bot);
        assert_eq!(
            orchestrator.state().await,
            AssessmentState::Active {
                cursor: NextCategory::Complete,
                progress: 100,
            }
        );

        // Any next turn re-runs the recommendation phase without
        // double-counting an answer.
        match orchestrator.submit_answer("try again").await.unwrap() {
            TurnOutcome::Completed { session, .. } => {
                assert_eq!(session.status, SessionStatus::Completed);
                let counts = &session.metadata.question_counts;
                assert!(counts.values().all(|&c| c == 2), "counts {counts:?}");
            }
            other => panic!("expected Completed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_input_during_recommendation_run_is_rejected() {
        let (orchestrator, advisor) = orchestrator();
        let orchestrator = Arc::new(orchestrator);
        orchestrator.start("alice").await.unwrap();
        expect_question(&orchestrator, "Begin Assessment").await;
        for i in 0..7 {
            expect_question(&orchestrator, &format!("answer {i}")).await;
        }

        // Hold the recommendation call in flight, then submit from the side.
        advisor.delay_recommendations(400);
        let runner = Arc::clone(&orchestrator);
        let trigger = tokio::spawn(async move { runner.submit_answer("final answer").await });

        tokio::time::sleep(Duration::from_millis(100)).await;
        let concurrent = orchestrator.submit_answer("one more thought").await;
        assert!(
            matches!(concurrent, Err(DomainError::InvalidState { .. })),
            "expected InvalidState, got {concurrent:?}"
        );

        match trigger.await.unwrap().unwrap() {
            TurnOutcome::Completed { session, .. } => {
                assert_eq!(session.status, SessionStatus::Completed);
            }
            other => panic!("expected Completed, got {other:?}"),
        }
        assert_eq!(orchestrator.state().await, AssessmentState::Completed);

        // The rejected input left no trace in the finished log.
        let session_id = orchestrator.session_id().await.unwrap();
        let log = orchestrator.store.log_snapshot(session_id).await;
        assert!(log.iter().all(|m| m.content != "one more thought"));

        // And the flag cleared: post-completion turns work again.
        match orchestrator.submit_answer("what now?").await.unwrap() {
            TurnOutcome::Guidance(_) => {}
            other => panic!("expected Guidance, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_completed_explore_turn_replies() {
        let (orchestrator, _) = orchestrator();
        orchestrator.start("alice").await.unwrap();
        expect_question(&orchestrator, "Begin Assessment").await;
        for i in 0..8 {
            let _ = orchestrator
                .submit_answer(&format!("answer {i}"))
                .await
                .unwrap();
        }
        assert_eq!(orchestrator.state().await, AssessmentState::Completed);

        let outcome = orchestrator
            .submit_answer("Tell me more about Data Analyst")
            .await
            .unwrap();
        match outcome {
            TurnOutcome::Reply(reply) => {
                assert_eq!(reply.kind, MessageKind::Bot);
                assert_eq!(reply.status, MessageStatus::Sent);
            }
            other => panic!("expected Reply, got {other:?}"),
        }
        // Exploring does not reopen the interview.
        assert_eq!(orchestrator.state().await, AssessmentState::Completed);
    }

    #[tokio::test]
    async fn test_completed_unrecognized_input_gets_guidance() {
        let (orchestrator, _) = orchestrator();
        orchestrator.start("alice").await.unwrap();
        expect_question(&orchestrator, "Begin Assessment").await;
        for i in 0..8 {
            let _ = orchestrator
                .submit_answer(&format!("answer {i}"))
                .await
                .unwrap();
        }

        match orchestrator.submit_answer("what's the weather?").await.unwrap() {
            TurnOutcome::Guidance(message) => {
                assert_eq!(message.kind, MessageKind::Bot);
            }
            other => panic!("expected Guidance, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_completed_start_over_creates_new_session() {
        let (orchestrator, _) = orchestrator();
        let first = orchestrator.start("alice").await.unwrap();
        expect_question(&orchestrator, "Begin Assessment").await;
        for i in 0..8 {
            let _ = orchestrator
                .submit_answer(&format!("answer {i}"))
                .await
                .unwrap();
        }

        match orchestrator
            .submit_answer("start a new assessment")
            .await
            .unwrap()
        {
            TurnOutcome::NewSession(outcome) => {
                assert!(outcome.created);
                assert_ne!(outcome.session.id, first.session.id);
            }
            other => panic!("expected NewSession, got {other:?}"),
        }
        assert!(matches!(
            orchestrator.state().await,
            AssessmentState::Active { .. }
        ));
    }

    #[tokio::test]
    async fn test_resume_completed_session_rehydrates_recommendations() {
        let (orchestrator, _) = orchestrator();
        let start = orchestrator.start("alice").await.unwrap();
        expect_question(&orchestrator, "Begin Assessment").await;
        for i in 0..8 {
            let _ = orchestrator
                .submit_answer(&format!("answer {i}"))
                .await
                .unwrap();
        }

        // Fresh orchestrator over a new store: hydrates from persistence.
        let resumed = orchestrator
            .resume(start.session.id, "alice")
            .await
            .unwrap();
        assert!(!resumed.created);
        assert_eq!(orchestrator.state().await, AssessmentState::Completed);
        assert_eq!(orchestrator.recommendations().await.len(), 2);
    }

    #[tokio::test]
    async fn test_start_reports_degraded_advisor() {
        let (mut orchestrator, _) = orchestrator();
        orchestrator.advisor = Arc::new(MockAdvisor::unhealthy());
        let outcome = orchestrator.start("alice").await.unwrap();
        assert!(!outcome.advisor_ready);
        // The interview still proceeds on catalog questions.
        assert!(matches!(
            orchestrator.state().await,
            AssessmentState::Active { .. }
        ));
    }
}
