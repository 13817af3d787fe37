//! Application services: progress math, the message store, realtime sync,
//! session lifecycle, and the interview orchestrator.

pub mod message_store;
pub mod orchestrator;
pub mod progress;
pub mod session_service;
pub mod sync;

pub use message_store::MessageStore;
pub use orchestrator::{AssessmentOrchestrator, AssessmentState, StartOutcome, TurnOutcome};
pub use session_service::SessionService;
pub use sync::RealtimeSynchronizer;
