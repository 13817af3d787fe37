//! Realtime feed port: per-session change notifications for newly persisted
//! messages.
//!
//! Delivery is at-least-once and possibly duplicated; consumers deduplicate
//! by message id. Subscriptions are scoped to one session and torn down by
//! dropping the subscription, so switching sessions cannot leak events.

use tokio::sync::broadcast;
use tracing::warn;
use uuid::Uuid;

use crate::domain::models::Message;

/// Feed of newly inserted messages, publishable and subscribable per session.
pub trait MessageFeed: Send + Sync {
    /// Subscribes to inserts for one session.
    fn subscribe(&self, session_id: Uuid) -> FeedSubscription;

    /// Announces a newly persisted message to the session's subscribers.
    /// Best-effort: publishing to a session with no subscribers is a no-op.
    fn publish(&self, message: &Message);
}

/// A live, single-session subscription. Dropping it ends delivery.
pub struct FeedSubscription {
    session_id: Uuid,
    receiver: broadcast::Receiver<Message>,
}

impl FeedSubscription {
    pub fn new(session_id: Uuid, receiver: broadcast::Receiver<Message>) -> Self {
        Self {
            session_id,
            receiver,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Next message from the feed, or `None` once the channel is closed.
    /// Lagged receivers skip ahead; the id-based dedup downstream absorbs
    /// any resulting duplicates on replay.
    pub async fn recv(&mut self) -> Option<Message> {
        loop {
            match self.receiver.recv().await {
                Ok(message) => return Some(message),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(session_id = %self.session_id, skipped, "feed subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
