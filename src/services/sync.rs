//! Realtime synchronizer: merges feed events into the local message log.
//!
//! One synchronizer serves one session. It consumes the per-session feed and
//! hands every event to the store's id-deduplicated merge, so replays and
//! local echoes are absorbed and the final log is the same regardless of
//! delivery order. Dropping the synchronizer (or switching sessions) tears
//! the subscription task down.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::domain::ports::MessageFeed;
use crate::services::MessageStore;

/// Handle to a running per-session feed consumer.
pub struct RealtimeSynchronizer {
    session_id: Uuid,
    task: JoinHandle<()>,
}

impl RealtimeSynchronizer {
    /// Subscribes to the session's feed and spawns the merge loop.
    pub fn spawn(
        feed: &Arc<dyn MessageFeed>,
        store: Arc<MessageStore>,
        session_id: Uuid,
    ) -> Self {
        let mut subscription = feed.subscribe(session_id);
        let task = tokio::spawn(async move {
            while let Some(message) = subscription.recv().await {
                if message.session_id != session_id {
                    // The feed is per-session; a mismatched event is a bug
                    // upstream, not something to merge.
                    debug!(expected = %session_id, got = %message.session_id,
                        "dropping cross-session feed event");
                    continue;
                }
                let merged = store.merge_remote(message.clone()).await;
                if merged {
                    debug!(session_id = %session_id, message_id = %message.id,
                        index = message.index, "merged remote message");
                } else {
                    trace!(message_id = %message.id, "duplicate feed event ignored");
                }
            }
        });
        Self { session_id, task }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Stops consuming the feed. Also happens automatically on drop.
    pub fn shutdown(&self) {
        self.task.abort();
    }
}

impl Drop for RealtimeSynchronizer {
    fn drop(&mut self) {
        self.task.abort();
    }
}
