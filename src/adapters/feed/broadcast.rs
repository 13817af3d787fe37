//! In-process realtime feed backed by per-session tokio broadcast channels.

use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::broadcast;
use uuid::Uuid;

use crate::domain::models::Message;
use crate::domain::ports::{FeedSubscription, MessageFeed};

const DEFAULT_CAPACITY: usize = 256;

/// One broadcast channel per session, created lazily on first subscribe.
///
/// Publishing to a session nobody subscribed to is a no-op, and channels
/// whose subscribers have all dropped are pruned on the next publish.
pub struct BroadcastFeed {
    channels: Mutex<HashMap<Uuid, broadcast::Sender<Message>>>,
    capacity: usize,
}

impl BroadcastFeed {
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
            capacity,
        }
    }
}

impl Default for BroadcastFeed {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl MessageFeed for BroadcastFeed {
    fn subscribe(&self, session_id: Uuid) -> FeedSubscription {
        let mut channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        let sender = channels
            .entry(session_id)
            .or_insert_with(|| broadcast::channel(self.capacity).0);
        FeedSubscription::new(session_id, sender.subscribe())
    }

    fn publish(&self, message: &Message) {
        let mut channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(sender) = channels.get(&message.session_id) {
            // send() errs only when every receiver is gone; drop the channel.
            if sender.send(message.clone()).is_err() {
                channels.remove(&message.session_id);
            }
        }
    }
}
