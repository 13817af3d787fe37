//! Realtime feed adapters.

pub mod broadcast;

pub use broadcast::BroadcastFeed;
