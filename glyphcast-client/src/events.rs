//! Events published by the pollers for presentation to subscribe to.

use glyphcast_core::EntityId;

/// Cache keys the feed synchronizer refreshes independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedKey {
    Summaries,
    Detail(EntityId),
    Leaderboard,
    Chat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    FeedRefreshed,
    DetailRefreshed(EntityId),
    LeaderboardRefreshed,
    ChatRefreshed,
    /// A poll tick failed; the previous cache entry was kept and the key
    /// will be retried on its next tick.
    PollFailed { key: FeedKey, message: String },
}
