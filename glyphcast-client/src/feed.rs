//! Feed synchronization: interval polling, cache ownership, re-ranking.
//!
//! The synchronizer owns every polled cache (prompt summaries, per-prompt
//! details, leaderboard, chat) and is the only component that mutates them;
//! presentation reads snapshots. Each cache key carries an issuance
//! generation so an overlapping response can be discarded: a response is
//! applied only if no later-issued response for the same key has been
//! applied already (last-issued-wins, not last-completed-wins).
//!
//! Cache entries are replaced wholesale, never merged: the server is the
//! single source of truth and entries are immutable apart from vote and
//! proposal counts.

use crate::api_client::{ApiClient, ApiClientError};
use crate::events::{ClientEvent, FeedKey};
use crate::ranking;
use glyphcast_core::{
    ChatMessage, EntityId, LeaderboardEntry, Prompt, PromptDetail, SortMode, Timestamp,
};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};

/// Default chat message page size, matching the service default.
pub const CHAT_LIMIT: u32 = 50;

// ============================================================================
// VOTE VELOCITY
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct VoteSample {
    at: Timestamp,
    total_votes: i64,
}

/// Tracks total proposal votes per prompt across successive detail polls.
/// The service exposes no vote history, so trending velocity is derived
/// client-side from these samples.
#[derive(Debug, Default)]
pub struct VoteVelocityTracker {
    samples: HashMap<EntityId, VecDeque<VoteSample>>,
}

impl VoteVelocityTracker {
    pub fn record(&mut self, prompt_id: EntityId, total_votes: i64, now: Timestamp) {
        let window = chrono::Duration::seconds(ranking::TRENDING_WINDOW_SECS);
        let samples = self.samples.entry(prompt_id).or_default();
        samples.push_back(VoteSample {
            at: now,
            total_votes,
        });
        while let Some(front) = samples.front() {
            if now - front.at > window {
                samples.pop_front();
            } else {
                break;
            }
        }
    }

    /// Votes gained within the trending window. Needs at least two samples;
    /// with fewer there is no window data for the prompt.
    pub fn gained(&self, prompt_id: EntityId) -> Option<i64> {
        let samples = self.samples.get(&prompt_id)?;
        let first = samples.front()?;
        let last = samples.back()?;
        if samples.len() < 2 {
            return None;
        }
        Some(last.total_votes - first.total_votes)
    }

    /// Velocity map for the ranking engine. Empty when no prompt has window
    /// data yet, which makes trending fall back to hot ordering.
    pub fn snapshot(&self) -> HashMap<EntityId, i64> {
        self.samples
            .keys()
            .filter_map(|id| self.gained(*id).map(|gained| (*id, gained)))
            .collect()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

// ============================================================================
// SYNCHRONIZER
// ============================================================================

#[derive(Debug, Default, Clone, Copy)]
struct Generations {
    issued: u64,
    applied: u64,
}

#[derive(Debug)]
pub struct FeedSynchronizer {
    sort: SortMode,
    prompts: Vec<Prompt>,
    details: HashMap<EntityId, PromptDetail>,
    leaderboard: Vec<LeaderboardEntry>,
    chat: Vec<ChatMessage>,
    watched: HashSet<EntityId>,
    generations: HashMap<FeedKey, Generations>,
    velocity: VoteVelocityTracker,
}

impl FeedSynchronizer {
    pub fn new(sort: SortMode) -> Self {
        Self {
            sort,
            prompts: Vec::new(),
            details: HashMap::new(),
            leaderboard: Vec::new(),
            chat: Vec::new(),
            watched: HashSet::new(),
            generations: HashMap::new(),
            velocity: VoteVelocityTracker::default(),
        }
    }

    /// Drop all cached state. Test isolation hook.
    pub fn reset(&mut self) {
        self.prompts.clear();
        self.details.clear();
        self.leaderboard.clear();
        self.chat.clear();
        self.watched.clear();
        self.generations.clear();
        self.velocity.clear();
    }

    pub fn sort(&self) -> SortMode {
        self.sort
    }

    /// Switch sort mode. Invalidates the summary list (any in-flight summary
    /// response for the old sort will be discarded) but keeps cached details
    /// and the other feeds untouched. Returns whether the mode changed; the
    /// caller triggers the immediate refetch.
    pub fn set_sort(&mut self, mode: SortMode) -> bool {
        if self.sort == mode {
            return false;
        }
        self.sort = mode;
        self.invalidate(FeedKey::Summaries);
        true
    }

    /// Mark a prompt for detail polling. Returns true if it was not watched
    /// before, meaning the caller should trigger the initial lazy fetch.
    pub fn watch_prompt(&mut self, prompt_id: EntityId) -> bool {
        self.watched.insert(prompt_id)
    }

    pub fn unwatch_prompt(&mut self, prompt_id: EntityId) {
        self.watched.remove(&prompt_id);
    }

    pub fn watched_prompts(&self) -> Vec<EntityId> {
        self.watched.iter().copied().collect()
    }

    // ------------------------------------------------------------------------
    // Generation bookkeeping
    // ------------------------------------------------------------------------

    /// Record a new request issuance for a key and return its generation.
    pub fn begin_fetch(&mut self, key: FeedKey) -> u64 {
        let entry = self.generations.entry(key).or_default();
        entry.issued += 1;
        entry.issued
    }

    /// Discard any response issued up to now for this key.
    fn invalidate(&mut self, key: FeedKey) {
        let entry = self.generations.entry(key).or_default();
        entry.applied = entry.issued;
    }

    /// A response may be applied only if nothing later-issued has been
    /// applied (or invalidated past it) for the same key.
    fn try_apply(&mut self, key: FeedKey, generation: u64) -> bool {
        let entry = self.generations.entry(key).or_default();
        if generation > entry.applied {
            entry.applied = generation;
            true
        } else {
            false
        }
    }

    // ------------------------------------------------------------------------
    // Cache application (wholesale replacement)
    // ------------------------------------------------------------------------

    pub fn apply_summaries(&mut self, generation: u64, prompts: Vec<Prompt>) -> bool {
        if !self.try_apply(FeedKey::Summaries, generation) {
            return false;
        }
        self.prompts = prompts;
        true
    }

    pub fn apply_detail(
        &mut self,
        generation: u64,
        detail: PromptDetail,
        now: Timestamp,
    ) -> bool {
        let prompt_id = detail.prompt.id;
        if !self.try_apply(FeedKey::Detail(prompt_id), generation) {
            return false;
        }
        let total_votes = detail.proposals.iter().map(|p| p.votes).sum();
        self.velocity.record(prompt_id, total_votes, now);
        self.details.insert(prompt_id, detail);
        true
    }

    pub fn apply_leaderboard(&mut self, generation: u64, entries: Vec<LeaderboardEntry>) -> bool {
        if !self.try_apply(FeedKey::Leaderboard, generation) {
            return false;
        }
        self.leaderboard = entries;
        true
    }

    pub fn apply_chat(&mut self, generation: u64, messages: Vec<ChatMessage>) -> bool {
        if !self.try_apply(FeedKey::Chat, generation) {
            return false;
        }
        self.chat = messages;
        true
    }

    // ------------------------------------------------------------------------
    // Read accessors
    // ------------------------------------------------------------------------

    pub fn prompts(&self) -> &[Prompt] {
        &self.prompts
    }

    /// Lazily loading detail cache: `None` means not yet loaded.
    pub fn detail(&self, prompt_id: EntityId) -> Option<&PromptDetail> {
        self.details.get(&prompt_id)
    }

    pub fn leaderboard(&self) -> &[LeaderboardEntry] {
        &self.leaderboard
    }

    pub fn chat(&self) -> &[ChatMessage] {
        &self.chat
    }

    /// Current summaries in ranked order for the active sort mode.
    pub fn ranked(&self, now: Timestamp) -> Vec<Prompt> {
        ranking::rank(&self.prompts, self.sort, now, &self.velocity.snapshot())
    }
}

// ============================================================================
// ASYNC REFRESH OPERATIONS
// ============================================================================

/// Shared handle the pollers and presentation both hold.
pub type SharedFeed = Arc<Mutex<FeedSynchronizer>>;

pub fn shared(sort: SortMode) -> SharedFeed {
    Arc::new(Mutex::new(FeedSynchronizer::new(sort)))
}

/// Fetch the summary list for the current sort and apply it. Returns whether
/// the cache changed (a stale response reports false).
pub async fn refresh_summaries(
    feed: &SharedFeed,
    api: &ApiClient,
) -> Result<bool, ApiClientError> {
    let (generation, sort) = {
        let mut guard = feed.lock().await;
        (guard.begin_fetch(FeedKey::Summaries), guard.sort())
    };
    let prompts = api.list_prompts(None, Some(sort)).await?;
    Ok(feed.lock().await.apply_summaries(generation, prompts))
}

pub async fn refresh_detail(
    feed: &SharedFeed,
    api: &ApiClient,
    prompt_id: EntityId,
) -> Result<bool, ApiClientError> {
    let generation = feed.lock().await.begin_fetch(FeedKey::Detail(prompt_id));
    let detail = api.get_prompt(prompt_id).await?;
    let now = chrono::Utc::now();
    Ok(feed.lock().await.apply_detail(generation, detail, now))
}

pub async fn refresh_leaderboard(
    feed: &SharedFeed,
    api: &ApiClient,
) -> Result<bool, ApiClientError> {
    let generation = feed.lock().await.begin_fetch(FeedKey::Leaderboard);
    let entries = api.leaderboard().await?;
    Ok(feed.lock().await.apply_leaderboard(generation, entries))
}

pub async fn refresh_chat(
    feed: &SharedFeed,
    api: &ApiClient,
    room: &str,
) -> Result<bool, ApiClientError> {
    let generation = feed.lock().await.begin_fetch(FeedKey::Chat);
    let messages = api.list_chat(room, CHAT_LIMIT).await?;
    Ok(feed.lock().await.apply_chat(generation, messages))
}

/// Switch sort mode and refetch the summary list immediately. An in-flight
/// detail fetch is unaffected: only the summary key is invalidated.
pub async fn change_sort(
    feed: &SharedFeed,
    api: &ApiClient,
    mode: SortMode,
) -> Result<bool, ApiClientError> {
    if !feed.lock().await.set_sort(mode) {
        return Ok(false);
    }
    refresh_summaries(feed, api).await
}

/// Watch a prompt and lazily load its detail if this is the first watch.
pub async fn open_prompt(
    feed: &SharedFeed,
    api: &ApiClient,
    prompt_id: EntityId,
) -> Result<(), ApiClientError> {
    let newly_watched = feed.lock().await.watch_prompt(prompt_id);
    if newly_watched {
        refresh_detail(feed, api, prompt_id).await?;
    }
    Ok(())
}

// ============================================================================
// POLL LOOPS
// ============================================================================

/// Poll cadences, in milliseconds.
#[derive(Debug, Clone, Copy)]
pub struct PollerIntervals {
    pub summaries_ms: u64,
    pub detail_ms: u64,
    pub leaderboard_ms: u64,
    pub chat_ms: u64,
}

impl From<&crate::config::PollIntervals> for PollerIntervals {
    fn from(intervals: &crate::config::PollIntervals) -> Self {
        Self {
            summaries_ms: intervals.summaries_ms,
            detail_ms: intervals.detail_ms,
            leaderboard_ms: intervals.leaderboard_ms,
            chat_ms: intervals.chat_ms,
        }
    }
}

/// Spawn the four poll loops. Each tick refreshes its cache key through the
/// gateway and emits a [`ClientEvent`]; a failed tick keeps the previous
/// cache entry, logs a warning, and waits for the next tick (the interval
/// itself throttles retries, no backoff).
pub fn spawn_pollers(
    feed: SharedFeed,
    api: ApiClient,
    intervals: PollerIntervals,
    chat_room: String,
    sender: mpsc::Sender<ClientEvent>,
) {
    {
        let feed = feed.clone();
        let api = api.clone();
        let sender = sender.clone();
        tokio::spawn(async move {
            let mut ticker = interval(intervals.summaries_ms);
            loop {
                ticker.tick().await;
                match refresh_summaries(&feed, &api).await {
                    Ok(true) => notify(&sender, ClientEvent::FeedRefreshed).await,
                    Ok(false) => {}
                    Err(err) => poll_failed(&sender, FeedKey::Summaries, err).await,
                }
            }
        });
    }

    {
        let feed = feed.clone();
        let api = api.clone();
        let sender = sender.clone();
        tokio::spawn(async move {
            let mut ticker = interval(intervals.detail_ms);
            loop {
                ticker.tick().await;
                let watched = feed.lock().await.watched_prompts();
                for prompt_id in watched {
                    match refresh_detail(&feed, &api, prompt_id).await {
                        Ok(true) => {
                            notify(&sender, ClientEvent::DetailRefreshed(prompt_id)).await
                        }
                        Ok(false) => {}
                        Err(err) => poll_failed(&sender, FeedKey::Detail(prompt_id), err).await,
                    }
                }
            }
        });
    }

    {
        let feed = feed.clone();
        let api = api.clone();
        let sender = sender.clone();
        tokio::spawn(async move {
            let mut ticker = interval(intervals.leaderboard_ms);
            loop {
                ticker.tick().await;
                match refresh_leaderboard(&feed, &api).await {
                    Ok(true) => notify(&sender, ClientEvent::LeaderboardRefreshed).await,
                    Ok(false) => {}
                    Err(err) => poll_failed(&sender, FeedKey::Leaderboard, err).await,
                }
            }
        });
    }

    tokio::spawn(async move {
        let mut ticker = interval(intervals.chat_ms);
        loop {
            ticker.tick().await;
            match refresh_chat(&feed, &api, &chat_room).await {
                Ok(true) => notify(&sender, ClientEvent::ChatRefreshed).await,
                Ok(false) => {}
                Err(err) => poll_failed(&sender, FeedKey::Chat, err).await,
            }
        }
    });
}

fn interval(ms: u64) -> tokio::time::Interval {
    let mut ticker = tokio::time::interval(Duration::from_millis(ms));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    ticker
}

async fn notify(sender: &mpsc::Sender<ClientEvent>, event: ClientEvent) {
    let _ = sender.send(event).await;
}

async fn poll_failed(sender: &mpsc::Sender<ClientEvent>, key: FeedKey, err: ApiClientError) {
    tracing::warn!(?key, error = %err, "poll tick failed, keeping cached state");
    let _ = sender
        .send(ClientEvent::PollFailed {
            key,
            message: err.to_string(),
        })
        .await;
}
