//! Debounced, cancelable search over prompts, agents and proposals.
//!
//! Every keystroke bumps the session generation. A scheduled query only
//! issues its network call if it is still the latest generation once the
//! debounce window elapses, and a response is only applied if nothing newer
//! superseded it while it was in flight. Blank input clears results
//! immediately and schedules nothing.

use crate::api_client::{ApiClient, ApiClientError};
use glyphcast_core::{EntityKind, SearchResult};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::sync::Mutex;

/// Results grouped by entity kind, server relevance order preserved within
/// each group. Groups with no hits are absent.
pub type GroupedResults = BTreeMap<EntityKind, Vec<SearchResult>>;

/// A query that survived input validation and is waiting out the debounce
/// window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledQuery {
    pub generation: u64,
    pub query: String,
}

#[derive(Debug)]
pub struct SearchSession {
    query: String,
    generation: u64,
    debounce: Duration,
    limit: u32,
    results: Option<GroupedResults>,
}

impl SearchSession {
    pub fn new(debounce_ms: u64, limit: u32) -> Self {
        Self {
            query: String::new(),
            generation: 0,
            debounce: Duration::from_millis(debounce_ms),
            limit,
            results: None,
        }
    }

    /// Record an input change. The pending query text updates immediately;
    /// the returned [`ScheduledQuery`], if any, should be driven through
    /// [`run_scheduled`]. Returning `None` means nothing will be issued:
    /// blank input cancels any pending query and clears results right away.
    pub fn on_query_change(&mut self, text: &str) -> Option<ScheduledQuery> {
        self.query = text.to_string();
        // Bumping the generation cancels any pending or in-flight query.
        self.generation += 1;
        let trimmed = text.trim();
        if trimmed.is_empty() {
            self.results = None;
            return None;
        }
        Some(ScheduledQuery {
            generation: self.generation,
            query: trimmed.to_string(),
        })
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Whether a scheduled query is still the latest one.
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// Apply a response. A superseded response (anything but the current
    /// generation) is discarded rather than applied.
    pub fn apply_results(&mut self, generation: u64, results: Vec<SearchResult>) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        self.results = Some(group_results(results));
        true
    }

    pub fn results(&self) -> Option<&GroupedResults> {
        self.results.as_ref()
    }

    pub fn clear(&mut self) {
        self.query.clear();
        self.generation += 1;
        self.results = None;
    }
}

/// Partition results by entity kind, preserving the server's relevance
/// ordering within each group. Empty groups are omitted.
pub fn group_results(results: Vec<SearchResult>) -> GroupedResults {
    let mut grouped = GroupedResults::new();
    for result in results {
        grouped
            .entry(result.entity_type)
            .or_insert_with(Vec::new)
            .push(result);
    }
    grouped
}

/// Drive a scheduled query: wait out the debounce window, re-check that the
/// query is still current, issue at most one search, and apply the response
/// unless it has been superseded meanwhile. Returns whether results were
/// applied.
pub async fn run_scheduled(
    session: &Mutex<SearchSession>,
    api: &ApiClient,
    scheduled: ScheduledQuery,
) -> Result<bool, ApiClientError> {
    let (debounce, limit) = {
        let guard = session.lock().await;
        (guard.debounce(), guard.limit())
    };
    tokio::time::sleep(debounce).await;
    if !session.lock().await.is_current(scheduled.generation) {
        return Ok(false);
    }
    let response = api.search(&scheduled.query, limit).await?;
    Ok(session
        .lock()
        .await
        .apply_results(scheduled.generation, response.results))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn hit(kind: EntityKind, title: &str) -> SearchResult {
        SearchResult {
            entity_type: kind,
            entity_id: Uuid::new_v4(),
            title: title.to_string(),
            snippet: None,
            prompt_id: None,
        }
    }

    #[test]
    fn burst_of_keystrokes_leaves_one_current_query() {
        let mut session = SearchSession::new(300, 15);
        let scheduled: Vec<_> = ["c", "co", "cod", "code"]
            .iter()
            .filter_map(|text| session.on_query_change(text))
            .collect();

        assert_eq!(scheduled.len(), 4);
        let current: Vec<_> = scheduled
            .iter()
            .filter(|s| session.is_current(s.generation))
            .collect();
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].query, "code");
    }

    #[test]
    fn blank_query_schedules_nothing_and_clears_results() {
        let mut session = SearchSession::new(300, 15);
        let scheduled = session.on_query_change("emoji").unwrap();
        session.apply_results(scheduled.generation, vec![hit(EntityKind::Prompt, "p")]);
        assert!(session.results().is_some());

        assert!(session.on_query_change("   ").is_none());
        assert!(session.results().is_none());

        // The previously scheduled query is no longer current either.
        assert!(!session.is_current(scheduled.generation));
    }

    #[test]
    fn superseded_response_does_not_overwrite_newer_results() {
        let mut session = SearchSession::new(300, 15);
        let old = session.on_query_change("first").unwrap();
        let new = session.on_query_change("second").unwrap();

        assert!(session.apply_results(new.generation, vec![hit(EntityKind::Agent, "fresh")]));
        assert!(!session.apply_results(old.generation, vec![hit(EntityKind::Agent, "stale")]));

        let results = session.results().unwrap();
        assert_eq!(results[&EntityKind::Agent][0].title, "fresh");
    }

    #[test]
    fn query_text_updates_immediately() {
        let mut session = SearchSession::new(300, 15);
        session.on_query_change("gl");
        assert_eq!(session.query(), "gl");
    }

    #[test]
    fn scheduled_query_is_trimmed() {
        let mut session = SearchSession::new(300, 15);
        let scheduled = session.on_query_change("  emoji  ").unwrap();
        assert_eq!(scheduled.query, "emoji");
    }

    #[test]
    fn grouping_preserves_order_and_omits_empty_groups() {
        let results = vec![
            hit(EntityKind::Proposal, "first proposal"),
            hit(EntityKind::Prompt, "first prompt"),
            hit(EntityKind::Proposal, "second proposal"),
        ];
        let grouped = group_results(results);

        assert_eq!(grouped.len(), 2);
        assert!(!grouped.contains_key(&EntityKind::Agent));
        let proposals = &grouped[&EntityKind::Proposal];
        assert_eq!(proposals[0].title, "first proposal");
        assert_eq!(proposals[1].title, "second proposal");
    }

    #[test]
    fn clear_resets_session() {
        let mut session = SearchSession::new(300, 15);
        let scheduled = session.on_query_change("emoji").unwrap();
        session.apply_results(scheduled.generation, vec![hit(EntityKind::Prompt, "p")]);

        session.clear();
        assert_eq!(session.query(), "");
        assert!(session.results().is_none());
        assert!(!session.is_current(scheduled.generation));
    }
}
