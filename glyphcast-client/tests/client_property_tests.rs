use chrono::{Duration, TimeZone, Utc};
use glyphcast_client::config::{
    AuthConfig, ClientConfig, PollIntervals, SearchConfig,
};
use glyphcast_client::events::FeedKey;
use glyphcast_client::feed::FeedSynchronizer;
use glyphcast_client::ranking::rank;
use glyphcast_client::search::SearchSession;
use glyphcast_client::votes::VoteReconciler;
use glyphcast_core::{
    EntityKind, Prompt, PromptStatus, Proposal, SearchResult, SortMode, VoteDirection,
};
use proptest::prelude::*;
use std::collections::HashMap;
use uuid::Uuid;

fn base_config() -> ClientConfig {
    ClientConfig {
        api_base_url: "http://localhost:8000".to_string(),
        auth: AuthConfig { api_key: None },
        request_timeout_ms: 5_000,
        intervals: PollIntervals {
            summaries_ms: 15_000,
            detail_ms: 10_000,
            leaderboard_ms: 30_000,
            chat_ms: 8_000,
        },
        search: SearchConfig {
            debounce_ms: 300,
            limit: 15,
        },
        fingerprint_path: "tmp/glyphcast-identity.json".into(),
    }
}

fn fixed_now() -> chrono::DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).unwrap()
}

fn prompt_at(age_secs: i64, proposal_count: u32) -> Prompt {
    Prompt {
        id: Uuid::new_v4(),
        created_by: None,
        title: "t".to_string(),
        context_text: "c".to_string(),
        media_type: "text".to_string(),
        media_url: None,
        status: PromptStatus::Open,
        proposal_count,
        created_at: fixed_now() - Duration::seconds(age_secs),
    }
}

fn proposal_with_votes(votes: i64) -> Proposal {
    Proposal {
        id: Uuid::new_v4(),
        prompt_id: Uuid::new_v4(),
        agent_id: Uuid::new_v4(),
        agent_name: "agent".to_string(),
        emoji_string: "✨".to_string(),
        rationale: None,
        votes,
        created_at: fixed_now(),
    }
}

fn arb_direction() -> impl Strategy<Value = VoteDirection> {
    prop_oneof![Just(VoteDirection::Up), Just(VoteDirection::Down)]
}

fn arb_prompts() -> impl Strategy<Value = Vec<Prompt>> {
    prop::collection::vec((0i64..1_000_000, 0u32..200), 0..20).prop_map(|specs| {
        specs
            .into_iter()
            .map(|(age, count)| prompt_at(age, count))
            .collect()
    })
}

#[test]
fn config_rejects_zero_debounce() {
    let mut config = base_config();
    config.search.debounce_ms = 0;
    assert!(config.validate().is_err());
}

#[test]
fn config_accepts_base_values() {
    assert!(base_config().validate().is_ok());
}

proptest! {
    // ========================================================================
    // Property: Reconciled votes equal the server's returned value exactly
    // ========================================================================

    #[test]
    fn prop_reconcile_adopts_server_value(
        baseline in -1_000i64..1_000,
        net in -1_000i64..1_000,
        direction in arb_direction()
    ) {
        let mut reconciler = VoteReconciler::new();
        let proposal = proposal_with_votes(baseline);
        reconciler.sync_proposal(&proposal);

        reconciler.begin_cast(proposal.id, direction).unwrap();
        reconciler.complete_cast(proposal.id, net);

        // No drift: whatever the optimistic arithmetic said, the server
        // value wins.
        prop_assert_eq!(reconciler.displayed_votes(proposal.id), Some(net));
    }

    // ========================================================================
    // Property: Toggling the same direction twice is locally net zero
    // ========================================================================

    #[test]
    fn prop_double_toggle_is_net_zero(
        baseline in -1_000i64..1_000,
        direction in arb_direction()
    ) {
        let mut reconciler = VoteReconciler::new();
        let proposal = proposal_with_votes(baseline);
        reconciler.sync_proposal(&proposal);

        let first = reconciler.begin_cast(proposal.id, direction).unwrap();
        reconciler.fail_cast(proposal.id);
        let second = reconciler.begin_cast(proposal.id, direction).unwrap();

        prop_assert_eq!(first.value + second.value, 0);
        prop_assert_eq!(reconciler.displayed_votes(proposal.id), Some(baseline));
        prop_assert_eq!(reconciler.direction(proposal.id), Some(VoteDirection::None));
    }

    // ========================================================================
    // Property: Optimistic display is baseline plus the direction delta
    // ========================================================================

    #[test]
    fn prop_optimistic_display_matches_invariant(
        baseline in -1_000i64..1_000,
        direction in arb_direction()
    ) {
        let mut reconciler = VoteReconciler::new();
        let proposal = proposal_with_votes(baseline);
        reconciler.sync_proposal(&proposal);

        let pending = reconciler.begin_cast(proposal.id, direction).unwrap();
        prop_assert_eq!(
            reconciler.displayed_votes(proposal.id),
            Some(baseline + pending.direction.delta())
        );
    }

    // ========================================================================
    // Property: "new" ranking is a descending sort and is idempotent
    // ========================================================================

    #[test]
    fn prop_rank_new_descending_and_idempotent(prompts in arb_prompts()) {
        let now = fixed_now();
        let velocity = HashMap::new();
        let once = rank(&prompts, SortMode::New, now, &velocity);
        for pair in once.windows(2) {
            prop_assert!(pair[0].created_at >= pair[1].created_at);
        }
        let twice = rank(&once, SortMode::New, now, &velocity);
        prop_assert_eq!(once, twice);
    }

    // ========================================================================
    // Property: Ranking is deterministic regardless of input order
    // ========================================================================

    #[test]
    fn prop_rank_order_independent_of_input_order(
        prompts in arb_prompts(),
        mode in prop_oneof![Just(SortMode::New), Just(SortMode::Hot), Just(SortMode::Trending)]
    ) {
        let now = fixed_now();
        let velocity = HashMap::new();
        let forward = rank(&prompts, mode, now, &velocity);
        let mut reversed_input = prompts.clone();
        reversed_input.reverse();
        let backward = rank(&reversed_input, mode, now, &velocity);
        prop_assert_eq!(forward, backward);
    }

    // ========================================================================
    // Property: Hot ranking is idempotent under re-sort
    // ========================================================================

    #[test]
    fn prop_rank_hot_idempotent(prompts in arb_prompts()) {
        let now = fixed_now();
        let velocity = HashMap::new();
        let once = rank(&prompts, SortMode::Hot, now, &velocity);
        let twice = rank(&once, SortMode::Hot, now, &velocity);
        prop_assert_eq!(once, twice);
    }

    // ========================================================================
    // Property: A keystroke burst leaves exactly one current query
    // ========================================================================

    #[test]
    fn prop_burst_leaves_one_current_query(
        fragments in prop::collection::vec("[a-z]{1,8}", 1..10)
    ) {
        let mut session = SearchSession::new(300, 15);
        let scheduled: Vec<_> = fragments
            .iter()
            .filter_map(|text| session.on_query_change(text))
            .collect();

        let current = scheduled
            .iter()
            .filter(|s| session.is_current(s.generation))
            .count();
        prop_assert_eq!(current, 1);
    }

    // ========================================================================
    // Property: Clearing the query cancels everything scheduled before it
    // ========================================================================

    #[test]
    fn prop_cleared_query_schedules_nothing(
        fragments in prop::collection::vec("[a-z]{1,8}", 1..10)
    ) {
        let mut session = SearchSession::new(300, 15);
        let scheduled: Vec<_> = fragments
            .iter()
            .filter_map(|text| session.on_query_change(text))
            .collect();
        prop_assert!(session.on_query_change("   ").is_none());

        // Nothing issued earlier may fire or apply results now.
        for query in &scheduled {
            prop_assert!(!session.is_current(query.generation));
            prop_assert!(!session.apply_results(query.generation, Vec::new()));
        }
        prop_assert!(session.results().is_none());
    }

    // ========================================================================
    // Property: A superseded response never overwrites newer results
    // ========================================================================

    #[test]
    fn prop_stale_search_response_discarded(queries in prop::collection::vec("[a-z]{1,8}", 2..8)) {
        let mut session = SearchSession::new(300, 15);
        let scheduled: Vec<_> = queries
            .iter()
            .filter_map(|text| session.on_query_change(text))
            .collect();

        let newest = scheduled.last().unwrap();
        let fresh = vec![SearchResult {
            entity_type: EntityKind::Prompt,
            entity_id: Uuid::new_v4(),
            title: "fresh".to_string(),
            snippet: None,
            prompt_id: None,
        }];
        prop_assert!(session.apply_results(newest.generation, fresh));

        for stale in &scheduled[..scheduled.len() - 1] {
            prop_assert!(!session.apply_results(stale.generation, Vec::new()));
        }
        let results = session.results().unwrap();
        prop_assert_eq!(results[&EntityKind::Prompt][0].title.as_str(), "fresh");
    }

    // ========================================================================
    // Property: Only the latest-issued poll response is applied
    // ========================================================================

    #[test]
    fn prop_last_issued_poll_wins(completion_order in Just(vec![0usize, 1, 2, 3]).prop_shuffle()) {
        let mut feed = FeedSynchronizer::new(SortMode::New);
        let generations: Vec<u64> = (0..4).map(|_| feed.begin_fetch(FeedKey::Summaries)).collect();
        let newest = *generations.last().unwrap();

        let mut applied_newest = false;
        for index in completion_order {
            let generation = generations[index];
            let applied = feed.apply_summaries(generation, vec![prompt_at(generation as i64, 0)]);
            if generation == newest && applied {
                applied_newest = true;
            }
            // Once the newest response landed, nothing older may replace it.
            if applied_newest && generation != newest {
                prop_assert!(!applied);
            }
        }
        // The newest response always lands, whatever the completion order.
        prop_assert!(applied_newest);
        prop_assert_eq!(feed.prompts().len(), 1);
        prop_assert_eq!(feed.prompts()[0].created_at, fixed_now() - Duration::seconds(newest as i64));
    }

    // ========================================================================
    // Property: Interval config validation accepts positive cadences
    // ========================================================================

    #[test]
    fn prop_positive_intervals_validate(
        summaries in 1u64..120_000,
        detail in 1u64..120_000,
        leaderboard in 1u64..120_000,
        chat in 1u64..120_000
    ) {
        let mut config = base_config();
        config.intervals = PollIntervals {
            summaries_ms: summaries,
            detail_ms: detail,
            leaderboard_ms: leaderboard,
            chat_ms: chat,
        };
        prop_assert!(config.validate().is_ok());
    }
}
