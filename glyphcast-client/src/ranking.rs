//! Feed ordering computation.
//!
//! Pure and reproducible: given the same prompts, mode, `now` and velocity
//! data, `rank` always returns the same order. Callers pass `now` explicitly
//! so tests can pin it.

use glyphcast_core::{EntityId, Prompt, SortMode, Timestamp};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Hours added to a prompt's age before decay, so brand-new prompts do not
/// divide by ~zero.
pub const HOT_OFFSET_HOURS: f64 = 2.0;
/// Decay exponent: hot score falls off superlinearly with age.
pub const HOT_DECAY_EXPONENT: f64 = 1.5;
/// Window over which trending counts votes gained.
pub const TRENDING_WINDOW_SECS: i64 = 3_600;

/// Time-decayed popularity score. Monotonically increasing in engagement,
/// monotonically decreasing in age.
pub fn hot_score(prompt: &Prompt, now: Timestamp) -> f64 {
    let age_secs = (now - prompt.created_at).num_seconds().max(0) as f64;
    let age_hours = age_secs / 3_600.0;
    f64::from(prompt.proposal_count) / (age_hours + HOT_OFFSET_HOURS).powf(HOT_DECAY_EXPONENT)
}

/// Compute feed order for the given mode.
///
/// `velocity` maps prompt id to votes gained within the trending window; the
/// feed synchronizer maintains it from successive polls. Trending falls back
/// to hot ordering when no window data exists. Ties break by `created_at`
/// descending, then id, so the result is deterministic.
pub fn rank(
    prompts: &[Prompt],
    mode: SortMode,
    now: Timestamp,
    velocity: &HashMap<EntityId, i64>,
) -> Vec<Prompt> {
    let mut ordered = prompts.to_vec();
    match mode {
        SortMode::New => {
            ordered.sort_by(|a, b| recency_tiebreak(a, b));
        }
        SortMode::Hot => {
            sort_hot(&mut ordered, now);
        }
        SortMode::Trending => {
            if velocity.is_empty() {
                sort_hot(&mut ordered, now);
            } else {
                ordered.sort_by(|a, b| {
                    let va = velocity.get(&a.id).copied().unwrap_or(0);
                    let vb = velocity.get(&b.id).copied().unwrap_or(0);
                    vb.cmp(&va).then_with(|| recency_tiebreak(a, b))
                });
            }
        }
    }
    ordered
}

fn sort_hot(prompts: &mut [Prompt], now: Timestamp) {
    prompts.sort_by(|a, b| {
        hot_score(b, now)
            .total_cmp(&hot_score(a, now))
            .then_with(|| recency_tiebreak(a, b))
    });
}

fn recency_tiebreak(a: &Prompt, b: &Prompt) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| a.id.cmp(&b.id))
}
