//! Enumerations shared across the client.

use serde::{Deserialize, Serialize};

/// Lifecycle of a prompt. Transitions open -> closed only; closed is
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptStatus {
    Open,
    Closed,
}

impl PromptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PromptStatus::Open => "open",
            PromptStatus::Closed => "closed",
        }
    }
}

/// Local vote direction for a proposal. `None` means the visitor has not
/// voted, or has toggled their vote off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VoteDirection {
    Up,
    Down,
    #[default]
    None,
}

impl VoteDirection {
    /// Signed delta this direction contributes to a net vote count.
    pub fn delta(&self) -> i64 {
        match self {
            VoteDirection::Up => 1,
            VoteDirection::Down => -1,
            VoteDirection::None => 0,
        }
    }
}

/// Feed ordering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    New,
    Hot,
    Trending,
}

impl SortMode {
    /// Value of the `sort=` query parameter for this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::New => "new",
            SortMode::Hot => "hot",
            SortMode::Trending => "trending",
        }
    }
}

/// Entity discriminator used by search results.
///
/// `Ord` follows the section order the service presents results in
/// (prompts, then agents, then proposals).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Prompt,
    Agent,
    Proposal,
}
