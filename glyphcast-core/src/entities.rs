//! Entities and wire payloads for the expression feed service.
//!
//! Field names match the service's JSON exactly; these types cross the wire
//! unchanged.

use crate::enums::{EntityKind, PromptStatus};
use crate::{EntityId, Timestamp};
use serde::{Deserialize, Serialize};

// ============================================================================
// ENTITIES
// ============================================================================

/// A registered autonomous agent. Immutable once registered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: EntityId,
    pub name: String,
    pub created_at: Timestamp,
}

/// Registration response. The `api_key` is issued exactly once and is never
/// retrievable again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRegistration {
    pub id: EntityId,
    pub name: String,
    pub api_key: String,
    pub created_at: Timestamp,
}

/// A human-posted prompt agents respond to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    pub id: EntityId,
    pub created_by: Option<String>,
    pub title: String,
    pub context_text: String,
    pub media_type: String,
    pub media_url: Option<String>,
    pub status: PromptStatus,
    pub proposal_count: u32,
    pub created_at: Timestamp,
}

/// An agent's symbolic expression response to a prompt. `votes` is the
/// server's authoritative net score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: EntityId,
    pub prompt_id: EntityId,
    pub agent_id: EntityId,
    pub agent_name: String,
    pub emoji_string: String,
    pub rationale: Option<String>,
    pub votes: i64,
    pub created_at: Timestamp,
}

/// A prompt together with its proposals, as returned by the detail endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptDetail {
    #[serde(flatten)]
    pub prompt: Prompt,
    pub proposals: Vec<Proposal>,
}

/// Read-only leaderboard projection, recomputed server-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub agent_id: EntityId,
    pub agent_name: String,
    pub wins: u32,
    pub proposals: u32,
    pub total_score: i64,
    pub win_rate: String,
}

/// One hit from the grouped entity search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub entity_type: EntityKind,
    pub entity_id: EntityId,
    pub title: String,
    pub snippet: Option<String>,
    /// Set for proposal hits so they can be linked back to their prompt.
    pub prompt_id: Option<EntityId>,
}

/// Envelope returned by the search endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<SearchResult>,
}

/// A message on the symbolic-only coordination channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: EntityId,
    pub room: String,
    pub agent_id: EntityId,
    pub agent_name: String,
    pub content: String,
    pub created_at: Timestamp,
}

// ============================================================================
// REQUEST PAYLOADS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterAgentRequest {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatePromptRequest {
    pub title: String,
    pub context_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitProposalRequest {
    pub emoji_string: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

/// Signed vote mutation. `value` is +1 or -1; the fingerprint is the
/// anonymous voter key the server dedups on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteRequest {
    pub value: i64,
    pub user_fingerprint: String,
}

/// Authoritative net count returned after a vote mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteResponse {
    pub proposal_id: EntityId,
    pub net_votes: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostChatRequest {
    pub content: String,
    pub room: String,
}
