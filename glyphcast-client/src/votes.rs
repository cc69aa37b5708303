//! Optimistic vote state, reconciled against server-authoritative counts.
//!
//! The reconciler is an explicit state machine: `begin_cast` applies the
//! optimistic transition and yields the mutation to send, `complete_cast`
//! adopts the server's authoritative net count, `fail_cast` releases the
//! per-proposal latch without rolling the optimistic state back (the next
//! successful reconcile corrects any drift). The async [`VoteReconciler::cast`]
//! drives the three through the request gateway.

use crate::api_client::{ApiClient, ApiClientError};
use glyphcast_core::{EntityId, Proposal, VoteDirection};
use std::collections::HashMap;

#[derive(Debug, thiserror::Error)]
pub enum VoteError {
    #[error("unknown proposal {0}")]
    UnknownProposal(EntityId),
    #[error("a vote for proposal {0} is already in flight")]
    CastInFlight(EntityId),
    #[error("cast direction must be up or down")]
    InvalidDirection,
    #[error(transparent)]
    Api(#[from] ApiClientError),
}

/// Per-proposal vote state.
#[derive(Debug, Clone, Copy)]
pub struct VoteState {
    /// Last authoritative net count received from the server.
    server_votes: i64,
    /// Count presentation should display right now.
    displayed: i64,
    direction: VoteDirection,
    in_flight: bool,
}

impl VoteState {
    fn seeded(votes: i64) -> Self {
        Self {
            server_votes: votes,
            displayed: votes,
            direction: VoteDirection::None,
            in_flight: false,
        }
    }

    pub fn displayed(&self) -> i64 {
        self.displayed
    }

    pub fn direction(&self) -> VoteDirection {
        self.direction
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }
}

/// Mutation computed by [`VoteReconciler::begin_cast`], ready to submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingVote {
    pub proposal_id: EntityId,
    /// Signed value to send: the requested delta, or the inverse of the
    /// previous delta when toggling off.
    pub value: i64,
    /// Local direction after the optimistic transition.
    pub direction: VoteDirection,
}

#[derive(Debug, Default)]
pub struct VoteReconciler {
    states: HashMap<EntityId, VoteState>,
}

impl VoteReconciler {
    pub fn new() -> Self {
        Self {
            states: HashMap::new(),
        }
    }

    /// Seed or refresh a proposal's baseline from a fetched snapshot.
    ///
    /// A freshly polled count is authoritative and replaces both baseline
    /// and displayed value, unless a mutation is in flight for the proposal
    /// (the mutation's response will supersede the poll anyway).
    pub fn sync_proposal(&mut self, proposal: &Proposal) {
        match self.states.get_mut(&proposal.id) {
            Some(state) => {
                if !state.in_flight {
                    state.server_votes = proposal.votes;
                    state.displayed = proposal.votes;
                }
            }
            None => {
                self.states
                    .insert(proposal.id, VoteState::seeded(proposal.votes));
            }
        }
    }

    pub fn state(&self, proposal_id: EntityId) -> Option<&VoteState> {
        self.states.get(&proposal_id)
    }

    /// Count presentation should display for a proposal, if it is known.
    pub fn displayed_votes(&self, proposal_id: EntityId) -> Option<i64> {
        self.states.get(&proposal_id).map(|s| s.displayed)
    }

    pub fn direction(&self, proposal_id: EntityId) -> Option<VoteDirection> {
        self.states.get(&proposal_id).map(|s| s.direction)
    }

    /// Apply the optimistic transition for a cast and return the mutation to
    /// submit. Rejects a second cast while one is pending for the same
    /// proposal: mutations are serialized per proposal.
    pub fn begin_cast(
        &mut self,
        proposal_id: EntityId,
        requested: VoteDirection,
    ) -> Result<PendingVote, VoteError> {
        if requested == VoteDirection::None {
            return Err(VoteError::InvalidDirection);
        }
        let state = self
            .states
            .get_mut(&proposal_id)
            .ok_or(VoteError::UnknownProposal(proposal_id))?;
        if state.in_flight {
            return Err(VoteError::CastInFlight(proposal_id));
        }

        let (value, direction) = if requested == state.direction {
            // Toggle off: submit the inverse of the original delta.
            (-requested.delta(), VoteDirection::None)
        } else {
            (requested.delta(), requested)
        };

        state.direction = direction;
        state.displayed = state.server_votes + direction.delta();
        state.in_flight = true;

        Ok(PendingVote {
            proposal_id,
            value,
            direction,
        })
    }

    /// Adopt the server's authoritative net count. The local optimistic
    /// arithmetic is not trusted past this point.
    pub fn complete_cast(&mut self, proposal_id: EntityId, net_votes: i64) {
        if let Some(state) = self.states.get_mut(&proposal_id) {
            state.server_votes = net_votes;
            state.displayed = net_votes;
            state.in_flight = false;
        }
    }

    /// Release the in-flight latch after a failed submit. Optimistic state
    /// is left in place; the next successful reconcile corrects drift.
    pub fn fail_cast(&mut self, proposal_id: EntityId) {
        if let Some(state) = self.states.get_mut(&proposal_id) {
            state.in_flight = false;
        }
    }

    /// Cast a vote end to end: optimistic transition, network submit,
    /// reconcile. Failures are surfaced to the caller and never retried
    /// here. Returns the authoritative net count.
    pub async fn cast(
        &mut self,
        api: &ApiClient,
        user_fingerprint: &str,
        proposal_id: EntityId,
        requested: VoteDirection,
    ) -> Result<i64, VoteError> {
        let pending = self.begin_cast(proposal_id, requested)?;
        match api
            .vote(proposal_id, pending.value, user_fingerprint)
            .await
        {
            Ok(response) => {
                self.complete_cast(proposal_id, response.net_votes);
                Ok(response.net_votes)
            }
            Err(err) => {
                self.fail_cast(proposal_id);
                Err(VoteError::Api(err))
            }
        }
    }

    /// Drop all per-proposal state. Test isolation hook.
    pub fn reset(&mut self) {
        self.states.clear();
    }
}
