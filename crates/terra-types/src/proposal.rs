//! Trade proposals and the history records agents keep about them.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::bundle::ResourceBundle;
use crate::enums::{ProposalStatus, TradeRole};
use crate::ids::{ParticipantId, ProposalId, RegionId};
use crate::world::Participant;

/// One side of a trade: resources plus regions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TradeTerms {
    /// Resources changing hands.
    pub resources: ResourceBundle,
    /// Regions changing hands.
    pub regions: BTreeSet<RegionId>,
}

impl TradeTerms {
    /// Terms consisting of resources only.
    pub const fn resources(resources: ResourceBundle) -> Self {
        Self {
            resources,
            regions: BTreeSet::new(),
        }
    }

    /// Whether the terms transfer nothing.
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty() && self.regions.is_empty()
    }

    /// Whether `giver` currently holds every resource and region named here.
    pub fn deliverable_by(&self, giver: &Participant) -> bool {
        giver.resources.covers(&self.resources)
            && self.regions.iter().all(|region| giver.owns(*region))
    }
}

/// A bilateral trade offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Proposal {
    /// Proposal identifier.
    pub id: ProposalId,
    /// Participant making the offer.
    pub initiator: ParticipantId,
    /// Participant asked to respond.
    pub target: ParticipantId,
    /// What the initiator gives.
    pub offer: TradeTerms,
    /// What the initiator asks for in return.
    pub request: TradeTerms,
    /// Lifecycle status.
    pub status: ProposalStatus,
    /// Turn on which the proposal was created.
    pub turn_created: u32,
}

impl Proposal {
    /// Create a pending proposal with a fresh id.
    pub fn new(
        initiator: ParticipantId,
        target: ParticipantId,
        offer: TradeTerms,
        request: TradeTerms,
        turn_created: u32,
    ) -> Self {
        Self {
            id: ProposalId::new(),
            initiator,
            target,
            offer,
            request,
            status: ProposalStatus::Pending,
            turn_created,
        }
    }

    /// The other party from `participant`'s point of view.
    pub fn counterpart_of(&self, participant: ParticipantId) -> ParticipantId {
        if participant == self.initiator {
            self.target
        } else {
            self.initiator
        }
    }
}

/// A resolved negotiation as remembered by one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TradeRecord {
    /// The proposal that was resolved.
    pub proposal_id: ProposalId,
    /// The other party.
    pub counterpart: ParticipantId,
    /// Which side this agent was on.
    pub role: TradeRole,
    /// Whether the trade went through.
    pub accepted: bool,
    /// Turn on which it was resolved.
    pub turn: u32,
}
