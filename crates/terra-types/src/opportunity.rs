//! Candidate actions produced by the scorer and dispute evaluator.
//!
//! An [`Opportunity`] is ephemeral: it is built from one snapshot, ranked,
//! and dropped once an action has been chosen. Ranking uses one fixed
//! total order so that identical inputs always yield identical lists:
//!
//! 1. `priority` descending
//! 2. `risk` ascending
//! 3. `target` region id ascending
//! 4. `kind` declaration order
//! 5. `detail.structure` declaration order (`None` first)

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::bundle::ResourceBundle;
use crate::enums::{OpportunityKind, StructureType};
use crate::ids::{ParticipantId, RegionId};
use crate::world::Participant;

/// What an action costs the acting participant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ActionCost {
    /// Resources paid.
    pub resources: ResourceBundle,
    /// Victory points paid.
    pub victory_points: u32,
}

impl ActionCost {
    /// A cost of resources only.
    pub const fn resources(resources: ResourceBundle) -> Self {
        Self {
            resources,
            victory_points: 0,
        }
    }

    /// Whether `participant` can currently pay this cost in full.
    pub fn affordable_by(&self, participant: &Participant) -> bool {
        participant.victory_points >= self.victory_points
            && participant.resources.covers(&self.resources)
    }

    /// Total cost magnitude: resource units plus victory points.
    pub fn magnitude(&self) -> u64 {
        self.resources
            .total()
            .saturating_add(u64::from(self.victory_points))
    }
}

/// Kind-specific parameters of an opportunity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct OpportunityDetail {
    /// Structure to build (`Build` only).
    pub structure: Option<StructureType>,
    /// Current controller of the target (`Dispute` only).
    pub defender: Option<ParticipantId>,
    /// Estimated probability of winning the dispute (`Dispute` only).
    pub success_chance: Option<f64>,
}

/// A scored, not-yet-executed candidate action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Opportunity {
    /// Action kind.
    pub kind: OpportunityKind,
    /// Region the action targets.
    pub target: RegionId,
    /// Score; higher is better.
    pub priority: f64,
    /// Risk ratio in percent of holdings (zero for non-dispute actions).
    pub risk: f64,
    /// Human-readable explanation for logs and the activity feed.
    pub rationale: String,
    /// Cost checked at generation time and revalidated before execution.
    pub cost: ActionCost,
    /// Kind-specific parameters.
    pub detail: OpportunityDetail,
}

impl Opportunity {
    /// Compare two opportunities under the fixed ranking order.
    ///
    /// `Ordering::Less` means `self` ranks ahead of `other`.
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| self.risk.total_cmp(&other.risk))
            .then_with(|| self.target.cmp(&other.target))
            .then_with(|| self.kind.cmp(&other.kind))
            .then_with(|| self.detail.structure.cmp(&other.detail.structure))
    }
}

/// Sort opportunities into ranking order, best first.
pub fn rank(opportunities: &mut [Opportunity]) {
    opportunities.sort_by(Opportunity::rank_cmp);
}
