//! Dispute evaluator.
//!
//! Scores attempts to seize regions held by other participants. The
//! cost and the success probability come from a [`DisputeOracle`]
//! collaborator (faction and rule modifiers live there); this module
//! only turns them into a risk ratio and a score and applies the tier's
//! gate.

use terra_types::{
    ActionCost, Opportunity, OpportunityDetail, OpportunityKind, Participant, Region,
    WorldSnapshot, rank,
};
use tracing::debug;

use crate::difficulty::DifficultyTier;
use crate::error::AgentError;
use crate::numeric::units;
use crate::personality::KindWeights;
use crate::rules::GameRules;
use crate::validate::revalidate;

/// Supplies the modified cost and success chance of a dispute.
pub trait DisputeOracle: Send + Sync {
    /// Final cost `attacker` pays to contest `region`.
    fn dispute_cost(&self, attacker: &Participant, region: &Region) -> ActionCost;

    /// Probability in `[0, 1]` that `attacker` wins `region` from `defender`.
    fn success_chance(&self, attacker: &Participant, defender: &Participant, region: &Region)
    -> f64;
}

/// Risk of paying `cost` as a percentage of everything `participant` holds.
///
/// Infinite when the participant holds nothing.
pub fn risk_ratio(cost: &ActionCost, participant: &Participant) -> f64 {
    let total = participant.total_resources();
    if total == 0 {
        return f64::INFINITY;
    }
    units(cost.magnitude()) / units(total) * 100.0
}

/// Generates and gates dispute candidates for one agent.
#[derive(Debug, Clone, Copy)]
pub struct DisputeEvaluator<'a> {
    rules: &'a GameRules,
    weights: KindWeights,
    tier: &'a DifficultyTier,
}

impl<'a> DisputeEvaluator<'a> {
    /// Create an evaluator.
    pub const fn new(rules: &'a GameRules, weights: KindWeights, tier: &'a DifficultyTier) -> Self {
        Self {
            rules,
            weights,
            tier,
        }
    }

    /// Every affordable dispute `participant` could start, best first.
    pub fn find_dispute_opportunities(
        &self,
        participant: &Participant,
        world: &WorldSnapshot,
        oracle: &dyn DisputeOracle,
    ) -> Vec<Opportunity> {
        if participant.eliminated {
            return Vec::new();
        }
        let w = self.weights.get(OpportunityKind::Dispute);
        let value_weight = self.rules.scoring.region_value_weight;

        let mut out: Vec<Opportunity> = world
            .regions
            .values()
            .filter_map(|region| {
                let defender_id = region.controller.filter(|c| *c != participant.id)?;
                let defender = world.participant(defender_id).filter(|d| !d.eliminated)?;
                let cost = oracle.dispute_cost(participant, region);
                if !cost.affordable_by(participant) {
                    return None;
                }
                let chance = sanitize(oracle.success_chance(participant, defender, region));
                let value = units(region.resource_value());
                let priority = chance.mul_add(100.0, value * value_weight) * w;
                let risk = risk_ratio(&cost, participant);
                Some(Opportunity {
                    kind: OpportunityKind::Dispute,
                    target: region.id,
                    priority,
                    risk,
                    rationale: format!(
                        "dispute region {} held by {} ({:.0}% chance, {:.1}% risk)",
                        region.id,
                        defender.name,
                        chance * 100.0,
                        risk
                    ),
                    cost,
                    detail: OpportunityDetail {
                        defender: Some(defender_id),
                        success_chance: Some(chance),
                        ..OpportunityDetail::default()
                    },
                })
            })
            .collect();
        rank(&mut out);
        out
    }

    /// Whether the tier would act on `candidate`.
    pub fn should_dispute(&self, candidate: &Opportunity) -> bool {
        candidate.kind == OpportunityKind::Dispute
            && candidate.priority >= self.tier.dispute_score_threshold
            && candidate.risk < self.tier.risk_threshold
    }

    /// The best ranked candidate, if it clears the gate.
    pub fn decide<'o>(&self, ranked: &'o [Opportunity]) -> Option<&'o Opportunity> {
        let best = ranked.first()?;
        let go = self.should_dispute(best);
        debug!(
            target = %best.target,
            score = best.priority,
            risk = best.risk,
            go,
            "dispute gate"
        );
        go.then_some(best)
    }

    /// Recheck a chosen dispute against fresh state, including the gate,
    /// since the risk ratio moves with the participant's holdings.
    pub fn revalidate(
        &self,
        candidate: &Opportunity,
        participant: &Participant,
        world: &WorldSnapshot,
    ) -> Result<(), AgentError> {
        revalidate(candidate, participant, world)?;
        let risk = risk_ratio(&candidate.cost, participant);
        if risk >= self.tier.risk_threshold {
            return Err(AgentError::InvalidOpportunity {
                target: candidate.target,
                reason: format!("risk {risk:.1}% over ceiling"),
            });
        }
        Ok(())
    }
}

fn sanitize(chance: f64) -> f64 {
    if chance.is_nan() {
        0.0
    } else {
        chance.clamp(0.0, 1.0)
    }
}
