//! Negotiation evaluator.
//!
//! Decides whether an agent accepts a proposal addressed to it. Each
//! archetype values the two sides of a trade differently:
//!
//! - economist: weighted resource worth, accepting small losses
//! - expansionist: regions count several times their flat worth
//! - builder: wood and stone given up weigh more than wood and stone received
//! - diplomat: a probability rising with net worth and relationship, rolled
//!   against the injected RNG
//!
//! Whatever the archetype decides, a proposal is rejected if either side
//! cannot currently deliver its half.

use rand::Rng;
use serde::Serialize;
use terra_types::{Archetype, Proposal, TradeTerms, WorldSnapshot};
use tracing::debug;

use crate::agent::Agent;
use crate::config::NegotiationConfig;
use crate::error::AgentError;

/// Why a verdict came out the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VerdictReason {
    /// The valuation favoured the trade.
    Favourable,
    /// The valuation did not favour the trade.
    Unfavourable,
    /// The diplomat's roll came in under the acceptance probability.
    RollPassed,
    /// The diplomat's roll missed.
    RollFailed,
    /// The responder does not hold what is requested.
    ResponderCannotDeliver,
    /// The initiator does not hold what is offered.
    InitiatorCannotDeliver,
}

/// Outcome of evaluating one proposal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Verdict {
    /// Whether the agent accepts.
    pub accept: bool,
    /// Worth received minus worth given up, as the agent sees it.
    pub net_value: f64,
    /// What decided the outcome.
    pub reason: VerdictReason,
}

impl Verdict {
    const fn reject(net_value: f64, reason: VerdictReason) -> Self {
        Self {
            accept: false,
            net_value,
            reason,
        }
    }
}

/// Decide whether `agent` accepts `proposal`.
///
/// # Errors
///
/// Fails if the proposal is not addressed to the agent or either party is
/// missing from the snapshot.
pub fn evaluate_proposal<R: Rng>(
    agent: &Agent,
    proposal: &Proposal,
    world: &WorldSnapshot,
    config: &NegotiationConfig,
    rng: &mut R,
) -> Result<Verdict, AgentError> {
    if proposal.target != agent.participant_id {
        return Err(AgentError::NotAddressed {
            target: proposal.target,
            responder: agent.participant_id,
        });
    }
    let responder = world
        .participant(proposal.target)
        .ok_or(AgentError::UnknownParticipant(proposal.target))?;
    let initiator = world
        .participant(proposal.initiator)
        .ok_or(AgentError::UnknownParticipant(proposal.initiator))?;

    let (gain, cost) = valuation(agent.archetype, &proposal.offer, &proposal.request, config);
    let net_value = gain - cost;

    if !proposal.request.deliverable_by(responder) {
        return Ok(Verdict::reject(net_value, VerdictReason::ResponderCannotDeliver));
    }
    if !proposal.offer.deliverable_by(initiator) {
        return Ok(Verdict::reject(net_value, VerdictReason::InitiatorCannotDeliver));
    }

    let verdict = match agent.archetype {
        Archetype::Economist => {
            let ceiling = gain * (1.0 + config.loss_tolerance());
            settle(cost <= ceiling, net_value)
        }
        Archetype::Expansionist | Archetype::Builder => settle(net_value > 0.0, net_value),
        Archetype::Diplomat => {
            let relationship = agent.relationships.score_f64(proposal.initiator);
            let p = diplomat_probability(net_value, relationship, config);
            let roll: f64 = rng.random();
            let accept = roll < p;
            Verdict {
                accept,
                net_value,
                reason: if accept {
                    VerdictReason::RollPassed
                } else {
                    VerdictReason::RollFailed
                },
            }
        }
    };
    debug!(
        agent = %agent.participant_id,
        proposal = %proposal.id,
        archetype = ?agent.archetype,
        gain,
        cost,
        accept = verdict.accept,
        "proposal evaluated"
    );
    Ok(verdict)
}

/// Diplomat acceptance probability, clamped to `[0, cap]`.
pub fn diplomat_probability(net_value: f64, relationship: f64, config: &NegotiationConfig) -> f64 {
    let p = relationship.mul_add(
        config.diplomat_relationship_bonus,
        net_value.mul_add(config.diplomat_value_bonus, config.diplomat_base),
    );
    if p.is_nan() {
        return 0.0;
    }
    p.clamp(0.0, config.diplomat_cap.max(0.0))
}

/// Worth of `offer` (gained) and `request` (given up) as `archetype` sees it.
pub fn valuation(
    archetype: Archetype,
    offer: &TradeTerms,
    request: &TradeTerms,
    config: &NegotiationConfig,
) -> (f64, f64) {
    match archetype {
        Archetype::Expansionist => {
            let region = config.region_value * config.expansionist_region_factor;
            (config.terms_value(offer, region), config.terms_value(request, region))
        }
        Archetype::Builder => (
            config.terms_value(offer, config.region_value),
            builder_cost(request, config),
        ),
        Archetype::Economist | Archetype::Diplomat => (
            config.terms_value(offer, config.region_value),
            config.terms_value(request, config.region_value),
        ),
    }
}

fn builder_cost(request: &TradeTerms, config: &NegotiationConfig) -> f64 {
    let premium: f64 = request
        .resources
        .iter()
        .filter(|(resource, _)| resource.is_construction_material())
        .map(|(resource, amount)| {
            f64::from(amount) * config.unit_value(resource) * (config.builder_cost_premium - 1.0)
        })
        .sum();
    config.terms_value(request, config.region_value) + premium
}

const fn settle(accept: bool, net_value: f64) -> Verdict {
    Verdict {
        accept,
        net_value,
        reason: if accept {
            VerdictReason::Favourable
        } else {
            VerdictReason::Unfavourable
        },
    }
}
