//! Acceptance-time revalidation of candidates.
//!
//! A candidate is scored against one snapshot and executed against the
//! world as it is a moment later. [`revalidate`] re-runs the legality and
//! affordability checks against a fresh snapshot so a stale candidate is
//! dropped instead of executed.

use terra_types::{MAX_EXPLORATION_LEVEL, Opportunity, OpportunityKind, Participant, WorldSnapshot};

use crate::error::AgentError;

/// Check that `participant` can still pay for and legally take `opportunity`.
pub fn revalidate(
    opportunity: &Opportunity,
    participant: &Participant,
    world: &WorldSnapshot,
) -> Result<(), AgentError> {
    if participant.victory_points < opportunity.cost.victory_points {
        return Err(AgentError::UnaffordablePoints {
            needed: opportunity.cost.victory_points,
            available: participant.victory_points,
        });
    }
    if let Some((resource, needed, available)) =
        participant.resources.shortfall(&opportunity.cost.resources)
    {
        return Err(AgentError::UnaffordableResources {
            resource,
            needed,
            available,
        });
    }

    let region = world
        .region(opportunity.target)
        .ok_or(AgentError::UnknownRegion(opportunity.target))?;
    let owned = participant.owns(region.id);
    let invalid = |reason: &str| {
        Err(AgentError::InvalidOpportunity {
            target: region.id,
            reason: String::from(reason),
        })
    };

    match opportunity.kind {
        OpportunityKind::Claim if region.controller.is_some() => invalid("region already controlled"),
        OpportunityKind::Explore if !owned => invalid("region not owned"),
        OpportunityKind::Explore if region.exploration_level >= MAX_EXPLORATION_LEVEL => {
            invalid("region fully explored")
        }
        OpportunityKind::Collect if !owned => invalid("region not owned"),
        OpportunityKind::Collect if !region.is_explored() => invalid("region unexplored"),
        OpportunityKind::Build if !owned => invalid("region not owned"),
        OpportunityKind::Build => match opportunity.detail.structure {
            None => invalid("no structure named"),
            Some(s) if region.structures.contains(&s) => invalid("structure already present"),
            Some(_) => Ok(()),
        },
        OpportunityKind::Dispute => {
            let defender = region.controller.filter(|c| *c != participant.id);
            match defender.and_then(|d| world.participant(d)) {
                None => invalid("region no longer held by an opponent"),
                Some(d) if d.eliminated => invalid("defender eliminated"),
                Some(_) => Ok(()),
            }
        }
        _ => Ok(()),
    }
}
