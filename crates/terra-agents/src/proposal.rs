//! Proposal synthesizer.
//!
//! Builds one outbound trade for an agent: pick a counterpart, compare
//! holdings with the archetype's targets, and size an offer and a request
//! from a share of the relevant holdings. When the archetype rule finds
//! nothing, a one-for-one swap is tried instead. The offer is clamped to
//! the initiator's holdings before it leaves this module.

use std::cmp::Ordering;

use terra_types::{
    Archetype, Participant, Proposal, RegionId, Resource, ResourceBundle, TradeTerms,
    WorldSnapshot,
};
use tracing::debug;

use crate::agent::Agent;
use crate::config::NegotiationConfig;
use crate::error::AgentError;
use crate::numeric::share_of;
use crate::personality::{PersonalityProfile, profile, resource_targets};

/// Build one proposal from `agent` to the best counterpart, if any.
///
/// Returns `Ok(None)` when there is no eligible counterpart or no trade
/// either side could fund.
pub fn synthesize_proposal(
    agent: &Agent,
    world: &WorldSnapshot,
    config: &NegotiationConfig,
) -> Result<Option<Proposal>, AgentError> {
    let me = world
        .participant(agent.participant_id)
        .ok_or(AgentError::UnknownParticipant(agent.participant_id))?;
    if me.eliminated {
        return Ok(None);
    }
    let Some(counterpart) = select_counterpart(agent, me, world, config) else {
        debug!(agent = %me.id, "no eligible counterpart");
        return Ok(None);
    };

    let traits = profile(agent.archetype);
    let archetype_deal = match agent.archetype {
        Archetype::Expansionist => region_deal(me, counterpart, world, config)
            .or_else(|| resource_deal(agent.archetype, traits, me, counterpart, config)),
        _ => resource_deal(agent.archetype, traits, me, counterpart, config),
    };
    let Some((offer, request)) = archetype_deal.or_else(|| default_trade(me, counterpart)) else {
        debug!(agent = %me.id, counterpart = %counterpart.id, "no viable trade");
        return Ok(None);
    };

    let offer = clamp_terms(&offer, me);
    let request = clamp_terms(&request, counterpart);
    if offer.is_empty() || request.is_empty() {
        return Ok(None);
    }
    Ok(Some(Proposal::new(
        me.id,
        counterpart.id,
        offer,
        request,
        world.turn,
    )))
}

/// The participant `agent` would rather trade with.
///
/// Only active participants other than the agent holding at least the
/// minimum unit of the trade currency qualify. Remaining ties go to the
/// lowest id.
pub fn select_counterpart<'w>(
    agent: &Agent,
    me: &Participant,
    world: &'w WorldSnapshot,
    config: &NegotiationConfig,
) -> Option<&'w Participant> {
    let min_unit = config.min_trade_unit.max(1);
    world
        .active_participants()
        .filter(|p| p.id != me.id)
        .filter(|p| p.resources.get(config.trade_currency) >= min_unit)
        .min_by(|a, b| preference(agent, a, b).then_with(|| a.id.cmp(&b.id)))
}

fn preference(agent: &Agent, a: &Participant, b: &Participant) -> Ordering {
    match agent.archetype {
        Archetype::Expansionist => a.victory_points.cmp(&b.victory_points),
        Archetype::Economist => b.total_resources().cmp(&a.total_resources()),
        Archetype::Builder => construction_material(b).cmp(&construction_material(a)),
        Archetype::Diplomat => agent
            .relationships
            .score(b.id)
            .cmp(&agent.relationships.score(a.id)),
    }
}

fn construction_material(p: &Participant) -> u64 {
    p.resources
        .iter()
        .filter(|(r, _)| r.is_construction_material())
        .map(|(_, amount)| u64::from(amount))
        .sum()
}

/// Units by which `held` exceeds (positive) or falls short of (negative) `target`.
fn balance(held: u32, target: u32) -> i64 {
    i64::from(held).saturating_sub(i64::from(target))
}

fn resource_deal(
    archetype: Archetype,
    traits: &PersonalityProfile,
    me: &Participant,
    counterpart: &Participant,
    config: &NegotiationConfig,
) -> Option<(TradeTerms, TradeTerms)> {
    let targets = resource_targets(archetype);
    let my_balance = |r: Resource| balance(me.resources.get(r), targets.get(r));
    let their_surplus = |r: Resource| balance(counterpart.resources.get(r), config.neutral_target);

    let wanted = best_by(
        Resource::ALL
            .into_iter()
            .filter(|&r| my_balance(r) < 0 && their_surplus(r) > 0),
        |r| {
            let deficit = units_i64(my_balance(r).saturating_neg());
            match archetype {
                Archetype::Builder if r.is_construction_material() => deficit + 1_000.0,
                Archetype::Economist => deficit * config.unit_value(r),
                _ => deficit,
            }
        },
    )?;
    let spare = best_by(
        Resource::ALL
            .into_iter()
            .filter(|&r| r != wanted && my_balance(r) > 0),
        |r| {
            let surplus = units_i64(my_balance(r));
            match archetype {
                Archetype::Economist => surplus / config.unit_value(r).max(f64::EPSILON),
                _ => surplus,
            }
        },
    )?;

    let give = share_of(me.resources.get(spare), traits.offer_pct);
    let take = share_of(counterpart.resources.get(wanted), traits.request_pct);
    Some((
        TradeTerms::resources(ResourceBundle::from([(spare, give)])),
        TradeTerms::resources(ResourceBundle::from([(wanted, take)])),
    ))
}

fn region_deal(
    me: &Participant,
    counterpart: &Participant,
    world: &WorldSnapshot,
    config: &NegotiationConfig,
) -> Option<(TradeTerms, TradeTerms)> {
    if counterpart.regions.len() < 2 {
        return None;
    }
    let target: RegionId = world
        .frontier(me)
        .into_iter()
        .filter(|id| counterpart.owns(*id))
        .filter_map(|id| world.region(id))
        .min_by(|a, b| {
            a.resource_value()
                .cmp(&b.resource_value())
                .then_with(|| a.id.cmp(&b.id))
        })?
        .id;
    let (resource, held) = me.resources.largest()?;
    let give = share_of(held, config.region_offer_pct);
    let mut request = TradeTerms::default();
    request.regions.insert(target);
    Some((
        TradeTerms::resources(ResourceBundle::from([(resource, give)])),
        request,
    ))
}

/// One unit of the initiator's most-held resource for one unit of the
/// counterpart's most-held other resource.
fn default_trade(me: &Participant, counterpart: &Participant) -> Option<(TradeTerms, TradeTerms)> {
    let (give, _) = me.resources.largest()?;
    let (take, _) = counterpart
        .resources
        .iter()
        .filter(|(r, _)| *r != give)
        .fold(None, |best: Option<(Resource, u32)>, (r, amount)| match best {
            Some((_, top)) if top >= amount => best,
            _ => Some((r, amount)),
        })?;
    Some((
        TradeTerms::resources(ResourceBundle::from([(give, 1)])),
        TradeTerms::resources(ResourceBundle::from([(take, 1)])),
    ))
}

fn clamp_terms(terms: &TradeTerms, holder: &Participant) -> TradeTerms {
    TradeTerms {
        resources: terms.resources.clamped_to(&holder.resources),
        regions: terms
            .regions
            .iter()
            .copied()
            .filter(|id| holder.owns(*id))
            .collect(),
    }
}

fn best_by<I, F>(candidates: I, score: F) -> Option<Resource>
where
    I: Iterator<Item = Resource>,
    F: Fn(Resource) -> f64,
{
    candidates
        .fold(None, |best: Option<(Resource, f64)>, r| {
            let s = score(r);
            match best {
                Some((_, top)) if top >= s => best,
                _ => Some((r, s)),
            }
        })
        .map(|(r, _)| r)
}

fn units_i64(value: i64) -> f64 {
    i32::try_from(value).map_or(f64::from(i32::MAX), f64::from)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};
    use terra_types::{Biome, Difficulty, GridSpec, Neighborhood, ParticipantId, Region};

    use super::*;

    const P: ParticipantId = ParticipantId(1);
    const Q: ParticipantId = ParticipantId(2);

    fn bundle(wood: u32, stone: u32, gold: u32, water: u32) -> ResourceBundle {
        ResourceBundle::from([
            (Resource::Wood, wood),
            (Resource::Stone, stone),
            (Resource::Gold, gold),
            (Resource::Water, water),
        ])
    }

    fn participant(id: ParticipantId, resources: ResourceBundle, regions: &[u32]) -> Participant {
        Participant {
            id,
            name: format!("{id}"),
            resources,
            victory_points: id.0,
            regions: regions.iter().copied().map(RegionId).collect(),
            eliminated: false,
        }
    }

    fn world(participants: Vec<Participant>) -> WorldSnapshot {
        let mut regions = BTreeMap::new();
        for p in &participants {
            for id in &p.regions {
                regions.insert(
                    *id,
                    Region {
                        id: *id,
                        x: id.0 % 4,
                        y: id.0 / 4,
                        biome: Biome::Plains,
                        exploration_level: 0,
                        resources: ResourceBundle::from([(Resource::Wood, id.0)]),
                        controller: Some(p.id),
                        structures: BTreeSet::new(),
                    },
                );
            }
        }
        WorldSnapshot {
            turn: 5,
            grid: GridSpec {
                width: 4,
                height: 4,
                neighborhood: Neighborhood::Four,
            },
            participants: participants.into_iter().map(|p| (p.id, p)).collect(),
            regions,
        }
    }

    #[test]
    fn builder_offers_wood_for_stone() {
        let w = world(vec![
            participant(P, bundle(12, 3, 1, 4), &[0]),
            participant(Q, bundle(2, 9, 4, 3), &[3]),
        ]);
        let agent = Agent::new(P, Archetype::Builder, Difficulty::Normal);
        let proposal = synthesize_proposal(&agent, &w, &NegotiationConfig::default())
            .unwrap()
            .unwrap();
        assert_eq!(proposal.target, Q);
        assert_eq!(proposal.turn_created, 5);
        let wood = proposal.offer.resources.get(Resource::Wood);
        assert!((1..=2).contains(&wood));
        assert_eq!(proposal.offer.resources.iter().count(), 1);
        assert_eq!(
            proposal.request.resources,
            ResourceBundle::from([(Resource::Stone, 1)])
        );
    }

    #[test]
    fn counterparts_without_currency_are_skipped() {
        let w = world(vec![
            participant(P, bundle(12, 3, 1, 4), &[0]),
            participant(Q, bundle(2, 9, 0, 3), &[3]),
        ]);
        let agent = Agent::new(P, Archetype::Builder, Difficulty::Normal);
        assert!(
            synthesize_proposal(&agent, &w, &NegotiationConfig::default())
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn expansionist_prefers_weakest_opponent() {
        let r = ParticipantId(3);
        let w = world(vec![
            participant(P, bundle(5, 5, 5, 5), &[0]),
            participant(r, bundle(5, 5, 5, 5), &[8]),
            participant(Q, bundle(5, 5, 5, 5), &[12]),
        ]);
        let agent = Agent::new(P, Archetype::Expansionist, Difficulty::Normal);
        let me = w.participant(P).unwrap();
        let picked = select_counterpart(&agent, me, &w, &NegotiationConfig::default()).unwrap();
        assert_eq!(picked.id, Q);
    }

    #[test]
    fn economist_prefers_richest() {
        let r = ParticipantId(3);
        let w = world(vec![
            participant(P, bundle(5, 5, 5, 5), &[0]),
            participant(Q, bundle(1, 1, 1, 1), &[8]),
            participant(r, bundle(9, 9, 9, 9), &[12]),
        ]);
        let agent = Agent::new(P, Archetype::Economist, Difficulty::Normal);
        let me = w.participant(P).unwrap();
        let picked = select_counterpart(&agent, me, &w, &NegotiationConfig::default()).unwrap();
        assert_eq!(picked.id, r);
    }

    #[test]
    fn expansionist_asks_for_adjacent_region() {
        // P owns 0; Q owns 1 (adjacent) and 3.
        let w = world(vec![
            participant(P, bundle(10, 2, 2, 2), &[0]),
            participant(Q, bundle(1, 1, 1, 1), &[1, 3]),
        ]);
        let agent = Agent::new(P, Archetype::Expansionist, Difficulty::Normal);
        let proposal = synthesize_proposal(&agent, &w, &NegotiationConfig::default())
            .unwrap()
            .unwrap();
        assert_eq!(proposal.request.regions, BTreeSet::from([RegionId(1)]));
        assert_eq!(
            proposal.offer.resources,
            ResourceBundle::from([(Resource::Wood, 3)])
        );
    }

    #[test]
    fn falls_back_to_one_for_one_swap() {
        // Everyone at target: no deficit, no surplus.
        let w = world(vec![
            participant(P, bundle(5, 5, 4, 5), &[0]),
            participant(Q, bundle(1, 1, 1, 6), &[3]),
        ]);
        let agent = Agent::new(P, Archetype::Diplomat, Difficulty::Normal);
        let proposal = synthesize_proposal(&agent, &w, &NegotiationConfig::default())
            .unwrap()
            .unwrap();
        assert_eq!(
            proposal.offer.resources,
            ResourceBundle::from([(Resource::Wood, 1)])
        );
        assert_eq!(
            proposal.request.resources,
            ResourceBundle::from([(Resource::Water, 1)])
        );
    }

    #[test]
    fn empty_handed_initiator_gets_nothing() {
        let w = world(vec![
            participant(P, ResourceBundle::new(), &[0]),
            participant(Q, bundle(3, 3, 3, 3), &[3]),
        ]);
        let agent = Agent::new(P, Archetype::Diplomat, Difficulty::Normal);
        assert!(
            synthesize_proposal(&agent, &w, &NegotiationConfig::default())
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn offers_never_exceed_holdings() {
        let mut rng = SmallRng::seed_from_u64(42);
        let config = NegotiationConfig::default();
        for _ in 0..200 {
            let mut roll = || rng.random_range(0..15);
            let mine = bundle(roll(), roll(), roll(), roll());
            let theirs = bundle(roll(), roll(), roll().max(1), roll());
            let w = world(vec![
                participant(P, mine, &[0]),
                participant(Q, theirs, &[1, 5]),
            ]);
            for archetype in Archetype::ALL {
                let agent = Agent::new(P, archetype, Difficulty::Normal);
                let Some(p) = synthesize_proposal(&agent, &w, &config).unwrap() else {
                    continue;
                };
                let me = w.participant(P).unwrap();
                let them = w.participant(Q).unwrap();
                assert!(p.offer.deliverable_by(me));
                assert!(p.request.deliverable_by(them));
                assert!(!p.offer.is_empty());
            }
        }
    }
}
