//! Opportunity scorer.
//!
//! Enumerates every legal claim, explore, collect, and build action for
//! a participant and scores it with the formulas below. Affordability is
//! checked while generating, so an unaffordable candidate is never
//! emitted. The pooled list comes back in ranking order; an empty list
//! means the participant should pass.
//!
//! - claim: `(Σ yields × affinity − distance × penalty) × w`
//! - explore: `(1 + missing levels × level bonus) × w`
//! - collect: `Σ yields × (1 + level × exploration bonus) × w`
//! - build: `(points × point weight + demand-weighted income × demand weight) × synergy × w`

use terra_types::{
    ActionCost, Archetype, MAX_EXPLORATION_LEVEL, Opportunity, OpportunityDetail,
    OpportunityKind, Participant, Region, Resource, ResourceBundle, StructureType,
    WorldSnapshot, rank,
};

use crate::numeric::units;
use crate::personality::{KindWeights, preferred_biomes, resource_targets};
use crate::rules::{GameRules, StructureSpec, synergy};

/// Scores non-dispute candidates for one archetype.
#[derive(Debug, Clone, Copy)]
pub struct OpportunityScorer<'a> {
    rules: &'a GameRules,
    archetype: Archetype,
    weights: KindWeights,
}

impl<'a> OpportunityScorer<'a> {
    /// Create a scorer using `weights` as the effective per-kind weights.
    pub const fn new(rules: &'a GameRules, archetype: Archetype, weights: KindWeights) -> Self {
        Self {
            rules,
            archetype,
            weights,
        }
    }

    /// Every legal non-dispute candidate for `participant`, best first.
    pub fn find_opportunities(
        &self,
        participant: &Participant,
        world: &WorldSnapshot,
    ) -> Vec<Opportunity> {
        if participant.eliminated {
            return Vec::new();
        }
        let mut out = self.claims(participant, world);
        out.extend(self.explores(participant, world));
        out.extend(self.collects(participant, world));
        out.extend(self.builds(participant, world));
        rank(&mut out);
        out
    }

    fn claims(&self, participant: &Participant, world: &WorldSnapshot) -> Vec<Opportunity> {
        let cost = ActionCost {
            resources: self.rules.claim_cost.clone(),
            victory_points: self.rules.claim_victory_points,
        };
        if !cost.affordable_by(participant) {
            return Vec::new();
        }
        let preferred = preferred_biomes(self.archetype);
        let factors = &self.rules.scoring;
        let w = self.weights.get(OpportunityKind::Claim);

        world
            .frontier(participant)
            .into_iter()
            .filter_map(|id| world.region(id))
            .filter(|region| region.controller.is_none())
            .map(|region| {
                let affinity = if preferred.contains(&region.biome) {
                    factors.biome_affinity
                } else {
                    1.0
                };
                let distance = world
                    .distance_to_territory(participant, region.id)
                    .unwrap_or(1);
                let priority = claim_priority(
                    units(region.resource_value()),
                    affinity,
                    distance,
                    factors.distance_penalty,
                    w,
                );
                candidate(
                    OpportunityKind::Claim,
                    region,
                    priority,
                    format!(
                        "claim {:?} region {} worth {}",
                        region.biome,
                        region.id,
                        region.resource_value()
                    ),
                    cost.clone(),
                    None,
                )
            })
            .collect()
    }

    fn explores(&self, participant: &Participant, world: &WorldSnapshot) -> Vec<Opportunity> {
        let cost = ActionCost::resources(self.rules.explore_cost.clone());
        if !cost.affordable_by(participant) {
            return Vec::new();
        }
        let bonus = self.rules.scoring.level_bonus_factor;
        let w = self.weights.get(OpportunityKind::Explore);

        world
            .owned_regions(participant)
            .filter(|region| region.exploration_level < MAX_EXPLORATION_LEVEL)
            .map(|region| {
                let missing = MAX_EXPLORATION_LEVEL.saturating_sub(region.exploration_level);
                let priority = f64::from(missing).mul_add(bonus, 1.0) * w;
                candidate(
                    OpportunityKind::Explore,
                    region,
                    priority,
                    format!(
                        "explore region {} from level {}",
                        region.id, region.exploration_level
                    ),
                    cost.clone(),
                    None,
                )
            })
            .collect()
    }

    fn collects(&self, participant: &Participant, world: &WorldSnapshot) -> Vec<Opportunity> {
        let cost = ActionCost::resources(self.rules.collect_cost.clone());
        if !cost.affordable_by(participant) {
            return Vec::new();
        }
        let bonus = self.rules.scoring.exploration_bonus;
        let w = self.weights.get(OpportunityKind::Collect);

        world
            .owned_regions(participant)
            .filter(|region| region.is_explored())
            .map(|region| {
                let level = f64::from(region.exploration_level);
                let priority = units(region.resource_value()) * level.mul_add(bonus, 1.0) * w;
                candidate(
                    OpportunityKind::Collect,
                    region,
                    priority,
                    format!(
                        "collect {} units from region {}",
                        region.resource_value(),
                        region.id
                    ),
                    cost.clone(),
                    None,
                )
            })
            .collect()
    }

    fn builds(&self, participant: &Participant, world: &WorldSnapshot) -> Vec<Opportunity> {
        let targets = resource_targets(self.archetype);
        let factors = &self.rules.scoring;
        let w = self.weights.get(OpportunityKind::Build);
        let mut out = Vec::new();

        for region in world.owned_regions(participant) {
            for structure in StructureType::ALL {
                if region.structures.contains(&structure) {
                    continue;
                }
                let Some(spec) = self.rules.structure(structure) else {
                    continue;
                };
                let cost = ActionCost::resources(spec.cost.clone());
                if !cost.affordable_by(participant) {
                    continue;
                }
                let income_value = demand_weighted_income(spec, &participant.resources, &targets);
                let base = f64::from(spec.victory_points)
                    .mul_add(factors.point_weight, income_value * factors.demand_weight);
                let priority = base * synergy(region.biome, structure) * w;
                out.push(candidate(
                    OpportunityKind::Build,
                    region,
                    priority,
                    format!("build {structure:?} on {:?} region {}", region.biome, region.id),
                    cost,
                    Some(structure),
                ));
            }
        }
        out
    }
}

/// Claim score for a region worth `value` at `distance` steps.
pub fn claim_priority(value: f64, affinity: f64, distance: u32, penalty: f64, weight: f64) -> f64 {
    f64::from(distance).mul_add(-penalty, value * affinity) * weight
}

/// How much the participant wants more of `resource`, in `[0.5, 2.0]`.
///
/// 1.0 at the target, rising toward 2.0 as holdings fall to zero and
/// falling toward 0.5 as holdings exceed the target.
pub fn demand(resource: Resource, holdings: &ResourceBundle, targets: &ResourceBundle) -> f64 {
    let target = f64::from(targets.get(resource).max(1));
    let held = f64::from(holdings.get(resource));
    (1.0 + (target - held) / target).clamp(0.5, 2.0)
}

fn demand_weighted_income(
    spec: &StructureSpec,
    holdings: &ResourceBundle,
    targets: &ResourceBundle,
) -> f64 {
    spec.income
        .iter()
        .map(|(resource, amount)| f64::from(amount) * demand(resource, holdings, targets))
        .sum()
}

fn candidate(
    kind: OpportunityKind,
    region: &Region,
    priority: f64,
    rationale: String,
    cost: ActionCost,
    structure: Option<StructureType>,
) -> Opportunity {
    Opportunity {
        kind,
        target: region.id,
        priority,
        risk: 0.0,
        rationale,
        cost,
        detail: OpportunityDetail {
            structure,
            ..OpportunityDetail::default()
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use terra_types::{Biome, Difficulty, GridSpec, Neighborhood, ParticipantId, RegionId};

    use super::*;
    use crate::difficulty::DifficultyTier;

    fn region(id: u32, biome: Biome, resources: ResourceBundle) -> Region {
        Region {
            id: RegionId(id),
            x: id % 3,
            y: id / 3,
            biome,
            exploration_level: 0,
            resources,
            controller: None,
            structures: BTreeSet::new(),
        }
    }

    /// 3x3 grid; participant 1 owns the centre (4). Region 1 (north of
    /// the centre) is a preferred-biome plot worth {madeira:2, agua:1}.
    fn world(holdings: ResourceBundle) -> WorldSnapshot {
        let mut regions: BTreeMap<RegionId, Region> = (0..9)
            .map(|i| (RegionId(i), region(i, Biome::Desert, ResourceBundle::new())))
            .collect();
        regions.insert(
            RegionId(1),
            region(
                1,
                Biome::Plains,
                ResourceBundle::from([(Resource::Wood, 2), (Resource::Water, 1)]),
            ),
        );
        if let Some(centre) = regions.get_mut(&RegionId(4)) {
            centre.controller = Some(ParticipantId(1));
            centre.exploration_level = 1;
            centre.biome = Biome::Forest;
            centre.resources = ResourceBundle::from([(Resource::Wood, 3)]);
        }
        let participant = Participant {
            id: ParticipantId(1),
            name: String::from("north"),
            resources: holdings,
            victory_points: 3,
            regions: BTreeSet::from([RegionId(4)]),
            eliminated: false,
        };
        WorldSnapshot {
            turn: 1,
            grid: GridSpec {
                width: 3,
                height: 3,
                neighborhood: Neighborhood::Four,
            },
            participants: BTreeMap::from([(participant.id, participant)]),
            regions,
        }
    }

    fn rich() -> ResourceBundle {
        ResourceBundle::from([
            (Resource::Wood, 10),
            (Resource::Stone, 10),
            (Resource::Gold, 5),
            (Resource::Water, 10),
        ])
    }

    fn expansionist(rules: &GameRules) -> OpportunityScorer<'_> {
        let tier = DifficultyTier::for_level(Difficulty::Normal);
        OpportunityScorer::new(
            rules,
            Archetype::Expansionist,
            KindWeights::for_agent(Archetype::Expansionist, tier),
        )
    }

    #[test]
    fn claim_scores_preferred_adjacent_region() {
        let rules = GameRules::default();
        let w = world(rich());
        let p = w.participant(ParticipantId(1)).unwrap();
        let list = expansionist(&rules).find_opportunities(p, &w);
        let claim = list
            .iter()
            .find(|o| o.kind == OpportunityKind::Claim && o.target == RegionId(1))
            .unwrap();
        assert!((claim.priority - 5.25).abs() < 1e-9);
        assert_eq!(claim.cost.victory_points, 1);
    }

    #[test]
    fn claims_only_touch_uncontrolled_neighbours() {
        let rules = GameRules::default();
        let w = world(rich());
        let p = w.participant(ParticipantId(1)).unwrap();
        let targets: BTreeSet<RegionId> = expansionist(&rules)
            .find_opportunities(p, &w)
            .into_iter()
            .filter(|o| o.kind == OpportunityKind::Claim)
            .map(|o| o.target)
            .collect();
        let expected: BTreeSet<RegionId> = [1, 3, 5, 7].into_iter().map(RegionId).collect();
        assert_eq!(targets, expected);
    }

    #[test]
    fn nothing_unaffordable_is_emitted() {
        let rules = GameRules::default();
        let w = world(ResourceBundle::from([(Resource::Water, 1)]));
        let p = w.participant(ParticipantId(1)).unwrap();
        let list = expansionist(&rules).find_opportunities(p, &w);
        assert!(list.iter().all(|o| o.cost.affordable_by(p)));
        assert!(list.iter().all(|o| o.kind == OpportunityKind::Collect));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn broke_participant_passes() {
        let rules = GameRules::default();
        let w = world(ResourceBundle::new());
        let p = w.participant(ParticipantId(1)).unwrap();
        assert!(expansionist(&rules).find_opportunities(p, &w).is_empty());
    }

    #[test]
    fn explore_and_collect_follow_level() {
        let rules = GameRules::default();
        let w = world(rich());
        let p = w.participant(ParticipantId(1)).unwrap();
        let list = expansionist(&rules).find_opportunities(p, &w);
        let explore = list
            .iter()
            .find(|o| o.kind == OpportunityKind::Explore)
            .unwrap();
        // (1 + 2 * 0.5) * 1.2
        assert!((explore.priority - 2.4).abs() < 1e-9);
        let collect = list
            .iter()
            .find(|o| o.kind == OpportunityKind::Collect)
            .unwrap();
        // 3 * (1 + 0.25) * 0.9
        assert!((collect.priority - 3.375).abs() < 1e-9);
    }

    #[test]
    fn build_skips_existing_structures() {
        let rules = GameRules::default();
        let mut w = world(rich());
        if let Some(centre) = w.regions.get_mut(&RegionId(4)) {
            centre.structures.insert(StructureType::Sawmill);
        }
        let p = w.participant(ParticipantId(1)).unwrap();
        let builds: Vec<StructureType> = expansionist(&rules)
            .find_opportunities(p, &w)
            .into_iter()
            .filter_map(|o| o.detail.structure)
            .collect();
        assert!(!builds.contains(&StructureType::Sawmill));
        assert!(builds.contains(&StructureType::Tower));
    }

    #[test]
    fn repeated_calls_are_identical() {
        let rules = GameRules::default();
        let w = world(rich());
        let p = w.participant(ParticipantId(1)).unwrap();
        let scorer = expansionist(&rules);
        let first = scorer.find_opportunities(p, &w);
        let second = scorer.find_opportunities(p, &w);
        assert_eq!(first, second);
        assert!(first.windows(2).all(|pair| match pair {
            [a, b] => a.rank_cmp(b).is_le(),
            _ => true,
        }));
    }

    #[test]
    fn demand_rises_below_target() {
        let targets = ResourceBundle::from([(Resource::Stone, 8)]);
        let low = ResourceBundle::from([(Resource::Stone, 0)]);
        let high = ResourceBundle::from([(Resource::Stone, 40)]);
        assert!((demand(Resource::Stone, &low, &targets) - 2.0).abs() < 1e-9);
        assert!((demand(Resource::Stone, &high, &targets) - 0.5).abs() < 1e-9);
    }
}
