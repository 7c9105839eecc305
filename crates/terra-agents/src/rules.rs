//! Game rule tables consumed by the scorer.
//!
//! Costs, the structure catalog, and the scoring factors are data. They
//! deserialize from the `rules` section of `terra-config.yaml`, and every
//! field has a default so a partial file still yields a playable game.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use terra_types::{Biome, Resource, ResourceBundle, StructureType};

/// Cost, value, and yield of one structure type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureSpec {
    /// Resources paid to build it.
    pub cost: ResourceBundle,
    /// Victory points awarded on completion.
    pub victory_points: u32,
    /// Resources it adds to the owner's income each turn.
    #[serde(default)]
    pub income: ResourceBundle,
}

/// Scoring coefficients for the opportunity formulas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringFactors {
    /// Multiplier on region value for biomes the archetype prefers.
    #[serde(default = "default_biome_affinity")]
    pub biome_affinity: f64,
    /// Deducted per grid step between a claim and the owner's territory.
    #[serde(default = "default_distance_penalty")]
    pub distance_penalty: f64,
    /// Explore bonus per missing exploration level.
    #[serde(default = "default_level_bonus")]
    pub level_bonus_factor: f64,
    /// Collect bonus per exploration level.
    #[serde(default = "default_exploration_bonus")]
    pub exploration_bonus: f64,
    /// Weight of a structure's victory points.
    #[serde(default = "default_unit_weight")]
    pub point_weight: f64,
    /// Weight of a structure's demand-adjusted income.
    #[serde(default = "default_unit_weight")]
    pub demand_weight: f64,
    /// Weight of a disputed region's resource value.
    #[serde(default = "default_region_value_weight")]
    pub region_value_weight: f64,
}

const fn default_biome_affinity() -> f64 {
    1.2
}

const fn default_distance_penalty() -> f64 {
    0.1
}

const fn default_level_bonus() -> f64 {
    0.5
}

const fn default_exploration_bonus() -> f64 {
    0.25
}

const fn default_unit_weight() -> f64 {
    1.0
}

const fn default_region_value_weight() -> f64 {
    2.0
}

impl Default for ScoringFactors {
    fn default() -> Self {
        Self {
            biome_affinity: default_biome_affinity(),
            distance_penalty: default_distance_penalty(),
            level_bonus_factor: default_level_bonus(),
            exploration_bonus: default_exploration_bonus(),
            point_weight: default_unit_weight(),
            demand_weight: default_unit_weight(),
            region_value_weight: default_region_value_weight(),
        }
    }
}

/// Costs and catalogs for every action kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRules {
    /// Resources paid to claim a region.
    #[serde(default = "default_claim_cost")]
    pub claim_cost: ResourceBundle,
    /// Victory points paid to claim a region.
    #[serde(default = "default_claim_points")]
    pub claim_victory_points: u32,
    /// Resources paid to raise a region's exploration level.
    #[serde(default = "default_explore_cost")]
    pub explore_cost: ResourceBundle,
    /// Resources paid to harvest a region.
    #[serde(default = "default_collect_cost")]
    pub collect_cost: ResourceBundle,
    /// Buildable structures.
    #[serde(default = "default_structures")]
    pub structures: BTreeMap<StructureType, StructureSpec>,
    /// Scoring coefficients.
    #[serde(default)]
    pub scoring: ScoringFactors,
}

fn default_claim_cost() -> ResourceBundle {
    ResourceBundle::from([(Resource::Wood, 2), (Resource::Water, 1)])
}

const fn default_claim_points() -> u32 {
    1
}

fn default_explore_cost() -> ResourceBundle {
    ResourceBundle::from([(Resource::Wood, 1), (Resource::Water, 1)])
}

fn default_collect_cost() -> ResourceBundle {
    ResourceBundle::from([(Resource::Water, 1)])
}

fn default_structures() -> BTreeMap<StructureType, StructureSpec> {
    let spec = |cost: ResourceBundle, victory_points, income: ResourceBundle| StructureSpec {
        cost,
        victory_points,
        income,
    };
    BTreeMap::from([
        (
            StructureType::Farm,
            spec(
                ResourceBundle::from([(Resource::Wood, 2), (Resource::Water, 1)]),
                1,
                ResourceBundle::from([(Resource::Water, 2)]),
            ),
        ),
        (
            StructureType::Sawmill,
            spec(
                ResourceBundle::from([(Resource::Wood, 1), (Resource::Stone, 2)]),
                1,
                ResourceBundle::from([(Resource::Wood, 2)]),
            ),
        ),
        (
            StructureType::Quarry,
            spec(
                ResourceBundle::from([(Resource::Wood, 2), (Resource::Stone, 1)]),
                1,
                ResourceBundle::from([(Resource::Stone, 2)]),
            ),
        ),
        (
            StructureType::Mine,
            spec(
                ResourceBundle::from([
                    (Resource::Wood, 2),
                    (Resource::Stone, 2),
                    (Resource::Gold, 1),
                ]),
                2,
                ResourceBundle::from([(Resource::Gold, 1)]),
            ),
        ),
        (
            StructureType::Tower,
            spec(
                ResourceBundle::from([(Resource::Stone, 3), (Resource::Gold, 2)]),
                4,
                ResourceBundle::new(),
            ),
        ),
    ])
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            claim_cost: default_claim_cost(),
            claim_victory_points: default_claim_points(),
            explore_cost: default_explore_cost(),
            collect_cost: default_collect_cost(),
            structures: default_structures(),
            scoring: ScoringFactors::default(),
        }
    }
}

impl GameRules {
    /// Catalog entry for `structure`, if it is buildable under these rules.
    pub fn structure(&self, structure: StructureType) -> Option<&StructureSpec> {
        self.structures.get(&structure)
    }
}

/// How well a structure suits a biome. Neutral pairs return 1.0.
pub const fn synergy(biome: Biome, structure: StructureType) -> f64 {
    match (biome, structure) {
        (Biome::Plains | Biome::Swamp, StructureType::Farm)
        | (Biome::Forest, StructureType::Sawmill)
        | (Biome::Mountain, StructureType::Quarry) => 1.5,
        (Biome::Mountain, StructureType::Mine) => 1.4,
        (Biome::Lake, StructureType::Farm) => 1.3,
        (Biome::Mountain | Biome::Plains, StructureType::Tower) => 1.2,
        (Biome::Desert, StructureType::Mine) => 1.1,
        (Biome::Lake | Biome::Swamp, StructureType::Quarry | StructureType::Mine) => 0.6,
        (Biome::Desert, StructureType::Farm) => 0.5,
        _ => 1.0,
    }
}
