//! Enumeration types for the Terra agent engine.
//!
//! Every dispatch point in the engine (resources, biomes, structures,
//! candidate action kinds, archetypes) is a closed enum so that match
//! arms are checked for exhaustiveness at compile time.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

/// A resource a participant can hold, spend, and trade.
///
/// Serialized under the names the game data files use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Resource {
    /// Lumber. A construction material.
    #[serde(rename = "madeira")]
    Wood,
    /// Quarried stone. A construction material.
    #[serde(rename = "pedra")]
    Stone,
    /// Gold. The scarcest resource and the currency of negotiation.
    #[serde(rename = "ouro")]
    Gold,
    /// Fresh water.
    #[serde(rename = "agua")]
    Water,
}

impl Resource {
    /// Every resource, in declaration order.
    pub const ALL: [Self; 4] = [Self::Wood, Self::Stone, Self::Gold, Self::Water];

    /// Whether the resource is one of the two hard construction materials.
    pub const fn is_construction_material(self) -> bool {
        matches!(self, Self::Wood | Self::Stone)
    }
}

// ---------------------------------------------------------------------------
// Terrain
// ---------------------------------------------------------------------------

/// The terrain type of a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Biome {
    /// Dense woodland, rich in lumber.
    Forest,
    /// Rocky highland, rich in stone and gold.
    Mountain,
    /// Open grassland.
    Plains,
    /// Arid land with sparse yields.
    Desert,
    /// Wetland, rich in water.
    Swamp,
    /// Freshwater lake shore.
    Lake,
}

impl Biome {
    /// Every biome, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Forest,
        Self::Mountain,
        Self::Plains,
        Self::Desert,
        Self::Swamp,
        Self::Lake,
    ];
}

/// Adjacency rule of the territory grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Neighborhood {
    /// Orthogonal neighbours only (von Neumann).
    #[default]
    Four,
    /// Orthogonal and diagonal neighbours (Moore).
    Eight,
}

// ---------------------------------------------------------------------------
// Structures
// ---------------------------------------------------------------------------

/// A structure that can be built in an owned region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum StructureType {
    /// Produces water.
    Farm,
    /// Produces wood.
    Sawmill,
    /// Produces stone.
    Quarry,
    /// Produces gold.
    Mine,
    /// Worth victory points, produces nothing.
    Tower,
}

impl StructureType {
    /// Every structure type, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Farm,
        Self::Sawmill,
        Self::Quarry,
        Self::Mine,
        Self::Tower,
    ];
}

// ---------------------------------------------------------------------------
// Candidate actions
// ---------------------------------------------------------------------------

/// The kind of action an [`Opportunity`](crate::Opportunity) proposes.
///
/// Declaration order is the secondary tie-break when two opportunities
/// share priority, risk, and target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum OpportunityKind {
    /// Take control of an uncontrolled adjacent region.
    Claim,
    /// Raise the exploration level of an owned region.
    Explore,
    /// Harvest the yields of an owned, explored region.
    Collect,
    /// Construct a structure in an owned region.
    Build,
    /// Contest a region controlled by another participant.
    Dispute,
}

impl OpportunityKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Claim,
        Self::Explore,
        Self::Collect,
        Self::Build,
        Self::Dispute,
    ];
}

// ---------------------------------------------------------------------------
// Agent configuration
// ---------------------------------------------------------------------------

/// A decision-weighting profile for a computer-controlled participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Archetype {
    /// Grows territory first; values regions far above resources.
    Expansionist,
    /// Builds structures; guards its construction materials.
    Builder,
    /// Accumulates value; trades on weighted resource worth.
    Economist,
    /// Favours trade and relationships; accepts stochastically.
    Diplomat,
}

impl Archetype {
    /// Every archetype, in declaration order.
    pub const ALL: [Self; 4] = [
        Self::Expansionist,
        Self::Builder,
        Self::Economist,
        Self::Diplomat,
    ];
}

/// Difficulty level of an agent. Each level maps to a fixed tier of
/// reaction, accuracy, and risk parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Difficulty {
    /// Slow, inaccurate, cautious.
    Easy,
    /// The default tier.
    #[default]
    Normal,
    /// Fast, accurate, aggressive.
    Hard,
}

// ---------------------------------------------------------------------------
// Negotiation and turn phases
// ---------------------------------------------------------------------------

/// Lifecycle status of a trade proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ProposalStatus {
    /// Awaiting a response from the target.
    Pending,
    /// Accepted and executed.
    Accepted,
    /// Rejected by the target or invalidated at acceptance time.
    Rejected,
}

/// Phase of an orchestrated agent turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum TurnPhase {
    /// No turn in progress for this participant.
    #[default]
    Idle,
    /// Income is being applied.
    Income,
    /// The action budget is being spent.
    Actions,
    /// Inbound proposals are answered and one outbound may be sent.
    Negotiation,
}

/// The side a participant took in a resolved negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum TradeRole {
    /// The participant sent the proposal.
    Initiator,
    /// The participant answered the proposal.
    Responder,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resources_serialize_under_game_names() {
        let json = serde_json::to_string(&Resource::ALL).ok();
        assert_eq!(
            json.as_deref(),
            Some(r#"["madeira","pedra","ouro","agua"]"#)
        );
    }

    #[test]
    fn construction_materials_are_wood_and_stone() {
        let hard: Vec<Resource> = Resource::ALL
            .into_iter()
            .filter(|r| r.is_construction_material())
            .collect();
        assert_eq!(hard, vec![Resource::Wood, Resource::Stone]);
    }

    #[test]
    fn opportunity_kinds_order_by_declaration() {
        assert!(OpportunityKind::Claim < OpportunityKind::Dispute);
        assert!(StructureType::Farm < StructureType::Tower);
    }
}
