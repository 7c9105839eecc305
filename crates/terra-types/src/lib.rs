//! Shared data model for the Terra agent engine.
//!
//! This crate is the single source of truth for the types exchanged
//! between the agent logic, the turn orchestrator, and the game's external
//! collaborators. Types flow to `TypeScript` via `ts-rs` for UI consumers.
//!
//! # Modules
//!
//! - [`ids`] -- Typed identifiers for participants, regions, and proposals
//! - [`enums`] -- Closed enumerations (resources, biomes, archetypes, phases)
//! - [`bundle`] -- [`ResourceBundle`] with clamping arithmetic
//! - [`world`] -- Participants, regions, grid, and the [`WorldSnapshot`]
//! - [`opportunity`] -- Scored candidate actions and their ranking order
//! - [`proposal`] -- Trade proposals and trade history records

pub mod bundle;
pub mod enums;
pub mod ids;
pub mod opportunity;
pub mod proposal;
pub mod world;

pub use bundle::ResourceBundle;
pub use enums::{
    Archetype, Biome, Difficulty, Neighborhood, OpportunityKind, ProposalStatus, Resource,
    StructureType, TradeRole, TurnPhase,
};
pub use ids::{ParticipantId, ProposalId, RegionId};
pub use opportunity::{ActionCost, Opportunity, OpportunityDetail, rank};
pub use proposal::{Proposal, TradeRecord, TradeTerms};
pub use world::{GridSpec, MAX_EXPLORATION_LEVEL, Participant, Region, WorldSnapshot};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation for UI consumers.

    #[test]
    fn export_bindings() {
        // ts-rs writes the files to `bindings/` relative to the crate root.
        use ts_rs::TS;

        let _ = crate::ids::ParticipantId::export_all();
        let _ = crate::ids::RegionId::export_all();
        let _ = crate::ids::ProposalId::export_all();

        let _ = crate::enums::Resource::export_all();
        let _ = crate::enums::Biome::export_all();
        let _ = crate::enums::Neighborhood::export_all();
        let _ = crate::enums::StructureType::export_all();
        let _ = crate::enums::OpportunityKind::export_all();
        let _ = crate::enums::Archetype::export_all();
        let _ = crate::enums::Difficulty::export_all();
        let _ = crate::enums::ProposalStatus::export_all();
        let _ = crate::enums::TurnPhase::export_all();
        let _ = crate::enums::TradeRole::export_all();

        let _ = crate::bundle::ResourceBundle::export_all();
        let _ = crate::world::Participant::export_all();
        let _ = crate::world::Region::export_all();
        let _ = crate::world::GridSpec::export_all();
        let _ = crate::world::WorldSnapshot::export_all();
        let _ = crate::opportunity::ActionCost::export_all();
        let _ = crate::opportunity::OpportunityDetail::export_all();
        let _ = crate::opportunity::Opportunity::export_all();
        let _ = crate::proposal::TradeTerms::export_all();
        let _ = crate::proposal::Proposal::export_all();
        let _ = crate::proposal::TradeRecord::export_all();
    }
}
