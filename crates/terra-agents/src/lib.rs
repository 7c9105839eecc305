//! Decision logic for computer-controlled Terra participants.
//!
//! Everything here is pure with respect to the world: functions read a
//! [`WorldSnapshot`](terra_types::WorldSnapshot) and return candidates,
//! verdicts, or proposals. Applying any of them is the job of the
//! collaborators wired up in `terra-core`.
//!
//! # Modules
//!
//! - [`agent`] -- Agent records and the [`AgentRoster`]
//! - [`config`] -- Negotiation parameters ([`NegotiationConfig`])
//! - [`difficulty`] -- Difficulty tiers ([`DifficultyTier`])
//! - [`dispute`] -- Dispute scoring and gating ([`DisputeEvaluator`], [`DisputeOracle`])
//! - [`error`] -- Error type for all agent logic ([`AgentError`])
//! - [`negotiation`] -- Accept/reject decisions ([`evaluate_proposal`])
//! - [`personality`] -- Archetype profiles and [`KindWeights`]
//! - [`planner`] -- Optional strategic overlay ([`StrategicPlanner`])
//! - [`proposal`] -- Outbound trade construction ([`synthesize_proposal`])
//! - [`relationship`] -- Decimal relationship scores ([`RelationshipMemory`])
//! - [`rules`] -- Costs, structure catalog, scoring factors ([`GameRules`])
//! - [`scorer`] -- Claim/explore/collect/build candidates ([`OpportunityScorer`])
//! - [`validate`] -- Acceptance-time revalidation ([`revalidate`])

pub mod agent;
pub mod config;
pub mod difficulty;
pub mod dispute;
pub mod error;
pub mod negotiation;
mod numeric;
pub mod personality;
pub mod planner;
pub mod proposal;
pub mod relationship;
pub mod rules;
pub mod scorer;
pub mod validate;

pub use agent::{Agent, AgentRoster};
pub use config::NegotiationConfig;
pub use difficulty::DifficultyTier;
pub use dispute::{DisputeEvaluator, DisputeOracle, risk_ratio};
pub use error::AgentError;
pub use negotiation::{Verdict, VerdictReason, evaluate_proposal};
pub use personality::{KindWeights, multiplier, preferred_biomes, resource_targets};
pub use planner::{GameStage, PlannerConfig, StrategicAssessment, StrategicPlanner};
pub use proposal::{select_counterpart, synthesize_proposal};
pub use relationship::RelationshipMemory;
pub use rules::{GameRules, ScoringFactors, StructureSpec, synergy};
pub use scorer::OpportunityScorer;
pub use validate::revalidate;
