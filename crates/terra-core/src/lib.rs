//! Turn orchestration for the Terra agent engine.
//!
//! This crate plays complete turns for computer-controlled participants
//! and guarantees that every turn it starts ends, either normally or by
//! forced termination from the health monitor.
//!
//! # Modules
//!
//! - [`clock`] -- Millisecond clocks ([`SystemClock`], [`ManualClock`])
//! - [`collaborators`] -- Traits for world state, execution, negotiation, turn order
//! - [`config`] -- `terra-config.yaml` loading ([`EngineConfig`])
//! - [`context`] -- Per-turn working state ([`TurnContext`])
//! - [`fault`] -- Turn fault taxonomy ([`TurnFault`])
//! - [`feedback`] -- Bounded diagnostic log ([`FeedbackLog`])
//! - [`health`] -- Background health checks ([`HealthMonitor`])
//! - [`orchestrator`] -- The turn state machine ([`TurnOrchestrator`])
//! - [`sandbox`] -- In-memory collaborators ([`SandboxWorld`])
//! - [`supervisor`] -- Turn slot and epoch ([`TurnSupervisor`])

pub mod clock;
pub mod collaborators;
pub mod config;
pub mod context;
pub mod fault;
pub mod feedback;
pub mod health;
pub mod orchestrator;
pub mod sandbox;
pub mod supervisor;

pub use clock::{Clock, ManualClock, SystemClock};
pub use collaborators::{
    ActionExecutor, ActionReport, CollaboratorError, Collaborators, ExecutionError,
    NegotiationDesk, Resolution, TurnDriver, WorldState,
};
pub use config::{
    ConfigError, EngineConfig, GameConfig, HealthConfig, ParticipantConfig, TurnConfig,
};
pub use context::TurnContext;
pub use fault::TurnFault;
pub use feedback::{FeedbackEntry, FeedbackKind, FeedbackLog};
pub use health::HealthMonitor;
pub use orchestrator::{
    ActionRecord, Finalization, OrchestratorError, TurnOrchestrator, TurnOutcome, TurnSummary,
};
pub use sandbox::SandboxWorld;
pub use supervisor::{TurnSupervisor, TurnTicket};
