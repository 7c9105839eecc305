//! Collaborator seams.
//!
//! The engine owns no game state. Everything it reads or changes goes
//! through these traits, handed to the orchestrator at construction.
//! The world state and turn driver are required. The executor, dispute
//! oracle, and negotiation desk are optional, and a missing one ends the
//! matching phase early instead of failing the turn.

use std::sync::Arc;

use serde::Serialize;
use terra_agents::DisputeOracle;
use terra_types::{
    Opportunity, OpportunityKind, Participant, ParticipantId, Proposal, ProposalId,
    ProposalStatus, Resource, ResourceBundle, WorldSnapshot,
};

/// Errors reported by world, negotiation, and turn collaborators.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollaboratorError {
    /// The participant does not exist.
    #[error("unknown participant: {0}")]
    UnknownParticipant(ParticipantId),

    /// The proposal does not exist or is no longer pending.
    #[error("unknown proposal: {0}")]
    UnknownProposal(ProposalId),

    /// The request no longer matches the collaborator's state.
    #[error("stale request: {0}")]
    Stale(String),

    /// The request was malformed.
    #[error("rejected request: {0}")]
    Rejected(String),

    /// The collaborator failed internally.
    #[error("collaborator failure: {0}")]
    Internal(String),
}

/// Errors reported by the action executor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecutionError {
    /// The actor cannot pay the cost right now.
    #[error("cannot afford: need {needed} {resource:?}, have {available}")]
    Unaffordable {
        /// The first resource that falls short.
        resource: Resource,
        /// Quantity required.
        needed: u32,
        /// Quantity held.
        available: u32,
    },

    /// The action is not legal in the current state.
    #[error("illegal action: {0}")]
    Illegal(String),

    /// The executor does not handle this kind of action.
    #[error("unsupported action kind: {0:?}")]
    Unsupported(OpportunityKind),

    /// The executor failed internally.
    #[error("executor failure: {0}")]
    Internal(String),
}

/// What an executed action did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionReport {
    /// Whether the action had its intended effect. A lost dispute is a
    /// completed action that did not succeed.
    pub success: bool,
    /// One-line description for logs.
    pub summary: String,
    /// Victory points the actor gained.
    pub victory_points_awarded: u32,
}

/// Outcome of resolving a proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    /// The proposal.
    pub proposal_id: ProposalId,
    /// Final status.
    pub status: ProposalStatus,
    /// Why an accept turned into a reject, if it did.
    pub note: Option<String>,
    /// Victory points awarded to the initiator.
    pub victory_points_awarded: u32,
}

impl Resolution {
    /// Whether the trade went through.
    pub fn accepted(&self) -> bool {
        self.status == ProposalStatus::Accepted
    }
}

/// Read access to the world plus income application.
pub trait WorldState: Send + Sync {
    /// A fresh copy of the world.
    fn snapshot(&self) -> Result<WorldSnapshot, CollaboratorError>;

    /// Current state of one participant.
    fn participant(&self, id: ParticipantId) -> Result<Participant, CollaboratorError>;

    /// Credit the participant's per-turn income and return it.
    fn apply_income(&self, id: ParticipantId) -> Result<ResourceBundle, CollaboratorError>;
}

/// Performs the mechanical effect of a chosen action.
pub trait ActionExecutor: Send + Sync {
    /// Pay the cost and apply `opportunity` on behalf of `actor`.
    fn execute(
        &self,
        actor: ParticipantId,
        opportunity: &Opportunity,
    ) -> Result<ActionReport, ExecutionError>;
}

/// The shared collection of pending proposals.
pub trait NegotiationDesk: Send + Sync {
    /// Pending proposals addressed to `participant`, oldest first.
    fn pending_for(&self, participant: ParticipantId) -> Result<Vec<Proposal>, CollaboratorError>;

    /// Add a proposal.
    fn submit(&self, proposal: Proposal) -> Result<(), CollaboratorError>;

    /// Accept or reject a pending proposal. Acceptance revalidates both
    /// sides and transfers the terms; a stale accept resolves as rejected.
    fn resolve(&self, proposal: ProposalId, accept: bool) -> Result<Resolution, CollaboratorError>;

    /// Resolved proposals `initiator` sent, oldest first.
    fn resolved_from(&self, initiator: ParticipantId) -> Result<Vec<Proposal>, CollaboratorError>;
}

/// Whose turn it is, and how to move on.
pub trait TurnDriver: Send + Sync {
    /// The participant whose turn it is.
    fn current_participant(&self) -> Option<ParticipantId>;

    /// Normal end of `participant`'s turn.
    fn finish_turn(&self, participant: ParticipantId) -> Result<(), CollaboratorError>;

    /// Move to the next live participant.
    fn advance_to_next_participant(&self) -> Result<ParticipantId, CollaboratorError>;

    /// Bump the turn index unconditionally. Must not fail.
    fn force_advance_index(&self) -> Option<ParticipantId>;
}

/// Every collaborator the orchestrator talks to.
#[derive(Clone)]
pub struct Collaborators {
    /// World state.
    pub world: Arc<dyn WorldState>,
    /// Turn driver.
    pub driver: Arc<dyn TurnDriver>,
    /// Action executor.
    pub executor: Option<Arc<dyn ActionExecutor>>,
    /// Dispute cost and probability model.
    pub oracle: Option<Arc<dyn DisputeOracle>>,
    /// Pending-proposal collection.
    pub desk: Option<Arc<dyn NegotiationDesk>>,
}

impl Collaborators {
    /// Required collaborators only.
    pub fn new(world: Arc<dyn WorldState>, driver: Arc<dyn TurnDriver>) -> Self {
        Self {
            world,
            driver,
            executor: None,
            oracle: None,
            desk: None,
        }
    }

    /// Attach an action executor.
    #[must_use]
    pub fn with_executor(mut self, executor: Arc<dyn ActionExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Attach a dispute oracle.
    #[must_use]
    pub fn with_oracle(mut self, oracle: Arc<dyn DisputeOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    /// Attach a negotiation desk.
    #[must_use]
    pub fn with_desk(mut self, desk: Arc<dyn NegotiationDesk>) -> Self {
        self.desk = Some(desk);
        self
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators")
            .field("executor", &self.executor.is_some())
            .field("oracle", &self.oracle.is_some())
            .field("desk", &self.desk.is_some())
            .finish_non_exhaustive()
    }
}
