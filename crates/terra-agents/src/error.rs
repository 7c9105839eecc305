//! Error types for the terra-agents crate.
//!
//! Scoring and negotiation never panic. Lookups against a snapshot that
//! no longer contains the participant or region in question surface as
//! typed errors, and the orchestrator downgrades them to a skipped step.

use terra_types::{ParticipantId, RegionId, Resource};

/// Errors raised by agent decision logic.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AgentError {
    /// The participant is not present in the world snapshot.
    #[error("unknown participant: {0}")]
    UnknownParticipant(ParticipantId),

    /// The region is not present in the world snapshot.
    #[error("unknown region: {0}")]
    UnknownRegion(RegionId),

    /// No agent is registered for the participant.
    #[error("participant {0} is not agent-controlled")]
    NotAnAgent(ParticipantId),

    /// An agent is already registered for the participant.
    #[error("agent already registered for participant {0}")]
    DuplicateAgent(ParticipantId),

    /// A proposal was handed to an agent it is not addressed to.
    #[error("proposal addressed to {target}, not {responder}")]
    NotAddressed {
        /// The proposal's target.
        target: ParticipantId,
        /// The agent asked to respond.
        responder: ParticipantId,
    },

    /// A candidate no longer describes a legal action.
    #[error("invalid opportunity on region {target}: {reason}")]
    InvalidOpportunity {
        /// Region the candidate targets.
        target: RegionId,
        /// Why the candidate is no longer valid.
        reason: String,
    },

    /// The participant can no longer pay for a candidate.
    #[error("unaffordable: need {needed} {resource:?}, have {available}")]
    UnaffordableResources {
        /// The first resource that falls short.
        resource: Resource,
        /// Quantity the action costs.
        needed: u32,
        /// Quantity currently held.
        available: u32,
    },

    /// The participant holds fewer victory points than the action costs.
    #[error("unaffordable: need {needed} victory points, have {available}")]
    UnaffordablePoints {
        /// Points the action costs.
        needed: u32,
        /// Points currently held.
        available: u32,
    },

    /// Decimal arithmetic overflowed.
    #[error("arithmetic overflow: {context}")]
    ArithmeticOverflow {
        /// Description of what was being computed.
        context: String,
    },
}

impl AgentError {
    /// Whether the error reflects a cost the participant can no longer pay.
    pub const fn is_unaffordable(&self) -> bool {
        matches!(
            self,
            Self::UnaffordableResources { .. } | Self::UnaffordablePoints { .. }
        )
    }
}
