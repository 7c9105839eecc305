//! Turn fault taxonomy.
//!
//! Every failure the orchestrator observes is classified as one of these.
//! The first three are absorbed where they happen (a slot is consumed or
//! a phase skipped). Only [`TurnFault::Timeout`] and
//! [`TurnFault::RepeatedFailure`] escalate to forced termination.

use serde::Serialize;

/// A classified turn failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
pub enum TurnFault {
    /// The scorer had nothing legal to offer, or a chosen candidate went stale.
    #[error("invalid opportunity: {0}")]
    InvalidOpportunity(String),

    /// Resources ran short between scoring and execution.
    #[error("unaffordable action: {0}")]
    UnaffordableAction(String),

    /// An expected collaborator was not wired in.
    #[error("missing collaborator: {0}")]
    MissingCollaborator(&'static str),

    /// The turn ran past the wall-clock ceiling.
    #[error("turn exceeded {ceiling_ms} ms (ran {elapsed_ms} ms)")]
    Timeout {
        /// How long the turn had been running.
        elapsed_ms: u64,
        /// The configured ceiling.
        ceiling_ms: u64,
    },

    /// Too many errors inside the trailing window.
    #[error("{errors} errors within {window_ms} ms")]
    RepeatedFailure {
        /// Errors counted in the window.
        errors: usize,
        /// The window length.
        window_ms: u64,
    },
}

impl TurnFault {
    /// Whether the fault forces the turn to end.
    pub const fn escalates(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::RepeatedFailure { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_timeouts_and_repeated_failures_escalate() {
        assert!(!TurnFault::InvalidOpportunity(String::new()).escalates());
        assert!(!TurnFault::UnaffordableAction(String::new()).escalates());
        assert!(!TurnFault::MissingCollaborator("executor").escalates());
        assert!(TurnFault::Timeout {
            elapsed_ms: 21_000,
            ceiling_ms: 20_000
        }
        .escalates());
        assert!(TurnFault::RepeatedFailure {
            errors: 4,
            window_ms: 5_000
        }
        .escalates());
    }
}
