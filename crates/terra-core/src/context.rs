//! Per-turn working state.

use serde::Serialize;
use terra_types::{ParticipantId, TurnPhase};
use tracing::debug;

use crate::supervisor::TurnTicket;

/// Mutable state of one orchestrated turn. Owned by the orchestrator for
/// the duration of the turn and dropped when it ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnContext {
    /// Current phase.
    pub phase: TurnPhase,
    /// Action slots left. Only the orchestrator decrements this.
    pub actions_remaining: u32,
    /// Whose turn it is.
    pub participant: ParticipantId,
    /// Supervisor epoch the turn runs under.
    pub epoch: u64,
    /// Clock reading when the turn began.
    pub started_at_ms: u64,
    /// Action-loop iterations so far.
    pub iterations: u32,
    /// Errors recorded during this turn.
    pub recent_errors: u32,
}

impl TurnContext {
    /// Fresh context for a turn that just began.
    pub const fn new(ticket: &TurnTicket) -> Self {
        Self {
            phase: TurnPhase::Idle,
            actions_remaining: 0,
            participant: ticket.participant,
            epoch: ticket.epoch,
            started_at_ms: ticket.started_ms,
            iterations: 0,
            recent_errors: 0,
        }
    }

    /// Move to `phase`.
    pub fn enter(&mut self, phase: TurnPhase) {
        debug!(
            participant = %self.participant,
            epoch = self.epoch,
            from = ?self.phase,
            to = ?phase,
            "turn phase"
        );
        self.phase = phase;
    }

    /// Set the action budget.
    pub const fn grant_actions(&mut self, slots: u32) {
        self.actions_remaining = slots;
    }

    /// Spend one action slot. Never goes below zero.
    pub const fn consume_action(&mut self) {
        self.actions_remaining = self.actions_remaining.saturating_sub(1);
    }

    /// Count one pass through the action loop.
    pub const fn tick(&mut self) {
        self.iterations = self.iterations.saturating_add(1);
    }

    /// Count one recorded error.
    pub const fn note_error(&mut self) {
        self.recent_errors = self.recent_errors.saturating_add(1);
    }

    /// Whether the action loop may run again under `iteration_cap`.
    pub const fn can_act(&self, iteration_cap: u32) -> bool {
        self.actions_remaining > 0 && self.iterations < iteration_cap
    }
}
