//! Turn supervisor: the single in-progress slot and its epoch counter.
//!
//! At most one orchestrated turn runs at a time. Beginning a turn bumps
//! the epoch; every orchestrator step carries the epoch it started under
//! and checks [`TurnSupervisor::is_current`] before mutating anything.
//! Ending a turn, normally or by force, is a claim on the slot: only the
//! first claimant for an epoch succeeds, so the driver is advanced
//! exactly once per turn.
//!
//! The slot lives behind a [`std::sync::Mutex`] that is never held across
//! an await point. A poisoned lock is recovered, since the slot holds
//! plain values that are valid after any partial update.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use terra_types::ParticipantId;
use tracing::{error, info, warn};

use crate::clock::Clock;
use crate::fault::TurnFault;
use crate::feedback::{FeedbackEntry, FeedbackKind, FeedbackLog};

/// Proof that a turn was started, carried through every step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TurnTicket {
    /// Epoch the turn runs under.
    pub epoch: u64,
    /// Participant whose turn it is.
    pub participant: ParticipantId,
    /// Clock reading when the turn began.
    pub started_ms: u64,
}

#[derive(Debug, Default)]
struct TurnSlot {
    in_progress: bool,
    epoch: u64,
    participant: Option<ParticipantId>,
    started_ms: u64,
}

/// Shared turn state: the in-progress slot and the feedback log.
#[derive(Debug)]
pub struct TurnSupervisor {
    slot: Mutex<TurnSlot>,
    feedback: Mutex<FeedbackLog>,
    clock: Arc<dyn Clock>,
    forced_terminations: AtomicU64,
}

impl TurnSupervisor {
    /// Create a supervisor with an empty slot.
    pub fn new(clock: Arc<dyn Clock>, feedback_capacity: usize) -> Self {
        Self {
            slot: Mutex::new(TurnSlot::default()),
            feedback: Mutex::new(FeedbackLog::new(feedback_capacity)),
            clock,
            forced_terminations: AtomicU64::new(0),
        }
    }

    /// The clock turns are timed with.
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    // -----------------------------------------------------------------------
    // Slot
    // -----------------------------------------------------------------------

    /// Start a turn for `participant` under a fresh epoch.
    ///
    /// Returns `None` if a turn is already in progress.
    pub fn try_begin(&self, participant: ParticipantId) -> Option<TurnTicket> {
        let now = self.clock.now_ms();
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.in_progress {
            return None;
        }
        slot.epoch = slot.epoch.saturating_add(1);
        slot.in_progress = true;
        slot.participant = Some(participant);
        slot.started_ms = now;
        Some(TurnTicket {
            epoch: slot.epoch,
            participant,
            started_ms: now,
        })
    }

    /// Whether the turn started under `epoch` is still the live one.
    pub fn is_current(&self, epoch: u64) -> bool {
        let slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        slot.in_progress && slot.epoch == epoch
    }

    /// Whether any turn is in progress.
    pub fn turn_in_progress(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .in_progress
    }

    /// The live turn, if any.
    pub fn active(&self) -> Option<TurnTicket> {
        let slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if !slot.in_progress {
            return None;
        }
        slot.participant.map(|participant| TurnTicket {
            epoch: slot.epoch,
            participant,
            started_ms: slot.started_ms,
        })
    }

    /// Latest epoch handed out.
    pub fn epoch(&self) -> u64 {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).epoch
    }

    /// Claim the end of the turn started under `epoch`.
    ///
    /// Returns `true` for the first claim while that turn is live. The
    /// caller that wins the claim is responsible for advancing the driver.
    pub fn end(&self, epoch: u64) -> bool {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if !slot.in_progress || slot.epoch != epoch {
            return false;
        }
        slot.in_progress = false;
        true
    }

    /// Force the turn started under `epoch` to end.
    ///
    /// Idempotent: a second call for the same epoch, or a call after the
    /// turn ended normally, returns `false` and changes nothing.
    pub fn force_terminate(&self, epoch: u64, fault: &TurnFault) -> bool {
        let participant = self.active().map(|t| t.participant);
        if !self.end(epoch) {
            return false;
        }
        self.forced_terminations.fetch_add(1, Ordering::AcqRel);
        error!(epoch, participant = ?participant, %fault, "turn force-terminated");
        self.record(epoch, participant, FeedbackKind::Error, format!("turn terminated: {fault}"));
        true
    }

    /// Number of forced terminations so far.
    pub fn forced_terminations(&self) -> u64 {
        self.forced_terminations.load(Ordering::Acquire)
    }

    // -----------------------------------------------------------------------
    // Feedback
    // -----------------------------------------------------------------------

    /// Record a diagnostic against the current epoch.
    pub fn capture(&self, message: impl Into<String>, kind: FeedbackKind) {
        let (epoch, participant) = {
            let slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
            (slot.epoch, slot.participant)
        };
        self.record(epoch, participant, kind, message.into());
    }

    /// Record a diagnostic against a specific epoch.
    pub fn record(
        &self,
        epoch: u64,
        participant: Option<ParticipantId>,
        kind: FeedbackKind,
        message: String,
    ) {
        match kind {
            FeedbackKind::Info => info!(epoch, participant = ?participant, "{message}"),
            FeedbackKind::Warning => warn!(epoch, participant = ?participant, "{message}"),
            FeedbackKind::Error => error!(epoch, participant = ?participant, "{message}"),
        }
        let entry = FeedbackEntry {
            message,
            kind,
            timestamp_ms: self.clock.now_ms(),
            epoch,
            participant,
        };
        self.feedback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }

    /// Errors recorded under `epoch` during the last `window_ms`.
    pub fn errors_within(&self, epoch: u64, window_ms: u64) -> usize {
        let since = self.clock.now_ms().saturating_sub(window_ms);
        self.feedback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .errors_since(epoch, since)
    }

    /// The `n` most recent feedback entries, oldest first.
    pub fn recent_feedback(&self, n: usize) -> Vec<FeedbackEntry> {
        self.feedback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .recent(n)
    }
}
