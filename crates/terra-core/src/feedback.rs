//! Diagnostic feedback log.
//!
//! A bounded ring of `{message, kind, timestamp}` entries. The health
//! monitor counts `Error` entries here; everything else is for operators
//! and the activity feed. Entries carry the turn epoch they were
//! recorded under so a stale step cannot count against a newer turn.

use std::collections::VecDeque;

use serde::Serialize;
use terra_types::ParticipantId;

/// Severity of a feedback entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FeedbackKind {
    /// Routine progress, including "agent skipped action" notes.
    Info,
    /// A recovered problem.
    Warning,
    /// A failure that counts toward the repeated-failure threshold.
    Error,
}

/// One recorded event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedbackEntry {
    /// Human-readable description.
    pub message: String,
    /// Severity.
    pub kind: FeedbackKind,
    /// When it was recorded, in clock milliseconds.
    pub timestamp_ms: u64,
    /// Turn epoch at the time of recording.
    pub epoch: u64,
    /// Participant whose turn it was, if any.
    pub participant: Option<ParticipantId>,
}

/// Bounded, oldest-first log of feedback entries.
#[derive(Debug, Clone)]
pub struct FeedbackLog {
    entries: VecDeque<FeedbackEntry>,
    capacity: usize,
}

impl FeedbackLog {
    /// Create a log holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an entry, evicting the oldest when full.
    pub fn push(&mut self, entry: FeedbackEntry) {
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Errors recorded under `epoch` at or after `since_ms`.
    pub fn errors_since(&self, epoch: u64, since_ms: u64) -> usize {
        self.entries
            .iter()
            .filter(|e| e.kind == FeedbackKind::Error)
            .filter(|e| e.epoch == epoch && e.timestamp_ms >= since_ms)
            .count()
    }

    /// The `n` most recent entries, oldest first.
    pub fn recent(&self, n: usize) -> Vec<FeedbackEntry> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip).cloned().collect()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
