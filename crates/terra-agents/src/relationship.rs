//! Per-agent relationship memory.
//!
//! Scores run from -1 (hostile) to 1 (allied) and are stored as
//! [`Decimal`] so repeated small adjustments never drift. Every update
//! clamps to the valid range. Unknown participants score 0.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use terra_types::ParticipantId;

use crate::error::AgentError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum relationship score.
const SCORE_MAX: Decimal = Decimal::ONE;

/// Minimum relationship score.
const SCORE_MIN: Decimal = Decimal::NEGATIVE_ONE;

/// Score of a participant this agent has never dealt with.
const SCORE_DEFAULT: Decimal = Decimal::ZERO;

// ---------------------------------------------------------------------------
// RelationshipMemory
// ---------------------------------------------------------------------------

/// Relationship scores and interaction counts keyed by counterpart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RelationshipMemory {
    scores: BTreeMap<ParticipantId, Decimal>,
    interactions: BTreeMap<ParticipantId, u64>,
}

impl RelationshipMemory {
    /// Create an empty memory.
    pub const fn new() -> Self {
        Self {
            scores: BTreeMap::new(),
            interactions: BTreeMap::new(),
        }
    }

    /// Score with `counterpart` (0 when unknown).
    pub fn score(&self, counterpart: ParticipantId) -> Decimal {
        self.scores
            .get(&counterpart)
            .copied()
            .unwrap_or(SCORE_DEFAULT)
    }

    /// Score with `counterpart` as a float for probability arithmetic.
    pub fn score_f64(&self, counterpart: ParticipantId) -> f64 {
        self.score(counterpart).to_f64().unwrap_or(0.0)
    }

    /// Number of resolved negotiations with `counterpart`.
    pub fn interactions(&self, counterpart: ParticipantId) -> u64 {
        self.interactions.get(&counterpart).copied().unwrap_or(0)
    }

    /// Shift the score with `counterpart` by `delta`, clamped to `[-1, 1]`.
    ///
    /// Returns the old and new scores.
    pub fn adjust(
        &mut self,
        counterpart: ParticipantId,
        delta: Decimal,
    ) -> Result<(Decimal, Decimal), AgentError> {
        let old = self.score(counterpart);
        let raw = old
            .checked_add(delta)
            .ok_or_else(|| AgentError::ArithmeticOverflow {
                context: String::from("relationship score addition overflow"),
            })?;
        let new = raw.clamp(SCORE_MIN, SCORE_MAX);
        self.scores.insert(counterpart, new);

        let count = self.interactions.entry(counterpart).or_insert(0);
        *count = count.saturating_add(1);

        Ok((old, new))
    }

    /// Every known counterpart with its score, in id order.
    pub fn iter(&self) -> impl Iterator<Item = (ParticipantId, Decimal)> + '_ {
        self.scores.iter().map(|(&id, &score)| (id, score))
    }
}
