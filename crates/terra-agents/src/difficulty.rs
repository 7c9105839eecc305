//! Difficulty tiers.
//!
//! Each [`Difficulty`] level maps to one immutable [`DifficultyTier`].
//! The tiers are compiled in; there is no runtime registry to get out of
//! sync with the enum.

use serde::Serialize;
use terra_types::Difficulty;

/// Reaction, accuracy, and risk parameters for one difficulty level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DifficultyTier {
    /// Pause between orchestrated steps when pacing is enabled.
    pub reaction_delay_ms: u64,
    /// Probability of choosing the top-ranked candidate. A miss picks the
    /// runner-up instead.
    pub decision_accuracy: f64,
    /// How many ranked candidates are tried when the chosen one fails
    /// revalidation.
    pub planning_depth: usize,
    /// Multiplier on the dispute weight.
    pub aggression_level: f64,
    /// Disputes with risk at or above this percentage are refused.
    pub risk_threshold: f64,
    /// How strongly archetype multipliers deviate from neutral.
    pub personality_weight_bias: f64,
    /// Minimum dispute score to act on.
    pub dispute_score_threshold: f64,
}

const EASY: DifficultyTier = DifficultyTier {
    reaction_delay_ms: 1500,
    decision_accuracy: 0.70,
    planning_depth: 1,
    aggression_level: 0.7,
    risk_threshold: 25.0,
    personality_weight_bias: 0.6,
    dispute_score_threshold: 70.0,
};

const NORMAL: DifficultyTier = DifficultyTier {
    reaction_delay_ms: 1000,
    decision_accuracy: 0.85,
    planning_depth: 2,
    aggression_level: 1.0,
    risk_threshold: 40.0,
    personality_weight_bias: 1.0,
    dispute_score_threshold: 55.0,
};

const HARD: DifficultyTier = DifficultyTier {
    reaction_delay_ms: 600,
    decision_accuracy: 0.97,
    planning_depth: 3,
    aggression_level: 1.25,
    risk_threshold: 60.0,
    personality_weight_bias: 1.2,
    dispute_score_threshold: 45.0,
};

impl DifficultyTier {
    /// The tier for `difficulty`.
    pub const fn for_level(difficulty: Difficulty) -> &'static Self {
        match difficulty {
            Difficulty::Easy => &EASY,
            Difficulty::Normal => &NORMAL,
            Difficulty::Hard => &HARD,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn harder_tiers_are_sharper() {
        let easy = DifficultyTier::for_level(Difficulty::Easy);
        let hard = DifficultyTier::for_level(Difficulty::Hard);
        assert!(hard.decision_accuracy > easy.decision_accuracy);
        assert!(hard.risk_threshold > easy.risk_threshold);
        assert!(hard.reaction_delay_ms < easy.reaction_delay_ms);
        assert!(hard.planning_depth > easy.planning_depth);
    }

    #[test]
    fn normal_tier_keeps_personality_unscaled() {
        let normal = DifficultyTier::for_level(Difficulty::default());
        assert!((normal.personality_weight_bias - 1.0).abs() < f64::EPSILON);
        assert!((normal.aggression_level - 1.0).abs() < f64::EPSILON);
    }
}
