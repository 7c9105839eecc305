//! Configuration loading and typed config structures for the Terra engine.
//!
//! The canonical configuration lives in `terra-config.yaml`. Every
//! section and field has a default, so an empty file (or no file at all)
//! yields a playable four-agent game. `TERRA_SEED` in the environment
//! overrides `game.seed`.

use std::path::Path;

use serde::Deserialize;
use terra_agents::{GameRules, NegotiationConfig, PlannerConfig};
use terra_types::{Archetype, Difficulty, Neighborhood};

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but cannot be used.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// What is wrong.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level engine configuration, mirroring `terra-config.yaml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EngineConfig {
    /// Board and session settings.
    #[serde(default)]
    pub game: GameConfig,
    /// Per-turn budgets and pacing.
    #[serde(default)]
    pub turn: TurnConfig,
    /// Health monitor thresholds.
    #[serde(default)]
    pub health: HealthConfig,
    /// Strategic planner overlay.
    #[serde(default)]
    pub planner: PlannerConfig,
    /// Negotiation valuation and sizing.
    #[serde(default)]
    pub negotiation: NegotiationConfig,
    /// Costs, structure catalog, and scoring factors.
    #[serde(default)]
    pub rules: GameRules,
    /// Seats at the table, in turn order.
    #[serde(default = "default_participants")]
    pub participants: Vec<ParticipantConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            game: GameConfig::default(),
            turn: TurnConfig::default(),
            health: HealthConfig::default(),
            planner: PlannerConfig::default(),
            negotiation: NegotiationConfig::default(),
            rules: GameRules::default(),
            participants: default_participants(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if it is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is unusable.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is unusable.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Some(seed) = std::env::var("TERRA_SEED")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
        {
            self.game.seed = seed;
        }
    }

    /// Reject values the engine cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| {
            Err(ConfigError::Invalid {
                reason: reason.to_owned(),
            })
        };
        if self.game.grid_width == 0 || self.game.grid_height == 0 {
            return invalid("grid dimensions must be at least 1");
        }
        let cells = u64::from(self.game.grid_width).saturating_mul(u64::from(self.game.grid_height));
        if u64::try_from(self.participants.len()).unwrap_or(u64::MAX) > cells {
            return invalid("more participants than grid cells");
        }
        if self.participants.len() < 2 {
            return invalid("at least two participants are required");
        }
        if self.turn.actions_per_turn == 0 {
            return invalid("turn.actions_per_turn must be at least 1");
        }
        if self.turn.iteration_cap < self.turn.actions_per_turn {
            return invalid("turn.iteration_cap must be at least turn.actions_per_turn");
        }
        if self.health.check_interval_ms == 0 {
            return invalid("health.check_interval_ms must be at least 1");
        }
        Ok(())
    }
}

/// Board and session settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GameConfig {
    /// Seed for map generation and agent randomness.
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Full rounds (every seat plays once) to run.
    #[serde(default = "default_rounds")]
    pub rounds: u32,
    /// Grid columns.
    #[serde(default = "default_grid_side")]
    pub grid_width: u32,
    /// Grid rows.
    #[serde(default = "default_grid_side")]
    pub grid_height: u32,
    /// Adjacency rule.
    #[serde(default)]
    pub neighborhood: Neighborhood,
    /// Victory points every participant starts with.
    #[serde(default = "default_starting_points")]
    pub starting_victory_points: u32,
}

const fn default_seed() -> u64 {
    7
}

const fn default_rounds() -> u32 {
    20
}

const fn default_grid_side() -> u32 {
    8
}

const fn default_starting_points() -> u32 {
    2
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            rounds: default_rounds(),
            grid_width: default_grid_side(),
            grid_height: default_grid_side(),
            neighborhood: Neighborhood::default(),
            starting_victory_points: default_starting_points(),
        }
    }
}

/// Per-turn budgets and pacing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TurnConfig {
    /// Action slots granted after income.
    #[serde(default = "default_actions_per_turn")]
    pub actions_per_turn: u32,
    /// Hard cap on action-loop iterations.
    #[serde(default = "default_iteration_cap")]
    pub iteration_cap: u32,
    /// Sleep for the tier's reaction delay between steps.
    #[serde(default)]
    pub pacing: bool,
    /// Keep the last action slot for an outbound proposal when one is
    /// likely.
    #[serde(default = "default_reserve_trade_slot")]
    pub reserve_trade_slot: bool,
    /// Entries kept in the feedback log.
    #[serde(default = "default_feedback_capacity")]
    pub feedback_capacity: usize,
}

const fn default_actions_per_turn() -> u32 {
    3
}

const fn default_iteration_cap() -> u32 {
    12
}

const fn default_reserve_trade_slot() -> bool {
    true
}

const fn default_feedback_capacity() -> usize {
    256
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            actions_per_turn: default_actions_per_turn(),
            iteration_cap: default_iteration_cap(),
            pacing: false,
            reserve_trade_slot: default_reserve_trade_slot(),
            feedback_capacity: default_feedback_capacity(),
        }
    }
}

/// Health monitor thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct HealthConfig {
    /// Interval between checks.
    #[serde(default = "default_check_interval")]
    pub check_interval_ms: u64,
    /// More errors than this inside the window forces termination.
    #[serde(default = "default_error_threshold")]
    pub error_threshold: usize,
    /// Trailing window for counting errors.
    #[serde(default = "default_error_window")]
    pub error_window_ms: u64,
    /// Absolute per-turn ceiling.
    #[serde(default = "default_turn_ceiling")]
    pub turn_ceiling_ms: u64,
}

const fn default_check_interval() -> u64 {
    5_000
}

const fn default_error_threshold() -> usize {
    3
}

const fn default_error_window() -> u64 {
    5_000
}

const fn default_turn_ceiling() -> u64 {
    20_000
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            check_interval_ms: default_check_interval(),
            error_threshold: default_error_threshold(),
            error_window_ms: default_error_window(),
            turn_ceiling_ms: default_turn_ceiling(),
        }
    }
}

/// One seat at the table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ParticipantConfig {
    /// Display name.
    pub name: String,
    /// Agent archetype; absent for a human seat.
    #[serde(default)]
    pub archetype: Option<Archetype>,
    /// Agent difficulty.
    #[serde(default)]
    pub difficulty: Difficulty,
}

fn default_participants() -> Vec<ParticipantConfig> {
    let seat = |name: &str, archetype, difficulty| ParticipantConfig {
        name: name.to_owned(),
        archetype: Some(archetype),
        difficulty,
    };
    vec![
        seat("Aurora", Archetype::Expansionist, Difficulty::Normal),
        seat("Basalt", Archetype::Builder, Difficulty::Normal),
        seat("Cobalt", Archetype::Economist, Difficulty::Hard),
        seat("Dahlia", Archetype::Diplomat, Difficulty::Easy),
    ]
}
