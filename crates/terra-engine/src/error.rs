//! Error types for the self-play binary.
//!
//! [`EngineError`] wraps every failure mode of startup and the round
//! loop so `main` can propagate with `?`.

/// Top-level error for the self-play binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: terra_core::ConfigError,
    },

    /// The roster could not be assembled.
    #[error("agent error: {source}")]
    Agent {
        /// The underlying agent error.
        #[from]
        source: terra_agents::AgentError,
    },

    /// The sandbox refused a driver call.
    #[error("collaborator error: {source}")]
    Collaborator {
        /// The underlying collaborator error.
        #[from]
        source: terra_core::CollaboratorError,
    },

    /// Board generation failed.
    #[error("map error: {message}")]
    Map {
        /// Description of the failure.
        message: String,
    },
}
