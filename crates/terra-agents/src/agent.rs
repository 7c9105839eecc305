//! Agent records and the roster that owns them.
//!
//! An [`Agent`] exists for every computer-controlled participant. It is
//! created at setup, lives for the whole game, and only negotiation
//! outcomes mutate it (relationship scores and trade history).

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;
use terra_types::{Archetype, Difficulty, ParticipantId, Proposal, TradeRecord, TradeRole};
use tracing::debug;

use crate::config::NegotiationConfig;
use crate::difficulty::DifficultyTier;
use crate::error::AgentError;
use crate::personality::KindWeights;
use crate::relationship::RelationshipMemory;

/// Decision state of one computer-controlled participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Agent {
    /// The participant this agent plays.
    pub participant_id: ParticipantId,
    /// Decision-weighting profile.
    pub archetype: Archetype,
    /// Difficulty level.
    pub difficulty: Difficulty,
    /// Scores toward other participants.
    pub relationships: RelationshipMemory,
    /// Every negotiation this agent took part in, oldest first.
    pub trade_history: Vec<TradeRecord>,
}

impl Agent {
    /// Create an agent with no history.
    pub const fn new(
        participant_id: ParticipantId,
        archetype: Archetype,
        difficulty: Difficulty,
    ) -> Self {
        Self {
            participant_id,
            archetype,
            difficulty,
            relationships: RelationshipMemory::new(),
            trade_history: Vec::new(),
        }
    }

    /// The agent's difficulty tier.
    pub const fn tier(&self) -> &'static DifficultyTier {
        DifficultyTier::for_level(self.difficulty)
    }

    /// Per-kind weights before any strategic bias.
    pub fn weights(&self) -> KindWeights {
        KindWeights::for_agent(self.archetype, self.tier())
    }

    /// Remember the outcome of a negotiation this agent took part in.
    ///
    /// Adjusts the relationship with the other party and appends a
    /// [`TradeRecord`]. Returns the new relationship score.
    pub fn record_resolution(
        &mut self,
        proposal: &Proposal,
        accepted: bool,
        turn: u32,
        config: &NegotiationConfig,
    ) -> Result<Decimal, AgentError> {
        let role = if proposal.initiator == self.participant_id {
            TradeRole::Initiator
        } else {
            TradeRole::Responder
        };
        let counterpart = proposal.counterpart_of(self.participant_id);
        let delta = if accepted {
            config.accept_delta()
        } else {
            config.reject_delta()
        };
        let (old, new) = self.relationships.adjust(counterpart, delta)?;
        self.trade_history.push(TradeRecord {
            proposal_id: proposal.id,
            counterpart,
            role,
            accepted,
            turn,
        });
        debug!(
            agent = %self.participant_id,
            counterpart = %counterpart,
            accepted,
            %old,
            %new,
            "relationship updated"
        );
        Ok(new)
    }
}

/// Every agent in the game, keyed by participant.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AgentRoster {
    agents: BTreeMap<ParticipantId, Agent>,
}

impl AgentRoster {
    /// Create an empty roster.
    pub const fn new() -> Self {
        Self {
            agents: BTreeMap::new(),
        }
    }

    /// Add an agent.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::DuplicateAgent`] if the participant already
    /// has one.
    pub fn register(&mut self, agent: Agent) -> Result<(), AgentError> {
        if self.agents.contains_key(&agent.participant_id) {
            return Err(AgentError::DuplicateAgent(agent.participant_id));
        }
        self.agents.insert(agent.participant_id, agent);
        Ok(())
    }

    /// Whether `participant` is computer-controlled.
    pub fn is_agent(&self, participant: ParticipantId) -> bool {
        self.agents.contains_key(&participant)
    }

    /// The agent for `participant`.
    pub fn get(&self, participant: ParticipantId) -> Option<&Agent> {
        self.agents.get(&participant)
    }

    /// Mutable access to the agent for `participant`.
    pub fn get_mut(&mut self, participant: ParticipantId) -> Option<&mut Agent> {
        self.agents.get_mut(&participant)
    }

    /// All agents in participant order.
    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values()
    }

    /// Number of agents.
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Whether the roster is empty.
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use terra_types::{ResourceBundle, Resource, TradeTerms};

    use super::*;

    fn proposal() -> Proposal {
        Proposal::new(
            ParticipantId(1),
            ParticipantId(2),
            TradeTerms::resources(ResourceBundle::from([(Resource::Wood, 1)])),
            TradeTerms::resources(ResourceBundle::from([(Resource::Stone, 1)])),
            3,
        )
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut roster = AgentRoster::new();
        let agent = Agent::new(ParticipantId(1), Archetype::Builder, Difficulty::Easy);
        roster.register(agent.clone()).unwrap();
        assert_eq!(
            roster.register(agent),
            Err(AgentError::DuplicateAgent(ParticipantId(1)))
        );
        assert_eq!(roster.len(), 1);
        assert!(roster.is_agent(ParticipantId(1)));
        assert!(!roster.is_agent(ParticipantId(2)));
    }

    #[test]
    fn both_sides_record_the_same_trade() {
        let config = NegotiationConfig::default();
        let p = proposal();
        let mut initiator = Agent::new(ParticipantId(1), Archetype::Builder, Difficulty::Normal);
        let mut responder = Agent::new(ParticipantId(2), Archetype::Diplomat, Difficulty::Normal);

        let a = initiator.record_resolution(&p, true, 3, &config).unwrap();
        let b = responder.record_resolution(&p, true, 3, &config).unwrap();
        assert_eq!(a, Decimal::new(1, 1));
        assert_eq!(b, Decimal::new(1, 1));

        let mine = initiator.trade_history.first().unwrap();
        assert_eq!(mine.role, TradeRole::Initiator);
        assert_eq!(mine.counterpart, ParticipantId(2));
        let theirs = responder.trade_history.first().unwrap();
        assert_eq!(theirs.role, TradeRole::Responder);
        assert_eq!(theirs.counterpart, ParticipantId(1));
    }

    #[test]
    fn rejection_lowers_relationship() {
        let config = NegotiationConfig::default();
        let mut agent = Agent::new(ParticipantId(2), Archetype::Economist, Difficulty::Hard);
        let score = agent.record_resolution(&proposal(), false, 3, &config).unwrap();
        assert_eq!(score, Decimal::new(-5, 2));
        assert!(!agent.trade_history.first().unwrap().accepted);
    }
}
