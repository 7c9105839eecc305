//! Shared fixtures for the orchestrator integration tests.

#![allow(dead_code, clippy::unwrap_used)]

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use terra_agents::{Agent, AgentRoster};
use terra_core::{
    ActionExecutor, ActionReport, Collaborators, EngineConfig, ExecutionError, ManualClock,
    SandboxWorld, TurnDriver, TurnOrchestrator, TurnOutcome, TurnSupervisor,
};
use terra_types::{
    Archetype, Biome, Difficulty, GridSpec, Neighborhood, Opportunity, OpportunityKind,
    Participant, ParticipantId, Region, RegionId, Resource, ResourceBundle, WorldSnapshot,
};

pub const AURORA: ParticipantId = ParticipantId(0);
pub const BASALT: ParticipantId = ParticipantId(1);
pub const HUMAN: ParticipantId = ParticipantId(2);

const BIOMES: [Biome; 9] = [
    Biome::Forest,
    Biome::Plains,
    Biome::Mountain,
    Biome::Lake,
    Biome::Plains,
    Biome::Forest,
    Biome::Mountain,
    Biome::Swamp,
    Biome::Mountain,
];

/// A 3x3 board: Aurora in the top-left corner, the human in the middle,
/// Basalt in the bottom-right corner.
pub fn board() -> WorldSnapshot {
    let holdings = ResourceBundle::from([
        (Resource::Wood, 8),
        (Resource::Stone, 6),
        (Resource::Gold, 3),
        (Resource::Water, 6),
    ]);
    let seat = |id: ParticipantId, name: &str, region: u32| Participant {
        id,
        name: name.to_owned(),
        resources: holdings.clone(),
        victory_points: 2,
        regions: BTreeSet::from([RegionId(region)]),
        eliminated: false,
    };
    let owners = [(0, AURORA), (4, HUMAN), (8, BASALT)];
    let regions = BIOMES
        .iter()
        .zip(0_u32..)
        .map(|(&biome, id)| {
            let controller = owners
                .iter()
                .find(|(region, _)| *region == id)
                .map(|(_, owner)| *owner);
            Region {
                id: RegionId(id),
                x: id % 3,
                y: id / 3,
                biome,
                exploration_level: u8::from(controller.is_some()),
                resources: ResourceBundle::from([(Resource::Wood, 2), (Resource::Stone, 1)]),
                controller,
                structures: BTreeSet::new(),
            }
        })
        .map(|r| (r.id, r))
        .collect();
    WorldSnapshot {
        turn: 0,
        grid: GridSpec {
            width: 3,
            height: 3,
            neighborhood: Neighborhood::Four,
        },
        participants: [
            seat(AURORA, "Aurora", 0),
            seat(BASALT, "Basalt", 8),
            seat(HUMAN, "Human", 4),
        ]
        .into_iter()
        .map(|p| (p.id, p))
        .collect(),
        regions,
    }
}

pub fn roster() -> AgentRoster {
    let mut roster = AgentRoster::new();
    roster
        .register(Agent::new(AURORA, Archetype::Expansionist, Difficulty::Normal))
        .unwrap();
    roster
        .register(Agent::new(BASALT, Archetype::Builder, Difficulty::Normal))
        .unwrap();
    roster
}

pub struct Harness {
    pub sandbox: Arc<SandboxWorld>,
    pub clock: Arc<ManualClock>,
    pub supervisor: Arc<TurnSupervisor>,
    pub config: EngineConfig,
}

impl Harness {
    pub fn new() -> Self {
        let config = EngineConfig::default();
        let clock = Arc::new(ManualClock::new(1_000));
        let supervisor = Arc::new(TurnSupervisor::new(clock.clone(), 256));
        let sandbox = Arc::new(SandboxWorld::new(board(), config.rules.clone(), config.game.seed));
        Self {
            sandbox,
            clock,
            supervisor,
            config,
        }
    }

    /// World and driver from the sandbox, nothing else.
    pub fn bare(&self) -> Collaborators {
        Collaborators::new(self.sandbox.clone(), self.sandbox.clone())
    }

    pub fn orchestrator(&self, collaborators: Collaborators) -> TurnOrchestrator {
        TurnOrchestrator::new(collaborators, self.supervisor.clone(), roster(), &self.config)
    }
}

/// Play `turns` turns, passing human turns straight through the driver.
pub async fn play_turns(
    orchestrator: &TurnOrchestrator,
    sandbox: &SandboxWorld,
    turns: usize,
) -> Vec<TurnOutcome> {
    let mut outcomes = Vec::new();
    for _ in 0..turns {
        let outcome = orchestrator.execute_agent_turn().await;
        if outcome == TurnOutcome::NotAgentTurn {
            let current = sandbox.current_participant().unwrap();
            sandbox.finish_turn(current).unwrap();
        }
        outcomes.push(outcome);
    }
    outcomes
}

/// Accepts every action without touching the world and remembers what
/// it was asked to do.
#[derive(Default)]
pub struct RecordingExecutor {
    pub executed: Mutex<Vec<(OpportunityKind, RegionId)>>,
}

impl RecordingExecutor {
    pub fn kinds(&self) -> Vec<OpportunityKind> {
        self.executed.lock().unwrap().iter().map(|(k, _)| *k).collect()
    }
}

impl ActionExecutor for RecordingExecutor {
    fn execute(&self, _: ParticipantId, opportunity: &Opportunity) -> Result<ActionReport, ExecutionError> {
        self.executed
            .lock()
            .unwrap()
            .push((opportunity.kind, opportunity.target));
        Ok(ActionReport {
            success: true,
            summary: format!("{:?} recorded", opportunity.kind),
            victory_points_awarded: 0,
        })
    }
}

/// Set `participant`'s gold.
pub fn set_gold(sandbox: &SandboxWorld, participant: ParticipantId, amount: u32) {
    sandbox.edit(|w| {
        w.participants
            .get_mut(&participant)
            .unwrap()
            .resources
            .set(Resource::Gold, amount);
    });
}
