//! Self-play binary for the Terra agent engine.
//!
//! Wires the orchestrator to the in-memory sandbox and plays a full game
//! between the configured seats. Seats without an archetype are human
//! and pass their turns.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `terra-config.yaml`
//! 3. Generate the seeded board
//! 4. Assemble the agent roster
//! 5. Spawn the health monitor
//! 6. Play `game.rounds` rounds
//! 7. Log the standings

mod error;
mod map;

use std::path::Path;
use std::sync::Arc;

use terra_agents::{Agent, AgentRoster};
use terra_core::{
    EngineConfig, HealthMonitor, ParticipantConfig, SandboxWorld, SystemClock, TurnDriver,
    TurnOrchestrator, TurnOutcome, TurnSupervisor,
};
use terra_types::ParticipantId;
use tokio::sync::Notify;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, board generation, or the turn
/// driver fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("terra-engine starting");

    // 2. Load configuration.
    let config = load_config()?;
    info!(
        seed = config.game.seed,
        rounds = config.game.rounds,
        grid_width = config.game.grid_width,
        grid_height = config.game.grid_height,
        seats = config.participants.len(),
        "Configuration loaded"
    );

    // 3. Generate the board.
    let world = map::generate_world(&config.game, &config.participants)?;

    // 4. Assemble the roster.
    let roster = build_roster(&config.participants)?;
    info!(
        agents = roster.len(),
        humans = config.participants.len().saturating_sub(roster.len()),
        "Roster assembled"
    );

    let sandbox = Arc::new(SandboxWorld::new(
        world,
        config.rules.clone(),
        config.game.seed,
    ));
    let supervisor = Arc::new(TurnSupervisor::new(
        Arc::new(SystemClock),
        config.turn.feedback_capacity,
    ));
    let orchestrator = TurnOrchestrator::new(
        sandbox.collaborators(),
        Arc::clone(&supervisor),
        roster,
        &config,
    );

    // 5. Spawn the health monitor.
    let shutdown = Arc::new(Notify::new());
    let monitor = Arc::new(HealthMonitor::new(
        Arc::clone(&supervisor),
        Arc::clone(&sandbox) as Arc<dyn TurnDriver>,
        config.health,
    ));
    let monitor_handle = monitor.spawn(Arc::clone(&shutdown));

    // 6. Play.
    let played = play(&orchestrator, &sandbox, &config).await;

    shutdown.notify_one();
    monitor_handle.await?;
    let played = played?;

    // 7. Log the standings.
    log_standings(&sandbox, &orchestrator);

    info!(
        turns = played,
        forced_terminations = supervisor.forced_terminations(),
        "terra-engine shutdown complete"
    );
    Ok(())
}

/// Load configuration from `terra-config.yaml` in the working directory,
/// falling back to defaults when the file is absent.
fn load_config() -> Result<EngineConfig, EngineError> {
    let config_path = Path::new("terra-config.yaml");
    if config_path.exists() {
        Ok(EngineConfig::from_file(config_path)?)
    } else {
        info!("Config file not found, using defaults");
        let mut config = EngineConfig::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }
}

/// One agent per seat that names an archetype. Seat `i` is
/// `ParticipantId(i)`, matching the board.
fn build_roster(seats: &[ParticipantConfig]) -> Result<AgentRoster, EngineError> {
    let mut roster = AgentRoster::new();
    for (seat, index) in seats.iter().zip(0_u32..) {
        if let Some(archetype) = seat.archetype {
            roster.register(Agent::new(ParticipantId(index), archetype, seat.difficulty))?;
        }
    }
    Ok(roster)
}

/// Play every seat's turn for `game.rounds` rounds, or until one
/// participant is left. Returns the number of turns played.
async fn play(
    orchestrator: &TurnOrchestrator,
    sandbox: &SandboxWorld,
    config: &EngineConfig,
) -> Result<u32, EngineError> {
    let mut played = 0_u32;
    for round in 1..=config.game.rounds {
        for _ in 0..config.participants.len() {
            if sandbox.world().active_participants().count() < 2 {
                info!(round, "one participant left standing");
                return Ok(played);
            }
            match orchestrator.execute_agent_turn().await {
                TurnOutcome::Completed(summary) => debug!(
                    participant = %summary.participant,
                    actions = summary.actions.len(),
                    failures = summary.failures,
                    passed = summary.passed,
                    "turn played"
                ),
                TurnOutcome::Aborted { participant, epoch } => {
                    warn!(participant = %participant, epoch, "turn ended by health monitor");
                }
                TurnOutcome::Busy => warn!("turn slot busy, skipping"),
                TurnOutcome::NotAgentTurn => pass_turn(sandbox)?,
            }
            played = played.saturating_add(1);
        }
        info!(round, turn = sandbox.world().turn, "round complete");
    }
    Ok(played)
}

/// Human seats have no input in self-play; their turns pass untouched.
fn pass_turn(sandbox: &SandboxWorld) -> Result<(), EngineError> {
    let Some(current) = sandbox.current_participant() else {
        return Ok(());
    };
    debug!(participant = %current, "passing turn");
    sandbox.finish_turn(current)?;
    Ok(())
}

fn log_standings(sandbox: &SandboxWorld, orchestrator: &TurnOrchestrator) {
    let world = sandbox.world();
    let mut standings: Vec<_> = world.participants.values().collect();
    standings.sort_by(|a, b| {
        b.victory_points
            .cmp(&a.victory_points)
            .then(b.regions.len().cmp(&a.regions.len()))
            .then(a.id.cmp(&b.id))
    });
    for (p, rank) in standings.into_iter().zip(1_u32..) {
        let agent = orchestrator.agent(p.id);
        info!(
            rank,
            name = p.name,
            victory_points = p.victory_points,
            regions = p.regions.len(),
            resources = p.total_resources(),
            eliminated = p.eliminated,
            archetype = ?agent.as_ref().map(|a| a.archetype),
            trades = agent.as_ref().map_or(0, |a| a.trade_history.len()),
            "standing"
        );
    }
}
