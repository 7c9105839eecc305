//! Turn orchestrator.
//!
//! [`TurnOrchestrator::execute_agent_turn`] plays one complete turn for
//! whichever agent the turn driver names:
//!
//! ```text
//! Idle -> Income -> Actions -> Negotiation -> Idle
//! ```
//!
//! Every step re-reads the world through the collaborators, checks that
//! its supervisor epoch is still live, and only then mutates anything. A
//! step that finds its epoch superseded (the health monitor ended the
//! turn) returns without touching the world or the driver. Failures
//! inside a step are recorded in the supervisor's feedback log and cost
//! the action slot, never the turn.
//!
//! No lock is held across an await point. Between steps the orchestrator
//! sleeps for the agent's reaction delay when pacing is on and yields to
//! the runtime otherwise.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use terra_agents::{
    Agent, AgentError, AgentRoster, DifficultyTier, DisputeEvaluator, GameRules, KindWeights,
    NegotiationConfig, OpportunityScorer, StrategicAssessment, StrategicPlanner, Verdict,
    revalidate, select_counterpart,
};
use terra_types::{
    Opportunity, OpportunityKind, Participant, ParticipantId, Proposal, ProposalId,
    ProposalStatus, RegionId, ResourceBundle, TurnPhase, WorldSnapshot,
};
use tracing::{debug, error, info, warn};

use crate::collaborators::{CollaboratorError, Collaborators, ExecutionError, NegotiationDesk};
use crate::config::{EngineConfig, TurnConfig};
use crate::context::TurnContext;
use crate::fault::TurnFault;
use crate::feedback::FeedbackKind;
use crate::supervisor::TurnSupervisor;

/// Errors from the orchestrator's direct entry points.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    /// Agent logic rejected the request.
    #[error("agent error: {source}")]
    Agent {
        /// The underlying agent error.
        #[from]
        source: AgentError,
    },

    /// A collaborator failed.
    #[error("collaborator error: {source}")]
    Collaborator {
        /// The underlying collaborator error.
        #[from]
        source: CollaboratorError,
    },
}

/// What [`TurnOrchestrator::execute_agent_turn`] did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TurnOutcome {
    /// The driver names nobody, a human, or an eliminated participant.
    NotAgentTurn,
    /// Another orchestrated turn is already running.
    Busy,
    /// The turn ran to completion.
    Completed(TurnSummary),
    /// The turn was ended from outside before it finished.
    Aborted {
        /// Whose turn it was.
        participant: ParticipantId,
        /// The superseded epoch.
        epoch: u64,
    },
}

/// How the driver was moved on at the end of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Finalization {
    /// `finish_turn` succeeded.
    Finished,
    /// `finish_turn` failed; `advance_to_next_participant` moved on.
    Advanced(ParticipantId),
    /// Both failed; the index was forced forward.
    Forced(Option<ParticipantId>),
}

/// One executed action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionRecord {
    /// Action kind.
    pub kind: OpportunityKind,
    /// Target region.
    pub target: RegionId,
    /// Whether it had its intended effect.
    pub success: bool,
    /// Executor's description.
    pub summary: String,
}

/// Record of a completed turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnSummary {
    /// Whose turn it was.
    pub participant: ParticipantId,
    /// Supervisor epoch.
    pub epoch: u64,
    /// Income credited at the start of the turn.
    pub income: ResourceBundle,
    /// Actions the executor carried out, in order.
    pub actions: Vec<ActionRecord>,
    /// Action slots lost to failures.
    pub failures: u32,
    /// The agent had nothing to do and ended right after income.
    pub passed: bool,
    /// Inbound proposals answered.
    pub inbound_answered: u32,
    /// Inbound proposals that went through.
    pub inbound_accepted: u32,
    /// Outbound proposal submitted this turn.
    pub outbound: Option<ProposalId>,
    /// Errors recorded during the turn.
    pub errors: u32,
    /// How the driver was moved on.
    pub finalization: Finalization,
}

impl TurnSummary {
    fn new(ctx: &TurnContext) -> Self {
        Self {
            participant: ctx.participant,
            epoch: ctx.epoch,
            income: ResourceBundle::new(),
            actions: Vec::new(),
            failures: 0,
            passed: false,
            inbound_answered: 0,
            inbound_accepted: 0,
            outbound: None,
            errors: 0,
            finalization: Finalization::Finished,
        }
    }
}

/// Marker for a step whose epoch was superseded.
#[derive(Debug)]
struct Superseded;

/// Plays agent turns against the injected collaborators.
pub struct TurnOrchestrator {
    collaborators: Collaborators,
    supervisor: Arc<TurnSupervisor>,
    roster: Mutex<AgentRoster>,
    planner: Mutex<StrategicPlanner>,
    rng: Mutex<SmallRng>,
    rules: GameRules,
    negotiation: NegotiationConfig,
    turn: TurnConfig,
}

impl std::fmt::Debug for TurnOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnOrchestrator")
            .field("collaborators", &self.collaborators)
            .field("turn", &self.turn)
            .finish_non_exhaustive()
    }
}

impl TurnOrchestrator {
    /// Create an orchestrator. Randomness is seeded from `config.game.seed`.
    pub fn new(
        collaborators: Collaborators,
        supervisor: Arc<TurnSupervisor>,
        roster: AgentRoster,
        config: &EngineConfig,
    ) -> Self {
        Self {
            collaborators,
            supervisor,
            roster: Mutex::new(roster),
            planner: Mutex::new(StrategicPlanner::new(config.planner.clone())),
            rng: Mutex::new(SmallRng::seed_from_u64(config.game.seed)),
            rules: config.rules.clone(),
            negotiation: config.negotiation.clone(),
            turn: config.turn.clone(),
        }
    }

    /// The shared turn supervisor.
    pub const fn supervisor(&self) -> &Arc<TurnSupervisor> {
        &self.supervisor
    }

    /// A copy of the agent playing `participant`.
    pub fn agent(&self, participant: ParticipantId) -> Option<Agent> {
        self.roster().get(participant).cloned()
    }

    /// A copy of every agent.
    pub fn agents(&self) -> Vec<Agent> {
        self.roster().iter().cloned().collect()
    }

    /// Latest strategic assessment of `participant`.
    pub fn assessment(&self, participant: ParticipantId) -> Option<StrategicAssessment> {
        self.planner().assessment(participant).cloned()
    }

    // -----------------------------------------------------------------------
    // Direct entry points
    // -----------------------------------------------------------------------

    /// Decide whether the agent a proposal is addressed to accepts it.
    ///
    /// Does not resolve the proposal.
    pub fn evaluate_proposal(&self, proposal: &Proposal) -> Result<Verdict, OrchestratorError> {
        let world = self.collaborators.world.snapshot()?;
        Ok(self.evaluate_against(proposal, &world)?)
    }

    /// Build the proposal `participant`'s agent would send right now.
    ///
    /// Does not submit it.
    pub fn synthesize_proposal(
        &self,
        participant: ParticipantId,
    ) -> Result<Option<Proposal>, OrchestratorError> {
        let world = self.collaborators.world.snapshot()?;
        let roster = self.roster();
        let agent = roster
            .get(participant)
            .ok_or(AgentError::NotAnAgent(participant))?;
        Ok(terra_agents::synthesize_proposal(
            agent,
            &world,
            &self.negotiation,
        )?)
    }

    /// Report the outcome of a proposal resolved outside an orchestrated
    /// turn, such as a human answering an agent's offer.
    ///
    /// Every agent party updates its relationship score and trade history
    /// once; repeated reports of the same proposal are ignored.
    pub fn record_resolution(&self, proposal: &Proposal, accepted: bool) -> Result<(), OrchestratorError> {
        let world = self.collaborators.world.snapshot()?;
        self.remember(proposal, accepted, world.turn);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Turn
    // -----------------------------------------------------------------------

    /// Play the current participant's turn if it is agent-controlled.
    ///
    /// Calling this while another orchestrated turn runs is a no-op that
    /// returns [`TurnOutcome::Busy`].
    pub async fn execute_agent_turn(&self) -> TurnOutcome {
        let Some(participant) = self.collaborators.driver.current_participant() else {
            return TurnOutcome::NotAgentTurn;
        };
        let Some(agent) = self.agent(participant) else {
            return TurnOutcome::NotAgentTurn;
        };
        match self.collaborators.world.participant(participant) {
            Ok(p) if !p.eliminated => {}
            Ok(_) => {
                debug!(participant = %participant, "eliminated participant has no turn");
                return TurnOutcome::NotAgentTurn;
            }
            Err(e) => {
                warn!(participant = %participant, error = %e, "cannot read current participant");
                return TurnOutcome::NotAgentTurn;
            }
        }
        let Some(ticket) = self.supervisor.try_begin(participant) else {
            warn!(participant = %participant, "turn already in progress, ignoring call");
            return TurnOutcome::Busy;
        };

        let mut ctx = TurnContext::new(&ticket);
        let mut summary = TurnSummary::new(&ctx);
        info!(
            participant = %participant,
            epoch = ctx.epoch,
            archetype = ?agent.archetype,
            difficulty = ?agent.difficulty,
            "agent turn started"
        );

        if self.play(&agent, &mut ctx, &mut summary).await.is_err() {
            return Self::aborted(&ctx);
        }
        let Some(finalization) = self.finalize(&mut ctx) else {
            return Self::aborted(&ctx);
        };
        summary.finalization = finalization;
        summary.errors = ctx.recent_errors;
        info!(
            participant = %participant,
            epoch = ctx.epoch,
            actions = summary.actions.len(),
            failures = summary.failures,
            answered = summary.inbound_answered,
            outbound = summary.outbound.is_some(),
            finalization = ?finalization,
            "agent turn completed"
        );
        TurnOutcome::Completed(summary)
    }

    fn aborted(ctx: &TurnContext) -> TurnOutcome {
        info!(
            participant = %ctx.participant,
            epoch = ctx.epoch,
            phase = ?ctx.phase,
            "turn superseded, abandoning remaining steps"
        );
        TurnOutcome::Aborted {
            participant: ctx.participant,
            epoch: ctx.epoch,
        }
    }

    async fn play(
        &self,
        agent: &Agent,
        ctx: &mut TurnContext,
        summary: &mut TurnSummary,
    ) -> Result<(), Superseded> {
        let tier = agent.tier();

        ctx.enter(TurnPhase::Income);
        self.ensure_current(ctx)?;
        match self.collaborators.world.apply_income(ctx.participant) {
            Ok(income) => summary.income = income,
            Err(e) => self.report(ctx, FeedbackKind::Error, format!("income failed: {e}")),
        }
        ctx.grant_actions(self.turn.actions_per_turn);

        let viable = match self.collaborators.world.snapshot() {
            Ok(world) => {
                self.refresh_plan(ctx.participant, &world);
                self.has_possible_action(agent, ctx.participant, &world)
            }
            Err(_) => true,
        };
        if !viable {
            summary.passed = true;
            self.report(
                ctx,
                FeedbackKind::Info,
                String::from("agent skipped turn: no possible action"),
            );
            return Ok(());
        }

        self.pace(tier).await;
        self.run_actions(agent, ctx, summary).await?;
        self.pace(tier).await;
        self.run_negotiation(tier, ctx, summary).await
    }

    // -----------------------------------------------------------------------
    // Actions
    // -----------------------------------------------------------------------

    async fn run_actions(
        &self,
        agent: &Agent,
        ctx: &mut TurnContext,
        summary: &mut TurnSummary,
    ) -> Result<(), Superseded> {
        ctx.enter(TurnPhase::Actions);
        let Some(executor) = self.collaborators.executor.clone() else {
            self.report(
                ctx,
                FeedbackKind::Warning,
                TurnFault::MissingCollaborator("action executor").to_string(),
            );
            return Ok(());
        };
        let tier = agent.tier();

        while ctx.can_act(self.turn.iteration_cap) {
            if ctx.iterations > 0 {
                self.pace(tier).await;
            }
            ctx.tick();
            self.ensure_current(ctx)?;

            let world = match self.collaborators.world.snapshot() {
                Ok(world) => world,
                Err(e) => {
                    self.report(ctx, FeedbackKind::Error, format!("snapshot failed: {e}"));
                    ctx.consume_action();
                    continue;
                }
            };
            let Some(me) = world.participant(ctx.participant) else {
                self.report(
                    ctx,
                    FeedbackKind::Error,
                    format!("participant {} missing from snapshot", ctx.participant),
                );
                ctx.consume_action();
                continue;
            };
            if me.eliminated {
                debug!(participant = %me.id, "eliminated mid-turn");
                break;
            }
            if ctx.actions_remaining <= 1 && self.reserves_trade_slot(agent, me, &world) {
                debug!(participant = %me.id, "keeping last slot for an outbound proposal");
                break;
            }

            let weights = self.weights_for(agent);
            let shortlist = self.shortlist(agent, weights, me, &world);
            if shortlist.is_empty() {
                self.report(
                    ctx,
                    FeedbackKind::Info,
                    String::from("agent skipped action: nothing worth doing"),
                );
                ctx.consume_action();
                break;
            }
            let Some(chosen) = self.first_valid(agent, weights, ctx, &shortlist, &world) else {
                summary.failures = summary.failures.saturating_add(1);
                ctx.consume_action();
                continue;
            };

            self.ensure_current(ctx)?;
            match executor.execute(ctx.participant, &chosen) {
                Ok(report) => {
                    info!(
                        participant = %ctx.participant,
                        kind = ?chosen.kind,
                        target = %chosen.target,
                        priority = chosen.priority,
                        success = report.success,
                        points = report.victory_points_awarded,
                        "{}",
                        report.summary
                    );
                    summary.actions.push(ActionRecord {
                        kind: chosen.kind,
                        target: chosen.target,
                        success: report.success,
                        summary: report.summary,
                    });
                }
                Err(e) => {
                    let (kind, message) = classify_execution(&e);
                    self.report(ctx, kind, message);
                    self.report(
                        ctx,
                        FeedbackKind::Info,
                        String::from("agent skipped action"),
                    );
                    summary.failures = summary.failures.saturating_add(1);
                }
            }
            ctx.consume_action();
        }
        Ok(())
    }

    /// Candidates to try this step, in order: a gated dispute if one
    /// clears the tier, then a window of the scorer's ranking.
    fn shortlist(
        &self,
        agent: &Agent,
        weights: KindWeights,
        me: &Participant,
        world: &WorldSnapshot,
    ) -> Vec<Opportunity> {
        let tier = agent.tier();
        let mut out = Vec::new();
        if let Some(oracle) = &self.collaborators.oracle {
            let evaluator = DisputeEvaluator::new(&self.rules, weights, tier);
            let ranked = evaluator.find_dispute_opportunities(me, world, oracle.as_ref());
            if let Some(best) = evaluator.decide(&ranked) {
                out.push(best.clone());
            }
        }

        let ranked =
            OpportunityScorer::new(&self.rules, agent.archetype, weights).find_opportunities(me, world);
        let skip = usize::from(ranked.len() > 1 && self.misjudges(tier));
        if skip > 0 {
            debug!(participant = %me.id, "accuracy roll missed, passing over the top candidate");
        }
        out.extend(ranked.into_iter().skip(skip).take(tier.planning_depth.max(1)));
        out
    }

    /// The first candidate that survives revalidation against the
    /// participant's current state.
    fn first_valid(
        &self,
        agent: &Agent,
        weights: KindWeights,
        ctx: &mut TurnContext,
        shortlist: &[Opportunity],
        world: &WorldSnapshot,
    ) -> Option<Opportunity> {
        let fresh = match self.collaborators.world.participant(ctx.participant) {
            Ok(fresh) => fresh,
            Err(e) => {
                self.report(ctx, FeedbackKind::Error, format!("participant lookup failed: {e}"));
                return None;
            }
        };
        let evaluator = DisputeEvaluator::new(&self.rules, weights, agent.tier());
        let mut last = None;
        for candidate in shortlist {
            let checked = if candidate.kind == OpportunityKind::Dispute {
                evaluator.revalidate(candidate, &fresh, world)
            } else {
                revalidate(candidate, &fresh, world)
            };
            match checked {
                Ok(()) => return Some(candidate.clone()),
                Err(e) => {
                    debug!(target = %candidate.target, kind = ?candidate.kind, error = %e, "candidate went stale");
                    last = Some(e);
                }
            }
        }
        if let Some(e) = last {
            let fault = if e.is_unaffordable() {
                TurnFault::UnaffordableAction(e.to_string())
            } else {
                TurnFault::InvalidOpportunity(e.to_string())
            };
            self.report(ctx, FeedbackKind::Warning, fault.to_string());
        }
        None
    }

    fn misjudges(&self, tier: &DifficultyTier) -> bool {
        let roll: f64 = self.rng().random();
        roll >= tier.decision_accuracy
    }

    /// Whether the last action slot should be kept for an outbound
    /// proposal: only when one could actually be sent.
    fn reserves_trade_slot(&self, agent: &Agent, me: &Participant, world: &WorldSnapshot) -> bool {
        self.turn.reserve_trade_slot
            && self.turn.actions_per_turn > 1
            && self.collaborators.desk.is_some()
            && self.holds_currency(me)
            && select_counterpart(agent, me, world, &self.negotiation).is_some()
    }

    fn holds_currency(&self, me: &Participant) -> bool {
        me.resources.get(self.negotiation.trade_currency) >= self.negotiation.min_trade_unit.max(1)
    }

    fn weights_for(&self, agent: &Agent) -> KindWeights {
        let bias = self.planner().bias(agent.participant_id);
        agent.weights().scaled_by(&bias)
    }

    fn refresh_plan(&self, participant: ParticipantId, world: &WorldSnapshot) {
        if let Some(me) = world.participant(participant) {
            self.planner().refresh(me, world);
        }
    }

    fn has_possible_action(&self, agent: &Agent, participant: ParticipantId, world: &WorldSnapshot) -> bool {
        let Some(me) = world.participant(participant) else {
            return false;
        };
        let weights = self.weights_for(agent);
        let scorer = OpportunityScorer::new(&self.rules, agent.archetype, weights);
        if !scorer.find_opportunities(me, world).is_empty() {
            return true;
        }
        if let Some(oracle) = &self.collaborators.oracle {
            let evaluator = DisputeEvaluator::new(&self.rules, weights, agent.tier());
            let ranked = evaluator.find_dispute_opportunities(me, world, oracle.as_ref());
            if evaluator.decide(&ranked).is_some() {
                return true;
            }
        }
        let Some(desk) = &self.collaborators.desk else {
            return false;
        };
        if desk.pending_for(participant).is_ok_and(|p| !p.is_empty()) {
            return true;
        }
        self.holds_currency(me) && select_counterpart(agent, me, world, &self.negotiation).is_some()
    }

    // -----------------------------------------------------------------------
    // Negotiation
    // -----------------------------------------------------------------------

    async fn run_negotiation(
        &self,
        tier: &DifficultyTier,
        ctx: &mut TurnContext,
        summary: &mut TurnSummary,
    ) -> Result<(), Superseded> {
        ctx.enter(TurnPhase::Negotiation);
        let Some(desk) = self.collaborators.desk.clone() else {
            self.report(
                ctx,
                FeedbackKind::Warning,
                TurnFault::MissingCollaborator("negotiation desk").to_string(),
            );
            return Ok(());
        };
        self.ensure_current(ctx)?;
        self.reconcile_outbound(desk.as_ref(), ctx);

        let inbound = match desk.pending_for(ctx.participant) {
            Ok(inbound) => inbound,
            Err(e) => {
                self.report(ctx, desk_severity(&e), format!("pending proposals unavailable: {e}"));
                Vec::new()
            }
        };
        for proposal in &inbound {
            self.pace(tier).await;
            self.ensure_current(ctx)?;
            self.answer(desk.as_ref(), ctx, summary, proposal);
        }

        if ctx.actions_remaining == 0 {
            return Ok(());
        }
        self.pace(tier).await;
        self.ensure_current(ctx)?;
        self.send_outbound(desk.as_ref(), ctx, summary);
        Ok(())
    }

    fn answer(
        &self,
        desk: &dyn NegotiationDesk,
        ctx: &mut TurnContext,
        summary: &mut TurnSummary,
        proposal: &Proposal,
    ) {
        let world = match self.collaborators.world.snapshot() {
            Ok(world) => world,
            Err(e) => {
                self.report(ctx, FeedbackKind::Error, format!("snapshot failed: {e}"));
                return;
            }
        };
        let accept = match self.evaluate_against(proposal, &world) {
            Ok(verdict) => {
                debug!(
                    proposal = %proposal.id,
                    accept = verdict.accept,
                    net = verdict.net_value,
                    reason = ?verdict.reason,
                    "verdict"
                );
                verdict.accept
            }
            Err(e) => {
                self.report(
                    ctx,
                    FeedbackKind::Warning,
                    format!("proposal {} declined unevaluated: {e}", proposal.id),
                );
                false
            }
        };
        match desk.resolve(proposal.id, accept) {
            Ok(resolution) => {
                summary.inbound_answered = summary.inbound_answered.saturating_add(1);
                if resolution.accepted() {
                    summary.inbound_accepted = summary.inbound_accepted.saturating_add(1);
                } else if accept {
                    debug!(proposal = %proposal.id, note = ?resolution.note, "accept did not go through");
                }
                info!(
                    proposal = %proposal.id,
                    initiator = %proposal.initiator,
                    responder = %proposal.target,
                    status = ?resolution.status,
                    "proposal resolved"
                );
                self.remember(proposal, resolution.accepted(), world.turn);
            }
            Err(e) => self.report(ctx, desk_severity(&e), format!("resolve failed: {e}")),
        }
    }

    fn send_outbound(&self, desk: &dyn NegotiationDesk, ctx: &mut TurnContext, summary: &mut TurnSummary) {
        let world = match self.collaborators.world.snapshot() {
            Ok(world) => world,
            Err(e) => {
                self.report(ctx, FeedbackKind::Error, format!("snapshot failed: {e}"));
                return;
            }
        };
        let Some(me) = world.participant(ctx.participant) else {
            return;
        };
        if !self.holds_currency(me) {
            debug!(participant = %me.id, "no trade currency, not proposing");
            return;
        }
        let synthesized = {
            let roster = self.roster();
            roster
                .get(ctx.participant)
                .ok_or(AgentError::NotAnAgent(ctx.participant))
                .and_then(|agent| terra_agents::synthesize_proposal(agent, &world, &self.negotiation))
        };
        match synthesized {
            Ok(Some(proposal)) => {
                let id = proposal.id;
                let target = proposal.target;
                match desk.submit(proposal) {
                    Ok(()) => {
                        ctx.consume_action();
                        summary.outbound = Some(id);
                        info!(proposal = %id, initiator = %ctx.participant, target = %target, "proposal submitted");
                    }
                    Err(e) => self.report(ctx, desk_severity(&e), format!("submit failed: {e}")),
                }
            }
            Ok(None) => debug!(participant = %ctx.participant, "no outbound proposal"),
            Err(e) => self.report(ctx, FeedbackKind::Warning, format!("proposal not built: {e}")),
        }
    }

    fn evaluate_against(&self, proposal: &Proposal, world: &WorldSnapshot) -> Result<Verdict, AgentError> {
        let roster = self.roster();
        let agent = roster
            .get(proposal.target)
            .ok_or(AgentError::NotAnAgent(proposal.target))?;
        let mut rng = self.rng();
        terra_agents::evaluate_proposal(agent, proposal, world, &self.negotiation, &mut *rng)
    }

    /// Learn how this agent's earlier outbound proposals were answered
    /// when someone other than the orchestrator resolved them.
    fn reconcile_outbound(&self, desk: &dyn NegotiationDesk, ctx: &mut TurnContext) {
        let resolved = match desk.resolved_from(ctx.participant) {
            Ok(resolved) => resolved,
            Err(e) => {
                self.report(ctx, desk_severity(&e), format!("resolved proposals unavailable: {e}"));
                return;
            }
        };
        let turn = self
            .collaborators
            .world
            .snapshot()
            .map_or(0, |world| world.turn);
        for proposal in &resolved {
            self.remember(proposal, proposal.status == ProposalStatus::Accepted, turn);
        }
    }

    /// Update relationship memory and trade history of every agent party
    /// that has not already recorded `proposal`.
    fn remember(&self, proposal: &Proposal, accepted: bool, turn: u32) {
        let mut roster = self.roster();
        for party in [proposal.initiator, proposal.target] {
            if let Some(agent) = roster.get_mut(party) {
                if agent.trade_history.iter().any(|r| r.proposal_id == proposal.id) {
                    continue;
                }
                if let Err(e) = agent.record_resolution(proposal, accepted, turn, &self.negotiation) {
                    warn!(agent = %party, error = %e, "relationship not updated");
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Plumbing
    // -----------------------------------------------------------------------

    /// End the turn and move the driver on. `None` if the turn was
    /// already ended from outside.
    fn finalize(&self, ctx: &mut TurnContext) -> Option<Finalization> {
        ctx.enter(TurnPhase::Idle);
        if !self.supervisor.end(ctx.epoch) {
            return None;
        }
        let driver = &self.collaborators.driver;
        let finalization = match driver.finish_turn(ctx.participant) {
            Ok(()) => Finalization::Finished,
            Err(e) => {
                warn!(participant = %ctx.participant, error = %e, "finish_turn failed, advancing");
                match driver.advance_to_next_participant() {
                    Ok(next) => Finalization::Advanced(next),
                    Err(e) => {
                        error!(participant = %ctx.participant, error = %e, "advance failed, forcing index");
                        Finalization::Forced(driver.force_advance_index())
                    }
                }
            }
        };
        Some(finalization)
    }

    fn ensure_current(&self, ctx: &TurnContext) -> Result<(), Superseded> {
        if self.supervisor.is_current(ctx.epoch) {
            Ok(())
        } else {
            debug!(epoch = ctx.epoch, phase = ?ctx.phase, "stale step dropped");
            Err(Superseded)
        }
    }

    fn report(&self, ctx: &mut TurnContext, kind: FeedbackKind, message: String) {
        if kind == FeedbackKind::Error {
            ctx.note_error();
        }
        self.supervisor
            .record(ctx.epoch, Some(ctx.participant), kind, message);
    }

    async fn pace(&self, tier: &DifficultyTier) {
        if self.turn.pacing && tier.reaction_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(tier.reaction_delay_ms)).await;
        } else {
            tokio::task::yield_now().await;
        }
    }

    fn roster(&self) -> MutexGuard<'_, AgentRoster> {
        self.roster.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn planner(&self) -> MutexGuard<'_, StrategicPlanner> {
        self.planner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn rng(&self) -> MutexGuard<'_, SmallRng> {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Feedback severity and message for an executor failure. Only internal
/// failures count toward the repeated-failure threshold.
fn classify_execution(error: &ExecutionError) -> (FeedbackKind, String) {
    let fault = match error {
        ExecutionError::Unaffordable { .. } => TurnFault::UnaffordableAction(error.to_string()),
        ExecutionError::Illegal(reason) => TurnFault::InvalidOpportunity(reason.clone()),
        ExecutionError::Unsupported(_) => TurnFault::MissingCollaborator("action executor"),
        ExecutionError::Internal(_) => return (FeedbackKind::Error, error.to_string()),
    };
    (FeedbackKind::Warning, format!("{fault} ({error})"))
}

const fn desk_severity(error: &CollaboratorError) -> FeedbackKind {
    match error {
        CollaboratorError::Internal(_) => FeedbackKind::Error,
        _ => FeedbackKind::Warning,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use terra_types::Resource;

    #[test]
    fn only_internal_executor_failures_are_errors() {
        let (kind, _) = classify_execution(&ExecutionError::Internal(String::from("db down")));
        assert_eq!(kind, FeedbackKind::Error);
        let (kind, message) = classify_execution(&ExecutionError::Unaffordable {
            resource: Resource::Gold,
            needed: 2,
            available: 0,
        });
        assert_eq!(kind, FeedbackKind::Warning);
        assert!(message.starts_with("unaffordable action"));
        let (kind, message) = classify_execution(&ExecutionError::Unsupported(OpportunityKind::Dispute));
        assert_eq!(kind, FeedbackKind::Warning);
        assert!(message.starts_with("missing collaborator"));
    }

    #[test]
    fn desk_rejections_are_warnings() {
        assert_eq!(
            desk_severity(&CollaboratorError::Stale(String::new())),
            FeedbackKind::Warning
        );
        assert_eq!(
            desk_severity(&CollaboratorError::Internal(String::new())),
            FeedbackKind::Error
        );
    }
}
