//! In-memory collaborators.
//!
//! [`SandboxWorld`] implements every collaborator trait over one
//! [`WorldSnapshot`] kept behind a mutex. It is the reference rule set
//! the demo binary plays on and the world the integration tests drive:
//!
//! - income: one unit of the biome's resource per owned region, plus the
//!   income of every structure standing in those regions
//! - execution: revalidate, pay (clamped at zero), apply the effect
//! - disputes: cost and odds from [`sandbox_dispute_cost`] and
//!   [`sandbox_success_chance`], rolled on the sandbox's seeded RNG
//! - trades: revalidate both sides at acceptance, transfer, check that
//!   nothing was created or destroyed, award the initiator a point
//! - turns: round robin over live participants; the global turn number
//!   advances when the order wraps

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use terra_agents::{AgentError, DisputeOracle, GameRules, revalidate};
use terra_types::{
    ActionCost, Biome, Opportunity, OpportunityKind, Participant, ParticipantId, Proposal,
    ProposalId, ProposalStatus, Region, Resource, ResourceBundle, TradeTerms, WorldSnapshot,
};
use tracing::{debug, info, warn};

use crate::collaborators::{
    ActionExecutor, ActionReport, CollaboratorError, Collaborators, ExecutionError,
    NegotiationDesk, Resolution, TurnDriver, WorldState,
};

/// Victory points an initiator earns for a completed trade.
pub const TRADE_VICTORY_POINTS: u32 = 1;

/// Bounds of the sandbox dispute odds.
const MIN_CHANCE: f64 = 0.05;
const MAX_CHANCE: f64 = 0.95;

/// Strength a region adds in a dispute, in resource units.
const REGION_STRENGTH: u64 = 5;

#[derive(Debug)]
struct SandboxState {
    world: WorldSnapshot,
    proposals: Vec<Proposal>,
    order: Vec<ParticipantId>,
    cursor: usize,
    advances: u64,
    rng: SmallRng,
}

/// A complete in-memory game behind the collaborator traits.
#[derive(Debug)]
pub struct SandboxWorld {
    state: Mutex<SandboxState>,
    rules: GameRules,
}

impl SandboxWorld {
    /// Wrap `world`. Turn order is ascending participant id, starting
    /// with the lowest.
    pub fn new(world: WorldSnapshot, rules: GameRules, seed: u64) -> Self {
        let order = world.participants.keys().copied().collect();
        Self {
            state: Mutex::new(SandboxState {
                world,
                proposals: Vec::new(),
                order,
                cursor: 0,
                advances: 0,
                rng: SmallRng::seed_from_u64(seed),
            }),
            rules,
        }
    }

    /// Every collaborator backed by this sandbox.
    pub fn collaborators(self: &Arc<Self>) -> Collaborators {
        Collaborators::new(self.clone(), self.clone())
            .with_executor(self.clone())
            .with_oracle(self.clone())
            .with_desk(self.clone())
    }

    /// Times the turn index has moved.
    pub fn advances(&self) -> u64 {
        self.state().advances
    }

    /// Every proposal ever submitted, oldest first.
    pub fn proposals(&self) -> Vec<Proposal> {
        self.state().proposals.clone()
    }

    /// Current copy of the world.
    pub fn world(&self) -> WorldSnapshot {
        self.state().world.clone()
    }

    /// Apply `edit` to the world directly. For setting up scenarios.
    pub fn edit<F: FnOnce(&mut WorldSnapshot)>(&self, edit: F) {
        edit(&mut self.state().world);
    }

    fn state(&self) -> MutexGuard<'_, SandboxState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Resource a biome yields as base income, if any.
pub const fn biome_resource(biome: Biome) -> Option<Resource> {
    match biome {
        Biome::Forest => Some(Resource::Wood),
        Biome::Mountain => Some(Resource::Stone),
        Biome::Plains | Biome::Swamp | Biome::Lake => Some(Resource::Water),
        Biome::Desert => None,
    }
}

/// Odds of `attacker` taking `region` from `defender`: attacker strength
/// over combined strength, where strength is held resources plus a flat
/// amount per region. Each defending structure shaves five points.
pub fn sandbox_success_chance(attacker: &Participant, defender: &Participant, region: &Region) -> f64 {
    let strength = |p: &Participant| {
        let regions = u64::try_from(p.regions.len()).unwrap_or(u64::MAX);
        p.total_resources()
            .saturating_add(regions.saturating_mul(REGION_STRENGTH))
    };
    let a = strength(attacker);
    let d = strength(defender);
    let total = a.saturating_add(d);
    if total == 0 {
        return MIN_CHANCE;
    }
    let raw = units(a) / units(total);
    let fortification = f64::from(u32::try_from(region.structures.len()).unwrap_or(u32::MAX)) * 0.05;
    (raw - fortification).clamp(MIN_CHANCE, MAX_CHANCE)
}

#[allow(clippy::cast_precision_loss)]
const fn units(value: u64) -> f64 {
    value as f64
}

// ---------------------------------------------------------------------------
// World state
// ---------------------------------------------------------------------------

impl WorldState for SandboxWorld {
    fn snapshot(&self) -> Result<WorldSnapshot, CollaboratorError> {
        Ok(self.world())
    }

    fn participant(&self, id: ParticipantId) -> Result<Participant, CollaboratorError> {
        self.state()
            .world
            .participant(id)
            .cloned()
            .ok_or(CollaboratorError::UnknownParticipant(id))
    }

    fn apply_income(&self, id: ParticipantId) -> Result<ResourceBundle, CollaboratorError> {
        let mut state = self.state();
        let world = &mut state.world;
        let owner = world
            .participant(id)
            .ok_or(CollaboratorError::UnknownParticipant(id))?;

        let mut income = ResourceBundle::new();
        for region in world.owned_regions(owner) {
            if let Some(resource) = biome_resource(region.biome) {
                income.add(resource, 1);
            }
            for structure in &region.structures {
                if let Some(spec) = self.rules.structure(*structure) {
                    income.add_bundle(&spec.income);
                }
            }
        }
        if let Some(p) = world.participants.get_mut(&id) {
            p.resources.add_bundle(&income);
        }
        debug!(participant = %id, income = ?income, "income applied");
        Ok(income)
    }
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

impl ActionExecutor for SandboxWorld {
    fn execute(
        &self,
        actor: ParticipantId,
        opportunity: &Opportunity,
    ) -> Result<ActionReport, ExecutionError> {
        let mut state = self.state();
        let SandboxState { world, rng, .. } = &mut *state;

        let participant = world
            .participant(actor)
            .ok_or_else(|| ExecutionError::Illegal(format!("unknown participant {actor}")))?;
        revalidate(opportunity, participant, world).map_err(|e| match e {
            AgentError::UnaffordableResources {
                resource,
                needed,
                available,
            } => ExecutionError::Unaffordable {
                resource,
                needed,
                available,
            },
            other => ExecutionError::Illegal(other.to_string()),
        })?;

        // Disputes pay the cost the oracle quotes now, not the quoted one.
        let (cost, chance) = if opportunity.kind == OpportunityKind::Dispute {
            let region = world
                .region(opportunity.target)
                .ok_or_else(|| ExecutionError::Illegal(format!("unknown region {}", opportunity.target)))?;
            let defender = region
                .controller
                .and_then(|id| world.participant(id))
                .ok_or_else(|| ExecutionError::Illegal(String::from("region has no defender")))?;
            let cost = sandbox_dispute_cost(region);
            if !cost.affordable_by(participant) {
                return Err(ExecutionError::Illegal(String::from("dispute cost rose")));
            }
            (cost, sandbox_success_chance(participant, defender, region))
        } else {
            (opportunity.cost.clone(), 0.0)
        };

        let target = opportunity.target;
        pay(world, actor, &cost);

        let report = match opportunity.kind {
            OpportunityKind::Claim => {
                set_controller(world, target, actor);
                report(true, format!("claimed region {target}"), 0)
            }
            OpportunityKind::Explore => {
                let level = world.regions.get_mut(&target).map_or(0, |region| {
                    region.exploration_level = region
                        .exploration_level
                        .saturating_add(1)
                        .min(terra_types::MAX_EXPLORATION_LEVEL);
                    region.exploration_level
                });
                report(true, format!("explored region {target} to level {level}"), 0)
            }
            OpportunityKind::Collect => {
                let harvest: ResourceBundle = world
                    .region(target)
                    .map(|region| {
                        let level = u32::from(region.exploration_level);
                        region
                            .resources
                            .iter()
                            .map(|(resource, amount)| (resource, amount.saturating_mul(level)))
                            .collect()
                    })
                    .unwrap_or_default();
                if let Some(p) = world.participants.get_mut(&actor) {
                    p.resources.add_bundle(&harvest);
                }
                report(true, format!("collected {} units from region {target}", harvest.total()), 0)
            }
            OpportunityKind::Build => {
                let structure = opportunity
                    .detail
                    .structure
                    .ok_or_else(|| ExecutionError::Illegal(String::from("no structure named")))?;
                let points = self.rules.structure(structure).map_or(0, |s| s.victory_points);
                if let Some(region) = world.regions.get_mut(&target) {
                    region.structures.insert(structure);
                }
                award(world, actor, points);
                report(true, format!("built {structure:?} in region {target}"), points)
            }
            OpportunityKind::Dispute => {
                let roll: f64 = rng.random();
                if roll < chance {
                    let loser = world.region(target).and_then(|r| r.controller);
                    set_controller(world, target, actor);
                    if let Some(loser) = loser {
                        eliminate_if_landless(world, loser);
                    }
                    report(true, format!("won region {target} ({:.0}% odds)", chance * 100.0), 0)
                } else {
                    report(false, format!("lost the dispute for region {target}"), 0)
                }
            }
        };
        Ok(report)
    }
}

fn report(success: bool, summary: String, victory_points_awarded: u32) -> ActionReport {
    ActionReport {
        success,
        summary,
        victory_points_awarded,
    }
}

fn pay(world: &mut WorldSnapshot, actor: ParticipantId, cost: &ActionCost) {
    if let Some(p) = world.participants.get_mut(&actor) {
        p.resources.saturating_sub_bundle(&cost.resources);
        p.victory_points = p.victory_points.saturating_sub(cost.victory_points);
    }
}

fn award(world: &mut WorldSnapshot, actor: ParticipantId, points: u32) {
    if let Some(p) = world.participants.get_mut(&actor) {
        p.victory_points = p.victory_points.saturating_add(points);
    }
}

/// Move `region` to `owner`, updating both participants' region sets.
fn set_controller(world: &mut WorldSnapshot, region: terra_types::RegionId, owner: ParticipantId) {
    let previous = world
        .regions
        .get_mut(&region)
        .and_then(|r| r.controller.replace(owner));
    if let Some(previous) = previous.and_then(|id| world.participants.get_mut(&id)) {
        previous.regions.remove(&region);
    }
    if let Some(p) = world.participants.get_mut(&owner) {
        p.regions.insert(region);
    }
}

fn eliminate_if_landless(world: &mut WorldSnapshot, id: ParticipantId) {
    if let Some(p) = world.participants.get_mut(&id) {
        if p.regions.is_empty() && !p.eliminated {
            p.eliminated = true;
            info!(participant = %id, name = %p.name, "participant eliminated");
        }
    }
}

// ---------------------------------------------------------------------------
// Disputes
// ---------------------------------------------------------------------------

/// Cost of contesting `region`: two wood, one gold, a victory point,
/// and a stone per structure standing in it.
pub fn sandbox_dispute_cost(region: &Region) -> ActionCost {
    let mut resources = ResourceBundle::from([(Resource::Wood, 2), (Resource::Gold, 1)]);
    let structures = u32::try_from(region.structures.len()).unwrap_or(u32::MAX);
    resources.add(Resource::Stone, structures);
    ActionCost {
        resources,
        victory_points: 1,
    }
}

impl DisputeOracle for SandboxWorld {
    fn dispute_cost(&self, _attacker: &Participant, region: &Region) -> ActionCost {
        sandbox_dispute_cost(region)
    }

    fn success_chance(&self, attacker: &Participant, defender: &Participant, region: &Region) -> f64 {
        sandbox_success_chance(attacker, defender, region)
    }
}

// ---------------------------------------------------------------------------
// Negotiation
// ---------------------------------------------------------------------------

impl NegotiationDesk for SandboxWorld {
    fn pending_for(&self, participant: ParticipantId) -> Result<Vec<Proposal>, CollaboratorError> {
        Ok(self
            .state()
            .proposals
            .iter()
            .filter(|p| p.target == participant && p.status == ProposalStatus::Pending)
            .cloned()
            .collect())
    }

    fn resolved_from(&self, initiator: ParticipantId) -> Result<Vec<Proposal>, CollaboratorError> {
        Ok(self
            .state()
            .proposals
            .iter()
            .filter(|p| p.initiator == initiator && p.status != ProposalStatus::Pending)
            .cloned()
            .collect())
    }

    fn submit(&self, proposal: Proposal) -> Result<(), CollaboratorError> {
        let mut state = self.state();
        if proposal.initiator == proposal.target {
            return Err(CollaboratorError::Rejected(String::from("proposal to self")));
        }
        if proposal.status != ProposalStatus::Pending {
            return Err(CollaboratorError::Rejected(String::from("proposal not pending")));
        }
        for party in [proposal.initiator, proposal.target] {
            if state.world.participant(party).is_none() {
                return Err(CollaboratorError::UnknownParticipant(party));
            }
        }
        if state.proposals.iter().any(|p| p.id == proposal.id) {
            return Err(CollaboratorError::Rejected(format!("duplicate proposal {}", proposal.id)));
        }
        debug!(proposal = %proposal.id, initiator = %proposal.initiator, target = %proposal.target, "proposal queued");
        state.proposals.push(proposal);
        Ok(())
    }

    fn resolve(&self, id: ProposalId, accept: bool) -> Result<Resolution, CollaboratorError> {
        let mut state = self.state();
        let SandboxState { world, proposals, .. } = &mut *state;
        let proposal = proposals
            .iter_mut()
            .find(|p| p.id == id && p.status == ProposalStatus::Pending)
            .ok_or(CollaboratorError::UnknownProposal(id))?;

        let mut resolution = Resolution {
            proposal_id: id,
            status: ProposalStatus::Rejected,
            note: None,
            victory_points_awarded: 0,
        };
        if accept {
            match execute_trade(world, proposal) {
                Ok(()) => {
                    award(world, proposal.initiator, TRADE_VICTORY_POINTS);
                    resolution.status = ProposalStatus::Accepted;
                    resolution.victory_points_awarded = TRADE_VICTORY_POINTS;
                }
                Err(CollaboratorError::Stale(reason)) => {
                    warn!(proposal = %id, %reason, "accepted proposal no longer deliverable");
                    resolution.note = Some(reason);
                }
                Err(other) => return Err(other),
            }
        }
        proposal.status = resolution.status;
        Ok(resolution)
    }
}

/// Revalidate and carry out both sides of `proposal`.
fn execute_trade(world: &mut WorldSnapshot, proposal: &Proposal) -> Result<(), CollaboratorError> {
    let stale = |reason: &str| Err(CollaboratorError::Stale(reason.to_owned()));
    let (Some(initiator), Some(target)) = (
        world.participant(proposal.initiator),
        world.participant(proposal.target),
    ) else {
        return stale("a party has left the game");
    };
    if initiator.eliminated || target.eliminated {
        return stale("a party has been eliminated");
    }
    if !proposal.offer.deliverable_by(initiator) {
        return stale("initiator can no longer deliver the offer");
    }
    if !proposal.request.deliverable_by(target) {
        return stale("target can no longer deliver the request");
    }

    let before = combined_holdings(world, proposal);
    transfer(world, proposal.initiator, proposal.target, &proposal.offer);
    transfer(world, proposal.target, proposal.initiator, &proposal.request);
    let after = combined_holdings(world, proposal);
    if before != after {
        return Err(CollaboratorError::Internal(format!(
            "trade {} did not conserve holdings",
            proposal.id
        )));
    }
    Ok(())
}

fn transfer(world: &mut WorldSnapshot, from: ParticipantId, to: ParticipantId, terms: &TradeTerms) {
    if let Some(giver) = world.participants.get_mut(&from) {
        giver.resources.saturating_sub_bundle(&terms.resources);
    }
    if let Some(taker) = world.participants.get_mut(&to) {
        taker.resources.add_bundle(&terms.resources);
    }
    for region in &terms.regions {
        set_controller(world, *region, to);
    }
}

/// Resources and region count of both parties together.
fn combined_holdings(world: &WorldSnapshot, proposal: &Proposal) -> (BTreeMap<Resource, u32>, usize) {
    let mut total = BTreeMap::new();
    let mut regions = 0_usize;
    for id in [proposal.initiator, proposal.target] {
        if let Some(p) = world.participant(id) {
            for (resource, amount) in p.resources.iter() {
                let slot = total.entry(resource).or_insert(0_u32);
                *slot = slot.saturating_add(amount);
            }
            regions = regions.saturating_add(p.regions.len());
        }
    }
    (total, regions)
}

// ---------------------------------------------------------------------------
// Turn order
// ---------------------------------------------------------------------------

impl SandboxState {
    fn current(&self) -> Option<ParticipantId> {
        self.order.get(self.cursor).copied()
    }

    fn step(&mut self) -> Option<ParticipantId> {
        if self.order.is_empty() {
            return None;
        }
        let next = self.cursor.saturating_add(1);
        if next >= self.order.len() {
            self.cursor = 0;
            self.world.turn = self.world.turn.saturating_add(1);
        } else {
            self.cursor = next;
        }
        self.advances = self.advances.saturating_add(1);
        self.current()
    }

    fn is_live(&self, id: ParticipantId) -> bool {
        self.world.participant(id).is_some_and(|p| !p.eliminated)
    }

    fn advance_live(&mut self) -> Result<ParticipantId, CollaboratorError> {
        for _ in 0..self.order.len() {
            if let Some(next) = self.step() {
                if self.is_live(next) {
                    return Ok(next);
                }
            }
        }
        Err(CollaboratorError::Internal(String::from("no live participant")))
    }
}

impl TurnDriver for SandboxWorld {
    fn current_participant(&self) -> Option<ParticipantId> {
        self.state().current()
    }

    fn finish_turn(&self, participant: ParticipantId) -> Result<(), CollaboratorError> {
        let mut state = self.state();
        if state.current() != Some(participant) {
            return Err(CollaboratorError::Stale(format!(
                "participant {participant} is not on turn"
            )));
        }
        let next = state.advance_live()?;
        debug!(finished = %participant, next = %next, turn = state.world.turn, "turn passed");
        Ok(())
    }

    fn advance_to_next_participant(&self) -> Result<ParticipantId, CollaboratorError> {
        self.state().advance_live()
    }

    fn force_advance_index(&self) -> Option<ParticipantId> {
        self.state().step()
    }
}
