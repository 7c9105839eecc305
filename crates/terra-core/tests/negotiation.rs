//! Inbound proposal handling during an orchestrated turn.

#![allow(clippy::unwrap_used, clippy::panic)]

mod common;

use std::sync::{Arc, Mutex};

use common::{AURORA, BASALT, HUMAN, Harness, RecordingExecutor, play_turns, set_gold};
use rust_decimal::Decimal;
use terra_core::{
    CollaboratorError, NegotiationDesk, Resolution, SandboxWorld, TurnOutcome, WorldState,
};
use terra_types::{
    ParticipantId, Proposal, ProposalId, ProposalStatus, Resource, ResourceBundle, TradeRole,
    TradeTerms,
};

fn terms(resource: Resource, amount: u32) -> TradeTerms {
    TradeTerms::resources(ResourceBundle::from([(resource, amount)]))
}

/// Sandbox desk that logs the writes made through it.
struct LoggingDesk {
    inner: Arc<SandboxWorld>,
    calls: Mutex<Vec<&'static str>>,
}

impl LoggingDesk {
    fn new(inner: Arc<SandboxWorld>) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }
}

impl NegotiationDesk for LoggingDesk {
    fn pending_for(&self, participant: ParticipantId) -> Result<Vec<Proposal>, CollaboratorError> {
        self.inner.pending_for(participant)
    }

    fn submit(&self, proposal: Proposal) -> Result<(), CollaboratorError> {
        self.calls.lock().unwrap().push("submit");
        self.inner.submit(proposal)
    }

    fn resolve(&self, proposal: ProposalId, accept: bool) -> Result<Resolution, CollaboratorError> {
        self.calls.lock().unwrap().push("resolve");
        self.inner.resolve(proposal, accept)
    }

    fn resolved_from(&self, initiator: ParticipantId) -> Result<Vec<Proposal>, CollaboratorError> {
        self.inner.resolved_from(initiator)
    }
}

#[tokio::test]
async fn favourable_inbound_trade_is_accepted_and_remembered() {
    let h = Harness::new();
    let orchestrator = h.orchestrator(h.bare().with_desk(h.sandbox.clone()));
    let proposal = Proposal::new(BASALT, AURORA, terms(Resource::Stone, 2), terms(Resource::Wood, 1), 0);
    let id = proposal.id;
    h.sandbox.submit(proposal).unwrap();
    let before = h.sandbox.participant(AURORA).unwrap();

    let TurnOutcome::Completed(summary) = orchestrator.execute_agent_turn().await else {
        panic!("turn did not complete");
    };

    assert_eq!(summary.inbound_answered, 1);
    assert_eq!(summary.inbound_accepted, 1);
    let after = h.sandbox.participant(AURORA).unwrap();
    // Two stone in, one wood out, on top of income.
    let expected = before
        .resources
        .total()
        .saturating_add(summary.income.total())
        .saturating_add(1);
    assert_eq!(after.resources.total(), expected);
    assert_eq!(h.sandbox.participant(BASALT).unwrap().victory_points, 3);

    let resolved = h.sandbox.proposals().into_iter().find(|p| p.id == id).unwrap();
    assert_eq!(resolved.status, ProposalStatus::Accepted);
    assert!(h.sandbox.pending_for(AURORA).unwrap().is_empty());

    let aurora = orchestrator.agent(AURORA).unwrap();
    let basalt = orchestrator.agent(BASALT).unwrap();
    assert_eq!(aurora.trade_history.len(), 1);
    assert_eq!(aurora.trade_history.first().unwrap().role, TradeRole::Responder);
    assert_eq!(basalt.trade_history.len(), 1);
    assert_eq!(basalt.trade_history.first().unwrap().role, TradeRole::Initiator);
    assert_eq!(aurora.relationships.score(BASALT), Decimal::new(10, 2));
    assert_eq!(basalt.relationships.score(AURORA), Decimal::new(10, 2));
}

#[tokio::test]
async fn lopsided_offer_from_a_human_is_declined() {
    let h = Harness::new();
    let orchestrator = h.orchestrator(h.bare().with_desk(h.sandbox.clone()));
    let proposal = Proposal::new(HUMAN, AURORA, terms(Resource::Wood, 1), terms(Resource::Gold, 2), 0);
    let id = proposal.id;
    h.sandbox.submit(proposal).unwrap();
    let gold_before = h.sandbox.participant(AURORA).unwrap().resources.get(Resource::Gold);

    let TurnOutcome::Completed(summary) = orchestrator.execute_agent_turn().await else {
        panic!("turn did not complete");
    };

    assert_eq!(summary.inbound_answered, 1);
    assert_eq!(summary.inbound_accepted, 0);
    let resolved = h.sandbox.proposals().into_iter().find(|p| p.id == id).unwrap();
    assert_eq!(resolved.status, ProposalStatus::Rejected);
    let aurora = orchestrator.agent(AURORA).unwrap();
    assert_eq!(aurora.relationships.score(HUMAN), Decimal::new(-5, 2));
    assert!(!aurora.trade_history.first().unwrap().accepted);
    // Income pays no gold on this board, and the outbound proposal is
    // only submitted, never settled inside the turn.
    assert_eq!(
        h.sandbox.participant(AURORA).unwrap().resources.get(Resource::Gold),
        gold_before
    );
}

#[tokio::test]
async fn direct_evaluation_does_not_resolve() {
    let h = Harness::new();
    let orchestrator = h.orchestrator(h.sandbox.collaborators());
    let proposal = Proposal::new(BASALT, AURORA, terms(Resource::Stone, 2), terms(Resource::Wood, 1), 0);
    h.sandbox.submit(proposal.clone()).unwrap();

    let verdict = orchestrator.evaluate_proposal(&proposal).unwrap();
    assert!(verdict.accept);
    assert_eq!(h.sandbox.pending_for(AURORA).unwrap().len(), 1);
    assert!(orchestrator.agent(AURORA).unwrap().trade_history.is_empty());

    let outbound = orchestrator.synthesize_proposal(BASALT).unwrap().unwrap();
    assert_eq!(outbound.initiator, BASALT);
    assert_ne!(outbound.target, BASALT);
    assert_eq!(outbound.status, ProposalStatus::Pending);
    assert!(h.sandbox.pending_for(outbound.target).unwrap().iter().all(|p| p.id != outbound.id));
}

#[tokio::test]
async fn declined_outbound_is_learned_on_the_next_turn() {
    let h = Harness::new();
    set_gold(&h.sandbox, BASALT, 0);
    let orchestrator = h.orchestrator(h.bare().with_desk(h.sandbox.clone()));

    let TurnOutcome::Completed(summary) = orchestrator.execute_agent_turn().await else {
        panic!("turn did not complete");
    };
    let id = summary.outbound.unwrap();
    let sent = h.sandbox.pending_for(HUMAN).unwrap();
    assert!(sent.iter().any(|p| p.id == id && p.initiator == AURORA));

    // The human turns it down between Aurora's turns.
    h.sandbox.resolve(id, false).unwrap();
    assert!(orchestrator.agent(AURORA).unwrap().trade_history.is_empty());

    play_turns(&orchestrator, &h.sandbox, 3).await;

    let aurora = orchestrator.agent(AURORA).unwrap();
    assert_eq!(aurora.relationships.score(HUMAN), Decimal::new(-5, 2));
    assert_eq!(aurora.trade_history.len(), 1);
    let record = aurora.trade_history.first().unwrap();
    assert_eq!(record.proposal_id, id);
    assert_eq!(record.role, TradeRole::Initiator);
    assert!(!record.accepted);
}

#[tokio::test]
async fn reported_resolution_is_remembered_once() {
    let h = Harness::new();
    let orchestrator = h.orchestrator(h.bare().with_desk(h.sandbox.clone()));
    let proposal = Proposal::new(BASALT, AURORA, terms(Resource::Stone, 2), terms(Resource::Wood, 1), 0);

    orchestrator.record_resolution(&proposal, true).unwrap();
    orchestrator.record_resolution(&proposal, true).unwrap();

    let aurora = orchestrator.agent(AURORA).unwrap();
    let basalt = orchestrator.agent(BASALT).unwrap();
    assert_eq!(aurora.trade_history.len(), 1);
    assert_eq!(basalt.trade_history.len(), 1);
    assert_eq!(aurora.relationships.score(BASALT), Decimal::new(10, 2));
    assert_eq!(basalt.relationships.score(AURORA), Decimal::new(10, 2));
}

#[tokio::test]
async fn every_inbound_is_answered_before_proposing() {
    let h = Harness::new();
    let desk = Arc::new(LoggingDesk::new(h.sandbox.clone()));
    let orchestrator = h.orchestrator(h.bare().with_desk(desk.clone()));
    for from in [BASALT, HUMAN] {
        let proposal = Proposal::new(from, AURORA, terms(Resource::Stone, 2), terms(Resource::Wood, 1), 0);
        h.sandbox.submit(proposal).unwrap();
    }

    let TurnOutcome::Completed(summary) = orchestrator.execute_agent_turn().await else {
        panic!("turn did not complete");
    };

    assert_eq!(summary.inbound_answered, 2);
    assert!(summary.outbound.is_some());
    assert_eq!(desk.calls(), vec!["resolve", "resolve", "submit"]);
}

#[tokio::test]
async fn spent_budget_still_answers_but_does_not_propose() {
    let mut h = Harness::new();
    h.config.turn.reserve_trade_slot = false;
    let desk = Arc::new(LoggingDesk::new(h.sandbox.clone()));
    let executor = Arc::new(RecordingExecutor::default());
    let orchestrator = h.orchestrator(
        h.bare()
            .with_executor(executor.clone())
            .with_desk(desk.clone()),
    );
    let proposal = Proposal::new(BASALT, AURORA, terms(Resource::Stone, 2), terms(Resource::Wood, 1), 0);
    h.sandbox.submit(proposal).unwrap();

    let TurnOutcome::Completed(summary) = orchestrator.execute_agent_turn().await else {
        panic!("turn did not complete");
    };

    assert_eq!(executor.kinds().len(), 3);
    assert_eq!(summary.inbound_answered, 1);
    assert_eq!(summary.outbound, None);
    assert_eq!(desk.calls(), vec!["resolve"]);
}
