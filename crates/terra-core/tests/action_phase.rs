//! The action phase: dispute priority, slot reservation, and passing.

#![allow(clippy::unwrap_used, clippy::panic)]

mod common;

use std::sync::Arc;

use common::{AURORA, BASALT, HUMAN, Harness, RecordingExecutor, set_gold};
use terra_agents::DisputeOracle;
use terra_core::{FeedbackKind, Finalization, TurnDriver, TurnOutcome};
use terra_types::{
    ActionCost, OpportunityKind, Participant, Region, RegionId, Resource, ResourceBundle,
};

/// Disputes cost one wood and are nearly certain to succeed.
struct CheapOracle;

impl DisputeOracle for CheapOracle {
    fn dispute_cost(&self, _: &Participant, _: &Region) -> ActionCost {
        ActionCost::resources(ResourceBundle::from([(Resource::Wood, 1)]))
    }

    fn success_chance(&self, _: &Participant, _: &Participant, _: &Region) -> f64 {
        0.9
    }
}

#[tokio::test]
async fn gated_dispute_is_tried_before_scored_actions() {
    let h = Harness::new();
    let executor = Arc::new(RecordingExecutor::default());
    let orchestrator = h.orchestrator(
        h.bare()
            .with_executor(executor.clone())
            .with_oracle(Arc::new(CheapOracle)),
    );

    let TurnOutcome::Completed(summary) = orchestrator.execute_agent_turn().await else {
        panic!("turn did not complete");
    };

    assert_eq!(summary.actions.len(), 3);
    let executed = executor.executed.lock().unwrap().clone();
    let (kind, target) = executed.first().copied().unwrap();
    assert_eq!(kind, OpportunityKind::Dispute);
    assert!(target == RegionId(4) || target == RegionId(8));
}

#[tokio::test]
async fn without_an_oracle_no_dispute_is_attempted() {
    let h = Harness::new();
    let executor = Arc::new(RecordingExecutor::default());
    let orchestrator = h.orchestrator(h.bare().with_executor(executor.clone()));

    orchestrator.execute_agent_turn().await;

    assert_eq!(executor.kinds().len(), 3);
    assert!(!executor.kinds().contains(&OpportunityKind::Dispute));
}

#[tokio::test]
async fn last_slot_is_kept_only_when_someone_can_trade() {
    let h = Harness::new();
    let orchestrator = h.orchestrator(h.sandbox.collaborators());

    let TurnOutcome::Completed(summary) = orchestrator.execute_agent_turn().await else {
        panic!("turn did not complete");
    };

    assert_eq!(summary.actions.len(), 2);
    assert!(summary.outbound.is_some());
}

#[tokio::test]
async fn no_counterpart_means_the_whole_budget_goes_to_actions() {
    let h = Harness::new();
    set_gold(&h.sandbox, BASALT, 0);
    set_gold(&h.sandbox, HUMAN, 0);
    let orchestrator = h.orchestrator(h.sandbox.collaborators());

    let TurnOutcome::Completed(summary) = orchestrator.execute_agent_turn().await else {
        panic!("turn did not complete");
    };

    assert_eq!(summary.actions.len(), 3);
    assert_eq!(summary.outbound, None);
    assert!(h.sandbox.proposals().is_empty());
}

#[tokio::test]
async fn agent_with_nothing_to_do_passes() {
    let h = Harness::new();
    h.sandbox.edit(|w| {
        w.participants.get_mut(&AURORA).unwrap().resources = ResourceBundle::new();
    });
    let executor = Arc::new(RecordingExecutor::default());
    let orchestrator = h.orchestrator(h.bare().with_executor(executor.clone()));

    let TurnOutcome::Completed(summary) = orchestrator.execute_agent_turn().await else {
        panic!("turn did not complete");
    };

    assert!(summary.passed);
    assert!(summary.actions.is_empty());
    assert_eq!(summary.failures, 0);
    assert_eq!(summary.finalization, Finalization::Finished);
    assert!(executor.kinds().is_empty());
    // Income still arrived before the check.
    assert!(!summary.income.is_empty());

    let notes = h.supervisor.recent_feedback(16);
    assert!(
        notes
            .iter()
            .any(|e| e.kind == FeedbackKind::Info && e.message.contains("no possible action"))
    );
    assert_eq!(h.sandbox.current_participant(), Some(BASALT));
}
