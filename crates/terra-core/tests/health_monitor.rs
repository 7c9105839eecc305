//! The background health monitor against a live supervisor.

#![allow(clippy::unwrap_used)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{AURORA, BASALT, Harness};
use terra_core::{FeedbackKind, HealthMonitor, TurnDriver, TurnFault};
use tokio::sync::Notify;

fn monitor(h: &Harness) -> Arc<HealthMonitor> {
    Arc::new(HealthMonitor::new(
        h.supervisor.clone(),
        h.sandbox.clone(),
        h.config.health,
    ))
}

#[tokio::test(start_paused = true)]
async fn spawned_monitor_ends_a_failing_turn() {
    let h = Harness::new();
    let ticket = h.supervisor.try_begin(AURORA).unwrap();
    for n in 0..4 {
        h.supervisor.capture(format!("step {n} failed"), FeedbackKind::Error);
    }

    let shutdown = Arc::new(Notify::new());
    let handle = monitor(&h).spawn(shutdown.clone());
    tokio::time::sleep(Duration::from_secs(6)).await;

    assert_eq!(h.supervisor.forced_terminations(), 1);
    assert!(!h.supervisor.is_current(ticket.epoch));
    assert_eq!(h.sandbox.current_participant(), Some(BASALT));
    assert_eq!(h.sandbox.advances(), 1);

    shutdown.notify_one();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn spawned_monitor_leaves_a_healthy_turn_alone() {
    let h = Harness::new();
    let ticket = h.supervisor.try_begin(AURORA).unwrap();
    for n in 0..3 {
        h.supervisor.capture(format!("step {n} failed"), FeedbackKind::Error);
    }

    let shutdown = Arc::new(Notify::new());
    let handle = monitor(&h).spawn(shutdown.clone());
    tokio::time::sleep(Duration::from_secs(12)).await;

    assert_eq!(h.supervisor.forced_terminations(), 0);
    assert!(h.supervisor.is_current(ticket.epoch));
    assert_eq!(h.sandbox.advances(), 0);

    shutdown.notify_one();
    handle.await.unwrap();
    assert!(h.supervisor.end(ticket.epoch));
}

#[tokio::test]
async fn turn_past_the_ceiling_is_timed_out() {
    let h = Harness::new();
    let ticket = h.supervisor.try_begin(AURORA).unwrap();
    h.clock.advance(19_999);
    let monitor = monitor(&h);
    assert!(monitor.check().is_none());

    h.clock.advance(1);
    assert_eq!(
        monitor.check(),
        Some(TurnFault::Timeout {
            elapsed_ms: 20_000,
            ceiling_ms: 20_000
        })
    );
    assert!(!h.supervisor.end(ticket.epoch));
    assert_eq!(h.sandbox.current_participant(), Some(BASALT));
}

#[tokio::test]
async fn normal_completion_wins_the_race() {
    let h = Harness::new();
    let ticket = h.supervisor.try_begin(AURORA).unwrap();
    h.clock.advance(30_000);
    let monitor = monitor(&h);
    assert!(monitor.diagnose().is_some());

    // The turn ends on its own before the check acts.
    assert!(h.supervisor.end(ticket.epoch));
    h.sandbox.finish_turn(AURORA).unwrap();

    assert!(monitor.check().is_none());
    assert_eq!(h.supervisor.forced_terminations(), 0);
    assert_eq!(h.sandbox.advances(), 1);
    assert_eq!(h.sandbox.current_participant(), Some(BASALT));
}

#[tokio::test]
async fn errors_from_an_earlier_turn_do_not_count() {
    let h = Harness::new();
    let first = h.supervisor.try_begin(AURORA).unwrap();
    for _ in 0..5 {
        h.supervisor.capture("old failure", FeedbackKind::Error);
    }
    assert!(h.supervisor.end(first.epoch));
    h.sandbox.finish_turn(AURORA).unwrap();

    let second = h.supervisor.try_begin(BASALT).unwrap();
    assert!(monitor(&h).check().is_none());
    assert!(h.supervisor.is_current(second.epoch));
}
