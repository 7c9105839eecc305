//! Health monitor.
//!
//! A background task that periodically inspects the live turn. Too many
//! errors recorded under the current epoch inside the trailing window, or
//! a turn running past the ceiling, forces the turn to end. Forced
//! termination clears the supervisor slot first and only the winner of
//! that claim advances the driver, so racing a normal completion or a
//! second check never advances twice.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::collaborators::TurnDriver;
use crate::config::HealthConfig;
use crate::fault::TurnFault;
use crate::supervisor::TurnSupervisor;

/// Watches the supervisor and terminates stuck or failing turns.
pub struct HealthMonitor {
    supervisor: Arc<TurnSupervisor>,
    driver: Arc<dyn TurnDriver>,
    config: HealthConfig,
}

impl std::fmt::Debug for HealthMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthMonitor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl HealthMonitor {
    /// Create a monitor over `supervisor` that advances `driver`.
    pub fn new(
        supervisor: Arc<TurnSupervisor>,
        driver: Arc<dyn TurnDriver>,
        config: HealthConfig,
    ) -> Self {
        Self {
            supervisor,
            driver,
            config,
        }
    }

    /// The fault the live turn is currently in, if any. Does not act.
    pub fn diagnose(&self) -> Option<(u64, TurnFault)> {
        let turn = self.supervisor.active()?;
        let errors = self
            .supervisor
            .errors_within(turn.epoch, self.config.error_window_ms);
        if errors > self.config.error_threshold {
            return Some((
                turn.epoch,
                TurnFault::RepeatedFailure {
                    errors,
                    window_ms: self.config.error_window_ms,
                },
            ));
        }
        let elapsed_ms = self
            .supervisor
            .clock()
            .now_ms()
            .saturating_sub(turn.started_ms);
        (elapsed_ms >= self.config.turn_ceiling_ms).then_some((
            turn.epoch,
            TurnFault::Timeout {
                elapsed_ms,
                ceiling_ms: self.config.turn_ceiling_ms,
            },
        ))
    }

    /// Run one inspection. Returns the fault that forced a termination,
    /// or `None` if the turn is healthy or was already ended.
    pub fn check(&self) -> Option<TurnFault> {
        let (epoch, fault) = self.diagnose()?;
        if !self.supervisor.force_terminate(epoch, &fault) {
            debug!(epoch, "turn already ended, nothing to terminate");
            return None;
        }
        self.advance_driver(epoch);
        Some(fault)
    }

    fn advance_driver(&self, epoch: u64) {
        match self.driver.advance_to_next_participant() {
            Ok(next) => info!(epoch, next = %next, "advanced past terminated turn"),
            Err(e) => {
                warn!(epoch, error = %e, "driver refused to advance, forcing index");
                match self.driver.force_advance_index() {
                    Some(next) => info!(epoch, next = %next, "turn index forced forward"),
                    None => error!(epoch, "no participant left to advance to"),
                }
            }
        }
    }

    /// Run [`check`](Self::check) every `check_interval_ms` until
    /// `shutdown` is notified.
    ///
    /// Signal shutdown with [`Notify::notify_one`] so a notification sent
    /// between ticks is not lost.
    pub fn spawn(self: Arc<Self>, shutdown: Arc<Notify>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let period = Duration::from_millis(self.config.check_interval_ms.max(1));
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(interval_ms = self.config.check_interval_ms, "health monitor started");
            loop {
                tokio::select! {
                    () = shutdown.notified() => break,
                    _ = ticker.tick() => {
                        if let Some(fault) = self.check() {
                            warn!(%fault, "health check forced a turn to end");
                        }
                    }
                }
            }
            info!(
                forced = self.supervisor.forced_terminations(),
                "health monitor stopped"
            );
        })
    }
}
