//! The tracker loop: one cycle per wake-up.
//!
//! fetch → load → prune expired → evaluate → deliver → save → plan → sleep.
//! Nothing in here retries; a failed step is logged and the cycle carries
//! on with what it has so the next wake-up is always scheduled.

use std::path::PathBuf;
use std::sync::Arc;

use slotwatch_core::config::AlertConfig;
use slotwatch_core::{Alert, CivilZone, Clock};
use slotwatch_notify::Dispatcher;
use slotwatch_rules::{should_accelerate, Evaluator, PollPlan, Scheduler};
use tracing::{error, info, warn};

use crate::shutdown::Shutdown;
use crate::source::SnapshotSource;

/// What one cycle did.
#[derive(Debug)]
pub struct CycleReport {
    /// `None` when the fetch failed.
    pub fetched: Option<usize>,
    pub alerts: Vec<Alert>,
    pub failed_deliveries: usize,
    pub tracked: usize,
    pub saved: bool,
    pub plan: PollPlan,
}

pub struct Tracker<S: SnapshotSource, Z: CivilZone> {
    source: S,
    dispatcher: Dispatcher,
    scheduler: Scheduler<Z>,
    alert: AlertConfig,
    state_path: PathBuf,
    clock: Arc<dyn Clock>,
}

impl<S: SnapshotSource, Z: CivilZone> Tracker<S, Z> {
    pub fn new(
        source: S,
        dispatcher: Dispatcher,
        scheduler: Scheduler<Z>,
        alert: AlertConfig,
        state_path: PathBuf,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            source,
            dispatcher,
            scheduler,
            alert,
            state_path,
            clock,
        }
    }

    /// Run a single cycle. Never fails: fetch, delivery and save errors
    /// are logged and reflected in the report.
    pub async fn run_cycle(&self) -> CycleReport {
        let now = self.clock.now();

        let fetched = match self.source.fetch().await {
            Ok(snapshots) => Some(snapshots),
            Err(e) => {
                warn!(source = self.source.name(), error = %e, "fetch failed, scheduling from stored state");
                None
            }
        };

        let prior = slotwatch_storage::prune_expired(slotwatch_storage::load(&self.state_path), now);

        let fetched_count = fetched.as_ref().map(Vec::len);
        let (alerts, states) = match fetched {
            Some(snapshots) => {
                let eval = Evaluator::evaluate(&snapshots, &prior, &self.alert, now);
                (eval.alerts, eval.next_states)
            }
            None => (Vec::new(), prior),
        };

        let results = self.dispatcher.deliver(&alerts).await;
        let failed_deliveries = results.iter().filter(|r| !r.success).count();

        let saved = match slotwatch_storage::save(&self.state_path, &states) {
            Ok(()) => true,
            Err(e) => {
                error!(path = %self.state_path.display(), error = %e, "failed to save state");
                false
            }
        };

        let plan_at = self.clock.now();
        let accelerated = should_accelerate(&states, plan_at, &self.alert);
        let plan = self.scheduler.next_poll(plan_at, &states, accelerated);

        info!(
            fetched = ?fetched_count,
            alerts = alerts.len(),
            failed_deliveries,
            tracked = states.len(),
            saved,
            next = %plan.target,
            reason = %plan.reason,
            "cycle complete"
        );

        CycleReport {
            fetched: fetched_count,
            alerts,
            failed_deliveries,
            tracked: states.len(),
            saved,
            plan,
        }
    }

    /// Loop cycles until `shutdown` fires. A running cycle always finishes;
    /// no new one starts after shutdown. Returns the number of cycles run.
    pub async fn run(&self, shutdown: &Shutdown) -> usize {
        let mut cycles = 0;
        while !shutdown.is_triggered() {
            let report = self.run_cycle().await;
            cycles += 1;
            if !shutdown.sleep(report.plan.delay_std()).await {
                break;
            }
        }
        info!(cycles, "tracker stopped");
        cycles
    }
}
