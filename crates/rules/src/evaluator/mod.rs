//! Snapshot evaluator with severity precedence and anti-flap suppression.
//!
//! Each cycle the evaluator takes the current snapshots, the state saved by
//! the previous cycle and the alert thresholds, and returns the alerts to
//! deliver plus the state to save. Per session it walks a fixed decision
//! list (see [`decision`]):
//!
//! 1. past sessions are ignored
//! 2. **Saturated** / **Reopened** capacity transitions fire first
//! 3. accept/decline silences the session, an active snooze pauses it
//! 4. **Urgent** (few spots left), else **Viable** (enough people and a
//!    secondary role), each suppressed so a class never repeats or
//!    downgrades without new information
//!
//! The evaluator never writes the user-response fields; it only reads them.

mod decision;
mod message;

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use slotwatch_core::config::AlertConfig;
use slotwatch_core::{Alert, PersistedState, ResourceSnapshot};
use tracing::{debug, info, warn};

use decision::{decide, Context};

pub use decision::{Decision, Quiet};

/// Alerts to deliver and state to persist for one cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation {
    /// Soonest session first.
    pub alerts: Vec<Alert>,
    /// Soonest session first. Includes records for sessions not observed
    /// this cycle, unchanged.
    pub next_states: Vec<PersistedState>,
}

pub struct Evaluator;

impl Evaluator {
    /// Evaluate one cycle.
    ///
    /// Malformed snapshots are skipped individually and any prior record for
    /// them is kept as is. When the same id appears more than once the last
    /// snapshot wins.
    pub fn evaluate(
        snapshots: &[ResourceSnapshot],
        prior_states: &[PersistedState],
        config: &AlertConfig,
        now: DateTime<Utc>,
    ) -> Evaluation {
        let prior_by_id: HashMap<&str, &PersistedState> =
            prior_states.iter().map(|s| (s.resource_id(), s)).collect();

        let current = Self::well_formed(snapshots);
        let observed: HashSet<&str> = current.iter().map(|s| s.resource_id.as_str()).collect();

        let mut alerts = Vec::new();
        let mut next_states = Vec::with_capacity(current.len() + prior_states.len());

        for &snapshot in &current {
            let prior = prior_by_id.get(snapshot.resource_id.as_str()).copied();
            let decision = decide(&Context {
                snapshot,
                prior,
                config,
                now,
            });

            let mut next = match prior {
                Some(p) => PersistedState {
                    snapshot: snapshot.clone(),
                    ..p.clone()
                },
                None => PersistedState::new(snapshot.clone()),
            };

            match decision {
                Decision::Alert(class) => {
                    next.record_alert(class, now);
                    info!(
                        resource_id = %snapshot.resource_id,
                        class = %class,
                        primary = snapshot.primary_count,
                        max = snapshot.primary_max,
                        "alert raised"
                    );
                    alerts.push(Alert {
                        class,
                        resource_id: snapshot.resource_id.clone(),
                        snapshot: snapshot.clone(),
                        message: message::render(class, snapshot, config),
                        action_url: snapshot
                            .url
                            .clone()
                            .or_else(|| config.action_url.clone())
                            .unwrap_or_default(),
                        raised_at: now,
                    });
                }
                Decision::Quiet(reason) => {
                    debug!(resource_id = %snapshot.resource_id, ?reason, "no alert");
                }
            }

            debug_assert!(next.is_consistent(), "inconsistent state for {}", next.resource_id());
            next_states.push(next);
        }

        // Records not observed this cycle live on until pruned.
        next_states.extend(
            prior_states
                .iter()
                .filter(|s| !observed.contains(s.resource_id()))
                .cloned(),
        );

        alerts.sort_by(|a, b| {
            (a.snapshot.anchor, &a.resource_id).cmp(&(b.snapshot.anchor, &b.resource_id))
        });
        next_states.sort_by(|a, b| (a.anchor(), a.resource_id()).cmp(&(b.anchor(), b.resource_id())));

        Evaluation {
            alerts,
            next_states,
        }
    }

    /// Drop malformed snapshots and collapse duplicate ids, keeping input
    /// order of first appearance and the last value seen.
    fn well_formed(snapshots: &[ResourceSnapshot]) -> Vec<&ResourceSnapshot> {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut kept: Vec<&ResourceSnapshot> = Vec::with_capacity(snapshots.len());

        for snap in snapshots {
            if !snap.is_well_formed() {
                warn!(
                    resource_id = %snap.resource_id,
                    primary_max = snap.primary_max,
                    "skipping malformed snapshot"
                );
                continue;
            }
            match index.get(snap.resource_id.as_str()) {
                Some(&i) => {
                    warn!(resource_id = %snap.resource_id, "duplicate snapshot id, keeping the last one");
                    kept[i] = snap;
                }
                None => {
                    index.insert(snap.resource_id.as_str(), kept.len());
                    kept.push(snap);
                }
            }
        }
        kept
    }
}

// ── Tests ───────────────────────────────────────────────────────────
