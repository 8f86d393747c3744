//! Multi-cycle behaviour of the evaluator: each cycle's `next_states` is fed
//! back as the following cycle's prior state, the way the tracker loop does.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use slotwatch_core::config::AlertConfig;
use slotwatch_core::{AlertClass, PersistedState, ResourceSnapshot, UserResponse};
use slotwatch_rules::{Evaluation, Evaluator};

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 14, 8, 0, 0).unwrap()
}

fn session(day: u32, count: u32, secondary: u32) -> ResourceSnapshot {
    ResourceSnapshot::new(
        NaiveDate::from_ymd_opt(2026, 10, day).unwrap(),
        NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2026, 10, day, 23, 0, 0).unwrap(),
    )
    .with_primary(count, 24)
    .with_secondary(secondary, 2)
}

/// Runs cycles sequentially, carrying state between them.
struct Tracker {
    config: AlertConfig,
    states: Vec<PersistedState>,
    now: DateTime<Utc>,
}

impl Tracker {
    fn new() -> Self {
        Self {
            config: AlertConfig::default(),
            states: Vec::new(),
            now: start(),
        }
    }

    fn cycle(&mut self, snapshots: &[ResourceSnapshot]) -> Evaluation {
        let out = Evaluator::evaluate(snapshots, &self.states, &self.config, self.now);
        self.states = out.next_states.clone();
        self.now += Duration::minutes(30);
        out
    }

    fn classes(&mut self, snapshots: &[ResourceSnapshot]) -> Vec<AlertClass> {
        self.cycle(snapshots).alerts.iter().map(|a| a.class).collect()
    }

    fn state(&self, id: &str) -> &PersistedState {
        self.states
            .iter()
            .find(|s| s.resource_id() == id)
            .unwrap_or_else(|| panic!("no state for {id}"))
    }
}

/// One random-walk move for a counter, bounded to `0..=max`.
fn step(rng: &mut StdRng, value: u32, max: u32) -> u32 {
    match rng.gen_range(0..5) {
        0 => value.saturating_sub(2),
        1 => value.saturating_sub(1),
        2 => value,
        3 => (value + 1).min(max),
        _ => (value + 3).min(max),
    }
}

// ── Fixed scenarios ──────────────────────────────────────────────────

#[test]
fn near_full_with_goalie_alerts_urgent_only() {
    let mut tracker = Tracker::new();
    assert_eq!(tracker.classes(&[session(20, 20, 2)]), vec![AlertClass::Urgent]);
}

#[test]
fn repeated_urgent_is_suppressed_until_count_rises() {
    let mut tracker = Tracker::new();
    assert_eq!(tracker.classes(&[session(20, 20, 1)]), vec![AlertClass::Urgent]);
    assert!(tracker.classes(&[session(20, 20, 1)]).is_empty());
    assert!(tracker.classes(&[session(20, 19, 1)]).is_empty());
    assert_eq!(tracker.classes(&[session(20, 21, 1)]), vec![AlertClass::Urgent]);
    assert_eq!(tracker.state("2026-10-20T19:00").last_primary_count_at_alert, Some(21));
}

#[test]
fn saturation_cycle() {
    let mut tracker = Tracker::new();
    let id = "2026-10-20T19:00";

    assert_eq!(tracker.classes(&[session(20, 21, 1)]), vec![AlertClass::Urgent]);
    assert_eq!(tracker.classes(&[session(20, 24, 2)]), vec![AlertClass::Saturated]);
    assert!(tracker.classes(&[session(20, 24, 2)]).is_empty());

    assert_eq!(tracker.classes(&[session(20, 23, 2)]), vec![AlertClass::Reopened]);
    assert_eq!(tracker.state(id).last_alert_class, Some(AlertClass::Reopened));
    assert!(tracker.classes(&[session(20, 23, 2)]).is_empty());

    // Filling up again is a new saturation.
    assert_eq!(tracker.classes(&[session(20, 24, 2)]), vec![AlertClass::Saturated]);
}

#[test]
fn reopened_first_cycle_without_prior_is_not_a_transition() {
    let mut tracker = Tracker::new();
    // Never seen full, so an open session with room is just urgent.
    assert_eq!(tracker.classes(&[session(20, 23, 0)]), vec![AlertClass::Urgent]);
}

#[test]
fn viable_realerts_only_after_spots_shrink() {
    let mut tracker = Tracker::new();
    assert_eq!(tracker.classes(&[session(20, 10, 1)]), vec![AlertClass::Viable]);
    assert!(tracker.classes(&[session(20, 11, 1)]).is_empty());
    assert!(tracker.classes(&[session(20, 9, 1)]).is_empty());
    assert_eq!(tracker.classes(&[session(20, 12, 1)]), vec![AlertClass::Viable]);
}

#[test]
fn viable_never_follows_urgent() {
    let mut tracker = Tracker::new();
    assert_eq!(tracker.classes(&[session(20, 21, 1)]), vec![AlertClass::Urgent]);
    // Drops back out of the urgent band but stays viable.
    assert!(tracker.classes(&[session(20, 15, 1)]).is_empty());
    assert!(tracker.classes(&[session(20, 18, 2)]).is_empty());
}

#[test]
fn decline_silences_until_cleared() {
    let mut tracker = Tracker::new();
    let id = "2026-10-20T19:00";
    assert_eq!(tracker.classes(&[session(20, 12, 1)]), vec![AlertClass::Viable]);

    let at = tracker.now;
    tracker
        .states
        .iter_mut()
        .find(|s| s.resource_id() == id)
        .unwrap()
        .set_response(UserResponse::Declined, at, None);

    assert!(tracker.classes(&[session(20, 22, 1)]).is_empty());
    // Capacity transitions still get through.
    assert_eq!(tracker.classes(&[session(20, 24, 1)]), vec![AlertClass::Saturated]);
    assert_eq!(tracker.state(id).user_response, UserResponse::Declined);
}

#[test]
fn snooze_expires_and_alerting_resumes() {
    let mut tracker = Tracker::new();
    let id = "2026-10-20T19:00";
    assert!(tracker.classes(&[session(20, 5, 0)]).is_empty());

    let at = tracker.now;
    let until = at + Duration::minutes(45);
    tracker
        .states
        .iter_mut()
        .find(|s| s.resource_id() == id)
        .unwrap()
        .set_response(UserResponse::Snoozed, at, Some(until));

    // Cycle at +0m: still snoozed.
    assert!(tracker.classes(&[session(20, 21, 1)]).is_empty());
    // Cycle at +30m: still snoozed.
    assert!(tracker.classes(&[session(20, 21, 1)]).is_empty());
    // Cycle at +60m: snooze over.
    assert_eq!(tracker.classes(&[session(20, 21, 1)]), vec![AlertClass::Urgent]);
}

#[test]
fn session_passing_goes_quiet() {
    let mut tracker = Tracker::new();
    tracker.now = Utc.with_ymd_and_hms(2026, 10, 20, 22, 30, 0).unwrap();
    assert_eq!(tracker.classes(&[session(20, 21, 1)]), vec![AlertClass::Urgent]);
    // 23:00 anchor reached.
    assert!(tracker.classes(&[session(20, 24, 2)]).is_empty());
}

// ── Random walks ─────────────────────────────────────────────────────

#[test]
fn random_walks_hold_alert_invariants() {
    for seed in 1..=40u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut tracker = Tracker::new();
        let mut counts = [(0u32, 0u32); 3];
        let days = [20, 21, 22];

        for _ in 0..120 {
            for (primary, secondary) in counts.iter_mut() {
                *primary = step(&mut rng, *primary, 24);
                *secondary = step(&mut rng, *secondary, 2);
            }
            let snapshots: Vec<ResourceSnapshot> = days
                .iter()
                .zip(counts.iter())
                .map(|(&day, &(p, s))| session(day, p, s))
                .collect();

            let prior = tracker.states.clone();
            let out = tracker.cycle(&snapshots);
            check_cycle(&prior, &snapshots, &out, &tracker.config, seed);
        }
    }
}

fn check_cycle(
    prior: &[PersistedState],
    snapshots: &[ResourceSnapshot],
    out: &Evaluation,
    config: &AlertConfig,
    seed: u64,
) {
    // At most one alert per resource per cycle.
    let mut ids: Vec<&str> = out.alerts.iter().map(|a| a.resource_id.as_str()).collect();
    ids.sort_unstable();
    let before = ids.len();
    ids.dedup();
    assert_eq!(before, ids.len(), "seed {seed}: duplicate alerts in one cycle");

    for alert in &out.alerts {
        let p = prior.iter().find(|s| s.resource_id() == alert.resource_id);
        let snap = snapshots
            .iter()
            .find(|s| s.resource_id == alert.resource_id)
            .unwrap();

        let last = p.and_then(|p| p.last_alert_class);
        match alert.class {
            AlertClass::Saturated => {
                assert!(snap.is_saturated(), "seed {seed}");
                assert!(!p.unwrap().snapshot.is_saturated(), "seed {seed}");
            }
            AlertClass::Reopened => {
                assert!(!snap.is_saturated(), "seed {seed}");
                assert!(p.unwrap().snapshot.is_saturated(), "seed {seed}");
            }
            AlertClass::Urgent => {
                assert!(snap.remaining() <= config.urgent_threshold, "seed {seed}");
                if matches!(
                    last,
                    Some(AlertClass::Urgent | AlertClass::Reopened | AlertClass::Saturated)
                ) {
                    let at_alert = p.unwrap().last_primary_count_at_alert.unwrap();
                    assert!(
                        snap.primary_count > at_alert,
                        "seed {seed}: urgent repeated without a count increase"
                    );
                }
            }
            AlertClass::Viable => {
                assert!(
                    matches!(last, None | Some(AlertClass::Viable)),
                    "seed {seed}: viable after {last:?}"
                );
                if last == Some(AlertClass::Viable) {
                    let at_alert = p.unwrap().last_primary_count_at_alert.unwrap();
                    let remaining_then = snap.primary_max - at_alert;
                    assert!(
                        remaining_then.saturating_sub(snap.remaining()) >= config.viable_realert_delta,
                        "seed {seed}: viable repeated without spots shrinking"
                    );
                }
            }
        }

        let next = out
            .next_states
            .iter()
            .find(|s| s.resource_id() == alert.resource_id)
            .unwrap();
        assert_eq!(next.last_alert_class, Some(alert.class));
        assert_eq!(next.last_primary_count_at_alert, Some(snap.primary_count));
    }

    // Sessions without an alert keep their bookkeeping.
    for next in &out.next_states {
        if out.alerts.iter().any(|a| a.resource_id == next.resource_id()) {
            continue;
        }
        if let Some(p) = prior.iter().find(|s| s.resource_id() == next.resource_id()) {
            assert_eq!(next.last_alert_class, p.last_alert_class, "seed {seed}");
            assert_eq!(next.last_alert_at, p.last_alert_at, "seed {seed}");
        }
    }
}
