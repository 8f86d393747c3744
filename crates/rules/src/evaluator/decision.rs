//! The per-session decision list.
//!
//! Rules run top to bottom and the first one that returns a [`Decision`]
//! ends the evaluation for that session. That early exit is what keeps the
//! output to at most one class per session per cycle.

use chrono::{DateTime, Utc};
use slotwatch_core::config::AlertConfig;
use slotwatch_core::{AlertClass, PersistedState, ResourceSnapshot, UserResponse};

/// Outcome of evaluating one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Alert(AlertClass),
    Quiet(Quiet),
}

/// Why no alert was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quiet {
    /// The session has already started.
    Past,
    /// The user accepted or declined.
    Responded(UserResponse),
    /// The user snoozed and the snooze is still running.
    Snoozed,
    /// Full, nothing actionable.
    Full,
    /// The class's condition holds but the last alert already covered it.
    Suppressed(AlertClass),
    /// No condition holds.
    Idle,
}

/// Everything a rule may look at.
pub(crate) struct Context<'a> {
    pub snapshot: &'a ResourceSnapshot,
    pub prior: Option<&'a PersistedState>,
    pub config: &'a AlertConfig,
    pub now: DateTime<Utc>,
}

type Rule = fn(&Context<'_>) -> Option<Decision>;

/// Ordered decision list. Order is significant.
const RULES: &[(&str, Rule)] = &[
    ("past", past),
    ("saturated_transition", saturated_transition),
    ("reopened_transition", reopened_transition),
    ("responded", responded),
    ("snoozed", snoozed),
    ("full", full),
    ("urgent", urgent),
    ("viable", viable),
];

/// Run the decision list for one session.
pub(crate) fn decide(ctx: &Context<'_>) -> Decision {
    for (name, rule) in RULES {
        if let Some(decision) = rule(ctx) {
            tracing::trace!(resource_id = %ctx.snapshot.resource_id, rule = name, ?decision, "rule matched");
            return decision;
        }
    }
    Decision::Quiet(Quiet::Idle)
}

fn past(ctx: &Context<'_>) -> Option<Decision> {
    (ctx.snapshot.anchor <= ctx.now).then_some(Decision::Quiet(Quiet::Past))
}

fn saturated_transition(ctx: &Context<'_>) -> Option<Decision> {
    let prior = ctx.prior?;
    (ctx.snapshot.is_saturated() && !prior.snapshot.is_saturated())
        .then_some(Decision::Alert(AlertClass::Saturated))
}

fn reopened_transition(ctx: &Context<'_>) -> Option<Decision> {
    let prior = ctx.prior?;
    (!ctx.snapshot.is_saturated() && prior.snapshot.is_saturated())
        .then_some(Decision::Alert(AlertClass::Reopened))
}

fn responded(ctx: &Context<'_>) -> Option<Decision> {
    let response = ctx.prior?.user_response;
    matches!(response, UserResponse::Accepted | UserResponse::Declined)
        .then_some(Decision::Quiet(Quiet::Responded(response)))
}

fn snoozed(ctx: &Context<'_>) -> Option<Decision> {
    // An expired snooze reads as no response and falls through.
    (ctx.prior?.effective_response(ctx.now) == UserResponse::Snoozed)
        .then_some(Decision::Quiet(Quiet::Snoozed))
}

fn full(ctx: &Context<'_>) -> Option<Decision> {
    ctx.snapshot
        .is_saturated()
        .then_some(Decision::Quiet(Quiet::Full))
}

/// Few spots left. A suppressed Urgent falls through to Viable.
fn urgent(ctx: &Context<'_>) -> Option<Decision> {
    if ctx.snapshot.remaining() > ctx.config.urgent_threshold {
        return None;
    }
    urgent_allowed(ctx.prior, ctx.snapshot).then_some(Decision::Alert(AlertClass::Urgent))
}

fn viable(ctx: &Context<'_>) -> Option<Decision> {
    let snap = ctx.snapshot;
    let holds = snap.secondary_count >= ctx.config.min_secondary
        && snap.primary_count >= ctx.config.min_primary_registered;
    if !holds {
        return None;
    }
    if viable_allowed(ctx.prior, snap, ctx.config.viable_realert_delta) {
        Some(Decision::Alert(AlertClass::Viable))
    } else {
        Some(Decision::Quiet(Quiet::Suppressed(AlertClass::Viable)))
    }
}

/// Urgent may follow Viable freely. After Urgent, Reopened or Saturated it
/// needs the primary count to have risen past the count at that alert.
pub(crate) fn urgent_allowed(prior: Option<&PersistedState>, snap: &ResourceSnapshot) -> bool {
    let Some(prior) = prior else {
        return true;
    };
    match prior.last_alert_class {
        None | Some(AlertClass::Viable) => true,
        Some(AlertClass::Urgent | AlertClass::Reopened | AlertClass::Saturated) => prior
            .last_primary_count_at_alert
            .map_or(true, |at_alert| snap.primary_count > at_alert),
    }
}

/// Viable never follows a more severe class. After a Viable alert it needs
/// the open spots to have shrunk by at least `delta`.
pub(crate) fn viable_allowed(
    prior: Option<&PersistedState>,
    snap: &ResourceSnapshot,
    delta: u32,
) -> bool {
    let Some(prior) = prior else {
        return true;
    };
    match prior.last_alert_class {
        None => true,
        Some(AlertClass::Viable) => prior.last_primary_count_at_alert.map_or(true, |at_alert| {
            let remaining_then = snap.primary_max.saturating_sub(at_alert);
            remaining_then.saturating_sub(snap.remaining()) >= delta
        }),
        Some(AlertClass::Urgent | AlertClass::Reopened | AlertClass::Saturated) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, NaiveTime, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 14, 12, 0, 0).unwrap()
    }

    fn snap(count: u32, secondary: u32) -> ResourceSnapshot {
        ResourceSnapshot::new(
            NaiveDate::from_ymd_opt(2026, 10, 15).unwrap(),
            NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
            now() + Duration::hours(31),
        )
        .with_primary(count, 24)
        .with_secondary(secondary, 2)
    }

    fn prior_with(class: Option<AlertClass>, count_at_alert: Option<u32>, current: u32) -> PersistedState {
        let mut p = PersistedState::new(snap(current, 1));
        p.last_alert_class = class;
        p.last_alert_at = class.map(|_| now() - Duration::hours(1));
        p.last_primary_count_at_alert = count_at_alert;
        p
    }

    fn run(snapshot: &ResourceSnapshot, prior: Option<&PersistedState>) -> Decision {
        let config = AlertConfig::default();
        decide(&Context {
            snapshot,
            prior,
            config: &config,
            now: now(),
        })
    }

    #[test]
    fn rule_order_is_fixed() {
        let names: Vec<&str> = RULES.iter().map(|(n, _)| *n).collect();
        assert_eq!(
            names,
            vec![
                "past",
                "saturated_transition",
                "reopened_transition",
                "responded",
                "snoozed",
                "full",
                "urgent",
                "viable"
            ]
        );
    }

    #[test]
    fn anchor_equal_to_now_is_past() {
        let mut s = snap(20, 1);
        s.anchor = now();
        assert_eq!(run(&s, None), Decision::Quiet(Quiet::Past));
    }

    #[test]
    fn no_history_means_no_transition() {
        // First sighting of a full session: nothing to transition from.
        assert_eq!(run(&snap(24, 1), None), Decision::Quiet(Quiet::Full));
    }

    #[test]
    fn transitions_beat_user_response() {
        let mut prior = prior_with(None, None, 20);
        prior.set_response(UserResponse::Declined, now(), None);
        assert_eq!(
            run(&snap(24, 1), Some(&prior)),
            Decision::Alert(AlertClass::Saturated)
        );
    }

    #[test]
    fn declined_suppresses_levels() {
        let mut prior = prior_with(None, None, 19);
        prior.set_response(UserResponse::Declined, now(), None);
        assert_eq!(
            run(&snap(20, 1), Some(&prior)),
            Decision::Quiet(Quiet::Responded(UserResponse::Declined))
        );
    }

    #[test]
    fn active_snooze_suppresses() {
        let mut prior = prior_with(None, None, 19);
        prior.set_response(UserResponse::Snoozed, now(), Some(now() + Duration::minutes(1)));
        assert_eq!(run(&snap(20, 1), Some(&prior)), Decision::Quiet(Quiet::Snoozed));
    }

    #[test]
    fn expired_snooze_falls_through() {
        let mut prior = prior_with(None, None, 19);
        prior.set_response(UserResponse::Snoozed, now() - Duration::hours(2), Some(now()));
        assert_eq!(
            run(&snap(20, 1), Some(&prior)),
            Decision::Alert(AlertClass::Urgent)
        );
    }

    #[test]
    fn urgent_after_viable_is_an_upgrade() {
        let prior = prior_with(Some(AlertClass::Viable), Some(12), 18);
        assert_eq!(
            run(&snap(21, 1), Some(&prior)),
            Decision::Alert(AlertClass::Urgent)
        );
    }

    #[test]
    fn urgent_after_urgent_needs_more_people() {
        let prior = prior_with(Some(AlertClass::Urgent), Some(20), 20);
        assert_eq!(
            run(&snap(20, 1), Some(&prior)),
            Decision::Quiet(Quiet::Suppressed(AlertClass::Viable))
        );
        assert_eq!(
            run(&snap(21, 1), Some(&prior)),
            Decision::Alert(AlertClass::Urgent)
        );
    }

    #[test]
    fn urgent_after_reopened_needs_more_people() {
        let prior = prior_with(Some(AlertClass::Reopened), Some(23), 23);
        assert!(!urgent_allowed(Some(&prior), &snap(23, 1)));
        assert!(!urgent_allowed(Some(&prior), &snap(22, 1)));
        // 24 would be full; the count can only rise by refilling.
        let prior = prior_with(Some(AlertClass::Reopened), Some(20), 20);
        assert!(urgent_allowed(Some(&prior), &snap(21, 1)));
    }

    #[test]
    fn viable_never_follows_severe_classes() {
        for class in [AlertClass::Urgent, AlertClass::Reopened, AlertClass::Saturated] {
            let prior = prior_with(Some(class), Some(10), 12);
            assert!(!viable_allowed(Some(&prior), &snap(12, 1), 2), "{class}");
        }
    }

    #[test]
    fn viable_realerts_after_delta() {
        let prior = prior_with(Some(AlertClass::Viable), Some(12), 12);
        assert!(!viable_allowed(Some(&prior), &snap(12, 1), 2));
        assert!(!viable_allowed(Some(&prior), &snap(13, 1), 2));
        assert!(viable_allowed(Some(&prior), &snap(14, 1), 2));
    }

    #[test]
    fn viable_needs_both_counters() {
        assert_eq!(run(&snap(12, 0), None), Decision::Quiet(Quiet::Idle));
        assert_eq!(run(&snap(9, 2), None), Decision::Quiet(Quiet::Idle));
        assert_eq!(run(&snap(10, 1), None), Decision::Alert(AlertClass::Viable));
    }
}
