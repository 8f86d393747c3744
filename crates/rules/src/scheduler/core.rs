//! [`Scheduler`]: computes when the tracker should wake up next.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use slotwatch_core::civil::CivilZone;
use slotwatch_core::config::{AlertConfig, ScheduleConfig};
use slotwatch_core::PersistedState;
use tracing::debug;

use super::active_hours;

/// Why the scheduler picked its wake-up time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollReason {
    /// Inside the nearest session's approach window; regular cadence.
    Approach,
    /// Sleeping until the nearest session's approach window opens.
    Sleep,
    /// Nothing close enough to plan around; capped sleep.
    Fallback,
}

impl fmt::Display for PollReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PollReason::Approach => "approach",
            PollReason::Sleep => "sleep",
            PollReason::Fallback => "fallback",
        })
    }
}

/// The next wake-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPlan {
    pub target: DateTime<Utc>,
    pub delay: Duration,
    pub reason: PollReason,
    /// The target was moved into active hours.
    pub clamped: bool,
}

impl PollPlan {
    /// Delay as a std duration for the runtime timer. Never negative.
    pub fn delay_std(&self) -> std::time::Duration {
        self.delay.to_std().unwrap_or(std::time::Duration::ZERO)
    }
}

/// Computes wake-up times from the tracked states.
///
/// Holds only validated configuration and the reference zone; every call to
/// [`next_poll`](Scheduler::next_poll) is a pure function of its arguments.
pub struct Scheduler<Z: CivilZone> {
    config: ScheduleConfig,
    zone: Z,
}

impl<Z: CivilZone> Scheduler<Z> {
    /// `config` is assumed to have passed `ScheduleConfig::validate`.
    pub fn new(config: ScheduleConfig, zone: Z) -> Self {
        Self { config, zone }
    }

    pub fn config(&self) -> &ScheduleConfig {
        &self.config
    }

    pub fn zone(&self) -> &Z {
        &self.zone
    }

    /// Plan the next poll.
    ///
    /// `accelerated` switches the in-window cadence to the accelerated
    /// interval; see [`should_accelerate`].
    pub fn next_poll(
        &self,
        now: DateTime<Utc>,
        states: &[PersistedState],
        accelerated: bool,
    ) -> PollPlan {
        let max_sleep_target = now + self.config.max_sleep();

        let (target, reason) = match next_anchor(states, now) {
            None => (max_sleep_target, PollReason::Fallback),
            Some(anchor) => {
                let approach_open = anchor - self.config.approach_window();
                if now >= approach_open {
                    let interval = if accelerated {
                        self.config.accelerated_interval()
                    } else {
                        self.config.normal_interval()
                    };
                    (now + interval, PollReason::Approach)
                } else if approach_open > max_sleep_target {
                    (max_sleep_target, PollReason::Fallback)
                } else {
                    (approach_open, PollReason::Sleep)
                }
            }
        };

        let (target, clamped) = active_hours::clamp(target, &self.config, &self.zone);
        let plan = PollPlan {
            target,
            delay: target - now,
            reason,
            clamped,
        };

        debug!(
            reason = %plan.reason,
            target = %plan.target,
            delay_mins = plan.delay.num_minutes(),
            clamped = plan.clamped,
            accelerated,
            "next poll planned"
        );
        plan
    }
}

/// Earliest anchor strictly after `now`.
fn next_anchor(states: &[PersistedState], now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    states
        .iter()
        .map(PersistedState::anchor)
        .filter(|anchor| *anchor > now)
        .min()
}

/// Whether the nearest upcoming session deserves the accelerated cadence:
/// it still has room and is either close to full or already viable.
pub fn should_accelerate(states: &[PersistedState], now: DateTime<Utc>, config: &AlertConfig) -> bool {
    let Some(next) = states
        .iter()
        .filter(|s| s.anchor() > now)
        .min_by_key(|s| (s.anchor(), s.resource_id().to_string()))
    else {
        return false;
    };

    let snap = &next.snapshot;
    if snap.is_saturated() {
        return false;
    }
    let urgent = snap.remaining() <= config.urgent_threshold;
    let viable = snap.secondary_count >= config.min_secondary
        && snap.primary_count >= config.min_primary_registered;
    urgent || viable
}
