//! Clamp an instant into the daily active-hours window.

use chrono::{DateTime, Timelike, Utc};
use slotwatch_core::civil::{first_valid_at_or_after, CivilZone};
use slotwatch_core::config::ScheduleConfig;

/// Move `target` to the next opening of the active window if its civil hour
/// in `zone` falls outside `[active_hour_start, active_hour_end]`.
///
/// Returns the (possibly unchanged) instant and whether it moved. Before the
/// window opens the opening is the same civil day; after it closes it is the
/// next civil day. The opening is resolved with the offset in force on that
/// day, and an opening that falls in a DST gap moves to the first minute
/// that exists.
pub(crate) fn clamp(
    target: DateTime<Utc>,
    config: &ScheduleConfig,
    zone: &dyn CivilZone,
) -> (DateTime<Utc>, bool) {
    let civil = zone.to_civil(target);
    let hour = civil.hour();
    if (config.active_hour_start..=config.active_hour_end).contains(&hour) {
        return (target, false);
    }

    let day = if hour < config.active_hour_start {
        Some(civil.date())
    } else {
        civil.date().succ_opt()
    };

    let opening = day
        .and_then(|d| d.and_hms_opt(config.active_hour_start, 0, 0))
        .and_then(|open| first_valid_at_or_after(zone, open));

    match opening {
        Some(open) => (open, true),
        None => {
            tracing::warn!(%target, zone = %zone.name(), "could not resolve active-hours opening");
            (target, false)
        }
    }
}
