//! One-shot subcommands that work on the state file directly.

use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use slotwatch_core::{CivilZone, PersistedState, UserResponse};
use slotwatch_rules::parse_duration;

use crate::cli::Action;

/// Translate a CLI action into the response to store and its snooze end.
pub fn resolve_action(
    action: Action,
    snooze_for: Option<&str>,
    now: DateTime<Utc>,
) -> Result<(UserResponse, Option<DateTime<Utc>>)> {
    let response = match action {
        Action::Accept => UserResponse::Accepted,
        Action::Decline => UserResponse::Declined,
        Action::None => UserResponse::None,
        Action::Snooze => {
            let Some(raw) = snooze_for else {
                bail!("snooze needs --for, e.g. --for 2h");
            };
            let length = parse_duration(raw)
                .with_context(|| format!("invalid snooze duration {raw:?}"))?;
            let length = chrono::Duration::from_std(length).context("snooze duration too long")?;
            let until = now
                .checked_add_signed(length)
                .context("snooze duration too long")?;
            return Ok((UserResponse::Snoozed, Some(until)));
        }
    };
    if snooze_for.is_some() {
        tracing::warn!(action = ?action, "--for only applies to snooze, ignoring");
    }
    Ok((response, None))
}

pub fn respond(
    state_path: &Path,
    resource_id: &str,
    action: Action,
    snooze_for: Option<&str>,
    now: DateTime<Utc>,
) -> Result<PersistedState> {
    let (response, until) = resolve_action(action, snooze_for, now)?;
    slotwatch_storage::record_response(state_path, resource_id, response, now, until)
        .with_context(|| format!("failed to record response for {resource_id}"))
}

pub fn status(state_path: &Path) -> Result<String> {
    let states = slotwatch_storage::load(state_path);
    serde_json::to_string_pretty(&states).context("failed to serialize state")
}

/// Drop records dated before `date`, defaulting to today in `zone`.
/// Returns how many were removed.
pub fn prune(
    state_path: &Path,
    date: Option<NaiveDate>,
    zone: &dyn CivilZone,
    now: DateTime<Utc>,
) -> Result<usize> {
    let today = date.unwrap_or_else(|| zone.to_civil(now).date());
    let states = slotwatch_storage::load(state_path);
    let before = states.len();
    let kept = slotwatch_storage::prune(states, today);
    let removed = before - kept.len();
    if removed > 0 {
        slotwatch_storage::save(state_path, &kept)
            .with_context(|| format!("failed to save {}", state_path.display()))?;
    }
    tracing::info!(%today, removed, kept = kept.len(), "pruned state");
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveTime, TimeZone};
    use slotwatch_core::{FixedZone, IanaZone, ResourceSnapshot};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 14, 12, 0, 0).unwrap()
    }

    fn state(day: u32) -> PersistedState {
        let date = NaiveDate::from_ymd_opt(2026, 10, day).unwrap();
        let start = NaiveTime::from_hms_opt(19, 0, 0).unwrap();
        PersistedState::new(
            ResourceSnapshot::at_civil(date, start, &FixedZone::utc())
                .unwrap()
                .with_primary(10, 24),
        )
    }

    #[test]
    fn snooze_needs_a_length() {
        assert!(resolve_action(Action::Snooze, None, now()).is_err());
        assert!(resolve_action(Action::Snooze, Some("soon"), now()).is_err());
        let (response, until) = resolve_action(Action::Snooze, Some("2h"), now()).unwrap();
        assert_eq!(response, UserResponse::Snoozed);
        assert_eq!(until, Some(now() + Duration::hours(2)));
    }

    #[test]
    fn other_actions_have_no_snooze_end() {
        assert_eq!(
            resolve_action(Action::Accept, None, now()).unwrap(),
            (UserResponse::Accepted, None)
        );
        assert_eq!(
            resolve_action(Action::Decline, Some("2h"), now()).unwrap(),
            (UserResponse::Declined, None)
        );
        assert_eq!(resolve_action(Action::None, None, now()).unwrap(), (UserResponse::None, None));
    }

    #[test]
    fn respond_writes_the_state_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        slotwatch_storage::save(&path, &[state(15), state(16)]).unwrap();

        let updated = respond(&path, "2026-10-16T19:00", Action::Snooze, Some("30m"), now()).unwrap();
        assert_eq!(updated.snooze_until, Some(now() + Duration::minutes(30)));

        let stored = slotwatch_storage::load(&path);
        assert_eq!(stored[0].user_response, UserResponse::None);
        assert_eq!(stored[1].user_response, UserResponse::Snoozed);

        assert!(respond(&path, "2026-10-30T19:00", Action::Accept, None, now()).is_err());
    }

    #[test]
    fn status_prints_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        assert_eq!(status(&path).unwrap(), "[]");

        slotwatch_storage::save(&path, &[state(15)]).unwrap();
        let out = status(&path).unwrap();
        let parsed: Vec<PersistedState> = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed, vec![state(15)]);
    }

    #[test]
    fn prune_defaults_to_today_in_zone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        slotwatch_storage::save(&path, &[state(12), state(13), state(14), state(15)]).unwrap();

        // 02:00 UTC on Oct 14 is still Oct 13 in Toronto.
        let zone: IanaZone = "America/Toronto".parse().unwrap();
        let early = Utc.with_ymd_and_hms(2026, 10, 14, 2, 0, 0).unwrap();
        assert_eq!(prune(&path, None, &zone, early).unwrap(), 1);
        assert_eq!(slotwatch_storage::load(&path).len(), 3);

        let explicit = NaiveDate::from_ymd_opt(2026, 10, 15);
        assert_eq!(prune(&path, explicit, &zone, early).unwrap(), 2);
        assert_eq!(prune(&path, explicit, &zone, early).unwrap(), 0);
    }
}
