//! Write path for user responses between cycles.

use std::path::Path;

use chrono::{DateTime, Utc};
use slotwatch_core::{PersistedState, UserResponse};
use tracing::info;

use crate::error::StorageError;
use crate::store::{load, save};

/// Record the user's response for one session and persist it atomically.
///
/// `snooze_until` is required for [`UserResponse::Snoozed`] and ignored
/// otherwise. Returns the updated record.
pub fn record_response(
    path: &Path,
    resource_id: &str,
    response: UserResponse,
    now: DateTime<Utc>,
    snooze_until: Option<DateTime<Utc>>,
) -> Result<PersistedState, StorageError> {
    if response == UserResponse::Snoozed && snooze_until.is_none() {
        return Err(StorageError::SnoozeWithoutEnd);
    }

    let mut states = load(path);
    let state = states
        .iter_mut()
        .find(|s| s.resource_id() == resource_id)
        .ok_or_else(|| StorageError::UnknownResource(resource_id.to_string()))?;

    state.set_response(response, now, snooze_until);
    let updated = state.clone();
    save(path, &states)?;

    info!(
        resource_id,
        response = %response,
        snooze_until = ?updated.snooze_until,
        "recorded user response"
    );
    Ok(updated)
}
