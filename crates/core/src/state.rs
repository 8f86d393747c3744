use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::alert::AlertClass;
use crate::snapshot::ResourceSnapshot;

/// What the user said about a session, written between cycles by the
/// interaction side (CLI, chat button, ...). The evaluator only reads it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserResponse {
    #[default]
    None,
    Accepted,
    Declined,
    Snoozed,
}

impl UserResponse {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserResponse::None => "none",
            UserResponse::Accepted => "accepted",
            UserResponse::Declined => "declined",
            UserResponse::Snoozed => "snoozed",
        }
    }
}

impl std::fmt::Display for UserResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The only data carried from one cycle to the next, one per resource.
///
/// Every field except `snapshot` defaults on deserialize so files written
/// before a field existed still load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedState {
    pub snapshot: ResourceSnapshot,
    #[serde(default)]
    pub last_alert_class: Option<AlertClass>,
    #[serde(default)]
    pub last_alert_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_primary_count_at_alert: Option<u32>,
    #[serde(default)]
    pub user_response: UserResponse,
    #[serde(default)]
    pub user_responded_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub snooze_until: Option<DateTime<Utc>>,
}

impl PersistedState {
    /// Fresh record for a resource seen for the first time.
    pub fn new(snapshot: ResourceSnapshot) -> Self {
        Self {
            snapshot,
            last_alert_class: None,
            last_alert_at: None,
            last_primary_count_at_alert: None,
            user_response: UserResponse::None,
            user_responded_at: None,
            snooze_until: None,
        }
    }

    pub fn resource_id(&self) -> &str {
        &self.snapshot.resource_id
    }

    pub fn anchor(&self) -> DateTime<Utc> {
        self.snapshot.anchor
    }

    pub fn date(&self) -> NaiveDate {
        self.snapshot.date
    }

    /// The response as it applies at `now`: an expired snooze reads as
    /// [`UserResponse::None`].
    pub fn effective_response(&self, now: DateTime<Utc>) -> UserResponse {
        match (self.user_response, self.snooze_until) {
            (UserResponse::Snoozed, Some(until)) if now >= until => UserResponse::None,
            // A snooze without an end never expires.
            (response, _) => response,
        }
    }

    /// Fold a fired alert into the bookkeeping fields.
    pub fn record_alert(&mut self, class: AlertClass, at: DateTime<Utc>) {
        self.last_alert_class = Some(class);
        self.last_alert_at = Some(at);
        self.last_primary_count_at_alert = Some(self.snapshot.primary_count);
    }

    /// Set the user's response. A snooze without an end time is recorded as
    /// given; every other response clears `snooze_until`.
    pub fn set_response(
        &mut self,
        response: UserResponse,
        at: DateTime<Utc>,
        snooze_until: Option<DateTime<Utc>>,
    ) {
        self.user_response = response;
        match response {
            UserResponse::None => {
                self.user_responded_at = None;
                self.snooze_until = None;
            }
            UserResponse::Snoozed => {
                self.user_responded_at = Some(at);
                self.snooze_until = snooze_until;
            }
            UserResponse::Accepted | UserResponse::Declined => {
                self.user_responded_at = Some(at);
                self.snooze_until = None;
            }
        }
    }

    /// Check the record-level invariants.
    pub fn is_consistent(&self) -> bool {
        let alert_ok = self.last_alert_class.is_none() || self.last_alert_at.is_some();
        let snooze_ok = self.snooze_until.is_none() || self.user_response == UserResponse::Snoozed;
        alert_ok && snooze_ok
    }
}
