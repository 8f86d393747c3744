use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::snapshot::ResourceSnapshot;

/// The four mutually exclusive alert classes.
///
/// Declared high to low severity; the derived `Ord` follows declaration
/// order, so `Saturated < Viable`. Use [`AlertClass::severity`] when a
/// numeric rank reads better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertClass {
    /// Primary capacity just filled up.
    Saturated,
    /// A full session just had a spot open up.
    Reopened,
    /// Few primary spots remain.
    Urgent,
    /// Enough people and a secondary role are registered for the session to run.
    Viable,
}

impl AlertClass {
    /// Numeric severity (higher = more severe).
    pub fn severity(&self) -> u8 {
        match self {
            AlertClass::Saturated => 3,
            AlertClass::Reopened => 2,
            AlertClass::Urgent => 1,
            AlertClass::Viable => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertClass::Saturated => "saturated",
            AlertClass::Reopened => "reopened",
            AlertClass::Urgent => "urgent",
            AlertClass::Viable => "viable",
        }
    }
}

impl fmt::Display for AlertClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decision to notify someone, ready for delivery.
///
/// Carries everything a sink needs so it never has to consult the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alert {
    pub class: AlertClass,
    pub resource_id: String,
    pub snapshot: ResourceSnapshot,
    pub message: String,
    pub action_url: String,
    pub raised_at: DateTime<Utc>,
}
