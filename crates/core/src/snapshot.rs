use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::civil::CivilZone;

/// One observation of a tracked session for the current cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSnapshot {
    /// `YYYY-MM-DDTHH:MM` of the civil start, see [`ResourceSnapshot::derive_id`].
    pub resource_id: String,
    /// Civil start date in the reference timezone.
    pub date: NaiveDate,
    /// Civil start time in the reference timezone.
    pub start_time: NaiveTime,
    /// Absolute instant of the civil start.
    pub anchor: DateTime<Utc>,
    pub primary_count: u32,
    pub primary_max: u32,
    #[serde(default)]
    pub secondary_count: u32,
    #[serde(default)]
    pub secondary_max: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Detail or registration page for this session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl ResourceSnapshot {
    /// Create a snapshot with empty counters. Use the `with_*` builders to
    /// fill them in.
    pub fn new(date: NaiveDate, start_time: NaiveTime, anchor: DateTime<Utc>) -> Self {
        Self {
            resource_id: Self::derive_id(date, start_time),
            date,
            start_time,
            anchor,
            primary_count: 0,
            primary_max: 0,
            secondary_count: 0,
            secondary_max: 0,
            title: None,
            url: None,
        }
    }

    /// Create a snapshot whose anchor is resolved through `zone`.
    ///
    /// Returns `None` when the civil start does not exist in the zone (it
    /// falls inside a DST gap).
    pub fn at_civil(date: NaiveDate, start_time: NaiveTime, zone: &dyn CivilZone) -> Option<Self> {
        let anchor = zone.resolve(date.and_time(start_time))?;
        Some(Self::new(date, start_time, anchor))
    }

    /// Composite key from the civil date and start time.
    pub fn derive_id(date: NaiveDate, start_time: NaiveTime) -> String {
        format!("{}T{}", date.format("%Y-%m-%d"), start_time.format("%H:%M"))
    }

    pub fn with_primary(mut self, count: u32, max: u32) -> Self {
        self.primary_count = count;
        self.primary_max = max;
        self
    }

    pub fn with_secondary(mut self, count: u32, max: u32) -> Self {
        self.secondary_count = count;
        self.secondary_max = max;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Primary capacity is full.
    pub fn is_saturated(&self) -> bool {
        self.primary_count >= self.primary_max
    }

    /// Open primary spots, zero when saturated or overbooked.
    pub fn remaining(&self) -> u32 {
        self.primary_max.saturating_sub(self.primary_count)
    }

    /// A snapshot without an identity or a primary capacity carries nothing
    /// the evaluator can reason about.
    pub fn is_well_formed(&self) -> bool {
        !self.resource_id.is_empty() && self.primary_max > 0
    }
}
