//! Where snapshots come from.
//!
//! [`SnapshotSource`] is the seam between the tracker loop and whatever
//! produces capacity data (a scraper, an API client). [`JsonFileSource`]
//! reads a JSON array of raw session records from disk, which is what a
//! separate scraper process drops off.

use std::path::PathBuf;

use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use slotwatch_core::{CivilZone, ResourceSnapshot};
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[async_trait::async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Current snapshots. Invalid records are dropped, not reported as errors.
    async fn fetch(&self) -> Result<Vec<ResourceSnapshot>, SourceError>;

    fn name(&self) -> &str;
}

/// One record as the scraper writes it. Counters are signed so a negative
/// value is caught here rather than wrapping.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSession {
    pub date: String,
    pub start_time: String,
    pub primary_count: Option<i64>,
    pub primary_max: Option<i64>,
    pub secondary_count: Option<i64>,
    pub secondary_max: Option<i64>,
    pub title: Option<String>,
    pub url: Option<String>,
}

/// Why a raw record was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejected {
    BadDate(String),
    BadTime(String),
    MissingCounter(&'static str),
    NegativeCounter(&'static str),
    /// The civil start does not exist in the zone (DST gap).
    NonexistentTime,
}

impl std::fmt::Display for Rejected {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejected::BadDate(d) => write!(f, "unparsable date {d:?}"),
            Rejected::BadTime(t) => write!(f, "unparsable start time {t:?}"),
            Rejected::MissingCounter(name) => write!(f, "missing {name}"),
            Rejected::NegativeCounter(name) => write!(f, "negative {name}"),
            Rejected::NonexistentTime => f.write_str("start time falls in a DST gap"),
        }
    }
}

fn counter(value: Option<i64>, name: &'static str) -> Result<Option<u32>, Rejected> {
    match value {
        None => Ok(None),
        Some(v) if v < 0 => Err(Rejected::NegativeCounter(name)),
        Some(v) => u32::try_from(v).map(Some).map_err(|_| Rejected::NegativeCounter(name)),
    }
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()
}

impl RawSession {
    /// Resolve the civil start through `zone` and check the counters.
    ///
    /// Primary counters are required. Secondary counters default to zero
    /// when the source does not report them.
    pub fn normalize(&self, zone: &dyn CivilZone) -> Result<ResourceSnapshot, Rejected> {
        let date = NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d")
            .map_err(|_| Rejected::BadDate(self.date.clone()))?;
        let start = parse_time(self.start_time.trim())
            .ok_or_else(|| Rejected::BadTime(self.start_time.clone()))?;

        let primary_count = counter(self.primary_count, "primary_count")?
            .ok_or(Rejected::MissingCounter("primary_count"))?;
        let primary_max = counter(self.primary_max, "primary_max")?
            .ok_or(Rejected::MissingCounter("primary_max"))?;
        let secondary_count = counter(self.secondary_count, "secondary_count")?.unwrap_or(0);
        let secondary_max = counter(self.secondary_max, "secondary_max")?.unwrap_or(0);

        let mut snap = ResourceSnapshot::at_civil(date, start, zone)
            .ok_or(Rejected::NonexistentTime)?
            .with_primary(primary_count, primary_max)
            .with_secondary(secondary_count, secondary_max);
        if let Some(title) = self.title.as_deref().filter(|t| !t.trim().is_empty()) {
            snap = snap.with_title(title.trim());
        }
        if let Some(url) = self.url.as_deref().filter(|u| !u.trim().is_empty()) {
            snap = snap.with_url(url.trim());
        }
        Ok(snap)
    }
}

/// Normalize every record, logging and dropping the ones that fail.
pub fn normalize_all(raw: &[RawSession], zone: &dyn CivilZone) -> Vec<ResourceSnapshot> {
    raw.iter()
        .filter_map(|r| match r.normalize(zone) {
            Ok(snap) => Some(snap),
            Err(reason) => {
                warn!(date = %r.date, start_time = %r.start_time, %reason, "skipping session record");
                None
            }
        })
        .collect()
}

/// Reads raw session records from a JSON file on every fetch.
pub struct JsonFileSource<Z: CivilZone> {
    path: PathBuf,
    zone: Z,
}

impl<Z: CivilZone> JsonFileSource<Z> {
    pub fn new(path: impl Into<PathBuf>, zone: Z) -> Self {
        Self {
            path: path.into(),
            zone,
        }
    }
}

#[async_trait::async_trait]
impl<Z: CivilZone + Send + Sync> SnapshotSource for JsonFileSource<Z> {
    async fn fetch(&self) -> Result<Vec<ResourceSnapshot>, SourceError> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|source| SourceError::Read {
            path: self.path.clone(),
            source,
        })?;
        let raw: Vec<RawSession> =
            serde_json::from_slice(&bytes).map_err(|source| SourceError::Parse {
                path: self.path.clone(),
                source,
            })?;

        let snapshots = normalize_all(&raw, &self.zone);
        debug!(
            path = %self.path.display(),
            records = raw.len(),
            kept = snapshots.len(),
            "fetched snapshots"
        );
        Ok(snapshots)
    }

    fn name(&self) -> &str {
        "json-file"
    }
}
