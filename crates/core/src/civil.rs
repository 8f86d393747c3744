//! Wall-clock and timezone seams.
//!
//! Everything that turns an absolute instant into a civil date/time (or back)
//! goes through [`CivilZone`], and everything that asks "what time is it"
//! goes through [`Clock`]. Production code uses [`SystemClock`] and an
//! [`IanaZone`]; tests inject a [`FixedClock`] and either a fixed offset or a
//! named zone whose rules ship with `chrono-tz`, so nothing depends on the
//! host machine's local time settings.

use std::str::FromStr;
use std::sync::RwLock;

use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::CoreError;

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The real wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at a given instant that tests can move by hand.
#[derive(Debug)]
pub struct FixedClock {
    now: RwLock<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(at),
        }
    }

    /// Jump to an absolute instant.
    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.write().expect("clock lock poisoned") = at;
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut guard = self.now.write().expect("clock lock poisoned");
        *guard += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read().expect("clock lock poisoned")
    }
}

/// Conversion between absolute instants and civil time in one timezone.
pub trait CivilZone: Send + Sync {
    /// Civil (wall-clock) date/time of `instant` in this zone.
    fn to_civil(&self, instant: DateTime<Utc>) -> NaiveDateTime;

    /// Absolute instant of a civil date/time.
    ///
    /// Ambiguous times (clocks falling back) resolve to the earlier instant.
    /// Returns `None` when the civil time does not exist (clocks springing
    /// forward).
    fn resolve(&self, civil: NaiveDateTime) -> Option<DateTime<Utc>>;

    /// Display name, e.g. `America/Toronto` or `+02:00`.
    fn name(&self) -> String;
}

/// A named IANA zone with its full offset history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IanaZone(Tz);

impl IanaZone {
    pub fn new(tz: Tz) -> Self {
        Self(tz)
    }

    pub fn tz(&self) -> Tz {
        self.0
    }
}

impl FromStr for IanaZone {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<Tz>()
            .map(Self)
            .map_err(|_| CoreError::UnknownTimezone(s.to_string()))
    }
}

impl CivilZone for IanaZone {
    fn to_civil(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        instant.with_timezone(&self.0).naive_local()
    }

    fn resolve(&self, civil: NaiveDateTime) -> Option<DateTime<Utc>> {
        self.0
            .from_local_datetime(&civil)
            .earliest()
            .map(|t| t.with_timezone(&Utc))
    }

    fn name(&self) -> String {
        self.0.name().to_string()
    }
}

/// A zone with a constant UTC offset and no seasonal changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedZone(FixedOffset);

impl FixedZone {
    pub fn new(offset: FixedOffset) -> Self {
        Self(offset)
    }

    pub fn utc() -> Self {
        Self(FixedOffset::east_opt(0).expect("zero offset is valid"))
    }

    /// Offset in whole hours east of UTC. Returns `None` outside ±23h.
    pub fn hours_east(hours: i32) -> Option<Self> {
        FixedOffset::east_opt(hours * 3_600).map(Self)
    }
}

impl CivilZone for FixedZone {
    fn to_civil(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        instant.with_timezone(&self.0).naive_local()
    }

    fn resolve(&self, civil: NaiveDateTime) -> Option<DateTime<Utc>> {
        self.0
            .from_local_datetime(&civil)
            .earliest()
            .map(|t| t.with_timezone(&Utc))
    }

    fn name(&self) -> String {
        self.0.to_string()
    }
}

/// Resolve `civil`, or the first civil minute after it that exists.
///
/// Only a DST gap can make a civil time unresolvable, and no gap lasts a
/// day, so the search is bounded to 24 hours.
pub fn first_valid_at_or_after(zone: &dyn CivilZone, civil: NaiveDateTime) -> Option<DateTime<Utc>> {
    (0..=24 * 60).find_map(|minute| zone.resolve(civil + Duration::minutes(minute)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};

    fn civil(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn parse_known_zone() {
        let zone: IanaZone = "America/Toronto".parse().unwrap();
        assert_eq!(zone.name(), "America/Toronto");
    }

    #[test]
    fn parse_unknown_zone_fails() {
        let err = "Mars/Olympus_Mons".parse::<IanaZone>().unwrap_err();
        assert!(err.to_string().contains("Mars/Olympus_Mons"));
    }

    #[test]
    fn toronto_offset_changes_with_season() {
        let zone: IanaZone = "America/Toronto".parse().unwrap();
        // Winter: UTC-5.
        let jan = Utc.with_ymd_and_hms(2026, 1, 15, 17, 0, 0).unwrap();
        assert_eq!(zone.to_civil(jan).hour(), 12);
        // Summer: UTC-4.
        let jul = Utc.with_ymd_and_hms(2026, 7, 15, 17, 0, 0).unwrap();
        assert_eq!(zone.to_civil(jul).hour(), 13);
    }

    #[test]
    fn resolve_gap_returns_none() {
        let zone: IanaZone = "America/Toronto".parse().unwrap();
        // 2026-03-08 02:30 does not exist in Toronto.
        assert!(zone.resolve(civil(2026, 3, 8, 2, 30)).is_none());
    }

    #[test]
    fn resolve_ambiguous_picks_earlier() {
        let zone: IanaZone = "America/Toronto".parse().unwrap();
        // 2026-11-01 01:30 happens twice; the first is still on EDT (UTC-4).
        let resolved = zone.resolve(civil(2026, 11, 1, 1, 30)).unwrap();
        assert_eq!(resolved, Utc.with_ymd_and_hms(2026, 11, 1, 5, 30, 0).unwrap());
    }

    #[test]
    fn first_valid_skips_gap() {
        let zone: IanaZone = "America/Toronto".parse().unwrap();
        let resolved = first_valid_at_or_after(&zone, civil(2026, 3, 8, 2, 0)).unwrap();
        // 03:00 EDT == 07:00 UTC.
        assert_eq!(resolved, Utc.with_ymd_and_hms(2026, 3, 8, 7, 0, 0).unwrap());
    }

    #[test]
    fn fixed_zone_round_trip() {
        let zone = FixedZone::hours_east(2).unwrap();
        let instant = Utc.with_ymd_and_hms(2026, 6, 1, 10, 0, 0).unwrap();
        let local = zone.to_civil(instant);
        assert_eq!(local.hour(), 12);
        assert_eq!(zone.resolve(local), Some(instant));
    }

    #[test]
    fn fixed_clock_advances() {
        let start = Utc.with_ymd_and_hms(2026, 6, 1, 10, 0, 0).unwrap();
        let clock = FixedClock::new(start);
        clock.advance(Duration::minutes(90));
        assert_eq!(clock.now(), start + Duration::minutes(90));
        clock.set(start);
        assert_eq!(clock.now(), start);
    }
}
