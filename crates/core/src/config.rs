use std::env;
use std::path::PathBuf;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::civil::IanaZone;
use crate::error::ConfigError;

/// Prefix shared by every recognized environment key.
pub const ENV_PREFIX: &str = "SLOTWATCH_";

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

/// Load a specific env file. Missing files are an error here since the
/// caller asked for this one by name.
pub fn load_env_file(path: &std::path::Path) -> Result<(), dotenvy::Error> {
    dotenvy::from_path(path).map(|_| ())
}

/// Key lookup over some environment, normally the process environment.
struct Env<F> {
    lookup: F,
}

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn full_key(key: &str) -> String {
        format!("{ENV_PREFIX}{key}")
    }

    fn opt(&self, key: &str) -> Option<String> {
        (self.lookup)(&Self::full_key(key)).filter(|s| !s.trim().is_empty())
    }

    fn string_or(&self, key: &str, default: &str) -> String {
        self.opt(key).unwrap_or_else(|| default.to_string())
    }

    /// Parse as signed so a negative value is reported instead of being
    /// mistaken for garbage.
    fn unsigned_or(&self, key: &str, default: u32) -> Result<u32, ConfigError> {
        let Some(raw) = self.opt(key) else {
            return Ok(default);
        };
        let full_key = Self::full_key(key);
        let value: i64 = raw.trim().parse().map_err(|_| ConfigError::Invalid {
            key: full_key.clone(),
            value: raw.clone(),
        })?;
        if value < 0 {
            return Err(ConfigError::Negative {
                key: full_key,
                value,
            });
        }
        u32::try_from(value).map_err(|_| ConfigError::Invalid {
            key: full_key,
            value: raw,
        })
    }
}

/// Upper bound for every schedule length, in hours (one leap year).
pub const MAX_PLAN_HOURS: u32 = 24 * 366;

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub alert: AlertConfig,
    pub schedule: ScheduleConfig,
    pub storage: StorageConfig,
    pub notify: NotifyConfig,
    /// IANA identifier of the reference timezone.
    pub timezone: String,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup. Keys carry the
    /// `SLOTWATCH_` prefix.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup };
        Ok(Self {
            alert: AlertConfig::from_env(&env)?,
            schedule: ScheduleConfig::from_env(&env)?,
            storage: StorageConfig::from_env(&env),
            notify: NotifyConfig::from_env(&env),
            timezone: env.string_or("TIMEZONE", DEFAULT_TIMEZONE),
        })
    }

    /// Reject settings the evaluator and scheduler cannot run with.
    ///
    /// Negative numbers are already rejected while loading; this covers
    /// relationships between fields and the timezone name.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.schedule.validate()?;
        self.zone()?;
        Ok(())
    }

    /// Parsed reference timezone.
    pub fn zone(&self) -> Result<IanaZone, ConfigError> {
        self.timezone
            .parse()
            .map_err(|_| ConfigError::UnknownTimezone(self.timezone.clone()))
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded:");
        tracing::info!(
            "  alert:     urgent<={}, viable secondary>={} primary>={}, re-alert delta={}",
            self.alert.urgent_threshold,
            self.alert.min_secondary,
            self.alert.min_primary_registered,
            self.alert.viable_realert_delta,
        );
        tracing::info!(
            "  schedule:  every {}m ({}m accelerated), approach={}h, max sleep={}h, active {:02}:00-{:02}:59",
            self.schedule.normal_interval_minutes,
            self.schedule.accelerated_interval_minutes,
            self.schedule.approach_window_hours,
            self.schedule.max_sleep_hours,
            self.schedule.active_hour_start,
            self.schedule.active_hour_end,
        );
        tracing::info!("  timezone:  {}", self.timezone);
        tracing::info!(
            "  storage:   state={}, source={}",
            self.storage.state_path.display(),
            self.storage.source_path.display()
        );
        tracing::info!(
            "  notify:    webhook={}",
            if self.notify.webhook_url.is_some() { "configured" } else { "(none)" }
        );
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            alert: AlertConfig::default(),
            schedule: ScheduleConfig::default(),
            storage: StorageConfig::default(),
            notify: NotifyConfig::default(),
            timezone: DEFAULT_TIMEZONE.to_string(),
        }
    }
}

const DEFAULT_TIMEZONE: &str = "America/Toronto";

// ── Alerting ──────────────────────────────────────────────────

/// Evaluator thresholds plus the wording used in alert messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertConfig {
    /// Urgent fires when `primary_max - primary_count <= urgent_threshold`.
    pub urgent_threshold: u32,
    pub min_secondary: u32,
    pub min_primary_registered: u32,
    /// Open spots that must disappear before Viable fires again.
    pub viable_realert_delta: u32,
    pub primary_label: String,
    pub secondary_label: String,
    /// Fallback action link when a snapshot has no URL of its own.
    pub action_url: Option<String>,
}

impl AlertConfig {
    fn from_env<F: Fn(&str) -> Option<String>>(env: &Env<F>) -> Result<Self, ConfigError> {
        let d = Self::default();
        Ok(Self {
            urgent_threshold: env.unsigned_or("URGENT_THRESHOLD", d.urgent_threshold)?,
            min_secondary: env.unsigned_or("MIN_SECONDARY", d.min_secondary)?,
            min_primary_registered: env
                .unsigned_or("MIN_PRIMARY_REGISTERED", d.min_primary_registered)?,
            viable_realert_delta: env.unsigned_or("VIABLE_REALERT_DELTA", d.viable_realert_delta)?,
            primary_label: env.string_or("PRIMARY_LABEL", &d.primary_label),
            secondary_label: env.string_or("SECONDARY_LABEL", &d.secondary_label),
            action_url: env.opt("ACTION_URL"),
        })
    }
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            urgent_threshold: 4,
            min_secondary: 1,
            min_primary_registered: 10,
            viable_realert_delta: 2,
            primary_label: "players".to_string(),
            secondary_label: "goalies".to_string(),
            action_url: None,
        }
    }
}

// ── Scheduling ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    pub normal_interval_minutes: u32,
    pub accelerated_interval_minutes: u32,
    pub approach_window_hours: u32,
    pub max_sleep_hours: u32,
    /// First civil hour (inclusive) a wake-up may land in.
    pub active_hour_start: u32,
    /// Last civil hour (inclusive) a wake-up may land in.
    pub active_hour_end: u32,
}

impl ScheduleConfig {
    fn from_env<F: Fn(&str) -> Option<String>>(env: &Env<F>) -> Result<Self, ConfigError> {
        let d = Self::default();
        Ok(Self {
            normal_interval_minutes: env
                .unsigned_or("NORMAL_INTERVAL_MINUTES", d.normal_interval_minutes)?,
            accelerated_interval_minutes: env
                .unsigned_or("ACCELERATED_INTERVAL_MINUTES", d.accelerated_interval_minutes)?,
            approach_window_hours: env
                .unsigned_or("APPROACH_WINDOW_HOURS", d.approach_window_hours)?,
            max_sleep_hours: env.unsigned_or("MAX_SLEEP_HOURS", d.max_sleep_hours)?,
            active_hour_start: env.unsigned_or("ACTIVE_HOUR_START", d.active_hour_start)?,
            active_hour_end: env.unsigned_or("ACTIVE_HOUR_END", d.active_hour_end)?,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("NORMAL_INTERVAL_MINUTES", self.normal_interval_minutes),
            ("ACCELERATED_INTERVAL_MINUTES", self.accelerated_interval_minutes),
            ("MAX_SLEEP_HOURS", self.max_sleep_hours),
        ] {
            if value == 0 {
                return Err(ConfigError::Zero {
                    key: format!("{ENV_PREFIX}{key}"),
                });
            }
        }
        let max_minutes = MAX_PLAN_HOURS * 60;
        for (key, value, max) in [
            ("NORMAL_INTERVAL_MINUTES", self.normal_interval_minutes, max_minutes),
            ("ACCELERATED_INTERVAL_MINUTES", self.accelerated_interval_minutes, max_minutes),
            ("APPROACH_WINDOW_HOURS", self.approach_window_hours, MAX_PLAN_HOURS),
            ("MAX_SLEEP_HOURS", self.max_sleep_hours, MAX_PLAN_HOURS),
        ] {
            if value > max {
                return Err(ConfigError::TooLarge {
                    key: format!("{ENV_PREFIX}{key}"),
                    value,
                    max,
                });
            }
        }
        for (key, value) in [
            ("ACTIVE_HOUR_START", self.active_hour_start),
            ("ACTIVE_HOUR_END", self.active_hour_end),
        ] {
            if value > 23 {
                return Err(ConfigError::HourOutOfRange {
                    key: format!("{ENV_PREFIX}{key}"),
                    value,
                });
            }
        }
        if self.active_hour_end <= self.active_hour_start {
            return Err(ConfigError::EmptyActiveHours {
                start: self.active_hour_start,
                end: self.active_hour_end,
            });
        }
        Ok(())
    }

    pub fn normal_interval(&self) -> Duration {
        Duration::minutes(i64::from(self.normal_interval_minutes))
    }

    pub fn accelerated_interval(&self) -> Duration {
        Duration::minutes(i64::from(self.accelerated_interval_minutes))
    }

    pub fn approach_window(&self) -> Duration {
        Duration::hours(i64::from(self.approach_window_hours))
    }

    pub fn max_sleep(&self) -> Duration {
        Duration::hours(i64::from(self.max_sleep_hours))
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            normal_interval_minutes: 60,
            accelerated_interval_minutes: 30,
            approach_window_hours: 48,
            max_sleep_hours: 12,
            active_hour_start: 7,
            active_hour_end: 22,
        }
    }
}

// ── Storage ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// JSON array of persisted per-session records.
    pub state_path: PathBuf,
    /// JSON array of raw session records read by the file source.
    pub source_path: PathBuf,
}

impl StorageConfig {
    fn from_env<F: Fn(&str) -> Option<String>>(env: &Env<F>) -> Self {
        Self {
            state_path: PathBuf::from(env.string_or("STATE_PATH", "data/state.json")),
            source_path: PathBuf::from(env.string_or("SOURCE_PATH", "data/sessions.json")),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_path: PathBuf::from("data/state.json"),
            source_path: PathBuf::from("data/sessions.json"),
        }
    }
}

// ── Notification ──────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotifyConfig {
    pub webhook_url: Option<String>,
    /// Minijinja override for the notification subject.
    pub subject_template: Option<String>,
    /// Minijinja override for the notification body.
    pub body_template: Option<String>,
}

impl NotifyConfig {
    fn from_env<F: Fn(&str) -> Option<String>>(env: &Env<F>) -> Self {
        Self {
            webhook_url: env.opt("WEBHOOK_URL"),
            subject_template: env.opt("SUBJECT_TEMPLATE"),
            body_template: env.opt("BODY_TEMPLATE"),
        }
    }
}
