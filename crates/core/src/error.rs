use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("unknown timezone: {0}")]
    UnknownTimezone(String),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Startup-time configuration failures. Any of these is fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: String, value: String },

    #[error("{key} must not be negative (got {value})")]
    Negative { key: String, value: i64 },

    #[error("{key} must be greater than zero")]
    Zero { key: String },

    #[error("{key} must be at most {max} (got {value})")]
    TooLarge { key: String, value: u32, max: u32 },

    #[error("{key} must be an hour between 0 and 23 (got {value})")]
    HourOutOfRange { key: String, value: u32 },

    #[error("active hours are empty: end ({end}) must be after start ({start})")]
    EmptyActiveHours { start: u32, end: u32 },

    #[error("unknown timezone: {0}")]
    UnknownTimezone(String),
}
