//! Notifier trait definition and shared error types.

use std::collections::HashMap;

/// Errors that can occur during notification delivery.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Template rendering failed: {0}")]
    Template(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// A rendered notification ready for delivery.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Notification {
    /// The rendered subject/title.
    pub subject: String,
    /// The rendered body content.
    pub body: String,
    /// `class`, `resource_id`, `severity` and `action_url` of the alert.
    pub metadata: HashMap<String, String>,
}

impl Notification {
    pub fn resource_id(&self) -> &str {
        self.metadata.get("resource_id").map(String::as_str).unwrap_or_default()
    }
}

/// Trait for notification channel implementations.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a notification through this channel.
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;

    /// Test connectivity with a sample notification.
    async fn test(&self) -> Result<(), NotifyError> {
        let probe = Notification {
            subject: "[slotwatch] test".to_string(),
            body: "Test notification from slotwatch.".to_string(),
            metadata: HashMap::from([("resource_id".to_string(), "test".to_string())]),
        };
        self.send(&probe).await
    }

    /// Human-readable name for this channel (e.g., "console", "webhook").
    fn channel_name(&self) -> &str;
}

/// Result of delivering one alert to a single channel.
#[derive(Debug)]
pub struct DispatchResult {
    pub channel: String,
    pub resource_id: String,
    pub success: bool,
    pub error: Option<String>,
    pub duration_ms: u64,
}
