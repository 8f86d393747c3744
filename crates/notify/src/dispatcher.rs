//! Routes alerts to configured channels.
//!
//! Each alert is rendered once through [`MessageTemplates`] and delivered to
//! every channel. Individual channel failures don't block other channels.

use slotwatch_core::config::{AlertConfig, NotifyConfig};
use slotwatch_core::{Alert, AlertClass};

use crate::console::ConsoleNotifier;
use crate::templating::MessageTemplates;
use crate::traits::{DispatchResult, Notification, Notifier, NotifyError};
use crate::webhook::WebhookNotifier;

/// Dispatches alerts to every configured channel.
pub struct Dispatcher {
    templates: MessageTemplates,
    channels: Vec<Box<dyn Notifier>>,
}

impl Dispatcher {
    pub fn new(templates: MessageTemplates, channels: Vec<Box<dyn Notifier>>) -> Self {
        Self {
            templates,
            channels,
        }
    }

    /// Console always, plus a webhook when `webhook_url` is set.
    pub fn from_config(notify: &NotifyConfig, alert: &AlertConfig) -> Result<Self, NotifyError> {
        let templates = MessageTemplates::from_config(notify, alert)?;
        let mut channels: Vec<Box<dyn Notifier>> = vec![Box::new(ConsoleNotifier::new())];
        if let Some(url) = notify.webhook_url.as_deref() {
            channels.push(Box::new(WebhookNotifier::new(url)?));
        }
        Ok(Self::new(templates, channels))
    }

    pub fn channel_names(&self) -> Vec<&str> {
        self.channels.iter().map(|c| c.channel_name()).collect()
    }

    /// Deliver every alert, in order. Returns one result per alert and
    /// channel.
    pub async fn deliver(&self, alerts: &[Alert]) -> Vec<DispatchResult> {
        let mut results = Vec::new();
        for alert in alerts {
            let notification = self.templates.compose(alert);
            results.extend(self.dispatch(alert.class, &notification).await);
        }
        results
    }

    /// Deliver one rendered notification to every channel. `class` only
    /// tags the log events.
    pub async fn dispatch(
        &self,
        class: AlertClass,
        notification: &Notification,
    ) -> Vec<DispatchResult> {
        let channels = &self.channels;
        let resource_id = notification.resource_id();

        if channels.is_empty() {
            tracing::debug!(%class, resource_id, "No notification channels configured");
            return Vec::new();
        }

        let mut results = Vec::with_capacity(channels.len());

        for channel in channels {
            let start = std::time::Instant::now();
            let result = channel.send(notification).await;
            let duration_ms = start.elapsed().as_millis() as u64;

            let (success, error) = match result {
                Ok(()) => {
                    tracing::info!(
                        %class,
                        resource_id,
                        channel = channel.channel_name(),
                        duration_ms,
                        "Notification delivered"
                    );
                    (true, None)
                }
                Err(e) => {
                    tracing::warn!(
                        %class,
                        resource_id,
                        channel = channel.channel_name(),
                        error = %e,
                        duration_ms,
                        "Notification delivery failed"
                    );
                    (false, Some(e.to_string()))
                }
            };

            results.push(DispatchResult {
                channel: channel.channel_name().to_string(),
                resource_id: resource_id.to_string(),
                success,
                error,
                duration_ms,
            });
        }

        results
    }
}
