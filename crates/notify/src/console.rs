//! Log-only notifier: writes each notification through `tracing`.

use crate::traits::{Notification, Notifier, NotifyError};

#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl Notifier for ConsoleNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        tracing::info!(
            resource_id = notification.resource_id(),
            subject = %notification.subject,
            body = %notification.body,
            "alert"
        );
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "console"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn console_always_succeeds() {
        let notifier = ConsoleNotifier::new();
        assert!(notifier.test().await.is_ok());
        assert_eq!(notifier.channel_name(), "console");
    }
}
