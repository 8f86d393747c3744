//! Minijinja template rendering for alert notifications.
//!
//! Subject and body are arbitrary strings supplied through configuration,
//! so a fresh [`minijinja::Environment`] is created per render call.
//!
//! Templates see three top-level values:
//!
//! - `alert`: `class`, `severity`, `message`, `action_url`, `raised_at`
//! - `session`: `id`, `title`, `date`, `start_time`, `anchor`, the primary
//!   and secondary counters, `remaining` and `saturated`
//! - `labels`: `primary` and `secondary` role names

use std::collections::HashMap;

use slotwatch_core::config::{AlertConfig, NotifyConfig};
use slotwatch_core::Alert;

use crate::traits::{Notification, NotifyError};

pub const DEFAULT_SUBJECT: &str =
    "[slotwatch] {{ alert.class | upper }}: {{ session.title }} {{ session.date }} {{ session.start_time }}";

pub const DEFAULT_BODY: &str =
    "{{ alert.message }}{% if alert.action_url %}\n{{ alert.action_url }}{% endif %}";

/// Context data available to notification templates.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TemplateContext {
    pub alert: AlertContext,
    pub session: SessionContext,
    pub labels: LabelContext,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct AlertContext {
    pub class: String,
    pub severity: u8,
    pub message: String,
    pub action_url: String,
    /// RFC 3339.
    pub raised_at: String,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct SessionContext {
    pub id: String,
    /// `"Session"` when the source gave no title.
    pub title: String,
    /// `YYYY-MM-DD`.
    pub date: String,
    /// `HH:MM`.
    pub start_time: String,
    /// RFC 3339, UTC.
    pub anchor: String,
    pub primary_count: u32,
    pub primary_max: u32,
    pub secondary_count: u32,
    pub secondary_max: u32,
    pub remaining: u32,
    pub saturated: bool,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct LabelContext {
    pub primary: String,
    pub secondary: String,
}

impl TemplateContext {
    pub fn from_alert(alert: &Alert, labels: &LabelContext) -> Self {
        let snap = &alert.snapshot;
        Self {
            alert: AlertContext {
                class: alert.class.to_string(),
                severity: alert.class.severity(),
                message: alert.message.clone(),
                action_url: alert.action_url.clone(),
                raised_at: alert.raised_at.to_rfc3339(),
            },
            session: SessionContext {
                id: alert.resource_id.clone(),
                title: snap.title.clone().unwrap_or_else(|| "Session".to_string()),
                date: snap.date.format("%Y-%m-%d").to_string(),
                start_time: snap.start_time.format("%H:%M").to_string(),
                anchor: snap.anchor.to_rfc3339(),
                primary_count: snap.primary_count,
                primary_max: snap.primary_max,
                secondary_count: snap.secondary_count,
                secondary_max: snap.secondary_max,
                remaining: snap.remaining(),
                saturated: snap.is_saturated(),
            },
            labels: labels.clone(),
        }
    }
}

/// Renders notification templates using minijinja.
#[derive(Debug, Default)]
pub struct TemplateRenderer {
    _private: (),
}

impl TemplateRenderer {
    pub fn new() -> Self {
        Self { _private: () }
    }

    fn build_env() -> minijinja::Environment<'static> {
        let mut env = minijinja::Environment::new();
        env.add_filter("spots", spots_filter);
        env.add_function("env", env_function);
        env
    }

    /// Render a template string with the given context.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Template`] if the template is invalid or
    /// rendering fails.
    pub fn render(&self, template_str: &str, ctx: &TemplateContext) -> Result<String, NotifyError> {
        let env = Self::build_env();
        env.render_str(template_str, ctx)
            .map_err(|e| NotifyError::Template(e.to_string()))
    }

    /// Check that a template string parses, without evaluating it.
    pub fn validate(&self, template_str: &str) -> Result<(), NotifyError> {
        let env = Self::build_env();
        env.template_from_str(template_str)
            .map_err(|e| NotifyError::Template(e.to_string()))?;
        Ok(())
    }
}

/// Subject and body templates plus the role labels, validated once at
/// startup and applied to every alert.
#[derive(Debug)]
pub struct MessageTemplates {
    subject: String,
    body: String,
    labels: LabelContext,
    renderer: TemplateRenderer,
}

impl MessageTemplates {
    pub fn new(
        subject: impl Into<String>,
        body: impl Into<String>,
        labels: LabelContext,
    ) -> Result<Self, NotifyError> {
        let renderer = TemplateRenderer::new();
        let subject = subject.into();
        let body = body.into();
        renderer
            .validate(&subject)
            .map_err(|e| NotifyError::Config(format!("invalid subject template: {e}")))?;
        renderer
            .validate(&body)
            .map_err(|e| NotifyError::Config(format!("invalid body template: {e}")))?;
        Ok(Self {
            subject,
            body,
            labels,
            renderer,
        })
    }

    /// Configured overrides, falling back to [`DEFAULT_SUBJECT`] and
    /// [`DEFAULT_BODY`].
    pub fn from_config(notify: &NotifyConfig, alert: &AlertConfig) -> Result<Self, NotifyError> {
        Self::new(
            notify.subject_template.as_deref().unwrap_or(DEFAULT_SUBJECT),
            notify.body_template.as_deref().unwrap_or(DEFAULT_BODY),
            LabelContext {
                primary: alert.primary_label.clone(),
                secondary: alert.secondary_label.clone(),
            },
        )
    }

    /// Render an alert into a [`Notification`].
    ///
    /// A template that fails at render time (a missing filter argument,
    /// say) degrades to the alert's plain message rather than dropping the
    /// alert.
    pub fn compose(&self, alert: &Alert) -> Notification {
        let ctx = TemplateContext::from_alert(alert, &self.labels);
        let subject = self.renderer.render(&self.subject, &ctx).unwrap_or_else(|e| {
            tracing::warn!(resource_id = %alert.resource_id, error = %e, "subject template failed");
            format!("[slotwatch] {}", alert.class)
        });
        let body = self.renderer.render(&self.body, &ctx).unwrap_or_else(|e| {
            tracing::warn!(resource_id = %alert.resource_id, error = %e, "body template failed");
            alert.message.clone()
        });

        Notification {
            subject,
            body,
            metadata: HashMap::from([
                ("class".to_string(), alert.class.to_string()),
                ("severity".to_string(), alert.class.severity().to_string()),
                ("resource_id".to_string(), alert.resource_id.clone()),
                ("action_url".to_string(), alert.action_url.clone()),
            ]),
        }
    }
}

/// Custom filter: `3 | spots` renders `"3 spots"`, `1 | spots` renders `"1 spot"`.
fn spots_filter(value: u32) -> String {
    if value == 1 {
        "1 spot".to_string()
    } else {
        format!("{value} spots")
    }
}

/// Global function: read an environment variable by name, empty when unset.
fn env_function(name: String) -> String {
    match std::env::var(&name) {
        Ok(val) => val,
        Err(_) => {
            tracing::warn!(var = %name, "Environment variable not found, returning empty string");
            String::new()
        }
    }
}
