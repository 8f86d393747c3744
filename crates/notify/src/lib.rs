//! Alert delivery.
//!
//! This crate provides:
//! - `Notifier` trait for pluggable notification channels
//! - Console and webhook notifier implementations
//! - Minijinja template rendering for notification subject and body
//! - Dispatcher that delivers each alert to every configured channel

pub mod console;
pub mod dispatcher;
pub mod templating;
pub mod traits;
pub mod webhook;

pub use console::ConsoleNotifier;
pub use dispatcher::Dispatcher;
pub use templating::{MessageTemplates, TemplateContext, TemplateRenderer};
pub use traits::{DispatchResult, Notification, Notifier, NotifyError};
pub use webhook::WebhookNotifier;
