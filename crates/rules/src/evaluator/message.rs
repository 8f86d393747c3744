//! Plain-text alert wording.

use slotwatch_core::config::AlertConfig;
use slotwatch_core::{AlertClass, ResourceSnapshot};

/// One-line message for a fired alert.
pub(crate) fn render(class: AlertClass, snap: &ResourceSnapshot, config: &AlertConfig) -> String {
    let name = snap.title.as_deref().unwrap_or("Session");
    let when = format!("{} at {}", snap.date.format("%a %b %-d"), snap.start_time.format("%H:%M"));
    let counts = format!(
        "{}/{} {}, {}/{} {}",
        snap.primary_count,
        snap.primary_max,
        config.primary_label,
        snap.secondary_count,
        snap.secondary_max,
        config.secondary_label,
    );

    match class {
        AlertClass::Saturated => format!("Full: {name} on {when} is now full ({counts})"),
        AlertClass::Reopened => {
            format!("Reopened: {} opened up for {name} on {when} ({counts})", spots(snap.remaining()))
        }
        AlertClass::Urgent => {
            format!("Almost full: only {} left for {name} on {when} ({counts})", spots(snap.remaining()))
        }
        AlertClass::Viable => format!("Looks on: {name} on {when} has {counts}"),
    }
}

fn spots(n: u32) -> String {
    if n == 1 {
        "1 spot".to_string()
    } else {
        format!("{n} spots")
    }
}
