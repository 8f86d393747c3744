use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};

/// Watches drop-in session capacity and alerts when a session is worth
/// acting on.
#[derive(Parser, Debug)]
#[command(name = "slotwatch", version, about)]
pub struct Cli {
    /// Load settings from this env file instead of `./.env`.
    #[arg(long, global = true, env = "SLOTWATCH_ENV_FILE")]
    pub env_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run cycles until interrupted (default).
    Run,
    /// Run a single cycle and print the next poll plan.
    Once,
    /// Record a response for one session.
    Respond {
        /// Session id, e.g. `2026-10-15T19:00`.
        resource_id: String,
        action: Action,
        /// Snooze length, e.g. `2h` or `1d12h`. Required with `snooze`.
        #[arg(long = "for", value_name = "DURATION")]
        snooze_for: Option<String>,
    },
    /// Print the tracked sessions as JSON.
    Status,
    /// Drop sessions dated before a day (default: today in the reference timezone).
    Prune {
        #[arg(long, value_name = "YYYY-MM-DD")]
        date: Option<NaiveDate>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Accept,
    Decline,
    Snooze,
    /// Clear a previous response.
    None,
}

impl Cli {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Run)
    }
}
