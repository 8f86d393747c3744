mod cli;
mod commands;
mod cycle;
mod shutdown;
mod source;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use slotwatch_core::config::{self, Config};
use slotwatch_core::{Clock, SystemClock};
use slotwatch_notify::Dispatcher;
use slotwatch_rules::Scheduler;

use crate::cli::{Cli, Command};
use crate::cycle::Tracker;
use crate::shutdown::Shutdown;
use crate::source::JsonFileSource;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Cli::parse();

    match args.env_file.as_deref() {
        Some(path) => config::load_env_file(path)
            .with_context(|| format!("failed to load env file {}", path.display()))?,
        None => config::load_dotenv(),
    }

    let config = Config::from_env().context("invalid configuration")?;
    config.validate().context("invalid configuration")?;
    let zone = config.zone().context("invalid configuration")?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let state_path = config.storage.state_path.clone();

    match args.command() {
        Command::Run | Command::Once => {
            config.log_summary();
            let dispatcher = Dispatcher::from_config(&config.notify, &config.alert)
                .context("failed to set up notification channels")?;
            info!(channels = ?dispatcher.channel_names(), "notification channels ready");
            let tracker = Tracker::new(
                JsonFileSource::new(config.storage.source_path.clone(), zone),
                dispatcher,
                Scheduler::new(config.schedule.clone(), zone),
                config.alert.clone(),
                state_path,
                clock,
            );

            if args.command() == Command::Once {
                let report = tracker.run_cycle().await;
                let fetched = report
                    .fetched
                    .map_or_else(|| "fetch failed".to_string(), |n| format!("{n} snapshot(s)"));
                println!(
                    "{fetched}, {} tracked, {} alert(s) ({} failed deliveries){}",
                    report.tracked,
                    report.alerts.len(),
                    report.failed_deliveries,
                    if report.saved { "" } else { ", state NOT saved" },
                );
                println!(
                    "next poll at {} ({}, in {} min{})",
                    report.plan.target,
                    report.plan.reason,
                    report.plan.delay.num_minutes(),
                    if report.plan.clamped { ", moved into active hours" } else { "" },
                );
            } else {
                let shutdown = Shutdown::new();
                shutdown.listen_for_signals();
                info!(state = %config.storage.state_path.display(), "tracker started");
                tracker.run(&shutdown).await;
            }
        }
        Command::Respond {
            resource_id,
            action,
            snooze_for,
        } => {
            let updated = commands::respond(
                &state_path,
                &resource_id,
                action,
                snooze_for.as_deref(),
                clock.now(),
            )?;
            println!("{}", serde_json::to_string_pretty(&updated)?);
        }
        Command::Status => {
            println!("{}", commands::status(&state_path)?);
        }
        Command::Prune { date } => {
            let removed = commands::prune(&state_path, date, &zone, clock.now())?;
            println!("removed {removed} record(s)");
        }
    }

    Ok(())
}
