#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the Australian emergency feed monitor.

use std::path::PathBuf;
use std::sync::Arc;

use aus_emergency_feed::registry::all_feeds;
use aus_emergency_incident_models::{AustralianState, CapAlert, Incident};
use aus_emergency_monitor::commands::parse_state;
use aus_emergency_monitor::config::EntryConfig;
use aus_emergency_monitor::console::{self, print_json_pretty};
use aus_emergency_monitor::pipeline::EntityView;
use aus_emergency_monitor::sensor::ActiveIncidentsSensor;
use aus_emergency_monitor::{MonitorConfig, MonitorContext};
use clap::{Parser, Subcommand};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "aus_emergency", about = "Australian emergency feed monitor")]
struct Cli {
    /// Path to the TOML config (overrides `AUS_EMERGENCY_CONFIG`)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll on a schedule, print events as JSON lines and read commands
    /// from stdin (the default)
    Run,
    /// Refresh once and print the tracked entities
    Poll {
        /// Only poll this state (e.g. "SA"), configured or not
        #[arg(long, value_parser = parse_state)]
        state: Option<AustralianState>,
    },
    /// Refresh once and print diagnostics
    Diagnostics,
    /// List the registered feeds
    Feeds,
}

#[derive(Serialize)]
struct StateReport {
    state: AustralianState,
    active_incidents: ActiveIncidentsSensor,
    incidents: Vec<EntityView<Incident>>,
    alerts: Vec<EntityView<CapAlert>>,
}

fn print_feeds() {
    println!("{:<6} {:<12} {:<6} NAME", "STATE", "SOURCE", "CAP");
    println!("{}", "-".repeat(60));
    for feed in all_feeds() {
        println!(
            "{:<6} {:<12} {:<6} {}",
            feed.state.as_ref(),
            feed.source,
            if feed.cap_url.is_some() { "yes" } else { "no" },
            feed.name
        );
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Feeds => print_feeds(),
        Commands::Run => {
            let config = MonitorConfig::load(cli.config.as_deref())?;
            let context = Arc::new(MonitorContext::new(&config)?);
            console::run(context).await?;
        }
        Commands::Poll { state } => {
            let mut config = MonitorConfig::load(cli.config.as_deref())?;
            if let Some(state) = state {
                let entry = config
                    .entries
                    .iter()
                    .find(|entry| entry.state == state)
                    .cloned()
                    .unwrap_or_else(|| EntryConfig::new(state));
                config.entries = vec![entry];
            }
            let context = MonitorContext::new(&config)?;
            context.refresh_all().await;

            let mut reports = Vec::new();
            for entry in context.entries() {
                let state = entry.state();
                reports.push(StateReport {
                    state,
                    active_incidents: context.active_incidents(state).await?,
                    incidents: context.incidents(state).await?,
                    alerts: context.alerts(state).await?,
                });
            }
            print_json_pretty(&reports)?;
            context.shutdown().await;
        }
        Commands::Diagnostics => {
            let config = MonitorConfig::load(cli.config.as_deref())?;
            let context = MonitorContext::new(&config)?;
            context.refresh_all().await;
            print_json_pretty(&context.diagnostics().await)?;
            context.shutdown().await;
        }
    }

    Ok(())
}
