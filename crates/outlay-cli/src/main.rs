//! Outlay CLI - Subscription spending analytics
//!
//! Usage:
//!   outlay insights                     Ranked insights
//!   outlay monthly --months 12          Monthly totals
//!   outlay predict --months 3           Spending forecast
//!   outlay import-payments --file CSV   Merge payments into the snapshot
//!   outlay watch                        Background refresh until Ctrl-C

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use std::path::Path;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::ImportPayments { file } => commands::cmd_import_payments(&cli.data, &file),
        command => {
            let session =
                commands::open_session(&cli.data, cli.config.as_deref(), cli.as_of, cli.json)?;
            run(&session, command, &cli.data).await
        }
    }
}

async fn run(session: &commands::Session, command: Commands, data: &Path) -> Result<()> {
    match command {
        Commands::Spending { period, category } => {
            let period = commands::parse_period(&period)?;
            commands::cmd_spending(session, period, category.as_deref()).await
        }
        Commands::Monthly { months, forecast } => {
            commands::cmd_monthly(session, months, forecast).await
        }
        Commands::Categories { period } => {
            let period = commands::parse_period(&period)?;
            commands::cmd_categories(session, period).await
        }
        Commands::Subscription { id } => commands::cmd_subscription(session, &id).await,
        Commands::Insights => commands::cmd_insights(session).await,
        Commands::Predict { months } => commands::cmd_predict(session, months).await,
        Commands::Budget { period } => {
            let period = commands::parse_period(&period)?;
            commands::cmd_budget(session, period).await
        }
        Commands::Compare { window } => {
            let window = commands::parse_window(&window)?;
            commands::cmd_compare(session, window).await
        }
        Commands::Yearly => commands::cmd_yearly(session).await,
        Commands::Anomalies { period } => {
            let period = period.as_deref().map(commands::parse_period).transpose()?;
            commands::cmd_anomalies(session, period).await
        }
        Commands::Watch { interval_minutes } => {
            commands::cmd_watch(session, data, interval_minutes).await
        }
        Commands::ImportPayments { file } => commands::cmd_import_payments(data, &file),
    }
}
