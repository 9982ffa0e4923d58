//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

/// Outlay - Subscription spending analytics
#[derive(Parser)]
#[command(name = "outlay")]
#[command(about = "Analytics and forecasts for your subscriptions", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Snapshot file with subscriptions, payments, and budgets (JSON)
    #[arg(long, default_value = "outlay.json", global = true)]
    pub data: PathBuf,

    /// Analytics config override (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Treat this date as today (YYYY-MM-DD)
    #[arg(long, global = true)]
    pub as_of: Option<NaiveDate>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List spending records
    Spending {
        /// Period: month, quarter, year, all
        #[arg(short, long, default_value = "month")]
        period: String,

        /// Only this category
        #[arg(short, long)]
        category: Option<String>,
    },

    /// Monthly totals
    Monthly {
        /// Number of months to show
        #[arg(short, long, default_value = "6")]
        months: usize,

        /// Append a projected bucket for next month
        #[arg(long)]
        forecast: bool,
    },

    /// Spending by category with trend vs. the previous period
    Categories {
        /// Period: month, quarter, year, all
        #[arg(short, long, default_value = "month")]
        period: String,
    },

    /// Lifetime report for one subscription
    Subscription {
        /// Subscription ID
        id: String,
    },

    /// Ranked insights
    Insights,

    /// Forecast upcoming monthly spending
    Predict {
        /// Months to forecast (defaults to the configured horizon)
        #[arg(short, long)]
        months: Option<usize>,
    },

    /// Budget status per category
    Budget {
        /// Period: month, quarter, year, all
        #[arg(short, long, default_value = "month")]
        period: String,
    },

    /// Compare recent spending with the window before it
    Compare {
        /// Window: 1m, 3m, 6m, 12m
        #[arg(short, long, default_value = "1m")]
        window: String,
    },

    /// Year-over-year totals
    Yearly,

    /// Unusual charges
    Anomalies {
        /// Period to scan (defaults to the configured lookback)
        #[arg(short, long)]
        period: Option<String>,
    },

    /// Refresh analytics in the background until Ctrl-C
    Watch {
        /// Refresh interval in minutes (defaults to config)
        #[arg(long)]
        interval_minutes: Option<u64>,
    },

    /// Merge payments from a CSV file into the snapshot
    ///
    /// Columns: subscription_id,id,date,amount,status
    ImportPayments {
        /// CSV file to import
        #[arg(short, long)]
        file: PathBuf,
    },
}
