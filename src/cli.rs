//! Command-line definition

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fleet_ledger")]
#[command(version)]
#[command(about = "Fleet bookkeeping in yearly CSV tables")]
#[command(
    long_about = "Records vehicles, trips, expenses, fuel and driver pay in yearly CSV tables, \
                  and reports profit, loss and document expiry."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Root directory holding one sub-directory per year (overrides FLEET_DATA_DIR)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Year to read or write. Defaults to the current year.
    #[arg(long, short = 'y', global = true)]
    pub year: Option<i32>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Append a record
    Add {
        #[command(subcommand)]
        record: AddRecord,
    },

    /// Remove the most recently added record of a kind (vehicle, trip, expense, fuel, driver)
    Undo { kind: String },

    /// List vehicle numbers registered for the year
    Vehicles,

    /// List years that have data, newest first
    Years,

    /// Per-vehicle kms, revenue, expenses, fuel and net profit
    Summary {
        #[arg(long)]
        vehicle: Option<String>,

        /// Calendar month (1-12)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: Option<u32>,

        /// First date included (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Last date included (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,

        /// Write vehicle_summary.csv into this directory instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Profit and loss per period
    Report {
        /// daily, weekly, monthly or yearly
        #[arg(long, short = 'f', default_value = "monthly")]
        frequency: String,

        #[arg(long)]
        vehicle: Option<String>,

        /// Order periods by label instead of first appearance
        #[arg(long)]
        sorted: bool,

        /// Write expense_report_<year>_<frequency>.csv into this directory instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Profit and loss per period for one vehicle
    Breakdown {
        vehicle: String,

        #[arg(long, short = 'f', default_value = "monthly")]
        frequency: String,

        #[arg(long)]
        sorted: bool,
    },

    /// Insurance, fitness certificate and tax expiry status per vehicle
    Expiry {
        /// Evaluate as of this date instead of now (YYYY-MM-DD)
        #[arg(long)]
        today: Option<NaiveDate>,
    },
}

#[derive(Subcommand)]
pub enum AddRecord {
    Vehicle {
        #[arg(long)]
        number: String,

        #[arg(long = "type")]
        vehicle_type: String,

        /// Insurance expiry (YYYY-MM-DD)
        #[arg(long)]
        insurance: Option<NaiveDate>,

        /// Fitness certificate expiry (YYYY-MM-DD)
        #[arg(long)]
        fc: Option<NaiveDate>,

        /// Road tax expiry (YYYY-MM-DD)
        #[arg(long)]
        tax: Option<NaiveDate>,
    },

    Trip {
        #[arg(long)]
        date: NaiveDate,

        #[arg(long)]
        vehicle: String,

        #[arg(long)]
        kms: u32,

        #[arg(long)]
        revenue: u32,

        #[arg(long, default_value = "")]
        mode: String,
    },

    Expense {
        #[arg(long)]
        date: NaiveDate,

        #[arg(long)]
        vehicle: String,

        #[arg(long)]
        category: String,

        #[arg(long)]
        amount: u32,

        #[arg(long, default_value = "")]
        details: String,
    },

    Fuel {
        #[arg(long)]
        date: NaiveDate,

        #[arg(long)]
        vehicle: String,

        #[arg(long)]
        litres: f64,

        #[arg(long)]
        amount: u32,
    },

    Driver {
        #[arg(long)]
        name: String,

        #[arg(long)]
        vehicle: String,

        /// Monthly salary
        #[arg(long)]
        salary: u32,

        #[arg(long, default_value_t = 0)]
        advance: u32,

        #[arg(long, default_value = "")]
        remarks: String,

        #[arg(long)]
        date: NaiveDate,
    },
}
