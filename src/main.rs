use chrono::{Datelike, Local, NaiveTime};
use clap::Parser;
use log::{debug, warn};
use std::path::Path;
use std::process::ExitCode;

use crate::aggregator::{Aggregator, Frequency, TotalsFilter};
use crate::cli::{AddRecord, Cli, Commands};
use crate::config::Config;
use crate::csv_handler::RecordStore;
use crate::error::{FleetError, Result};
use crate::records::{
    DATE_FORMAT, DriverEntry, Expense, FuelEntry, Record, RecordKind, Trip, Vehicle,
};

mod aggregator;
mod cli;
mod config;
mod csv_handler;
mod error;
mod expiry;
mod records;
mod report;

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            if e.is_client_error() {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::from_env().with_data_dir(cli.data_dir);
    let store = RecordStore::new(config.data_dir);
    let year = cli.year.unwrap_or_else(|| Local::now().year());
    debug!("Using data directory {} for {}", store.root().display(), year);

    match cli.command {
        Commands::Add { record } => add_record(&store, year, record),
        Commands::Undo { kind } => {
            let kind: RecordKind = kind.parse()?;
            if !store.remove_last(kind, year)? {
                return Err(FleetError::NothingToUndo { kind, year });
            }
            println!("Removed last {kind} entry for {year}");
            Ok(())
        }
        Commands::Vehicles => {
            for number in store.vehicle_numbers(year)? {
                println!("{number}");
            }
            Ok(())
        }
        Commands::Years => {
            for name in store.list_years()? {
                println!("{name}");
            }
            Ok(())
        }
        Commands::Summary { vehicle, month, from, to, output } => {
            let filter = TotalsFilter { vehicle, month, from, to };
            let summary = Aggregator::new(&store).summarize_totals(year, filter)?;
            emit(output.as_deref(), report::TOTALS_FILE_NAME, &report::export_totals(&summary)?)
        }
        Commands::Report { frequency, vehicle, sorted, output } => {
            let frequency = Frequency::from_name(&frequency);
            let mut summary = Aggregator::new(&store).summarize_by_period(
                year,
                frequency,
                vehicle.as_deref(),
            )?;
            if sorted {
                summary.sort_by_label();
            }
            let file_name = report::period_report_file_name(year, frequency);
            emit(output.as_deref(), &file_name, &report::export_period_report(&summary)?)
        }
        Commands::Breakdown { vehicle, frequency, sorted } => {
            let frequency = Frequency::from_name(&frequency);
            let mut breakdown =
                Aggregator::new(&store).vehicle_breakdown(&vehicle, year, frequency)?;
            if sorted {
                breakdown.sort_by_label();
            }
            print!("{}", report::export_period_report(&breakdown)?);
            Ok(())
        }
        Commands::Expiry { today } => {
            let now = match today {
                Some(date) => date.and_time(NaiveTime::MIN),
                None => Local::now().naive_local(),
            };
            let alerts = expiry::evaluate_year(&store, year, now)?;
            if alerts.is_empty() {
                warn!("No vehicles registered for {year}");
            }
            print!("{}", report::export_alerts(&alerts)?);
            Ok(())
        }
    }
}

fn add_record(store: &RecordStore, year: i32, record: AddRecord) -> Result<()> {
    match record {
        AddRecord::Vehicle { number, vehicle_type, insurance, fc, tax } => {
            let as_text = |date: Option<chrono::NaiveDate>| {
                date.map(|d| d.format(DATE_FORMAT).to_string()).unwrap_or_default()
            };
            let vehicle = Vehicle {
                number,
                vehicle_type,
                insurance_expiry: as_text(insurance),
                fc_expiry: as_text(fc),
                tax_expiry: as_text(tax),
            };
            append(store, year, vehicle)
        }
        AddRecord::Trip { date, vehicle, kms, revenue, mode } => {
            let trip = Trip { date, vehicle_no: vehicle, kms, revenue, mode };
            append(store, year, trip)
        }
        AddRecord::Expense { date, vehicle, category, amount, details } => {
            let expense = Expense { date, vehicle_no: vehicle, category, amount, details };
            append(store, year, expense)
        }
        AddRecord::Fuel { date, vehicle, litres, amount } => {
            let fuel = FuelEntry { date, vehicle_no: vehicle, litres, amount };
            append(store, year, fuel)
        }
        AddRecord::Driver { name, vehicle, salary, advance, remarks, date } => {
            let entry = DriverEntry {
                name,
                vehicle_no: vehicle,
                salary,
                advance,
                remarks,
                date,
            };
            append(store, year, entry)
        }
    }
}

fn append<R: Record>(store: &RecordStore, year: i32, record: R) -> Result<()> {
    store.append(year, &record)?;
    println!("Added {} for {} to {}", R::KIND, record.vehicle_no(), year);
    Ok(())
}

/// Prints an export, or writes it under `output` with its download name.
fn emit(output: Option<&Path>, file_name: &str, content: &str) -> Result<()> {
    match output {
        Some(dir) => {
            let path = report::write_export(dir, file_name, content)?;
            println!("{}", path.display());
        }
        None => print!("{content}"),
    }
    Ok(())
}
