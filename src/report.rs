use log::info;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::aggregator::{Buckets, Frequency, PeriodTotals, VehicleTotals};
use crate::error::{FleetError, Result};
use crate::expiry::VehicleAlerts;

pub const TOTALS_FILE_NAME: &str = "vehicle_summary.csv";

pub fn period_report_file_name(year: i32, frequency: Frequency) -> String {
    format!("expense_report_{year}_{frequency}.csv")
}

/// Per-vehicle totals with net profit, one row per vehicle in summary order.
pub fn export_totals(summary: &Buckets<VehicleTotals>) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "Vehicle No",
        "KMs Run",
        "Revenue",
        "Expenses",
        "Fuel Cost",
        "Net Profit",
    ])?;
    for (vehicle, totals) in summary.iter() {
        writer.write_record([
            vehicle.to_string(),
            totals.kms.to_string(),
            totals.revenue.to_string(),
            totals.expense.to_string(),
            totals.fuel.to_string(),
            totals.net_profit().to_string(),
        ])?;
    }
    into_string(writer)
}

/// Profit and loss per period label, in the order the summary holds them.
pub fn export_period_report(summary: &Buckets<PeriodTotals>) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "Period",
        "Revenue",
        "Fuel",
        "Expenses",
        "Salary",
        "Advance",
        "Operational Expense",
        "Net Profit/Loss",
    ])?;
    for (period, totals) in summary.iter() {
        writer.write_record([
            period.to_string(),
            totals.revenue.to_string(),
            totals.fuel.to_string(),
            totals.expense.to_string(),
            totals.salary.to_string(),
            totals.advance.to_string(),
            totals.operational_expense().to_string(),
            totals.net().to_string(),
        ])?;
    }
    into_string(writer)
}

pub fn export_alerts(alerts: &Buckets<VehicleAlerts>) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["Vehicle No", "Insurance", "FC", "Tax"])?;
    for (vehicle, status) in alerts.iter() {
        writer.write_record([
            vehicle,
            status.insurance.name(),
            status.fc.name(),
            status.tax.name(),
        ])?;
    }
    into_string(writer)
}

/// Writes an export under `dir` with its download name and returns the path.
pub fn write_export(dir: &Path, file_name: &str, content: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(file_name);
    fs::write(&path, content)?;
    info!("Wrote {}", path.display());
    Ok(path)
}

fn into_string(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer.into_inner().map_err(|e| FleetError::Io(e.into_error()))?;
    String::from_utf8(bytes)
        .map_err(|e| FleetError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
}
