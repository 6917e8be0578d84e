use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::error::{FleetError, Result};

/// Date layout used by every table and by expiry fields.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Vehicle,
    Trip,
    Expense,
    Fuel,
    Driver,
}

impl RecordKind {
    pub fn file_name(self) -> &'static str {
        match self {
            RecordKind::Vehicle => "vehicles.csv",
            RecordKind::Trip => "trips.csv",
            RecordKind::Expense => "expenses.csv",
            RecordKind::Fuel => "fuel.csv",
            RecordKind::Driver => "drivers.csv",
        }
    }

    /// Header row written when a table is first created.
    pub fn header(self) -> &'static [&'static str] {
        match self {
            RecordKind::Vehicle => &[
                "Vehicle No",
                "Type",
                "Insurance Expiry",
                "FC Expiry",
                "Tax Expiry",
            ],
            RecordKind::Trip => &["Date", "Vehicle No", "KMs Run", "Revenue", "Mode"],
            RecordKind::Expense => &["Date", "Vehicle No", "Type", "Amount", "Details"],
            RecordKind::Fuel => &["Date", "Vehicle No", "Litres", "Amount"],
            RecordKind::Driver => &[
                "Driver Name",
                "Vehicle No",
                "Monthly Salary",
                "Advance",
                "Remarks",
                "Date",
            ],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RecordKind::Vehicle => "vehicle",
            RecordKind::Trip => "trip",
            RecordKind::Expense => "expense",
            RecordKind::Fuel => "fuel",
            RecordKind::Driver => "driver",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RecordKind {
    type Err = FleetError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "vehicle" => Ok(RecordKind::Vehicle),
            "trip" => Ok(RecordKind::Trip),
            "expense" => Ok(RecordKind::Expense),
            "fuel" => Ok(RecordKind::Fuel),
            "driver" => Ok(RecordKind::Driver),
            other => Err(FleetError::InvalidKind(other.to_string())),
        }
    }
}

/// A row of one of the five tables.
pub trait Record: Serialize + DeserializeOwned {
    const KIND: RecordKind;

    fn vehicle_no(&self) -> &str;

    /// Checks run before a row is appended, so that reads never see a row
    /// the application itself wrote badly.
    fn validate(&self) -> Result<()> {
        if self.vehicle_no().trim().is_empty() {
            return Err(FleetError::Validation("vehicle number must not be empty".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    #[serde(rename = "Vehicle No")]
    pub number: String,
    #[serde(rename = "Type")]
    pub vehicle_type: String,
    // Expiry dates stay as text: a blank or garbled value is reported, not rejected.
    #[serde(rename = "Insurance Expiry", default)]
    pub insurance_expiry: String,
    #[serde(rename = "FC Expiry", default)]
    pub fc_expiry: String,
    #[serde(rename = "Tax Expiry", default)]
    pub tax_expiry: String,
}

impl Record for Vehicle {
    const KIND: RecordKind = RecordKind::Vehicle;

    fn vehicle_no(&self) -> &str {
        &self.number
    }

    fn validate(&self) -> Result<()> {
        if self.number.trim().is_empty() {
            return Err(FleetError::Validation("vehicle number must not be empty".to_string()));
        }
        for (field, value) in [
            ("insurance expiry", &self.insurance_expiry),
            ("FC expiry", &self.fc_expiry),
            ("tax expiry", &self.tax_expiry),
        ] {
            if !value.is_empty() && NaiveDate::parse_from_str(value, DATE_FORMAT).is_err() {
                return Err(FleetError::Validation(format!(
                    "{field} '{value}' is not a {DATE_FORMAT} date"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Vehicle No")]
    pub vehicle_no: String,
    #[serde(rename = "KMs Run")]
    pub kms: u32,
    #[serde(rename = "Revenue")]
    pub revenue: u32,
    #[serde(rename = "Mode")]
    pub mode: String,
}

impl Record for Trip {
    const KIND: RecordKind = RecordKind::Trip;

    fn vehicle_no(&self) -> &str {
        &self.vehicle_no
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Vehicle No")]
    pub vehicle_no: String,
    #[serde(rename = "Type")]
    pub category: String,
    #[serde(rename = "Amount")]
    pub amount: u32,
    #[serde(rename = "Details")]
    pub details: String,
}

impl Record for Expense {
    const KIND: RecordKind = RecordKind::Expense;

    fn vehicle_no(&self) -> &str {
        &self.vehicle_no
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuelEntry {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Vehicle No")]
    pub vehicle_no: String,
    #[serde(rename = "Litres")]
    pub litres: f64,
    #[serde(rename = "Amount")]
    pub amount: u32,
}

impl Record for FuelEntry {
    const KIND: RecordKind = RecordKind::Fuel;

    fn vehicle_no(&self) -> &str {
        &self.vehicle_no
    }

    fn validate(&self) -> Result<()> {
        if self.vehicle_no.trim().is_empty() {
            return Err(FleetError::Validation("vehicle number must not be empty".to_string()));
        }
        if !self.litres.is_finite() || self.litres < 0.0 {
            return Err(FleetError::Validation(format!(
                "litres must be a non-negative number, got {}",
                self.litres
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverEntry {
    #[serde(rename = "Driver Name")]
    pub name: String,
    #[serde(rename = "Vehicle No")]
    pub vehicle_no: String,
    #[serde(rename = "Monthly Salary")]
    pub salary: u32,
    #[serde(rename = "Advance")]
    pub advance: u32,
    #[serde(rename = "Remarks")]
    pub remarks: String,
    #[serde(rename = "Date")]
    pub date: NaiveDate,
}

impl Record for DriverEntry {
    const KIND: RecordKind = RecordKind::Driver;

    fn vehicle_no(&self) -> &str {
        &self.vehicle_no
    }
}
