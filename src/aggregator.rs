use std::collections::HashMap;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use log::{debug, trace};

use crate::csv_handler::RecordStore;
use crate::error::Result;
use crate::records::{DriverEntry, Expense, FuelEntry, Trip};

/// Label → totals, iterated in the order labels were first seen.
#[derive(Debug, Clone, PartialEq)]
pub struct Buckets<T> {
    entries: Vec<(String, T)>,
    index: HashMap<String, usize>,
}

impl<T> Default for Buckets<T> {
    fn default() -> Self {
        Buckets {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T> Buckets<T> {
    #[cfg(test)]
    pub fn get(&self, label: &str) -> Option<&T> {
        self.index.get(label).map(|&i| &self.entries[i].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> + '_ {
        self.entries.iter().map(|(label, value)| (label.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reorders buckets lexicographically by label.
    pub fn sort_by_label(&mut self) {
        self.entries.sort_by(|a, b| a.0.cmp(&b.0));
        self.reindex();
    }

    fn reindex(&mut self) {
        self.index = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, (label, _))| (label.clone(), i))
            .collect();
    }
}

impl<T: Default> Buckets<T> {
    /// Returns the bucket for `label`, appending a zeroed one if it is new.
    pub fn entry(&mut self, label: &str) -> &mut T {
        let i = match self.index.get(label) {
            Some(&i) => i,
            None => {
                self.entries.push((label.to_string(), T::default()));
                self.index.insert(label.to_string(), self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        &mut self.entries[i].1
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VehicleTotals {
    pub kms: i64,
    pub revenue: i64,
    pub expense: i64,
    pub fuel: i64,
}

impl VehicleTotals {
    pub fn net_profit(&self) -> i64 {
        self.revenue - self.expense - self.fuel
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PeriodTotals {
    pub revenue: i64,
    pub fuel: i64,
    pub expense: i64,
    pub salary: i64,
    pub advance: i64,
}

impl PeriodTotals {
    pub fn operational_expense(&self) -> i64 {
        self.fuel + self.expense + self.salary + self.advance
    }

    pub fn net(&self) -> i64 {
        self.revenue - self.operational_expense()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Frequency {
    Daily,
    Weekly,
    #[default]
    Monthly,
    Yearly,
}

impl Frequency {
    /// Unrecognized names fall back to monthly.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "daily" => Frequency::Daily,
            "weekly" => Frequency::Weekly,
            "yearly" => Frequency::Yearly,
            _ => Frequency::Monthly,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Yearly => "yearly",
        }
    }

    pub fn period_label(self, date: NaiveDate) -> String {
        match self {
            Frequency::Daily => date.format("%Y-%m-%d").to_string(),
            Frequency::Weekly => format!("Week {}", date.iso_week().week()),
            Frequency::Monthly => date.format("%Y-%m").to_string(),
            Frequency::Yearly => date.format("%Y").to_string(),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Row filters for [`FleetTotals`]. Every filter that is set must match.
#[derive(Debug, Clone, Default)]
pub struct TotalsFilter {
    pub vehicle: Option<String>,
    /// Calendar month, 1 to 12.
    pub month: Option<u32>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl TotalsFilter {
    pub fn matches(&self, date: NaiveDate, vehicle_no: &str) -> bool {
        if self.vehicle.as_deref().is_some_and(|v| v != vehicle_no) {
            return false;
        }
        if self.month.is_some_and(|m| m != date.month()) {
            return false;
        }
        if self.from.is_some_and(|from| date < from) {
            return false;
        }
        if self.to.is_some_and(|to| date > to) {
            return false;
        }
        true
    }
}

/// Accumulates per-vehicle kms, revenue, expense and fuel.
#[derive(Debug, Default)]
pub struct FleetTotals {
    filter: TotalsFilter,
    vehicles: Buckets<VehicleTotals>,
}

impl FleetTotals {
    pub fn new(filter: TotalsFilter) -> Self {
        FleetTotals {
            filter,
            vehicles: Buckets::default(),
        }
    }

    pub fn load_trips(&mut self, trips: &[Trip]) {
        for trip in trips {
            if !self.filter.matches(trip.date, &trip.vehicle_no) {
                trace!("Trip on {} for {} filtered out", trip.date, trip.vehicle_no);
                continue;
            }
            let totals = self.vehicles.entry(&trip.vehicle_no);
            totals.kms += i64::from(trip.kms);
            totals.revenue += i64::from(trip.revenue);
        }
    }

    pub fn load_expenses(&mut self, expenses: &[Expense]) {
        for expense in expenses {
            if !self.filter.matches(expense.date, &expense.vehicle_no) {
                trace!("Expense on {} for {} filtered out", expense.date, expense.vehicle_no);
                continue;
            }
            self.vehicles.entry(&expense.vehicle_no).expense += i64::from(expense.amount);
        }
    }

    pub fn load_fuel(&mut self, fuel: &[FuelEntry]) {
        for entry in fuel {
            if !self.filter.matches(entry.date, &entry.vehicle_no) {
                trace!("Fuel on {} for {} filtered out", entry.date, entry.vehicle_no);
                continue;
            }
            self.vehicles.entry(&entry.vehicle_no).fuel += i64::from(entry.amount);
        }
    }

    pub fn into_buckets(self) -> Buckets<VehicleTotals> {
        self.vehicles
    }
}

/// Accumulates revenue and cost per period label, optionally for one vehicle.
#[derive(Debug)]
pub struct PeriodLedger {
    frequency: Frequency,
    vehicle: Option<String>,
    periods: Buckets<PeriodTotals>,
}

impl PeriodLedger {
    pub fn new(frequency: Frequency, vehicle: Option<String>) -> Self {
        PeriodLedger {
            frequency,
            vehicle,
            periods: Buckets::default(),
        }
    }

    fn bucket(&mut self, date: NaiveDate, vehicle_no: &str) -> Option<&mut PeriodTotals> {
        if self.vehicle.as_deref().is_some_and(|v| v != vehicle_no) {
            return None;
        }
        let label = self.frequency.period_label(date);
        Some(self.periods.entry(&label))
    }

    pub fn load_trips(&mut self, trips: &[Trip]) {
        for trip in trips {
            if let Some(totals) = self.bucket(trip.date, &trip.vehicle_no) {
                totals.revenue += i64::from(trip.revenue);
            }
        }
    }

    pub fn load_expenses(&mut self, expenses: &[Expense]) {
        for expense in expenses {
            if let Some(totals) = self.bucket(expense.date, &expense.vehicle_no) {
                totals.expense += i64::from(expense.amount);
            }
        }
    }

    pub fn load_fuel(&mut self, fuel: &[FuelEntry]) {
        for entry in fuel {
            if let Some(totals) = self.bucket(entry.date, &entry.vehicle_no) {
                totals.fuel += i64::from(entry.amount);
            }
        }
    }

    pub fn load_drivers(&mut self, drivers: &[DriverEntry]) {
        for entry in drivers {
            if let Some(totals) = self.bucket(entry.date, &entry.vehicle_no) {
                totals.salary += i64::from(entry.salary);
                totals.advance += i64::from(entry.advance);
            }
        }
    }

    pub fn into_buckets(self) -> Buckets<PeriodTotals> {
        self.periods
    }
}

/// Store-backed entry points for the dashboards and exports.
pub struct Aggregator<'a> {
    store: &'a RecordStore,
}

impl<'a> Aggregator<'a> {
    pub fn new(store: &'a RecordStore) -> Self {
        Aggregator { store }
    }

    pub fn summarize_totals(
        &self,
        year: i32,
        filter: TotalsFilter,
    ) -> Result<Buckets<VehicleTotals>> {
        let mut totals = FleetTotals::new(filter);
        totals.load_trips(&self.store.read_all::<Trip>(year)?);
        totals.load_expenses(&self.store.read_all::<Expense>(year)?);
        totals.load_fuel(&self.store.read_all::<FuelEntry>(year)?);
        let totals = totals.into_buckets();
        debug!("Summarized {} vehicles for {}", totals.len(), year);
        Ok(totals)
    }

    pub fn summarize_by_period(
        &self,
        year: i32,
        frequency: Frequency,
        vehicle: Option<&str>,
    ) -> Result<Buckets<PeriodTotals>> {
        let mut ledger = PeriodLedger::new(frequency, vehicle.map(str::to_string));
        ledger.load_trips(&self.store.read_all::<Trip>(year)?);
        ledger.load_expenses(&self.store.read_all::<Expense>(year)?);
        ledger.load_fuel(&self.store.read_all::<FuelEntry>(year)?);
        ledger.load_drivers(&self.store.read_all::<DriverEntry>(year)?);
        let periods = ledger.into_buckets();
        debug!("Summarized {} {} periods for {}", periods.len(), frequency, year);
        Ok(periods)
    }

    /// Per-period figures for a single vehicle.
    pub fn vehicle_breakdown(
        &self,
        vehicle: &str,
        year: i32,
        frequency: Frequency,
    ) -> Result<Buckets<PeriodTotals>> {
        let mut ledger = PeriodLedger::new(frequency, Some(vehicle.to_string()));
        ledger.load_expenses(&self.store.read_all::<Expense>(year)?);
        ledger.load_fuel(&self.store.read_all::<FuelEntry>(year)?);
        ledger.load_drivers(&self.store.read_all::<DriverEntry>(year)?);
        ledger.load_trips(&self.store.read_all::<Trip>(year)?);
        Ok(ledger.into_buckets())
    }
}
