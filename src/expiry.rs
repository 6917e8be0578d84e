use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use log::debug;

use crate::aggregator::Buckets;
use crate::csv_handler::RecordStore;
use crate::error::Result;
use crate::records::{DATE_FORMAT, Vehicle};

const RED_WITHIN_DAYS: i64 = 15;
const AMBER_WITHIN_DAYS: i64 = 30;
const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExpiryStatus {
    Ok,
    Amber,
    Red,
    #[default]
    Unknown,
}

impl ExpiryStatus {
    pub fn from_days_remaining(days: i64) -> Self {
        if days <= RED_WITHIN_DAYS {
            ExpiryStatus::Red
        } else if days <= AMBER_WITHIN_DAYS {
            ExpiryStatus::Amber
        } else {
            ExpiryStatus::Ok
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ExpiryStatus::Ok => "ok",
            ExpiryStatus::Amber => "amber",
            ExpiryStatus::Red => "red",
            ExpiryStatus::Unknown => "unknown",
        }
    }
}

/// Status of each expiring document of one vehicle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VehicleAlerts {
    pub insurance: ExpiryStatus,
    pub fc: ExpiryStatus,
    pub tax: ExpiryStatus,
}

/// Whole days from `now` until midnight at the start of the expiry date,
/// rounded down. `None` if the stored value is blank or not a date.
pub fn days_remaining(expiry: &str, now: NaiveDateTime) -> Option<i64> {
    let expiry = NaiveDate::parse_from_str(expiry.trim(), DATE_FORMAT).ok()?;
    let seconds = (expiry.and_time(NaiveTime::MIN) - now).num_seconds();
    Some(seconds.div_euclid(SECONDS_PER_DAY))
}

pub fn status_of(expiry: &str, now: NaiveDateTime) -> ExpiryStatus {
    days_remaining(expiry, now)
        .map(ExpiryStatus::from_days_remaining)
        .unwrap_or(ExpiryStatus::Unknown)
}

/// Evaluates every vehicle row against `now`. A repeated vehicle number keeps
/// its first position but takes the later row's statuses.
pub fn evaluate(vehicles: &[Vehicle], now: NaiveDateTime) -> Buckets<VehicleAlerts> {
    let mut alerts = Buckets::default();
    for vehicle in vehicles {
        *alerts.entry(&vehicle.number) = VehicleAlerts {
            insurance: status_of(&vehicle.insurance_expiry, now),
            fc: status_of(&vehicle.fc_expiry, now),
            tax: status_of(&vehicle.tax_expiry, now),
        };
    }
    alerts
}

pub fn evaluate_year(
    store: &RecordStore,
    year: i32,
    now: NaiveDateTime,
) -> Result<Buckets<VehicleAlerts>> {
    let vehicles = store.read_all::<Vehicle>(year)?;
    debug!("Evaluating expiry of {} vehicles for {} as of {}", vehicles.len(), year, now);
    Ok(evaluate(&vehicles, now))
}
