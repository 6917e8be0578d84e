use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::records::{Record, RecordKind, Vehicle};

/// Year-partitioned CSV tables under a data root: `<root>/<YYYY>/<kind>.csv`.
///
/// Tables are append-only. A missing directory or file reads as an empty table.
#[derive(Debug, Clone)]
pub struct RecordStore {
    root: PathBuf,
}

impl RecordStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        RecordStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn year_dir(&self, year: i32) -> PathBuf {
        self.root.join(format!("{year:04}"))
    }

    pub fn table_path(&self, kind: RecordKind, year: i32) -> PathBuf {
        self.year_dir(year).join(kind.file_name())
    }

    /// Validates `record` and appends it to its table, writing the header first
    /// when the table is new.
    pub fn append<R: Record>(&self, year: i32, record: &R) -> Result<()> {
        record.validate()?;

        let dir = self.year_dir(year);
        fs::create_dir_all(&dir)?;
        let path = dir.join(R::KIND.file_name());
        let is_new = fs::metadata(&path).map(|meta| meta.len() == 0).unwrap_or(true);

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        if is_new {
            writer.write_record(R::KIND.header())?;
        }
        writer.serialize(record)?;
        writer.flush()?;

        info!("Appended {} for vehicle {} to {}", R::KIND, record.vehicle_no(), path.display());
        Ok(())
    }

    /// Reads every row of `R`'s table for `year`, in file order.
    pub fn read_all<R: Record>(&self, year: i32) -> Result<Vec<R>> {
        let path = self.table_path(R::KIND, year);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No {} table at {}, treating as empty", R::KIND, path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };
        let records: Vec<R> = load_csv_file(file, &path).collect();
        debug!("Read {} {} rows from {}", records.len(), R::KIND, path.display());
        Ok(records)
    }

    /// Drops the final data row of a table. Returns `false` when the table is
    /// missing or holds only its header.
    pub fn remove_last(&self, kind: RecordKind, year: i32) -> Result<bool> {
        let path = self.table_path(kind, year);
        let file = match OpenOptions::new().read(true).write(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        };

        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(&file);
        reader.headers()?;
        let mut record = csv::ByteRecord::new();
        let mut last_start = None;
        loop {
            let start = reader.position().byte();
            if !reader.read_byte_record(&mut record)? {
                break;
            }
            last_start = Some(start);
        }
        drop(reader);

        match last_start {
            Some(offset) => {
                file.set_len(offset)?;
                info!("Removed last {} entry from {}", kind, path.display());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Year directories under the root, newest first.
    pub fn list_years(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut years = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if name.len() == 4 && name.bytes().all(|b| b.is_ascii_digit()) {
                    years.push(name.to_string());
                }
            }
        }
        years.sort_unstable_by(|a, b| b.cmp(a));
        Ok(years)
    }

    pub fn vehicle_numbers(&self, year: i32) -> Result<Vec<String>> {
        Ok(self
            .read_all::<Vehicle>(year)?
            .into_iter()
            .map(|vehicle| vehicle.number)
            .collect())
    }
}

/// Deserializes rows from a table, skipping any row whose date or amount does
/// not parse.
fn load_csv_file<R: DeserializeOwned>(file: File, path: &Path) -> impl Iterator<Item = R> {
    let reader: csv::DeserializeRecordsIntoIter<File, R> = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file)
        .into_deserialize();
    let path = path.display().to_string();
    reader.into_iter().filter_map(move |result| {
        match result {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Failed to parse a row of {}: {}. Skipping invalid record.", path, e);
                None
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::Trip;
    use chrono::NaiveDate;

    fn trip(date: (i32, u32, u32), vehicle: &str, kms: u32, revenue: u32) -> Trip {
        Trip {
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            vehicle_no: vehicle.to_string(),
            kms,
            revenue,
            mode: "daily".to_string(),
        }
    }

    #[test]
    fn test_missing_table_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path());
        assert!(store.read_all::<Trip>(2024).unwrap().is_empty());
        assert!(store.list_years().unwrap().is_empty());
    }

    #[test]
    fn test_append_then_read_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path());
        let trips = vec![
            trip((2024, 1, 5), "KA01", 100, 5000),
            trip((2024, 2, 10), "KA01", 50, 2000),
            trip((2024, 2, 11), "KA02", 70, 900),
        ];
        for t in &trips {
            store.append(2024, t).unwrap();
        }

        assert_eq!(store.read_all::<Trip>(2024).unwrap(), trips);
        assert!(store.read_all::<Trip>(2023).unwrap().is_empty());
    }

    #[test]
    fn test_header_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path());
        store.append(2024, &trip((2024, 1, 5), "KA01", 100, 5000)).unwrap();
        store.append(2024, &trip((2024, 1, 6), "KA01", 10, 500)).unwrap();

        let content = fs::read_to_string(store.table_path(RecordKind::Trip, 2024)).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Date,Vehicle No,KMs Run,Revenue,Mode");
        assert_eq!(lines[1], "2024-01-05,KA01,100,5000,daily");
    }

    #[test]
    fn test_invalid_record_is_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path());
        assert!(store.append(2024, &trip((2024, 1, 5), "", 100, 5000)).is_err());
        assert!(!store.table_path(RecordKind::Trip, 2024).exists());
    }

    #[test]
    fn test_remove_last_until_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path());
        store.append(2024, &trip((2024, 1, 5), "KA01", 100, 5000)).unwrap();

        assert!(store.remove_last(RecordKind::Trip, 2024).unwrap());
        let content = fs::read_to_string(store.table_path(RecordKind::Trip, 2024)).unwrap();
        assert_eq!(content.lines().count(), 1);
        assert!(store.read_all::<Trip>(2024).unwrap().is_empty());

        assert!(!store.remove_last(RecordKind::Trip, 2024).unwrap());
    }

    #[test]
    fn test_remove_last_keeps_earlier_rows() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path());
        let first = trip((2024, 1, 5), "KA01", 100, 5000);
        store.append(2024, &first).unwrap();
        store.append(2024, &trip((2024, 1, 6), "KA02", 10, 500)).unwrap();

        assert!(store.remove_last(RecordKind::Trip, 2024).unwrap());
        assert_eq!(store.read_all::<Trip>(2024).unwrap(), vec![first.clone()]);

        // The table stays appendable after a removal.
        store.append(2024, &first).unwrap();
        assert_eq!(store.read_all::<Trip>(2024).unwrap().len(), 2);
    }

    #[test]
    fn test_remove_last_on_missing_table() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path());
        assert!(!store.remove_last(RecordKind::Fuel, 2024).unwrap());
    }

    #[test]
    fn test_malformed_rows_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path());
        let path = store.table_path(RecordKind::Trip, 2024);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(
            &path,
            "Date,Vehicle No,KMs Run,Revenue,Mode\n\
             2024-01-05,KA01,100,5000,daily\n\
             not-a-date,KA01,100,5000,daily\n\
             2024-01-07,KA01,ten,5000,daily\n\
             2024-01-08,KA01,20,300,daily\n",
        )
        .unwrap();

        let trips = store.read_all::<Trip>(2024).unwrap();
        assert_eq!(trips.len(), 2);
        assert_eq!(trips[1].kms, 20);
    }

    #[test]
    fn test_list_years_descending() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["2023", "2025", "2024", "misc", "123"] {
            fs::create_dir_all(dir.path().join(name)).unwrap();
        }
        fs::write(dir.path().join("2022"), "not a directory").unwrap();

        let store = RecordStore::new(dir.path());
        assert_eq!(store.list_years().unwrap(), vec!["2025", "2024", "2023"]);
    }

    #[test]
    fn test_vehicle_numbers_in_file_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path());
        for number in ["KA02", "KA01"] {
            let vehicle = Vehicle {
                number: number.to_string(),
                vehicle_type: "Truck".to_string(),
                insurance_expiry: String::new(),
                fc_expiry: String::new(),
                tax_expiry: String::new(),
            };
            store.append(2024, &vehicle).unwrap();
        }
        assert_eq!(store.vehicle_numbers(2024).unwrap(), vec!["KA02", "KA01"]);
    }
}
