// DataExtractor - reads the three raw source files out of a data directory.
//
// pet_activity.json   array of activity objects
// environment.csv     sensor readings, one row per reading
// staff_logs.csv      one row per shift
//
// A missing file is not an error: the facility exports each feed
// independently, so extraction logs a warning and returns an empty table.
// A file that exists but cannot be parsed is a hard error.

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use log::{info, warn};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::records::{RawActivityRecord, RawEnvironmentReading, RawStaffShift};
use crate::transform::RawData;

pub const ACTIVITY_FILE: &str = "pet_activity.json";
pub const ENVIRONMENT_FILE: &str = "environment.csv";
pub const STAFF_FILE: &str = "staff_logs.csv";

pub struct DataExtractor {
    data_dir: PathBuf,
}

impl DataExtractor {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        DataExtractor {
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    /// Extract all three feeds. Missing files yield empty tables.
    pub fn extract_all(&self) -> Result<RawData> {
        Ok(RawData {
            activities: self.extract_activities()?,
            environment: self.extract_environment()?,
            staff: self.extract_staff()?,
        })
    }

    pub fn extract_activities(&self) -> Result<Vec<RawActivityRecord>> {
        let path = self.data_dir.join(ACTIVITY_FILE);
        if !path.exists() {
            warn!("activity feed missing: {}", path.display());
            return Ok(Vec::new());
        }

        let file = File::open(&path)
            .with_context(|| format!("Failed to open file: {}", path.display()))?;
        let reader = BufReader::new(file);
        let records: Vec<RawActivityRecord> = serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse JSON from {}", path.display()))?;

        info!("extracted {} activity records from {}", records.len(), path.display());
        Ok(records)
    }

    pub fn extract_environment(&self) -> Result<Vec<RawEnvironmentReading>> {
        let path = self.data_dir.join(ENVIRONMENT_FILE);
        if !path.exists() {
            warn!("environment feed missing: {}", path.display());
            return Ok(Vec::new());
        }

        let readings = read_csv(&path)?;
        info!("extracted {} environment readings from {}", readings.len(), path.display());
        Ok(readings)
    }

    pub fn extract_staff(&self) -> Result<Vec<RawStaffShift>> {
        let path = self.data_dir.join(STAFF_FILE);
        if !path.exists() {
            warn!("staff feed missing: {}", path.display());
            return Ok(Vec::new());
        }

        let shifts = read_csv(&path)?;
        info!("extracted {} staff shifts from {}", shifts.len(), path.display());
        Ok(shifts)
    }
}

fn read_csv<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open file: {}", path.display()))?;

    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(file);

    let mut rows = Vec::new();
    for result in reader.deserialize() {
        let row: T =
            result.with_context(|| format!("Failed to parse CSV row in {}", path.display()))?;
        rows.push(row);
    }
    Ok(rows)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_extract_activities_json() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(ACTIVITY_FILE),
            r#"[
                {"pet_id": "P001", "pet_name": "Rex", "activity_type": "play",
                 "timestamp": "2024-03-10 09:00:00", "duration_minutes": 30,
                 "staff_id": "S1", "notes": ""},
                {"pet_id": "P002", "pet_name": "Bella", "activity_type": "feeding",
                 "timestamp": "2024-03-10 12:00:00", "duration_minutes": "15",
                 "staff_id": "S1", "notes": "ate well"}
            ]"#,
        )
        .unwrap();

        let extractor = DataExtractor::new(dir.path());
        let records = extractor.extract_activities().unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].pet_id, "P001");
        // Numeric and string durations both survive extraction untouched.
        assert!(records[0].duration_minutes.is_number());
        assert!(records[1].duration_minutes.is_string());
    }

    #[test]
    fn test_extract_environment_csv() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(ENVIRONMENT_FILE),
            "timestamp,kennel_section,temperature_f,humidity_percent,noise_level_db\n\
             2024-03-10 09:00:00,A,72.5,45.0,38.0\n\
             2024-03-10 10:00:00,B,not-a-number,50.0,42.0\n",
        )
        .unwrap();

        let extractor = DataExtractor::new(dir.path());
        let readings = extractor.extract_environment().unwrap();

        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0].kennel_section, "A");
        // Junk values are kept here; transformation decides what to drop.
        assert!(readings[1].temperature_f.is_string());
    }

    #[test]
    fn test_extract_staff_csv() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(STAFF_FILE),
            "staff_id,staff_name,shift_start,shift_end,tasks_completed\n\
             S1,Alice,2024-03-10 09:00:00,2024-03-10 17:00:00,10\n",
        )
        .unwrap();

        let extractor = DataExtractor::new(dir.path());
        let shifts = extractor.extract_staff().unwrap();

        assert_eq!(shifts.len(), 1);
        assert_eq!(shifts[0].staff_name, "Alice");
    }

    #[test]
    fn test_missing_files_yield_empty_tables() {
        let dir = tempdir().unwrap();
        let extractor = DataExtractor::new(dir.path());

        let raw = extractor.extract_all().unwrap();
        assert!(raw.activities.is_empty());
        assert!(raw.environment.is_empty());
        assert!(raw.staff.is_empty());
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(ACTIVITY_FILE), "{not json").unwrap();

        let extractor = DataExtractor::new(dir.path());
        assert!(extractor.extract_activities().is_err());
    }
}
