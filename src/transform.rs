// Transformer - raw extracted records to validated canonical collections.
//
// Cleaning rules:
// - Activities: duration must coerce to a number > 0, timestamp must parse,
//   activity-type strings are normalized to lowercase categories.
// - Environment: temperature, humidity, and noise must all coerce or the row
//   is dropped whole (never individually nulled).
// - Staff: tasks must coerce to a number >= 0; shifts where end <= start are
//   dropped so tasks-per-hour is always defined on retained rows.
// Dropped rows are logged, never surfaced as errors.

use chrono::{NaiveDate, NaiveDateTime};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeSet, HashSet};

use crate::records::{
    ActivityRecord, ActivityType, DailySummary, EnvironmentReading, RawActivityRecord,
    RawEnvironmentReading, RawStaffShift, StaffShift,
};
use crate::stats;

// ============================================================================
// RAW / TRANSFORMED BUNDLES
// ============================================================================

/// Everything the extraction collaborator hands over.
#[derive(Debug, Clone, Default)]
pub struct RawData {
    pub activities: Vec<RawActivityRecord>,
    pub environment: Vec<RawEnvironmentReading>,
    pub staff: Vec<RawStaffShift>,
}

/// The four canonical tables the analyzers consume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformedData {
    pub activities: Vec<ActivityRecord>,
    pub environment: Vec<EnvironmentReading>,
    pub staff: Vec<StaffShift>,
    pub daily_summary: Vec<DailySummary>,
}

// ============================================================================
// COERCION HELPERS
// ============================================================================

/// Lenient numeric coercion: numbers pass through, numeric strings parse,
/// everything else is None.
pub fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parse the timestamp layouts the source systems emit. Date-only values get
/// a midnight time component.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    for fmt in TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(ts);
        }
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

// ============================================================================
// DATA TRANSFORMER
// ============================================================================

#[derive(Debug, Default)]
pub struct DataTransformer;

impl DataTransformer {
    pub fn new() -> Self {
        DataTransformer
    }

    /// Validate and enrich raw pet activity rows.
    pub fn transform_activities(&self, raw: &[RawActivityRecord]) -> Vec<ActivityRecord> {
        info!("Transforming {} pet activity rows", raw.len());

        let mut records = Vec::with_capacity(raw.len());
        for row in raw {
            let Some(timestamp) = parse_timestamp(&row.timestamp) else {
                warn!("Dropping activity row with unparseable timestamp: {:?}", row.timestamp);
                continue;
            };
            let duration = match coerce_number(&row.duration_minutes) {
                Some(d) if d > 0.0 => d,
                _ => {
                    warn!(
                        "Dropping activity row for pet {} with invalid duration {:?}",
                        row.pet_id, row.duration_minutes
                    );
                    continue;
                }
            };

            records.push(ActivityRecord {
                pet_id: row.pet_id.clone(),
                pet_name: row.pet_name.clone(),
                activity_type: ActivityType::parse(&row.activity_type),
                timestamp,
                duration_minutes: duration,
                staff_id: row.staff_id.clone(),
                notes: row.notes.clone(),
            });
        }

        info!("Kept {} of {} pet activity rows", records.len(), raw.len());
        records
    }

    /// Validate raw environment readings. A row survives only if all three
    /// measurements coerce.
    pub fn transform_environment(&self, raw: &[RawEnvironmentReading]) -> Vec<EnvironmentReading> {
        info!("Transforming {} environment rows", raw.len());

        let mut readings = Vec::with_capacity(raw.len());
        for row in raw {
            let Some(timestamp) = parse_timestamp(&row.timestamp) else {
                warn!("Dropping environment row with unparseable timestamp: {:?}", row.timestamp);
                continue;
            };
            let (Some(temperature), Some(humidity), Some(noise)) = (
                coerce_number(&row.temperature_f),
                coerce_number(&row.humidity_percent),
                coerce_number(&row.noise_level_db),
            ) else {
                warn!(
                    "Dropping environment row in section {} with non-numeric measurement",
                    row.kennel_section
                );
                continue;
            };

            readings.push(EnvironmentReading {
                timestamp,
                kennel_section: row.kennel_section.clone(),
                temperature_f: temperature,
                humidity_percent: humidity,
                noise_level_db: noise,
            });
        }

        info!("Kept {} of {} environment rows", readings.len(), raw.len());
        readings
    }

    /// Validate raw staff shift rows.
    pub fn transform_staff(&self, raw: &[RawStaffShift]) -> Vec<StaffShift> {
        info!("Transforming {} staff shift rows", raw.len());

        let mut shifts = Vec::with_capacity(raw.len());
        for row in raw {
            let (Some(start), Some(end)) = (
                parse_timestamp(&row.shift_start),
                parse_timestamp(&row.shift_end),
            ) else {
                warn!("Dropping staff row for {} with unparseable shift times", row.staff_id);
                continue;
            };
            if end <= start {
                warn!(
                    "Dropping zero/negative-duration shift for {} ({} -> {})",
                    row.staff_id, start, end
                );
                continue;
            }
            let tasks = match coerce_number(&row.tasks_completed) {
                Some(t) if t >= 0.0 => t as u32,
                _ => {
                    warn!(
                        "Dropping staff row for {} with invalid task count {:?}",
                        row.staff_id, row.tasks_completed
                    );
                    continue;
                }
            };

            shifts.push(StaffShift {
                staff_id: row.staff_id.clone(),
                staff_name: row.staff_name.clone(),
                shift_start: start,
                shift_end: end,
                tasks_completed: tasks,
            });
        }

        info!("Kept {} of {} staff shift rows", shifts.len(), raw.len());
        shifts
    }

    /// One summary row per calendar date present in any source. Sources with
    /// no rows on a date contribute zero counts and None averages.
    pub fn daily_summary(
        &self,
        activities: &[ActivityRecord],
        environment: &[EnvironmentReading],
        staff: &[StaffShift],
    ) -> Vec<DailySummary> {
        let mut dates: BTreeSet<NaiveDate> = BTreeSet::new();
        dates.extend(activities.iter().map(|a| a.date()));
        dates.extend(environment.iter().map(|e| e.date()));
        dates.extend(staff.iter().map(|s| s.date()));

        let mut summaries = Vec::with_capacity(dates.len());
        for date in dates {
            let day_activities: Vec<&ActivityRecord> =
                activities.iter().filter(|a| a.date() == date).collect();
            let unique_pets: HashSet<&str> =
                day_activities.iter().map(|a| a.pet_id.as_str()).collect();

            let day_env: Vec<&EnvironmentReading> =
                environment.iter().filter(|e| e.date() == date).collect();
            let env_mean = |values: Vec<f64>| stats::mean(&values).map(stats::round2);

            let day_staff: Vec<&StaffShift> = staff.iter().filter(|s| s.date() == date).collect();

            summaries.push(DailySummary {
                date,
                total_activities: day_activities.len(),
                total_activity_minutes: day_activities.iter().map(|a| a.duration_minutes).sum(),
                unique_pets: unique_pets.len(),
                avg_temperature: env_mean(day_env.iter().map(|e| e.temperature_f).collect()),
                avg_humidity: env_mean(day_env.iter().map(|e| e.humidity_percent).collect()),
                avg_noise: env_mean(day_env.iter().map(|e| e.noise_level_db).collect()),
                staff_shifts: day_staff.len(),
                total_tasks: day_staff.iter().map(|s| s.tasks_completed).sum(),
            });
        }

        info!("Created daily summary with {} days", summaries.len());
        summaries
    }

    /// Run the full transformation: three cleaned tables plus the merged
    /// daily summary.
    pub fn transform_all(&self, raw: &RawData) -> TransformedData {
        info!("Starting full data transformation");

        let activities = self.transform_activities(&raw.activities);
        let environment = self.transform_environment(&raw.environment);
        let staff = self.transform_staff(&raw.staff);
        let daily_summary = self.daily_summary(&activities, &environment, &staff);

        info!("Data transformation completed");
        TransformedData {
            activities,
            environment,
            staff,
            daily_summary,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_activity(pet: &str, ts: &str, duration: Value) -> RawActivityRecord {
        RawActivityRecord {
            pet_id: pet.to_string(),
            pet_name: format!("{pet}-name"),
            activity_type: "Play".to_string(),
            timestamp: ts.to_string(),
            duration_minutes: duration,
            staff_id: "S001".to_string(),
            notes: String::new(),
        }
    }

    fn raw_reading(ts: &str, temp: Value, humidity: Value, noise: Value) -> RawEnvironmentReading {
        RawEnvironmentReading {
            timestamp: ts.to_string(),
            kennel_section: "A".to_string(),
            temperature_f: temp,
            humidity_percent: humidity,
            noise_level_db: noise,
        }
    }

    fn raw_shift(staff: &str, start: &str, end: &str, tasks: Value) -> RawStaffShift {
        RawStaffShift {
            staff_id: staff.to_string(),
            staff_name: format!("{staff}-name"),
            shift_start: start.to_string(),
            shift_end: end.to_string(),
            tasks_completed: tasks,
        }
    }

    #[test]
    fn test_non_positive_and_non_numeric_durations_are_dropped() {
        let transformer = DataTransformer::new();
        let raw = vec![
            raw_activity("P1", "2024-03-11 08:00:00", json!(30)),
            raw_activity("P1", "2024-03-11 09:00:00", json!(0)),
            raw_activity("P1", "2024-03-11 10:00:00", json!(-5)),
            raw_activity("P1", "2024-03-11 11:00:00", json!("not-a-number")),
            raw_activity("P1", "2024-03-11 12:00:00", json!("45")),
        ];

        let records = transformer.transform_activities(&raw);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].duration_minutes, 30.0);
        assert_eq!(records[1].duration_minutes, 45.0);
    }

    #[test]
    fn test_activity_type_is_normalized() {
        let transformer = DataTransformer::new();
        let mut raw = raw_activity("P1", "2024-03-11 08:00:00", json!(15));
        raw.activity_type = "  FEEDING ".to_string();

        let records = transformer.transform_activities(&[raw]);
        assert_eq!(records[0].activity_type, ActivityType::Feeding);
    }

    #[test]
    fn test_environment_row_dropped_when_any_field_fails_parse() {
        let transformer = DataTransformer::new();
        let raw = vec![
            raw_reading("2024-03-11 08:00:00", json!(72.5), json!(50.0), json!(38.0)),
            raw_reading("2024-03-11 09:00:00", json!("bad"), json!(50.0), json!(38.0)),
            raw_reading("2024-03-11 10:00:00", json!(72.5), json!(null), json!(38.0)),
            raw_reading("2024-03-11 11:00:00", json!("70.1"), json!("55"), json!("41")),
        ];

        let readings = transformer.transform_environment(&raw);

        assert_eq!(readings.len(), 2);
        assert_eq!(readings[1].temperature_f, 70.1);
        assert_eq!(readings[1].noise_level_db, 41.0);
    }

    #[test]
    fn test_zero_duration_shifts_are_dropped() {
        let transformer = DataTransformer::new();
        let raw = vec![
            raw_shift("S1", "2024-03-11 09:00:00", "2024-03-11 17:00:00", json!(10)),
            // end == start: tasks-per-hour would be undefined
            raw_shift("S2", "2024-03-11 09:00:00", "2024-03-11 09:00:00", json!(4)),
            // end before start
            raw_shift("S3", "2024-03-11 17:00:00", "2024-03-11 09:00:00", json!(4)),
        ];

        let shifts = transformer.transform_staff(&raw);

        assert_eq!(shifts.len(), 1);
        assert_eq!(shifts[0].staff_id, "S1");
        assert!((shifts[0].tasks_per_hour() - 1.25).abs() < 1e-9);
    }

    #[test]
    fn test_negative_task_counts_are_dropped() {
        let transformer = DataTransformer::new();
        let raw = vec![
            raw_shift("S1", "2024-03-11 09:00:00", "2024-03-11 17:00:00", json!(-3)),
            raw_shift("S2", "2024-03-11 09:00:00", "2024-03-11 17:00:00", json!("oops")),
            raw_shift("S3", "2024-03-11 09:00:00", "2024-03-11 17:00:00", json!(0)),
        ];

        let shifts = transformer.transform_staff(&raw);
        assert_eq!(shifts.len(), 1);
        assert_eq!(shifts[0].tasks_completed, 0);
    }

    #[test]
    fn test_daily_summary_union_of_dates_with_null_env_averages() {
        let transformer = DataTransformer::new();

        let activities = transformer.transform_activities(&[
            raw_activity("P1", "2024-03-11 08:00:00", json!(30)),
            raw_activity("P2", "2024-03-11 10:00:00", json!(20)),
            raw_activity("P1", "2024-03-11 12:00:00", json!(10)),
        ]);
        let environment = transformer.transform_environment(&[raw_reading(
            "2024-03-12 08:00:00",
            json!(72.0),
            json!(50.0),
            json!(38.0),
        )]);
        let staff = transformer.transform_staff(&[raw_shift(
            "S1",
            "2024-03-13 09:00:00",
            "2024-03-13 17:00:00",
            json!(8),
        )]);

        let summary = transformer.daily_summary(&activities, &environment, &staff);

        // Exactly one row per date present in at least one source.
        assert_eq!(summary.len(), 3);

        let day1 = &summary[0];
        assert_eq!(day1.date.to_string(), "2024-03-11");
        assert_eq!(day1.total_activities, 3);
        assert_eq!(day1.total_activity_minutes, 60.0);
        assert_eq!(day1.unique_pets, 2);
        // No environment rows that day: averages are None, not zero.
        assert_eq!(day1.avg_temperature, None);
        assert_eq!(day1.avg_noise, None);
        assert_eq!(day1.staff_shifts, 0);
        assert_eq!(day1.total_tasks, 0);

        let day2 = &summary[1];
        assert_eq!(day2.avg_temperature, Some(72.0));
        assert_eq!(day2.total_activities, 0);

        let day3 = &summary[2];
        assert_eq!(day3.staff_shifts, 1);
        assert_eq!(day3.total_tasks, 8);
    }

    #[test]
    fn test_timestamp_parsing_variants() {
        assert!(parse_timestamp("2024-03-11 08:30:00").is_some());
        assert!(parse_timestamp("2024-03-11T08:30:00").is_some());
        assert!(parse_timestamp("2024-03-11 08:30").is_some());
        assert_eq!(
            parse_timestamp("2024-03-11").unwrap().to_string(),
            "2024-03-11 00:00:00"
        );
        assert!(parse_timestamp("11/03/2024").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn test_transform_all_produces_four_tables() {
        let transformer = DataTransformer::new();
        let raw = RawData {
            activities: vec![raw_activity("P1", "2024-03-11 08:00:00", json!(30))],
            environment: vec![raw_reading(
                "2024-03-11 08:00:00",
                json!(72.0),
                json!(50.0),
                json!(38.0),
            )],
            staff: vec![raw_shift(
                "S1",
                "2024-03-11 09:00:00",
                "2024-03-11 17:00:00",
                json!(8),
            )],
        };

        let transformed = transformer.transform_all(&raw);

        assert_eq!(transformed.activities.len(), 1);
        assert_eq!(transformed.environment.len(), 1);
        assert_eq!(transformed.staff.len(), 1);
        assert_eq!(transformed.daily_summary.len(), 1);
        assert_eq!(transformed.daily_summary[0].avg_humidity, Some(50.0));
    }
}
