// Canonical record types for the kennel pipeline.
//
// Raw* structs are the loose, pre-validation shape handed over by the
// extraction collaborator (numeric fields arrive as serde_json::Value so JSON
// and CSV sources share one lenient coercion path). The validated structs are
// what the analyzers consume. Derived values (date, hour, shift duration,
// comfort labels) are methods recomputed from the stored fields - they are
// never stored independently of the timestamps they come from.

use chrono::{NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::EnvironmentThresholds;

// ============================================================================
// CATEGORICAL LABELS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Feeding,
    Grooming,
    Medical,
    Play,
    Other,
}

impl ActivityType {
    /// Normalize a raw activity-type string to its canonical category.
    /// Anything unrecognized lands in Other.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "feeding" => ActivityType::Feeding,
            "grooming" => ActivityType::Grooming,
            "medical" => ActivityType::Medical,
            "play" => ActivityType::Play,
            _ => ActivityType::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Feeding => "feeding",
            ActivityType::Grooming => "grooming",
            ActivityType::Medical => "medical",
            ActivityType::Play => "play",
            ActivityType::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShiftType {
    Morning,
    Afternoon,
    Night,
}

impl ShiftType {
    /// Bucket a shift by its starting hour.
    pub fn from_start_hour(hour: u32) -> Self {
        match hour {
            5..=13 => ShiftType::Morning,
            14..=21 => ShiftType::Afternoon,
            _ => ShiftType::Night,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ShiftType::Morning => "morning",
            ShiftType::Afternoon => "afternoon",
            ShiftType::Night => "night",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComfortRating {
    Optimal,
    Acceptable,
    Poor,
}

impl ComfortRating {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComfortRating::Optimal => "optimal",
            ComfortRating::Acceptable => "acceptable",
            ComfortRating::Poor => "poor",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoiseCategory {
    Normal,
    Elevated,
    High,
    Critical,
}

impl NoiseCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoiseCategory::Normal => "normal",
            NoiseCategory::Elevated => "elevated",
            NoiseCategory::High => "high",
            NoiseCategory::Critical => "critical",
        }
    }
}

/// Pet activity-level label against the configured daily-minute bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityStatus {
    Low,
    Optimal,
    High,
}

impl ActivityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityStatus::Low => "low",
            ActivityStatus::Optimal => "optimal",
            ActivityStatus::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedingStatus {
    Infrequent,
    Normal,
    Excessive,
}

impl FeedingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedingStatus::Infrequent => "infrequent",
            FeedingStatus::Normal => "normal",
            FeedingStatus::Excessive => "excessive",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceRating {
    Excellent,
    Satisfactory,
    BelowTarget,
}

impl PerformanceRating {
    pub fn as_str(&self) -> &'static str {
        match self {
            PerformanceRating::Excellent => "excellent",
            PerformanceRating::Satisfactory => "satisfactory",
            PerformanceRating::BelowTarget => "below_target",
        }
    }
}

/// Fixed temperature buckets used by the temperature/activity correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureRange {
    Cold,
    Cool,
    Optimal,
    Warm,
    Hot,
}

impl TemperatureRange {
    pub fn categorize(temp_f: f64) -> Self {
        if temp_f < 65.0 {
            TemperatureRange::Cold
        } else if temp_f < 72.0 {
            TemperatureRange::Cool
        } else if temp_f <= 78.0 {
            TemperatureRange::Optimal
        } else if temp_f <= 82.0 {
            TemperatureRange::Warm
        } else {
            TemperatureRange::Hot
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TemperatureRange::Cold => "cold",
            TemperatureRange::Cool => "cool",
            TemperatureRange::Optimal => "optimal",
            TemperatureRange::Warm => "warm",
            TemperatureRange::Hot => "hot",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationStrength {
    Strong,
    Moderate,
    Weak,
    Negligible,
}

impl CorrelationStrength {
    /// Classify a Pearson coefficient by absolute value.
    pub fn classify(correlation: f64) -> Self {
        let abs = correlation.abs();
        if abs >= 0.7 {
            CorrelationStrength::Strong
        } else if abs >= 0.4 {
            CorrelationStrength::Moderate
        } else if abs >= 0.2 {
            CorrelationStrength::Weak
        } else {
            CorrelationStrength::Negligible
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CorrelationStrength::Strong => "strong",
            CorrelationStrength::Moderate => "moderate",
            CorrelationStrength::Weak => "weak",
            CorrelationStrength::Negligible => "negligible",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Increasing,
    Stable,
}

impl TrendDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendDirection::Increasing => "increasing",
            TrendDirection::Stable => "stable",
        }
    }
}

// ============================================================================
// RAW RECORDS (extraction output, pre-validation)
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawActivityRecord {
    pub pet_id: String,
    pub pet_name: String,
    pub activity_type: String,
    pub timestamp: String,
    pub duration_minutes: Value,
    pub staff_id: String,
    pub notes: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawEnvironmentReading {
    pub timestamp: String,
    pub kennel_section: String,
    pub temperature_f: Value,
    pub humidity_percent: Value,
    pub noise_level_db: Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawStaffShift {
    pub staff_id: String,
    pub staff_name: String,
    pub shift_start: String,
    pub shift_end: String,
    pub tasks_completed: Value,
}

// ============================================================================
// VALIDATED RECORDS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub pet_id: String,
    pub pet_name: String,
    pub activity_type: ActivityType,
    pub timestamp: NaiveDateTime,
    /// Always > 0; non-positive durations are dropped in transformation.
    pub duration_minutes: f64,
    pub staff_id: String,
    pub notes: String,
}

impl ActivityRecord {
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    pub fn hour(&self) -> u32 {
        use chrono::Timelike;
        self.timestamp.time().hour()
    }

    pub fn day_of_week(&self) -> Weekday {
        use chrono::Datelike;
        self.timestamp.date().weekday()
    }

    /// Case-insensitive substring match on the free-text notes. This is the
    /// heuristic behind weight-trend analysis, not structured data.
    pub fn notes_mention(&self, needle: &str) -> bool {
        self.notes.to_lowercase().contains(&needle.to_lowercase())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentReading {
    pub timestamp: NaiveDateTime,
    pub kennel_section: String,
    pub temperature_f: f64,
    pub humidity_percent: f64,
    pub noise_level_db: f64,
}

impl EnvironmentReading {
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    pub fn hour(&self) -> u32 {
        use chrono::Timelike;
        self.timestamp.time().hour()
    }

    pub fn temperature_comfort(&self, thresholds: &EnvironmentThresholds) -> ComfortRating {
        thresholds.temperature.rate(self.temperature_f)
    }

    pub fn humidity_comfort(&self, thresholds: &EnvironmentThresholds) -> ComfortRating {
        thresholds.humidity.rate(self.humidity_percent)
    }

    pub fn noise_category(&self, thresholds: &EnvironmentThresholds) -> NoiseCategory {
        thresholds.noise.categorize(self.noise_level_db)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffShift {
    pub staff_id: String,
    pub staff_name: String,
    pub shift_start: NaiveDateTime,
    pub shift_end: NaiveDateTime,
    pub tasks_completed: u32,
}

impl StaffShift {
    pub fn date(&self) -> NaiveDate {
        self.shift_start.date()
    }

    /// Shift length in hours. Transformation drops shifts with end <= start,
    /// so this is always positive on retained records.
    pub fn duration_hours(&self) -> f64 {
        (self.shift_end - self.shift_start).num_seconds() as f64 / 3600.0
    }

    pub fn shift_type(&self) -> ShiftType {
        use chrono::Timelike;
        ShiftType::from_start_hour(self.shift_start.time().hour())
    }

    pub fn tasks_per_hour(&self) -> f64 {
        f64::from(self.tasks_completed) / self.duration_hours()
    }
}

/// One aggregated row per calendar date across all three sources.
/// Environment averages are None (not zero) on dates without readings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub total_activities: usize,
    pub total_activity_minutes: f64,
    pub unique_pets: usize,
    pub avg_temperature: Option<f64>,
    pub avg_humidity: Option<f64>,
    pub avg_noise: Option<f64>,
    pub staff_shifts: usize,
    pub total_tasks: u32,
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_activity_type_parse_normalizes() {
        assert_eq!(ActivityType::parse("Feeding"), ActivityType::Feeding);
        assert_eq!(ActivityType::parse("  GROOMING  "), ActivityType::Grooming);
        assert_eq!(ActivityType::parse("medical"), ActivityType::Medical);
        assert_eq!(ActivityType::parse("walk"), ActivityType::Other);
        assert_eq!(ActivityType::parse(""), ActivityType::Other);
    }

    #[test]
    fn test_shift_type_buckets() {
        assert_eq!(ShiftType::from_start_hour(5), ShiftType::Morning);
        assert_eq!(ShiftType::from_start_hour(13), ShiftType::Morning);
        assert_eq!(ShiftType::from_start_hour(14), ShiftType::Afternoon);
        assert_eq!(ShiftType::from_start_hour(21), ShiftType::Afternoon);
        assert_eq!(ShiftType::from_start_hour(22), ShiftType::Night);
        assert_eq!(ShiftType::from_start_hour(4), ShiftType::Night);
        assert_eq!(ShiftType::from_start_hour(0), ShiftType::Night);
    }

    #[test]
    fn test_activity_derived_fields_come_from_timestamp() {
        let record = ActivityRecord {
            pet_id: "P001".to_string(),
            pet_name: "Rex".to_string(),
            activity_type: ActivityType::Play,
            timestamp: ts(2024, 3, 11, 15),
            duration_minutes: 30.0,
            staff_id: "S001".to_string(),
            notes: String::new(),
        };

        assert_eq!(record.date(), NaiveDate::from_ymd_opt(2024, 3, 11).unwrap());
        assert_eq!(record.hour(), 15);
        assert_eq!(record.day_of_week(), Weekday::Mon);
    }

    #[test]
    fn test_notes_mention_is_case_insensitive() {
        let record = ActivityRecord {
            pet_id: "P001".to_string(),
            pet_name: "Rex".to_string(),
            activity_type: ActivityType::Medical,
            timestamp: ts(2024, 3, 11, 9),
            duration_minutes: 10.0,
            staff_id: "S001".to_string(),
            notes: "Weight check: 54 lbs, stable".to_string(),
        };

        assert!(record.notes_mention("weight"));
        assert!(record.notes_mention("WEIGHT"));
        assert!(!record.notes_mention("vaccine"));
    }

    #[test]
    fn test_shift_duration_and_rate() {
        let shift = StaffShift {
            staff_id: "S001".to_string(),
            staff_name: "Jamie".to_string(),
            shift_start: ts(2024, 3, 11, 9),
            shift_end: ts(2024, 3, 11, 17),
            tasks_completed: 10,
        };

        assert_eq!(shift.duration_hours(), 8.0);
        assert_eq!(shift.shift_type(), ShiftType::Morning);
        assert!((shift.tasks_per_hour() - 1.25).abs() < 1e-9);
    }

    #[test]
    fn test_temperature_range_buckets() {
        assert_eq!(TemperatureRange::categorize(60.0), TemperatureRange::Cold);
        assert_eq!(TemperatureRange::categorize(65.0), TemperatureRange::Cool);
        assert_eq!(TemperatureRange::categorize(72.0), TemperatureRange::Optimal);
        assert_eq!(TemperatureRange::categorize(78.0), TemperatureRange::Optimal);
        assert_eq!(TemperatureRange::categorize(78.1), TemperatureRange::Warm);
        assert_eq!(TemperatureRange::categorize(82.0), TemperatureRange::Warm);
        assert_eq!(TemperatureRange::categorize(82.1), TemperatureRange::Hot);
    }

    #[test]
    fn test_correlation_strength_bands() {
        assert_eq!(CorrelationStrength::classify(0.8), CorrelationStrength::Strong);
        assert_eq!(CorrelationStrength::classify(-0.7), CorrelationStrength::Strong);
        assert_eq!(CorrelationStrength::classify(0.5), CorrelationStrength::Moderate);
        assert_eq!(CorrelationStrength::classify(-0.25), CorrelationStrength::Weak);
        assert_eq!(CorrelationStrength::classify(0.1), CorrelationStrength::Negligible);
    }

    #[test]
    fn test_raw_activity_accepts_numeric_or_string_duration() {
        let from_json: RawActivityRecord = serde_json::from_str(
            r#"{"pet_id":"P001","pet_name":"Rex","activity_type":"play",
                "timestamp":"2024-03-11 15:00:00","duration_minutes":30,
                "staff_id":"S001","notes":""}"#,
        )
        .unwrap();
        assert_eq!(from_json.duration_minutes, serde_json::json!(30));

        let from_csvish: RawActivityRecord = serde_json::from_str(
            r#"{"pet_id":"P001","pet_name":"Rex","activity_type":"play",
                "timestamp":"2024-03-11 15:00:00","duration_minutes":"30",
                "staff_id":"S001","notes":""}"#,
        )
        .unwrap();
        assert_eq!(from_csvish.duration_minutes, serde_json::json!("30"));
    }
}
