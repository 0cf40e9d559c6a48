// Threshold Configuration
//
// Every analyzer reads the same immutable AnalysisConfig, constructed once at
// process start and shared by reference (Arc). Classification rules live next
// to the bands they consume so the cutoff semantics are defined in one place.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::records::{ComfortRating, NoiseCategory};

// ============================================================================
// ANALYSIS WINDOWS
// ============================================================================

/// Named trailing-window lengths, in days.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisWindows {
    pub short_term: u32,
    pub medium_term: u32,
    pub long_term: u32,
}

impl Default for AnalysisWindows {
    fn default() -> Self {
        AnalysisWindows {
            short_term: 7,
            medium_term: 30,
            long_term: 90,
        }
    }
}

/// A concrete trailing window: `days` back from an explicit reference instant.
///
/// The reference instant is always injected by the caller (defaulting to the
/// wall clock only at the outermost entry points), so windowed analysis is
/// deterministic and testable without mocking the clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisWindow {
    pub days: u32,
    pub reference: NaiveDateTime,
}

impl AnalysisWindow {
    pub fn new(days: u32, reference: NaiveDateTime) -> Self {
        AnalysisWindow { days, reference }
    }

    pub fn cutoff(&self) -> NaiveDateTime {
        self.reference - Duration::days(i64::from(self.days))
    }

    /// Records on or after the cutoff are inside the window.
    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        ts >= self.cutoff()
    }
}

// ============================================================================
// PET WELLNESS THRESHOLDS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WellnessThresholds {
    pub min_activity_minutes_per_day: f64,
    pub max_activity_minutes_per_day: f64,
    pub min_feeding_times_per_day: f64,
    pub max_feeding_times_per_day: f64,
    /// Percentage weight change that should trigger an alert.
    pub weight_change_alert_threshold: f64,
}

impl Default for WellnessThresholds {
    fn default() -> Self {
        WellnessThresholds {
            min_activity_minutes_per_day: 60.0,
            max_activity_minutes_per_day: 180.0,
            min_feeding_times_per_day: 2.0,
            max_feeding_times_per_day: 4.0,
            weight_change_alert_threshold: 5.0,
        }
    }
}

// ============================================================================
// ENVIRONMENT THRESHOLDS
// ============================================================================

/// Two-tier comfort band: optimal range inside an acceptable (alert) range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComfortBand {
    pub optimal_min: f64,
    pub optimal_max: f64,
    pub alert_min: f64,
    pub alert_max: f64,
}

impl ComfortBand {
    /// Rate a measured value against the band. Bounds are inclusive.
    pub fn rate(&self, value: f64) -> ComfortRating {
        if value >= self.optimal_min && value <= self.optimal_max {
            ComfortRating::Optimal
        } else if value >= self.alert_min && value <= self.alert_max {
            ComfortRating::Acceptable
        } else {
            ComfortRating::Poor
        }
    }

    pub fn is_optimal(&self, value: f64) -> bool {
        value >= self.optimal_min && value <= self.optimal_max
    }
}

/// Noise uses a four-tier ladder instead of a band.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoiseThresholds {
    pub normal_max: f64,
    pub alert_threshold: f64,
    pub critical_threshold: f64,
}

impl NoiseThresholds {
    /// Categorize a dB reading. Boundary values belong to the lower tier,
    /// so the four categories partition the line with no gaps or overlaps.
    pub fn categorize(&self, noise_db: f64) -> NoiseCategory {
        if noise_db <= self.normal_max {
            NoiseCategory::Normal
        } else if noise_db <= self.alert_threshold {
            NoiseCategory::Elevated
        } else if noise_db <= self.critical_threshold {
            NoiseCategory::High
        } else {
            NoiseCategory::Critical
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentThresholds {
    pub temperature: ComfortBand,
    pub humidity: ComfortBand,
    pub noise: NoiseThresholds,
}

impl Default for EnvironmentThresholds {
    fn default() -> Self {
        EnvironmentThresholds {
            temperature: ComfortBand {
                optimal_min: 68.0,
                optimal_max: 78.0,
                alert_min: 60.0,
                alert_max: 85.0,
            },
            humidity: ComfortBand {
                optimal_min: 40.0,
                optimal_max: 60.0,
                alert_min: 30.0,
                alert_max: 80.0,
            },
            noise: NoiseThresholds {
                normal_max: 40.0,
                alert_threshold: 45.0,
                critical_threshold: 50.0,
            },
        }
    }
}

// ============================================================================
// OPERATIONS THRESHOLDS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffPerformanceThresholds {
    pub min_tasks_per_hour: f64,
    pub target_tasks_per_hour: f64,
    pub max_tasks_per_hour: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroomingThresholds {
    /// Target interval between grooming sessions, in days.
    pub target_days_between: i64,
    /// Days since last groom beyond which a pet is overdue.
    pub alert_days_overdue: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedingScheduleThresholds {
    pub expected_interval_hours: i64,
    pub late_threshold_minutes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationsThresholds {
    pub staff_performance: StaffPerformanceThresholds,
    pub grooming_frequency: GroomingThresholds,
    pub feeding_schedule: FeedingScheduleThresholds,
}

impl Default for OperationsThresholds {
    fn default() -> Self {
        OperationsThresholds {
            staff_performance: StaffPerformanceThresholds {
                min_tasks_per_hour: 0.8,
                target_tasks_per_hour: 1.2,
                max_tasks_per_hour: 2.0,
            },
            grooming_frequency: GroomingThresholds {
                target_days_between: 7,
                alert_days_overdue: 10,
            },
            feeding_schedule: FeedingScheduleThresholds {
                expected_interval_hours: 8,
                late_threshold_minutes: 30,
            },
        }
    }
}

// ============================================================================
// TOP-LEVEL CONFIG
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub windows: AnalysisWindows,
    pub wellness: WellnessThresholds,
    pub environment: EnvironmentThresholds,
    pub operations: OperationsThresholds,
}

impl AnalysisConfig {
    /// Medium-term window from an explicit reference instant - the default
    /// window for every analyzer operation.
    pub fn medium_window(&self, reference: NaiveDateTime) -> AnalysisWindow {
        AnalysisWindow::new(self.windows.medium_term, reference)
    }

    pub fn short_window(&self, reference: NaiveDateTime) -> AnalysisWindow {
        AnalysisWindow::new(self.windows.short_term, reference)
    }

    pub fn long_window(&self, reference: NaiveDateTime) -> AnalysisWindow {
        AnalysisWindow::new(self.windows.long_term, reference)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_default_thresholds_match_reference_values() {
        let config = AnalysisConfig::default();

        assert_eq!(config.windows.short_term, 7);
        assert_eq!(config.windows.medium_term, 30);
        assert_eq!(config.windows.long_term, 90);
        assert_eq!(config.wellness.min_activity_minutes_per_day, 60.0);
        assert_eq!(config.wellness.max_activity_minutes_per_day, 180.0);
        assert_eq!(config.environment.temperature.optimal_max, 78.0);
        assert_eq!(config.environment.noise.critical_threshold, 50.0);
        assert_eq!(config.operations.staff_performance.target_tasks_per_hour, 1.2);
        assert_eq!(config.operations.grooming_frequency.alert_days_overdue, 10);
    }

    #[test]
    fn test_window_contains_cutoff_boundary() {
        let window = AnalysisWindow::new(7, at(2024, 3, 15));

        assert_eq!(window.cutoff(), at(2024, 3, 8));
        assert!(window.contains(at(2024, 3, 8)));
        assert!(window.contains(at(2024, 3, 14)));
        assert!(!window.contains(at(2024, 3, 7)));
    }

    #[test]
    fn test_comfort_band_rating_is_inclusive() {
        let band = EnvironmentThresholds::default().temperature;

        assert_eq!(band.rate(68.0), ComfortRating::Optimal);
        assert_eq!(band.rate(78.0), ComfortRating::Optimal);
        assert_eq!(band.rate(60.0), ComfortRating::Acceptable);
        assert_eq!(band.rate(85.0), ComfortRating::Acceptable);
        assert_eq!(band.rate(59.9), ComfortRating::Poor);
        assert_eq!(band.rate(90.0), ComfortRating::Poor);
    }

    #[test]
    fn test_noise_tiers_partition_the_line() {
        let noise = EnvironmentThresholds::default().noise;

        // Boundary values belong to the lower tier.
        assert_eq!(noise.categorize(40.0), NoiseCategory::Normal);
        assert_eq!(noise.categorize(40.1), NoiseCategory::Elevated);
        assert_eq!(noise.categorize(45.0), NoiseCategory::Elevated);
        assert_eq!(noise.categorize(45.1), NoiseCategory::High);
        assert_eq!(noise.categorize(50.0), NoiseCategory::High);
        assert_eq!(noise.categorize(50.1), NoiseCategory::Critical);
    }

    #[test]
    fn test_config_deserializes_partial_overrides() {
        let json = r#"{"windows": {"short_term": 3, "medium_term": 14, "long_term": 60}}"#;
        let config: AnalysisConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.windows.medium_term, 14);
        // Untouched sections keep the defaults.
        assert_eq!(config.wellness.min_feeding_times_per_day, 2.0);
    }
}
