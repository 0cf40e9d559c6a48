// WellnessAnalyzer - per-pet activity and feeding statistics plus the
// kennel-wide wellness summary.
//
// Every operation takes an explicit AnalysisWindow so results are a pure
// function of (config, captured records, window). The analyzer holds its own
// copy of the activity table; repeated queries are side-effect-free.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::{AnalysisConfig, AnalysisWindow};
use crate::error::{AnalysisError, AnalysisResult};
use crate::records::{ActivityRecord, ActivityStatus, ActivityType, FeedingStatus};
use crate::stats;

// ============================================================================
// RESULT TYPES
// ============================================================================

/// Average daily activity for one pet over the days it was actually active.
#[derive(Debug, Clone, Serialize)]
pub struct PetActivityAverage {
    pub pet_id: String,
    pub pet_name: String,
    /// Mean of per-day minute sums, over days with at least one activity.
    pub avg_daily_minutes: f64,
    pub avg_daily_activities: f64,
    pub activity_status: ActivityStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct PetFeedingStats {
    pub pet_id: String,
    pub pet_name: String,
    pub avg_feedings_per_day: f64,
    /// Sample std of daily feeding counts; 0.0 with a single observed day.
    pub feeding_consistency: f64,
    pub min_daily: f64,
    pub max_daily: f64,
    pub feeding_status: FeedingStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedingFrequencyAnalysis {
    pub total_pets_analyzed: usize,
    pub avg_feedings_across_kennel: f64,
    pub pets_with_irregular_feeding: usize,
    pub per_pet: Vec<PetFeedingStats>,
}

/// Weight-check counts inferred from free-text notes. Heuristic substring
/// search, not structured weight data.
#[derive(Debug, Clone, Serialize)]
pub struct PetWeightChecks {
    pub pet_id: String,
    pub pet_name: String,
    pub total_weight_checks: usize,
    pub first_check: NaiveDateTime,
    pub latest_check: NaiveDateTime,
    pub latest_notes: String,
    pub days_between_checks: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeightTrendAnalysis {
    pub pets_with_weight_monitoring: usize,
    pub total_weight_checks: usize,
    pub avg_checks_per_pet: f64,
    pub per_pet: Vec<PetWeightChecks>,
    /// Most recent weight-related activities, newest first, capped at 10.
    pub recent_weight_activities: Vec<ActivityRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WellnessSummary {
    pub total_pets: usize,
    /// Percentage of pets whose activity status is optimal.
    pub activity_wellness_rate: f64,
    /// Percentage of pets whose feeding status is normal.
    pub feeding_wellness_rate: f64,
    pub pets_needing_attention: Vec<PetActivityAverage>,
    pub activity_details: Vec<PetActivityAverage>,
    pub feeding_details: Option<FeedingFrequencyAnalysis>,
    pub weight_monitoring: Option<WeightTrendAnalysis>,
}

// ============================================================================
// ANALYZER
// ============================================================================

pub struct WellnessAnalyzer {
    activities: Vec<ActivityRecord>,
    config: Arc<AnalysisConfig>,
}

impl WellnessAnalyzer {
    /// Takes its own snapshot of the activity table.
    pub fn new(activities: &[ActivityRecord], config: Arc<AnalysisConfig>) -> Self {
        WellnessAnalyzer {
            activities: activities.to_vec(),
            config,
        }
    }

    fn in_window<'a>(&'a self, window: &AnalysisWindow) -> impl Iterator<Item = &'a ActivityRecord> {
        let cutoff = window.cutoff();
        self.activities.iter().filter(move |a| a.timestamp >= cutoff)
    }

    /// Average daily activity minutes per pet, sorted descending.
    ///
    /// Days with zero activity contribute no row, so the denominator is
    /// "days with at least one activity", not the window length.
    pub fn average_activity_per_pet(
        &self,
        window: &AnalysisWindow,
    ) -> AnalysisResult<Vec<PetActivityAverage>> {
        // (pet_id, pet_name, date) -> (minutes, count)
        let mut daily: BTreeMap<(String, String, NaiveDate), (f64, usize)> = BTreeMap::new();
        for record in self.in_window(window) {
            let key = (record.pet_id.clone(), record.pet_name.clone(), record.date());
            let entry = daily.entry(key).or_insert((0.0, 0));
            entry.0 += record.duration_minutes;
            entry.1 += 1;
        }

        if daily.is_empty() {
            return Err(AnalysisError::insufficient(
                "no activity records in the analysis window",
            ));
        }

        // Collapse per-day rows into per-pet means.
        let mut per_pet: BTreeMap<(String, String), (Vec<f64>, Vec<f64>)> = BTreeMap::new();
        for ((pet_id, pet_name, _date), (minutes, count)) in daily {
            let entry = per_pet.entry((pet_id, pet_name)).or_default();
            entry.0.push(minutes);
            entry.1.push(count as f64);
        }

        let mut averages: Vec<PetActivityAverage> = per_pet
            .into_iter()
            .map(|((pet_id, pet_name), (daily_minutes, daily_counts))| {
                let avg_minutes = stats::round2(stats::mean(&daily_minutes).unwrap_or(0.0));
                PetActivityAverage {
                    pet_id,
                    pet_name,
                    avg_daily_minutes: avg_minutes,
                    avg_daily_activities: stats::round2(stats::mean(&daily_counts).unwrap_or(0.0)),
                    activity_status: self.categorize_activity_level(avg_minutes),
                }
            })
            .collect();

        averages.sort_by(|a, b| {
            b.avg_daily_minutes
                .partial_cmp(&a.avg_daily_minutes)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(averages)
    }

    /// Daily feeding counts per pet: mean, consistency (std), min, max, and a
    /// status against the configured feeding bounds.
    pub fn feeding_frequency(
        &self,
        window: &AnalysisWindow,
    ) -> AnalysisResult<FeedingFrequencyAnalysis> {
        let mut daily: BTreeMap<(String, String, NaiveDate), usize> = BTreeMap::new();
        for record in self.in_window(window) {
            if record.activity_type == ActivityType::Feeding {
                let key = (record.pet_id.clone(), record.pet_name.clone(), record.date());
                *daily.entry(key).or_insert(0) += 1;
            }
        }

        if daily.is_empty() {
            return Err(AnalysisError::insufficient(
                "no feeding records in the analysis window",
            ));
        }

        let mut per_pet_counts: BTreeMap<(String, String), Vec<f64>> = BTreeMap::new();
        for ((pet_id, pet_name, _date), count) in daily {
            per_pet_counts
                .entry((pet_id, pet_name))
                .or_default()
                .push(count as f64);
        }

        let per_pet: Vec<PetFeedingStats> = per_pet_counts
            .into_iter()
            .map(|((pet_id, pet_name), counts)| {
                let avg = stats::round2(stats::mean(&counts).unwrap_or(0.0));
                PetFeedingStats {
                    pet_id,
                    pet_name,
                    avg_feedings_per_day: avg,
                    feeding_consistency: stats::round2(stats::sample_std(&counts).unwrap_or(0.0)),
                    min_daily: stats::min(&counts).unwrap_or(0.0),
                    max_daily: stats::max(&counts).unwrap_or(0.0),
                    feeding_status: self.categorize_feeding_frequency(avg),
                }
            })
            .collect();

        let kennel_avg = stats::mean(
            &per_pet
                .iter()
                .map(|p| p.avg_feedings_per_day)
                .collect::<Vec<f64>>(),
        )
        .unwrap_or(0.0);

        Ok(FeedingFrequencyAnalysis {
            total_pets_analyzed: per_pet.len(),
            avg_feedings_across_kennel: stats::round2(kennel_avg),
            pets_with_irregular_feeding: per_pet
                .iter()
                .filter(|p| p.feeding_status != FeedingStatus::Normal)
                .count(),
            per_pet,
        })
    }

    /// Weight monitoring inferred from medical-activity notes mentioning
    /// "weight". An empty result (medical records exist but none mention
    /// weight) is meaningful and returned as-is.
    pub fn weight_trend(&self, window: &AnalysisWindow) -> AnalysisResult<WeightTrendAnalysis> {
        let medical: Vec<&ActivityRecord> = self
            .in_window(window)
            .filter(|a| a.activity_type == ActivityType::Medical)
            .collect();

        if medical.is_empty() {
            return Err(AnalysisError::insufficient(
                "no medical records in the analysis window",
            ));
        }

        let mut mentions: Vec<&ActivityRecord> = medical
            .into_iter()
            .filter(|a| a.notes_mention("weight"))
            .collect();
        mentions.sort_by_key(|a| a.timestamp);

        let mut per_pet_map: BTreeMap<(String, String), Vec<&ActivityRecord>> = BTreeMap::new();
        for &record in &mentions {
            per_pet_map
                .entry((record.pet_id.clone(), record.pet_name.clone()))
                .or_default()
                .push(record);
        }

        let per_pet: Vec<PetWeightChecks> = per_pet_map
            .into_iter()
            .filter_map(|((pet_id, pet_name), checks)| {
                let first = checks.first()?;
                let latest = checks.last()?;
                Some(PetWeightChecks {
                    pet_id,
                    pet_name,
                    total_weight_checks: checks.len(),
                    first_check: first.timestamp,
                    latest_check: latest.timestamp,
                    latest_notes: latest.notes.clone(),
                    days_between_checks: (latest.timestamp - first.timestamp).num_days(),
                })
            })
            .collect();

        let avg_checks = stats::mean(
            &per_pet
                .iter()
                .map(|p| p.total_weight_checks as f64)
                .collect::<Vec<f64>>(),
        )
        .unwrap_or(0.0);

        let mut recent: Vec<ActivityRecord> = mentions.iter().map(|a| (*a).clone()).collect();
        recent.reverse();
        recent.truncate(10);

        Ok(WeightTrendAnalysis {
            pets_with_weight_monitoring: per_pet.len(),
            total_weight_checks: mentions.len(),
            avg_checks_per_pet: stats::round2(avg_checks),
            per_pet,
            recent_weight_activities: recent,
        })
    }

    /// Kennel-wide summary at the default (medium-term) window from the given
    /// reference instant. Feeding and weight sub-analyses degrade to None on
    /// insufficient data instead of failing the whole summary.
    pub fn wellness_summary(&self, reference: NaiveDateTime) -> AnalysisResult<WellnessSummary> {
        let window = self.config.medium_window(reference);

        let activity_details = self.average_activity_per_pet(&window)?;
        let feeding_details = self.feeding_frequency(&window).ok();
        let weight_monitoring = self.weight_trend(&window).ok();

        let total_pets = activity_details.len();
        let active_pets = activity_details
            .iter()
            .filter(|p| p.activity_status == ActivityStatus::Optimal)
            .count();
        let well_fed_pets = feeding_details
            .as_ref()
            .map(|f| {
                f.per_pet
                    .iter()
                    .filter(|p| p.feeding_status == FeedingStatus::Normal)
                    .count()
            })
            .unwrap_or(0);

        let rate = |count: usize| {
            if total_pets > 0 {
                stats::round2(count as f64 / total_pets as f64 * 100.0)
            } else {
                0.0
            }
        };

        let pets_needing_attention = activity_details
            .iter()
            .filter(|p| p.activity_status != ActivityStatus::Optimal)
            .cloned()
            .collect();

        Ok(WellnessSummary {
            total_pets,
            activity_wellness_rate: rate(active_pets),
            feeding_wellness_rate: rate(well_fed_pets),
            pets_needing_attention,
            activity_details,
            feeding_details,
            weight_monitoring,
        })
    }

    fn categorize_activity_level(&self, avg_minutes: f64) -> ActivityStatus {
        let bounds = &self.config.wellness;
        if avg_minutes < bounds.min_activity_minutes_per_day {
            ActivityStatus::Low
        } else if avg_minutes > bounds.max_activity_minutes_per_day {
            ActivityStatus::High
        } else {
            ActivityStatus::Optimal
        }
    }

    fn categorize_feeding_frequency(&self, avg_feedings: f64) -> FeedingStatus {
        let bounds = &self.config.wellness;
        if avg_feedings < bounds.min_feeding_times_per_day {
            FeedingStatus::Infrequent
        } else if avg_feedings > bounds.max_feeding_times_per_day {
            FeedingStatus::Excessive
        } else {
            FeedingStatus::Normal
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn activity(
        pet: &str,
        kind: ActivityType,
        timestamp: NaiveDateTime,
        minutes: f64,
    ) -> ActivityRecord {
        ActivityRecord {
            pet_id: pet.to_string(),
            pet_name: format!("{pet}-name"),
            activity_type: kind,
            timestamp,
            duration_minutes: minutes,
            staff_id: "S001".to_string(),
            notes: String::new(),
        }
    }

    fn analyzer(records: Vec<ActivityRecord>) -> WellnessAnalyzer {
        WellnessAnalyzer::new(&records, Arc::new(AnalysisConfig::default()))
    }

    fn window(days: u32) -> AnalysisWindow {
        AnalysisWindow::new(days, ts(31, 0))
    }

    #[test]
    fn test_average_uses_active_days_only() {
        // Rex: 30 and 45 minutes on two different days. The zero-duration
        // record never reaches the analyzer (dropped upstream), so the
        // average is over two active days, not the window length.
        let analyzer = analyzer(vec![
            activity("rex", ActivityType::Play, ts(10, 9), 30.0),
            activity("rex", ActivityType::Play, ts(12, 9), 45.0),
        ]);

        let result = analyzer.average_activity_per_pet(&window(30)).unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].avg_daily_minutes, 37.5);
        // 37.5 < 60 minute floor
        assert_eq!(result[0].activity_status, ActivityStatus::Low);
    }

    #[test]
    fn test_average_sorted_descending_and_statused() {
        let analyzer = analyzer(vec![
            activity("a", ActivityType::Play, ts(10, 9), 40.0),
            activity("b", ActivityType::Play, ts(10, 9), 90.0),
            activity("c", ActivityType::Play, ts(10, 9), 200.0),
        ]);

        let result = analyzer.average_activity_per_pet(&window(30)).unwrap();

        assert_eq!(result[0].pet_id, "c");
        assert_eq!(result[0].activity_status, ActivityStatus::High);
        assert_eq!(result[1].pet_id, "b");
        assert_eq!(result[1].activity_status, ActivityStatus::Optimal);
        assert_eq!(result[2].pet_id, "a");
        assert_eq!(result[2].activity_status, ActivityStatus::Low);
    }

    #[test]
    fn test_empty_window_is_insufficient_data() {
        let analyzer = analyzer(vec![activity("a", ActivityType::Play, ts(1, 9), 40.0)]);

        // Window covers only the last 7 days of March; the record is on the 1st.
        let result = analyzer.average_activity_per_pet(&window(7));
        assert!(matches!(result, Err(AnalysisError::InsufficientData(_))));
    }

    #[test]
    fn test_feeding_frequency_counts_and_status() {
        let analyzer = analyzer(vec![
            // Pet a: 3 feedings day 10, 1 feeding day 11 -> avg 2.0 (normal)
            activity("a", ActivityType::Feeding, ts(10, 7), 5.0),
            activity("a", ActivityType::Feeding, ts(10, 12), 5.0),
            activity("a", ActivityType::Feeding, ts(10, 18), 5.0),
            activity("a", ActivityType::Feeding, ts(11, 7), 5.0),
            // Pet b: 1 feeding on one day -> avg 1.0 (infrequent)
            activity("b", ActivityType::Feeding, ts(10, 7), 5.0),
            // Play records never count as feedings
            activity("b", ActivityType::Play, ts(10, 9), 30.0),
        ]);

        let result = analyzer.feeding_frequency(&window(30)).unwrap();

        assert_eq!(result.total_pets_analyzed, 2);
        let a = result.per_pet.iter().find(|p| p.pet_id == "a").unwrap();
        assert_eq!(a.avg_feedings_per_day, 2.0);
        assert_eq!(a.min_daily, 1.0);
        assert_eq!(a.max_daily, 3.0);
        assert_eq!(a.feeding_status, FeedingStatus::Normal);

        let b = result.per_pet.iter().find(|p| p.pet_id == "b").unwrap();
        assert_eq!(b.feeding_status, FeedingStatus::Infrequent);
        assert_eq!(b.feeding_consistency, 0.0);

        assert_eq!(result.pets_with_irregular_feeding, 1);
        assert_eq!(result.avg_feedings_across_kennel, 1.5);
    }

    #[test]
    fn test_weight_trend_matches_notes_heuristically() {
        let mut checked = activity("a", ActivityType::Medical, ts(5, 9), 10.0);
        checked.notes = "Weight check: 54 lbs".to_string();
        let mut checked_later = activity("a", ActivityType::Medical, ts(15, 9), 10.0);
        checked_later.notes = "weight stable at 53 lbs".to_string();
        let mut unrelated = activity("b", ActivityType::Medical, ts(10, 9), 10.0);
        unrelated.notes = "Vaccination booster".to_string();

        let analyzer = analyzer(vec![checked, checked_later, unrelated]);
        let result = analyzer.weight_trend(&window(30)).unwrap();

        assert_eq!(result.pets_with_weight_monitoring, 1);
        assert_eq!(result.total_weight_checks, 2);
        let pet = &result.per_pet[0];
        assert_eq!(pet.total_weight_checks, 2);
        assert_eq!(pet.days_between_checks, 10);
        assert_eq!(pet.latest_notes, "weight stable at 53 lbs");
        // Newest first
        assert_eq!(result.recent_weight_activities[0].timestamp, ts(15, 9));
    }

    #[test]
    fn test_weight_trend_without_medical_records_errors() {
        let analyzer = analyzer(vec![activity("a", ActivityType::Play, ts(10, 9), 30.0)]);
        assert!(analyzer.weight_trend(&window(30)).is_err());
    }

    #[test]
    fn test_wellness_summary_rates() {
        let analyzer = analyzer(vec![
            // Optimal activity + normal feeding
            activity("a", ActivityType::Play, ts(10, 9), 90.0),
            activity("a", ActivityType::Feeding, ts(10, 7), 5.0),
            activity("a", ActivityType::Feeding, ts(10, 12), 5.0),
            // Low activity, no feedings
            activity("b", ActivityType::Play, ts(10, 9), 20.0),
        ]);

        let summary = analyzer.wellness_summary(ts(31, 0)).unwrap();

        assert_eq!(summary.total_pets, 2);
        assert_eq!(summary.activity_wellness_rate, 50.0);
        // Feeding analysis only saw pet a; pet a is normal -> 1 of 2 pets.
        assert_eq!(summary.feeding_wellness_rate, 50.0);
        assert_eq!(summary.pets_needing_attention.len(), 1);
        assert_eq!(summary.pets_needing_attention[0].pet_id, "b");
        // No medical records at all: weight monitoring degrades to None.
        assert!(summary.weight_monitoring.is_none());
    }

    #[test]
    fn test_analyzer_holds_independent_snapshot() {
        let mut source = vec![activity("a", ActivityType::Play, ts(10, 9), 90.0)];
        let analyzer = WellnessAnalyzer::new(&source, Arc::new(AnalysisConfig::default()));

        // Mutating the caller's table after construction changes nothing.
        source.clear();

        let result = analyzer.average_activity_per_pet(&window(30)).unwrap();
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_feeding_minutes_count_toward_activity_average() {
        // Feeding durations still count toward activity minutes (they are
        // activities), pet a has 90 + 10 on one day.
        let analyzer = analyzer(vec![
            activity("a", ActivityType::Play, ts(10, 9), 90.0),
            activity("a", ActivityType::Feeding, ts(10, 12), 10.0),
        ]);

        let result = analyzer.average_activity_per_pet(&window(30)).unwrap();
        assert_eq!(result[0].avg_daily_minutes, 100.0);
        assert_eq!(result[0].avg_daily_activities, 2.0);
    }
}
