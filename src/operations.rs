// OperationsAnalyzer - grooming compliance, staff performance, and alert
// trends, rolled up into an overall operations score with recommendations.
//
// Consumes both the staff-shift table and the activity table; like the other
// analyzers it snapshots its inputs at construction.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use crate::config::{AnalysisConfig, AnalysisWindow};
use crate::error::{AnalysisError, AnalysisResult};
use crate::records::{
    ActivityRecord, ActivityType, PerformanceRating, ShiftType, StaffShift, TrendDirection,
};
use crate::stats;

/// Hours of day considered on-schedule for feedings. Feedings at any other
/// hour are counted as feeding delays.
pub const NORMAL_FEEDING_HOURS: [u32; 6] = [7, 8, 12, 13, 17, 18];

/// Minimum distinct days with data before a trend direction is computed.
/// Below this the 3-day head/tail comparison would overlap itself, so the
/// trend is reported as stable.
pub const MIN_TREND_DAYS: usize = 6;

// ============================================================================
// RESULT TYPES
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct PetGroomingStats {
    pub pet_id: String,
    pub pet_name: String,
    pub total_grooming_sessions: usize,
    pub first_groom: NaiveDateTime,
    pub latest_groom: NaiveDateTime,
    pub avg_duration: f64,
    pub days_since_last_groom: i64,
    /// Mean days between sessions: span / (sessions - 1); 0 for one session.
    pub avg_interval_days: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyGroomingPattern {
    pub grooming_sessions: usize,
    pub total_minutes: f64,
    pub avg_duration: f64,
    pub staff_involved: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroomingAnalysis {
    pub total_grooming_sessions: usize,
    pub pets_groomed: usize,
    pub avg_sessions_per_pet: f64,
    pub avg_grooming_duration: f64,
    /// Pets past the target interval (superset of the overdue set).
    pub pets_needing_grooming: Vec<PetGroomingStats>,
    /// Pets past the stricter alert interval.
    pub pets_overdue_grooming: Vec<PetGroomingStats>,
    pub schedule_compliance: f64,
    pub per_pet: Vec<PetGroomingStats>,
    pub daily_patterns: BTreeMap<NaiveDate, DailyGroomingPattern>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StaffMetrics {
    pub staff_id: String,
    pub staff_name: String,
    pub total_tasks: u32,
    pub avg_tasks_per_shift: f64,
    pub total_hours: f64,
    pub avg_hours_per_shift: f64,
    pub avg_tasks_per_hour: f64,
    pub total_shifts: usize,
    pub performance_rating: PerformanceRating,
    // Activity participation, left-joined from the activity table.
    pub total_activities: usize,
    pub total_activity_minutes: f64,
    pub activity_breakdown: BTreeMap<ActivityType, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StaffPerformanceAnalysis {
    pub total_staff_analyzed: usize,
    pub avg_tasks_per_hour_kennel: f64,
    /// Top five by mean tasks-per-hour.
    pub top_performers: Vec<StaffMetrics>,
    pub staff_needing_support: Vec<StaffMetrics>,
    /// Mean of per-staff means, per shift type.
    pub shift_type_performance: BTreeMap<ShiftType, f64>,
    pub per_staff: Vec<StaffMetrics>,
    pub performance_distribution: BTreeMap<PerformanceRating, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PetAlertCount {
    pub pet_id: String,
    pub pet_name: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AlertTrendsAnalysis {
    pub total_health_alerts: usize,
    pub total_feeding_delays: usize,
    pub avg_health_alerts_per_day: f64,
    pub avg_feeding_delays_per_day: f64,
    /// Top three hours by health-alert count.
    pub peak_health_alert_hours: Vec<(u32, usize)>,
    pub peak_feeding_issue_hours: Vec<(u32, usize)>,
    /// Pets with more than two health alerts in the window.
    pub pets_with_frequent_health_alerts: Vec<PetAlertCount>,
    /// Pets with more than one off-schedule feeding.
    pub pets_with_feeding_issues: Vec<PetAlertCount>,
    pub staff_alert_response: BTreeMap<String, usize>,
    pub daily_health_trend: BTreeMap<NaiveDate, usize>,
    pub daily_feeding_trend: BTreeMap<NaiveDate, usize>,
    pub health_alerts_trend: TrendDirection,
    pub feeding_delays_trend: TrendDirection,
}

#[derive(Debug, Clone, Serialize)]
pub struct OperationsSummary {
    pub operations_score: f64,
    pub grooming_operations: Option<GroomingAnalysis>,
    pub staff_performance: Option<StaffPerformanceAnalysis>,
    pub alert_management: Option<AlertTrendsAnalysis>,
    pub key_recommendations: Vec<String>,
}

// ============================================================================
// ANALYZER
// ============================================================================

pub struct OperationsAnalyzer {
    staff: Vec<StaffShift>,
    activities: Vec<ActivityRecord>,
    config: Arc<AnalysisConfig>,
}

impl OperationsAnalyzer {
    /// Takes snapshots of both input tables.
    pub fn new(
        staff: &[StaffShift],
        activities: &[ActivityRecord],
        config: Arc<AnalysisConfig>,
    ) -> Self {
        OperationsAnalyzer {
            staff: staff.to_vec(),
            activities: activities.to_vec(),
            config,
        }
    }

    fn activities_in_window<'a>(
        &'a self,
        window: &AnalysisWindow,
    ) -> impl Iterator<Item = &'a ActivityRecord> {
        let cutoff = window.cutoff();
        self.activities.iter().filter(move |a| a.timestamp >= cutoff)
    }

    /// Grooming cadence per pet plus compliance against the configured
    /// target/alert intervals.
    pub fn grooming_frequency(&self, window: &AnalysisWindow) -> AnalysisResult<GroomingAnalysis> {
        let grooming: Vec<&ActivityRecord> = self
            .activities_in_window(window)
            .filter(|a| a.activity_type == ActivityType::Grooming)
            .collect();

        if grooming.is_empty() {
            return Err(AnalysisError::insufficient(
                "no grooming records in the analysis window",
            ));
        }

        let mut by_pet: BTreeMap<(String, String), Vec<&ActivityRecord>> = BTreeMap::new();
        for &record in &grooming {
            by_pet
                .entry((record.pet_id.clone(), record.pet_name.clone()))
                .or_default()
                .push(record);
        }

        let per_pet: Vec<PetGroomingStats> = by_pet
            .into_iter()
            .filter_map(|((pet_id, pet_name), mut sessions)| {
                sessions.sort_by_key(|a| a.timestamp);
                let first = sessions.first()?.timestamp;
                let latest = sessions.last()?.timestamp;
                let count = sessions.len();
                let durations: Vec<f64> = sessions.iter().map(|a| a.duration_minutes).collect();

                let span_days = (latest - first).num_days();
                let avg_interval_days = if count > 1 {
                    stats::round2(span_days as f64 / (count - 1) as f64)
                } else {
                    0.0
                };

                Some(PetGroomingStats {
                    pet_id,
                    pet_name,
                    total_grooming_sessions: count,
                    first_groom: first,
                    latest_groom: latest,
                    avg_duration: stats::round2(stats::mean(&durations).unwrap_or(0.0)),
                    days_since_last_groom: (window.reference - latest).num_days(),
                    avg_interval_days,
                })
            })
            .collect();

        let grooming_cfg = &self.config.operations.grooming_frequency;
        let pets_needing_grooming: Vec<PetGroomingStats> = per_pet
            .iter()
            .filter(|p| p.days_since_last_groom > grooming_cfg.target_days_between)
            .cloned()
            .collect();
        let pets_overdue_grooming: Vec<PetGroomingStats> = per_pet
            .iter()
            .filter(|p| p.days_since_last_groom > grooming_cfg.alert_days_overdue)
            .cloned()
            .collect();

        let schedule_compliance = if per_pet.is_empty() {
            0.0
        } else {
            stats::round2(
                (1.0 - pets_overdue_grooming.len() as f64 / per_pet.len() as f64) * 100.0,
            )
        };

        let mut daily_patterns: BTreeMap<NaiveDate, DailyGroomingPattern> = BTreeMap::new();
        let mut daily_rows: BTreeMap<NaiveDate, Vec<&ActivityRecord>> = BTreeMap::new();
        for &record in &grooming {
            daily_rows.entry(record.date()).or_default().push(record);
        }
        for (date, rows) in daily_rows {
            let minutes: Vec<f64> = rows.iter().map(|a| a.duration_minutes).collect();
            let staff: HashSet<&str> = rows.iter().map(|a| a.staff_id.as_str()).collect();
            daily_patterns.insert(
                date,
                DailyGroomingPattern {
                    grooming_sessions: rows.len(),
                    total_minutes: minutes.iter().sum(),
                    avg_duration: stats::round2(stats::mean(&minutes).unwrap_or(0.0)),
                    staff_involved: staff.len(),
                },
            );
        }

        let all_durations: Vec<f64> = grooming.iter().map(|a| a.duration_minutes).collect();
        let session_counts: Vec<f64> = per_pet
            .iter()
            .map(|p| p.total_grooming_sessions as f64)
            .collect();

        Ok(GroomingAnalysis {
            total_grooming_sessions: grooming.len(),
            pets_groomed: per_pet.len(),
            avg_sessions_per_pet: stats::round2(stats::mean(&session_counts).unwrap_or(0.0)),
            avg_grooming_duration: stats::round2(stats::mean(&all_durations).unwrap_or(0.0)),
            pets_needing_grooming,
            pets_overdue_grooming,
            schedule_compliance,
            per_pet,
            daily_patterns,
        })
    }

    /// Per-staff productivity metrics with ratings, merged with activity
    /// participation from the activity table (left join, missing -> zero).
    pub fn staff_performance(
        &self,
        window: &AnalysisWindow,
    ) -> AnalysisResult<StaffPerformanceAnalysis> {
        let cutoff = window.cutoff();
        let recent: Vec<&StaffShift> = self
            .staff
            .iter()
            .filter(|s| s.shift_start >= cutoff)
            .collect();

        if recent.is_empty() {
            return Err(AnalysisError::insufficient(
                "no staff shifts in the analysis window",
            ));
        }

        // Activity participation per staff member.
        struct Participation {
            count: usize,
            minutes: f64,
            breakdown: BTreeMap<ActivityType, usize>,
        }
        let mut participation: BTreeMap<String, Participation> = BTreeMap::new();
        for record in self.activities_in_window(window) {
            let entry = participation
                .entry(record.staff_id.clone())
                .or_insert(Participation {
                    count: 0,
                    minutes: 0.0,
                    breakdown: BTreeMap::new(),
                });
            entry.count += 1;
            entry.minutes += record.duration_minutes;
            *entry.breakdown.entry(record.activity_type).or_insert(0) += 1;
        }

        let mut by_staff: BTreeMap<(String, String), Vec<&StaffShift>> = BTreeMap::new();
        for &shift in &recent {
            by_staff
                .entry((shift.staff_id.clone(), shift.staff_name.clone()))
                .or_default()
                .push(shift);
        }

        let per_staff: Vec<StaffMetrics> = by_staff
            .into_iter()
            .map(|((staff_id, staff_name), shifts)| {
                let tasks: Vec<f64> = shifts.iter().map(|s| f64::from(s.tasks_completed)).collect();
                let hours: Vec<f64> = shifts.iter().map(|s| s.duration_hours()).collect();
                let rates: Vec<f64> = shifts.iter().map(|s| s.tasks_per_hour()).collect();
                let avg_rate = stats::round2(stats::mean(&rates).unwrap_or(0.0));

                let (count, minutes, breakdown) = participation
                    .get(&staff_id)
                    .map(|p| (p.count, p.minutes, p.breakdown.clone()))
                    .unwrap_or((0, 0.0, BTreeMap::new()));

                StaffMetrics {
                    staff_id,
                    staff_name,
                    total_tasks: shifts.iter().map(|s| s.tasks_completed).sum(),
                    avg_tasks_per_shift: stats::round2(stats::mean(&tasks).unwrap_or(0.0)),
                    total_hours: stats::round2(hours.iter().sum()),
                    avg_hours_per_shift: stats::round2(stats::mean(&hours).unwrap_or(0.0)),
                    avg_tasks_per_hour: avg_rate,
                    total_shifts: shifts.len(),
                    performance_rating: self.rate_staff_performance(avg_rate),
                    total_activities: count,
                    total_activity_minutes: minutes,
                    activity_breakdown: breakdown,
                }
            })
            .collect();

        // Per shift type: mean of per-staff means, so one prolific member
        // does not dominate the bucket.
        let mut staff_shift_type: BTreeMap<(String, ShiftType), Vec<f64>> = BTreeMap::new();
        for shift in &recent {
            staff_shift_type
                .entry((shift.staff_id.clone(), shift.shift_type()))
                .or_default()
                .push(shift.tasks_per_hour());
        }
        let mut per_type: BTreeMap<ShiftType, Vec<f64>> = BTreeMap::new();
        for ((_staff, shift_type), rates) in staff_shift_type {
            if let Some(mean) = stats::mean(&rates) {
                per_type.entry(shift_type).or_default().push(mean);
            }
        }
        let shift_type_performance: BTreeMap<ShiftType, f64> = per_type
            .into_iter()
            .filter_map(|(shift_type, means)| {
                stats::mean(&means).map(|m| (shift_type, stats::round2(m)))
            })
            .collect();

        let mut performance_distribution: BTreeMap<PerformanceRating, usize> = BTreeMap::new();
        for metrics in &per_staff {
            *performance_distribution
                .entry(metrics.performance_rating)
                .or_insert(0) += 1;
        }

        let mut ranked = per_staff.clone();
        ranked.sort_by(|a, b| {
            b.avg_tasks_per_hour
                .partial_cmp(&a.avg_tasks_per_hour)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let top_performers: Vec<StaffMetrics> = ranked.iter().take(5).cloned().collect();

        let staff_needing_support: Vec<StaffMetrics> = per_staff
            .iter()
            .filter(|m| m.performance_rating == PerformanceRating::BelowTarget)
            .cloned()
            .collect();

        let kennel_rates: Vec<f64> = per_staff.iter().map(|m| m.avg_tasks_per_hour).collect();

        Ok(StaffPerformanceAnalysis {
            total_staff_analyzed: per_staff.len(),
            avg_tasks_per_hour_kennel: stats::round2(stats::mean(&kennel_rates).unwrap_or(0.0)),
            top_performers,
            staff_needing_support,
            shift_type_performance,
            per_staff,
            performance_distribution,
        })
    }

    /// Health alerts (medical activities) and feeding delays (feedings at
    /// off-schedule hours), with daily/hourly patterns and trend directions.
    pub fn alert_trends(&self, window: &AnalysisWindow) -> AnalysisResult<AlertTrendsAnalysis> {
        let recent: Vec<&ActivityRecord> = self.activities_in_window(window).collect();
        if recent.is_empty() {
            return Err(AnalysisError::insufficient(
                "no activity records in the analysis window",
            ));
        }

        let health_alerts: Vec<&ActivityRecord> = recent
            .iter()
            .copied()
            .filter(|a| a.activity_type == ActivityType::Medical)
            .collect();
        let feeding_delays: Vec<&ActivityRecord> = recent
            .iter()
            .copied()
            .filter(|a| {
                a.activity_type == ActivityType::Feeding
                    && !NORMAL_FEEDING_HOURS.contains(&a.hour())
            })
            .collect();

        let daily_counts = |records: &[&ActivityRecord]| -> BTreeMap<NaiveDate, usize> {
            let mut counts = BTreeMap::new();
            for record in records {
                *counts.entry(record.date()).or_insert(0) += 1;
            }
            counts
        };
        let hourly_top = |records: &[&ActivityRecord], top: usize| -> Vec<(u32, usize)> {
            let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
            for record in records {
                *counts.entry(record.hour()).or_insert(0) += 1;
            }
            let mut ranked: Vec<(u32, usize)> = counts.into_iter().collect();
            ranked.sort_by(|a, b| b.1.cmp(&a.1));
            ranked.truncate(top);
            ranked
        };
        let pet_counts = |records: &[&ActivityRecord], min: usize| -> Vec<PetAlertCount> {
            let mut counts: BTreeMap<(String, String), usize> = BTreeMap::new();
            for record in records {
                *counts
                    .entry((record.pet_id.clone(), record.pet_name.clone()))
                    .or_insert(0) += 1;
            }
            counts
                .into_iter()
                .filter(|(_, count)| *count > min)
                .map(|((pet_id, pet_name), count)| PetAlertCount {
                    pet_id,
                    pet_name,
                    count,
                })
                .collect()
        };

        let daily_health_trend = daily_counts(&health_alerts);
        let daily_feeding_trend = daily_counts(&feeding_delays);

        let mut staff_alert_response: BTreeMap<String, usize> = BTreeMap::new();
        for record in &health_alerts {
            *staff_alert_response
                .entry(record.staff_id.clone())
                .or_insert(0) += 1;
        }

        let days = f64::from(window.days.max(1));
        Ok(AlertTrendsAnalysis {
            total_health_alerts: health_alerts.len(),
            total_feeding_delays: feeding_delays.len(),
            avg_health_alerts_per_day: stats::round2(health_alerts.len() as f64 / days),
            avg_feeding_delays_per_day: stats::round2(feeding_delays.len() as f64 / days),
            peak_health_alert_hours: hourly_top(&health_alerts, 3),
            peak_feeding_issue_hours: hourly_top(&feeding_delays, 3),
            pets_with_frequent_health_alerts: pet_counts(&health_alerts, 2),
            pets_with_feeding_issues: pet_counts(&feeding_delays, 1),
            staff_alert_response,
            health_alerts_trend: trend_direction(&daily_health_trend),
            feeding_delays_trend: trend_direction(&daily_feeding_trend),
            daily_health_trend,
            daily_feeding_trend,
        })
    }

    /// Overall operations score and recommendations at the default
    /// (medium-term) window from the given reference instant.
    pub fn operations_summary(&self, reference: NaiveDateTime) -> OperationsSummary {
        let window = self.config.medium_window(reference);

        let grooming = self.grooming_frequency(&window).ok();
        let staff = self.staff_performance(&window).ok();
        let alerts = self.alert_trends(&window).ok();

        // Missing grooming data scores zero; missing staff or alert data
        // falls back to a neutral 50.
        let grooming_score = grooming
            .as_ref()
            .map(|g| g.schedule_compliance)
            .unwrap_or(0.0);
        let staff_score = staff.as_ref().map(Self::staff_score).unwrap_or(50.0);
        let alert_score = alerts.as_ref().map(Self::alert_score).unwrap_or(50.0);

        let operations_score = stats::round1((grooming_score + staff_score + alert_score) / 3.0);
        let key_recommendations =
            Self::recommendations(grooming.as_ref(), staff.as_ref(), alerts.as_ref());

        OperationsSummary {
            operations_score,
            grooming_operations: grooming,
            staff_performance: staff,
            alert_management: alerts,
            key_recommendations,
        }
    }

    fn rate_staff_performance(&self, tasks_per_hour: f64) -> PerformanceRating {
        let cfg = &self.config.operations.staff_performance;
        if tasks_per_hour >= cfg.target_tasks_per_hour {
            PerformanceRating::Excellent
        } else if tasks_per_hour >= cfg.min_tasks_per_hour {
            PerformanceRating::Satisfactory
        } else {
            PerformanceRating::BelowTarget
        }
    }

    fn staff_score(analysis: &StaffPerformanceAnalysis) -> f64 {
        let total: usize = analysis.performance_distribution.values().sum();
        if total == 0 {
            return 50.0;
        }
        let excellent = analysis
            .performance_distribution
            .get(&PerformanceRating::Excellent)
            .copied()
            .unwrap_or(0);
        let satisfactory = analysis
            .performance_distribution
            .get(&PerformanceRating::Satisfactory)
            .copied()
            .unwrap_or(0);

        let score = (excellent as f64 * 100.0 + satisfactory as f64 * 70.0) / total as f64;
        score.min(100.0)
    }

    fn alert_score(analysis: &AlertTrendsAnalysis) -> f64 {
        let health_penalty = (analysis.avg_health_alerts_per_day * 5.0).min(30.0);
        let feeding_penalty = (analysis.avg_feeding_delays_per_day * 10.0).min(20.0);
        (100.0 - health_penalty - feeding_penalty).max(0.0)
    }

    /// Fixed, ordered recommendation list; each line fires when its
    /// threshold condition holds.
    fn recommendations(
        grooming: Option<&GroomingAnalysis>,
        staff: Option<&StaffPerformanceAnalysis>,
        alerts: Option<&AlertTrendsAnalysis>,
    ) -> Vec<String> {
        let mut recommendations = Vec::new();

        if let Some(grooming) = grooming {
            let overdue = grooming.pets_overdue_grooming.len();
            if overdue > 0 {
                recommendations.push(format!("Schedule grooming for {overdue} overdue pets"));
            }
        }
        if let Some(staff) = staff {
            let below_target = staff.staff_needing_support.len();
            if below_target > 0 {
                recommendations.push(format!(
                    "Provide additional training/support to {below_target} staff members"
                ));
            }
        }
        if let Some(alerts) = alerts {
            if alerts.avg_health_alerts_per_day > 2.0 {
                recommendations.push(
                    "Review health monitoring protocols - high alert frequency detected"
                        .to_string(),
                );
            }
            if alerts.avg_feeding_delays_per_day > 1.0 {
                recommendations.push("Optimize feeding schedules to reduce delays".to_string());
            }
        }

        if recommendations.is_empty() {
            recommendations
                .push("Operations are running smoothly - maintain current standards".to_string());
        }
        recommendations
    }
}

/// Increasing iff the series spans enough days and the mean of the last
/// three days with data exceeds the mean of the first three.
fn trend_direction(daily: &BTreeMap<NaiveDate, usize>) -> TrendDirection {
    if daily.len() < MIN_TREND_DAYS {
        return TrendDirection::Stable;
    }
    let counts: Vec<f64> = daily.values().map(|c| *c as f64).collect();
    let head = stats::mean(&counts[..3]).unwrap_or(0.0);
    let tail = stats::mean(&counts[counts.len() - 3..]).unwrap_or(0.0);
    if tail > head {
        TrendDirection::Increasing
    } else {
        TrendDirection::Stable
    }
}

// ============================================================================
// TESTS
// ============================================================================
