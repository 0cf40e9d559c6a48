// EnvironmentalAnalyzer - temperature/humidity/noise statistics, comfort
// ratings, noise alerting, and the temperature/activity correlation that
// joins environment readings against the activity table at hourly grain.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::{AnalysisConfig, AnalysisWindow};
use crate::error::{AnalysisError, AnalysisResult};
use crate::records::{
    ActivityRecord, ComfortRating, CorrelationStrength, EnvironmentReading, NoiseCategory,
    TemperatureRange,
};
use crate::stats::{self, MetricStats};

// ============================================================================
// RESULT TYPES
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct OverallEnvironmentStats {
    pub temperature: MetricStats,
    pub humidity: MetricStats,
    pub noise: MetricStats,
    pub total_readings: usize,
    pub days_analyzed: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionStats {
    pub kennel_section: String,
    pub temperature: MetricStats,
    pub humidity: MetricStats,
    pub noise: MetricStats,
    pub temp_comfort_rating: ComfortRating,
    pub humidity_comfort_rating: ComfortRating,
}

/// How many readings fell into each comfort/noise category.
#[derive(Debug, Clone, Serialize)]
pub struct ComfortSummary {
    pub temperature_comfort_distribution: BTreeMap<ComfortRating, usize>,
    pub humidity_comfort_distribution: BTreeMap<ComfortRating, usize>,
    pub noise_level_distribution: BTreeMap<NoiseCategory, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnvironmentAverages {
    pub overall: OverallEnvironmentStats,
    /// Per-section breakdown; empty when by_section was not requested.
    pub by_section: Vec<SectionStats>,
    pub comfort_summary: ComfortSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct HourlyAlertCount {
    pub date: NaiveDate,
    pub hour: u32,
    pub alert_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct NoiseAlertAnalysis {
    /// Readings above the alert threshold (critical ones included).
    pub total_alerts: usize,
    pub critical_alerts: usize,
    pub alerts_per_day: f64,
    pub hourly_alerts: Vec<HourlyAlertCount>,
    pub daily_breakdown: BTreeMap<NaiveDate, BTreeMap<NoiseCategory, usize>>,
    /// Hours whose average noise exceeds the alert threshold, loudest first.
    pub peak_noise_hours: Vec<(u32, f64)>,
    pub noise_distribution: BTreeMap<NoiseCategory, usize>,
    /// Most recent readings above the alert threshold, capped at 10.
    pub recent_alerts: Vec<EnvironmentReading>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemperatureRangeActivity {
    pub avg_activity_minutes: f64,
    pub avg_activity_count: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CorrelationAnalysis {
    pub temperature_activity_correlation: f64,
    pub temperature_count_correlation: f64,
    pub humidity_activity_correlation: f64,
    pub activity_by_temperature_range: BTreeMap<TemperatureRange, TemperatureRangeActivity>,
    /// Temperature bucket with the highest mean activity minutes.
    pub optimal_temperature_range: TemperatureRange,
    pub data_points: usize,
    pub correlation_strength: CorrelationStrength,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnvironmentalSummary {
    pub conditions: EnvironmentAverages,
    pub noise_monitoring: Option<NoiseAlertAnalysis>,
    pub overall_comfort_score: f64,
    pub temperature_activity_insights: Option<CorrelationAnalysis>,
}

// Hourly aggregation rows used by the correlation join.
struct HourlyEnvironment {
    temperature: f64,
    humidity: f64,
}

struct HourlyActivity {
    total_minutes: f64,
    count: usize,
}

// ============================================================================
// ANALYZER
// ============================================================================

pub struct EnvironmentalAnalyzer {
    readings: Vec<EnvironmentReading>,
    config: Arc<AnalysisConfig>,
}

impl EnvironmentalAnalyzer {
    /// Takes its own snapshot of the readings table.
    pub fn new(readings: &[EnvironmentReading], config: Arc<AnalysisConfig>) -> Self {
        EnvironmentalAnalyzer {
            readings: readings.to_vec(),
            config,
        }
    }

    fn in_window<'a>(
        &'a self,
        window: &AnalysisWindow,
    ) -> impl Iterator<Item = &'a EnvironmentReading> {
        let cutoff = window.cutoff();
        self.readings.iter().filter(move |r| r.timestamp >= cutoff)
    }

    /// Windowed mean/std/min/max for the three metrics, optionally broken
    /// down per kennel section with per-section comfort ratings.
    pub fn temperature_humidity_averages(
        &self,
        window: &AnalysisWindow,
        by_section: bool,
    ) -> AnalysisResult<EnvironmentAverages> {
        let recent: Vec<&EnvironmentReading> = self.in_window(window).collect();
        if recent.is_empty() {
            return Err(AnalysisError::insufficient(
                "no environment readings in the analysis window",
            ));
        }

        let overall = OverallEnvironmentStats {
            temperature: metric_stats(&recent, |r| r.temperature_f),
            humidity: metric_stats(&recent, |r| r.humidity_percent),
            noise: metric_stats(&recent, |r| r.noise_level_db),
            total_readings: recent.len(),
            days_analyzed: window.days,
        };

        let by_section = if by_section {
            let mut sections: BTreeMap<String, Vec<&EnvironmentReading>> = BTreeMap::new();
            for &reading in &recent {
                sections
                    .entry(reading.kennel_section.clone())
                    .or_default()
                    .push(reading);
            }
            sections
                .into_iter()
                .map(|(kennel_section, rows)| {
                    let temperature = metric_stats(&rows, |r| r.temperature_f);
                    let humidity = metric_stats(&rows, |r| r.humidity_percent);
                    SectionStats {
                        temp_comfort_rating: self.config.environment.temperature.rate(temperature.mean),
                        humidity_comfort_rating: self.config.environment.humidity.rate(humidity.mean),
                        noise: metric_stats(&rows, |r| r.noise_level_db),
                        temperature,
                        humidity,
                        kennel_section,
                    }
                })
                .collect()
        } else {
            Vec::new()
        };

        Ok(EnvironmentAverages {
            overall,
            by_section,
            comfort_summary: self.comfort_summary(&recent),
        })
    }

    /// Noise alert counts, per-day rate, peak hours, and category breakdowns.
    pub fn noise_alerts(&self, window: &AnalysisWindow) -> AnalysisResult<NoiseAlertAnalysis> {
        let recent: Vec<&EnvironmentReading> = self.in_window(window).collect();
        if recent.is_empty() {
            return Err(AnalysisError::insufficient(
                "no environment readings in the analysis window",
            ));
        }

        let noise = &self.config.environment.noise;
        let alert_threshold = noise.alert_threshold;
        let critical_threshold = noise.critical_threshold;

        let mut alerts: Vec<&EnvironmentReading> = recent
            .iter()
            .copied()
            .filter(|r| r.noise_level_db > alert_threshold)
            .collect();
        alerts.sort_by_key(|r| r.timestamp);

        // (date, hour) -> alert count
        let mut hourly_map: BTreeMap<(NaiveDate, u32), usize> = BTreeMap::new();
        for reading in &alerts {
            *hourly_map.entry((reading.date(), reading.hour())).or_insert(0) += 1;
        }
        let hourly_alerts = hourly_map
            .into_iter()
            .map(|((date, hour), alert_count)| HourlyAlertCount {
                date,
                hour,
                alert_count,
            })
            .collect();

        // date -> category -> count
        let mut daily_breakdown: BTreeMap<NaiveDate, BTreeMap<NoiseCategory, usize>> =
            BTreeMap::new();
        let mut noise_distribution: BTreeMap<NoiseCategory, usize> = BTreeMap::new();
        for reading in &recent {
            let category = noise.categorize(reading.noise_level_db);
            *daily_breakdown
                .entry(reading.date())
                .or_default()
                .entry(category)
                .or_insert(0) += 1;
            *noise_distribution.entry(category).or_insert(0) += 1;
        }

        // Hour-of-day average noise, restricted to hours above the threshold.
        let mut by_hour: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
        for reading in &recent {
            by_hour.entry(reading.hour()).or_default().push(reading.noise_level_db);
        }
        let mut peak_noise_hours: Vec<(u32, f64)> = by_hour
            .into_iter()
            .filter_map(|(hour, values)| stats::mean(&values).map(|m| (hour, stats::round2(m))))
            .filter(|(_, avg)| *avg > alert_threshold)
            .collect();
        peak_noise_hours
            .sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        let critical_alerts = recent
            .iter()
            .filter(|r| r.noise_level_db > critical_threshold)
            .count();

        let mut recent_alerts: Vec<EnvironmentReading> =
            alerts.iter().rev().take(10).map(|r| (*r).clone()).collect();
        recent_alerts.reverse();

        Ok(NoiseAlertAnalysis {
            total_alerts: alerts.len(),
            critical_alerts,
            alerts_per_day: stats::round2(alerts.len() as f64 / f64::from(window.days.max(1))),
            hourly_alerts,
            daily_breakdown,
            peak_noise_hours,
            noise_distribution,
            recent_alerts,
        })
    }

    /// Correlate hourly environment averages with hourly activity totals.
    ///
    /// Both sources are aggregated to (date, hour) and inner-joined; fewer
    /// than two joined rows is insufficient for a correlation.
    pub fn temperature_activity_correlation(
        &self,
        activities: &[ActivityRecord],
        window: &AnalysisWindow,
    ) -> AnalysisResult<CorrelationAnalysis> {
        let cutoff = window.cutoff();

        let mut env_hourly: BTreeMap<(NaiveDate, u32), Vec<&EnvironmentReading>> = BTreeMap::new();
        for reading in self.in_window(window) {
            env_hourly
                .entry((reading.date(), reading.hour()))
                .or_default()
                .push(reading);
        }

        let mut activity_hourly: BTreeMap<(NaiveDate, u32), HourlyActivity> = BTreeMap::new();
        for record in activities.iter().filter(|a| a.timestamp >= cutoff) {
            let entry = activity_hourly
                .entry((record.date(), record.hour()))
                .or_insert(HourlyActivity {
                    total_minutes: 0.0,
                    count: 0,
                });
            entry.total_minutes += record.duration_minutes;
            entry.count += 1;
        }

        // Inner join on (date, hour).
        let mut joined: Vec<(HourlyEnvironment, HourlyActivity)> = Vec::new();
        for (key, rows) in &env_hourly {
            if let Some(activity) = activity_hourly.get(key) {
                let temps: Vec<f64> = rows.iter().map(|r| r.temperature_f).collect();
                let hums: Vec<f64> = rows.iter().map(|r| r.humidity_percent).collect();
                joined.push((
                    HourlyEnvironment {
                        temperature: stats::mean(&temps).unwrap_or(0.0),
                        humidity: stats::mean(&hums).unwrap_or(0.0),
                    },
                    HourlyActivity {
                        total_minutes: activity.total_minutes,
                        count: activity.count,
                    },
                ));
            }
        }

        if joined.len() < 2 {
            return Err(AnalysisError::insufficient(
                "no matching environment/activity hours for correlation analysis",
            ));
        }

        let temps: Vec<f64> = joined.iter().map(|(e, _)| e.temperature).collect();
        let hums: Vec<f64> = joined.iter().map(|(e, _)| e.humidity).collect();
        let minutes: Vec<f64> = joined.iter().map(|(_, a)| a.total_minutes).collect();
        let counts: Vec<f64> = joined.iter().map(|(_, a)| a.count as f64).collect();

        // Zero-variance series make the coefficient undefined; report 0.0.
        let corr = |x: &[f64], y: &[f64]| stats::round3(stats::pearson(x, y).unwrap_or(0.0));
        let temp_activity = corr(&temps, &minutes);

        // Mean activity per fixed temperature bucket.
        let mut by_range: BTreeMap<TemperatureRange, (Vec<f64>, Vec<f64>)> = BTreeMap::new();
        for (env, activity) in &joined {
            let entry = by_range
                .entry(TemperatureRange::categorize(env.temperature))
                .or_default();
            entry.0.push(activity.total_minutes);
            entry.1.push(activity.count as f64);
        }

        let activity_by_temperature_range: BTreeMap<TemperatureRange, TemperatureRangeActivity> =
            by_range
                .iter()
                .map(|(range, (mins, cnts))| {
                    (
                        *range,
                        TemperatureRangeActivity {
                            avg_activity_minutes: stats::round2(stats::mean(mins).unwrap_or(0.0)),
                            avg_activity_count: stats::round2(stats::mean(cnts).unwrap_or(0.0)),
                        },
                    )
                })
                .collect();

        // Ties keep the first bucket in range order (cold to hot).
        let mut optimal_temperature_range = TemperatureRange::Optimal;
        let mut best_minutes = f64::NEG_INFINITY;
        for (range, activity) in &activity_by_temperature_range {
            if activity.avg_activity_minutes > best_minutes {
                best_minutes = activity.avg_activity_minutes;
                optimal_temperature_range = *range;
            }
        }

        Ok(CorrelationAnalysis {
            temperature_activity_correlation: temp_activity,
            temperature_count_correlation: corr(&temps, &counts),
            humidity_activity_correlation: corr(&hums, &minutes),
            activity_by_temperature_range,
            optimal_temperature_range,
            data_points: joined.len(),
            correlation_strength: CorrelationStrength::classify(temp_activity),
        })
    }

    /// Composite comfort score: three binary 100/50 sub-scores (mean inside
    /// the optimal band or not) averaged and rounded to one decimal.
    pub fn comfort_score(&self, overall: &OverallEnvironmentStats) -> f64 {
        let env = &self.config.environment;
        let temp_score = if env.temperature.is_optimal(overall.temperature.mean) {
            100.0
        } else {
            50.0
        };
        let humidity_score = if env.humidity.is_optimal(overall.humidity.mean) {
            100.0
        } else {
            50.0
        };
        let noise_score = if overall.noise.mean <= env.noise.normal_max {
            100.0
        } else {
            50.0
        };

        stats::round1((temp_score + humidity_score + noise_score) / 3.0)
    }

    /// Full environmental picture: conditions at the medium-term window,
    /// noise at the short-term window, comfort score, and (when an activity
    /// table is supplied and joins) correlation insights.
    pub fn environmental_summary(
        &self,
        activities: Option<&[ActivityRecord]>,
        reference: NaiveDateTime,
    ) -> AnalysisResult<EnvironmentalSummary> {
        let conditions =
            self.temperature_humidity_averages(&self.config.medium_window(reference), true)?;
        let noise_monitoring = self.noise_alerts(&self.config.short_window(reference)).ok();
        let overall_comfort_score = self.comfort_score(&conditions.overall);

        let temperature_activity_insights = activities.and_then(|records| {
            self.temperature_activity_correlation(records, &self.config.medium_window(reference))
                .ok()
        });

        Ok(EnvironmentalSummary {
            conditions,
            noise_monitoring,
            overall_comfort_score,
            temperature_activity_insights,
        })
    }

    fn comfort_summary(&self, readings: &[&EnvironmentReading]) -> ComfortSummary {
        let env = &self.config.environment;
        let mut temperature = BTreeMap::new();
        let mut humidity = BTreeMap::new();
        let mut noise = BTreeMap::new();

        for reading in readings {
            *temperature
                .entry(env.temperature.rate(reading.temperature_f))
                .or_insert(0) += 1;
            *humidity
                .entry(env.humidity.rate(reading.humidity_percent))
                .or_insert(0) += 1;
            *noise
                .entry(env.noise.categorize(reading.noise_level_db))
                .or_insert(0) += 1;
        }

        ComfortSummary {
            temperature_comfort_distribution: temperature,
            humidity_comfort_distribution: humidity,
            noise_level_distribution: noise,
        }
    }
}

fn metric_stats(rows: &[&EnvironmentReading], field: impl Fn(&EnvironmentReading) -> f64) -> MetricStats {
    let values: Vec<f64> = rows.iter().map(|&r| field(r)).collect();
    MetricStats::from_values(&values).unwrap_or(MetricStats {
        mean: 0.0,
        std: 0.0,
        min: 0.0,
        max: 0.0,
    })
}

// ============================================================================
// TESTS
// ============================================================================
