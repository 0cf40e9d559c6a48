// Descriptive statistics helpers shared by the analyzers.
//
// Standard deviation uses the sample (n-1) denominator, matching the
// reporting tool this pipeline feeds. Pearson returns None when a coefficient
// is undefined (fewer than two points or zero variance); callers decide how
// to surface that.

use serde::{Deserialize, Serialize};

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n-1). None for fewer than two values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let sum_sq: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((sum_sq / (values.len() - 1) as f64).sqrt())
}

pub fn min(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::min)
}

pub fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

/// Pearson correlation coefficient between two equal-length series.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let mx = mean(x)?;
    let my = mean(y)?;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (&xi, &yi) in x.iter().zip(y.iter()) {
        cov += (xi - mx) * (yi - my);
        var_x += (xi - mx).powi(2);
        var_y += (yi - my).powi(2);
    }

    let denom = (var_x * var_y).sqrt();
    if denom == 0.0 {
        return None;
    }
    Some(cov / denom)
}

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// mean/std/min/max bundle, rounded to reporting precision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricStats {
    pub mean: f64,
    /// 0.0 when only a single value was observed.
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

impl MetricStats {
    pub fn from_values(values: &[f64]) -> Option<MetricStats> {
        Some(MetricStats {
            mean: round2(mean(values)?),
            std: round2(sample_std(values).unwrap_or(0.0)),
            min: round2(min(values)?),
            max: round2(max(values)?),
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
