//! Anomaly replacement followed by exponential smoothing

use crate::anomaly::{AnomalyReport, SmoothingPreset};
use crate::data::{DemandSeries, Granularity};
use crate::error::{ForecastError, Result};
use crate::models::exponential_smoothing::ExponentialSmoothing;
use crate::models::{ForecastModel, TrainedForecastModel};
use chrono::NaiveDate;
use plan_math::stats;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// How a flagged observation is replaced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplacementMethod {
    /// Median of all non-anomalous observations
    #[default]
    Median,
    /// Mean of the nearest non-anomalous observation on each side
    Neighbor,
}

impl fmt::Display for ReplacementMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplacementMethod::Median => write!(f, "median"),
            ReplacementMethod::Neighbor => write!(f, "neighbor"),
        }
    }
}

impl FromStr for ReplacementMethod {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "median" => Ok(ReplacementMethod::Median),
            "neighbor" | "neighbour" => Ok(ReplacementMethod::Neighbor),
            other => Err(ForecastError::InvalidParameter(format!(
                "Unknown replacement method: {}",
                other
            ))),
        }
    }
}

/// One period of the cleaned signal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmoothedPoint {
    pub date: NaiveDate,
    /// Quantity after anomaly replacement
    pub cleaned_quantity: f64,
    /// Exponentially smoothed level at this period
    pub exp_smoothed_value: f64,
}

/// Cleaned and smoothed demand for one SKU
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmoothedSeries {
    pub sku: String,
    pub granularity: Granularity,
    pub alpha: f64,
    pub replaced_count: usize,
    pub points: Vec<SmoothedPoint>,
}

impl SmoothedSeries {
    pub fn cleaned(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.cleaned_quantity).collect()
    }

    pub fn smoothed(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.exp_smoothed_value).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Replace flagged observations, leaving the rest untouched
///
/// If every observation is flagged there is nothing robust to replace with,
/// so the values come back unchanged.
pub fn replace_anomalies(values: &[f64], flags: &[bool], method: ReplacementMethod) -> Vec<f64> {
    let normal: Vec<f64> = values
        .iter()
        .zip(flags)
        .filter(|(_, &flagged)| !flagged)
        .map(|(&v, _)| v)
        .collect();

    let median = match stats::median(&normal) {
        Some(m) => m,
        None => return values.to_vec(),
    };

    values
        .iter()
        .enumerate()
        .map(|(i, &value)| {
            if !flags.get(i).copied().unwrap_or(false) {
                return value;
            }
            match method {
                ReplacementMethod::Median => median,
                ReplacementMethod::Neighbor => neighbor_estimate(values, flags, i).unwrap_or(median),
            }
        })
        .collect()
}

fn neighbor_estimate(values: &[f64], flags: &[bool], index: usize) -> Option<f64> {
    let before = (0..index).rev().find(|&j| !flags[j]).map(|j| values[j]);
    let after = (index + 1..values.len()).find(|&j| !flags[j]).map(|j| values[j]);

    match (before, after) {
        (Some(b), Some(a)) => Some((b + a) / 2.0),
        (Some(v), None) | (None, Some(v)) => Some(v),
        (None, None) => None,
    }
}

/// Cleans a series using an anomaly report, then smooths it
#[derive(Debug, Clone, Copy)]
pub struct SignalSmoother {
    preset: SmoothingPreset,
    replacement: ReplacementMethod,
}

impl SignalSmoother {
    pub fn new(preset: SmoothingPreset) -> Self {
        Self {
            preset,
            replacement: ReplacementMethod::default(),
        }
    }

    pub fn with_replacement(mut self, replacement: ReplacementMethod) -> Self {
        self.replacement = replacement;
        self
    }

    /// Produce the smoothed series for `series` given its detection report
    pub fn smooth(&self, series: &DemandSeries, report: &AnomalyReport) -> Result<SmoothedSeries> {
        if report.flags.len() != series.len() {
            return Err(ForecastError::ValidationError(format!(
                "Anomaly report for {} has {} flags for {} observations",
                series.sku(),
                report.flags.len(),
                series.len()
            )));
        }

        let alpha = self.preset.alpha();
        let flags: Vec<bool> = report.flags.iter().map(|f| f.is_anomaly).collect();
        let cleaned = replace_anomalies(&series.quantities(), &flags, self.replacement);

        let smoothed = if cleaned.is_empty() {
            Vec::new()
        } else {
            let trained = ExponentialSmoothing::new(alpha)?.train(&cleaned)?;
            trained.fitted().to_vec()
        };

        debug!(
            sku = series.sku(),
            replaced = report.anomaly_count,
            alpha,
            "Smoothed demand signal"
        );

        Ok(SmoothedSeries {
            sku: series.sku().to_string(),
            granularity: series.granularity(),
            alpha,
            replaced_count: report.anomaly_count,
            points: series
                .points()
                .iter()
                .zip(cleaned.into_iter().zip(smoothed))
                .map(|(p, (cleaned_quantity, exp_smoothed_value))| SmoothedPoint {
                    date: p.date,
                    cleaned_quantity,
                    exp_smoothed_value,
                })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anomaly::AnomalyDetector;
    use chrono::Duration;

    fn daily(values: &[f64]) -> DemandSeries {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        DemandSeries::from_pairs(
            "SKU-S",
            Granularity::Daily,
            values
                .iter()
                .enumerate()
                .map(|(i, &v)| (start + Duration::days(i as i64), v)),
        )
        .unwrap()
    }

    #[test]
    fn test_median_replacement() {
        let cleaned = replace_anomalies(
            &[10.0, 12.0, 500.0, 11.0],
            &[false, false, true, false],
            ReplacementMethod::Median,
        );
        assert_eq!(cleaned, vec![10.0, 12.0, 11.0, 11.0]);
    }

    #[test]
    fn test_neighbor_replacement() {
        let values = [10.0, 500.0, 20.0, 400.0];
        let flags = [false, true, false, true];
        let cleaned = replace_anomalies(&values, &flags, ReplacementMethod::Neighbor);
        // interior uses both sides, the trailing point only its left neighbor
        assert_eq!(cleaned, vec![10.0, 15.0, 20.0, 20.0]);
    }

    #[test]
    fn test_all_flagged_left_unchanged() {
        let cleaned = replace_anomalies(&[1.0, 2.0], &[true, true], ReplacementMethod::Median);
        assert_eq!(cleaned, vec![1.0, 2.0]);
    }

    #[test]
    fn test_smoother_replaces_spike_before_smoothing() {
        let mut values = vec![10.0; 40];
        values[20] = 500.0;
        let series = daily(&values);
        let report = AnomalyDetector::new(SmoothingPreset::Balanced).detect(&series);
        let smoothed = SignalSmoother::new(SmoothingPreset::Balanced)
            .smooth(&series, &report)
            .unwrap();

        assert_eq!(smoothed.alpha, 0.3);
        assert_eq!(smoothed.replaced_count, 1);
        assert!(smoothed.cleaned().iter().all(|&v| v == 10.0));
        assert!(smoothed.smoothed().iter().all(|&v| (v - 10.0).abs() < 1e-9));
    }

    #[test]
    fn test_skipped_detection_passes_values_through() {
        let series = daily(&[5.0, 15.0, 5.0]);
        let report = AnomalyDetector::new(SmoothingPreset::Aggressive).detect(&series);
        let smoothed = SignalSmoother::new(SmoothingPreset::Aggressive)
            .smooth(&series, &report)
            .unwrap();
        assert_eq!(smoothed.cleaned(), vec![5.0, 15.0, 5.0]);
        assert_eq!(smoothed.smoothed(), vec![5.0, 10.0, 7.5]);
    }
}
