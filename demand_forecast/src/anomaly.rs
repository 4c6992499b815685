//! Z-score anomaly detection over a demand series

use crate::data::DemandSeries;
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::error::{ForecastError, Result};
use plan_math::stats;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// Below this many observations detection is skipped
pub const MIN_DETECTION_SAMPLE_SIZE: usize = 30;

/// CV (percent) above which demand is treated as intermittent
pub const INTERMITTENT_CV_THRESHOLD: f64 = 150.0;

/// Z-threshold forced onto intermittent series
pub const INTERMITTENT_Z_THRESHOLD: f64 = 4.0;

/// Share of flagged observations (percent) that triggers a review warning
pub const MAX_ANOMALY_PCT: f64 = 20.0;

/// Sensitivity preset shared by the detector and the smoother
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmoothingPreset {
    /// Flags the most points, smooths the least
    Conservative,
    #[default]
    Balanced,
    /// Flags only extreme points, follows recent demand closely
    Aggressive,
}

impl SmoothingPreset {
    /// Z-score above which an observation is anomalous
    pub fn z_threshold(&self) -> f64 {
        match self {
            SmoothingPreset::Conservative => 1.5,
            SmoothingPreset::Balanced => 2.0,
            SmoothingPreset::Aggressive => 3.0,
        }
    }

    /// Exponential smoothing factor
    pub fn alpha(&self) -> f64 {
        match self {
            SmoothingPreset::Conservative => 0.1,
            SmoothingPreset::Balanced => 0.3,
            SmoothingPreset::Aggressive => 0.5,
        }
    }

    pub fn all() -> [SmoothingPreset; 3] {
        [
            SmoothingPreset::Conservative,
            SmoothingPreset::Balanced,
            SmoothingPreset::Aggressive,
        ]
    }
}

impl fmt::Display for SmoothingPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SmoothingPreset::Conservative => write!(f, "conservative"),
            SmoothingPreset::Balanced => write!(f, "balanced"),
            SmoothingPreset::Aggressive => write!(f, "aggressive"),
        }
    }
}

impl FromStr for SmoothingPreset {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "conservative" => Ok(SmoothingPreset::Conservative),
            "balanced" => Ok(SmoothingPreset::Balanced),
            "aggressive" => Ok(SmoothingPreset::Aggressive),
            other => Err(ForecastError::InvalidParameter(format!(
                "Unknown smoothing preset: {}",
                other
            ))),
        }
    }
}

/// Per-observation detection outcome
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnomalyFlag {
    pub is_anomaly: bool,
    pub z_score: f64,
}

/// Detection result for one series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyReport {
    /// One flag per observation, in series order
    pub flags: Vec<AnomalyFlag>,
    pub anomaly_count: usize,
    /// Flagged share of observations, in percent
    pub anomaly_pct: f64,
    /// Threshold actually used (preset or intermittent override)
    pub applied_z_threshold: f64,
    pub is_intermittent: bool,
    pub skipped_detection: bool,
    /// Coefficient of variation in percent, when defined
    pub cv: Option<f64>,
    pub diagnostics: Vec<Diagnostic>,
}

impl AnomalyReport {
    fn unflagged(len: usize, threshold: f64) -> Self {
        Self {
            flags: vec![
                AnomalyFlag {
                    is_anomaly: false,
                    z_score: 0.0,
                };
                len
            ],
            anomaly_count: 0,
            anomaly_pct: 0.0,
            applied_z_threshold: threshold,
            is_intermittent: false,
            skipped_detection: false,
            cv: None,
            diagnostics: Vec::new(),
        }
    }

    /// Indices of flagged observations
    pub fn anomaly_indices(&self) -> Vec<usize> {
        self.flags
            .iter()
            .enumerate()
            .filter(|(_, f)| f.is_anomaly)
            .map(|(i, _)| i)
            .collect()
    }
}

/// Flags statistically abnormal observations with an adaptive Z-threshold
#[derive(Debug, Clone, Copy)]
pub struct AnomalyDetector {
    preset: SmoothingPreset,
    check_intermittent: bool,
}

impl AnomalyDetector {
    pub fn new(preset: SmoothingPreset) -> Self {
        Self {
            preset,
            check_intermittent: true,
        }
    }

    /// Enable or disable the intermittent-demand threshold override
    pub fn with_intermittent_check(mut self, enabled: bool) -> Self {
        self.check_intermittent = enabled;
        self
    }

    pub fn preset(&self) -> SmoothingPreset {
        self.preset
    }

    /// Run detection over `series`
    pub fn detect(&self, series: &DemandSeries) -> AnomalyReport {
        let sku = series.sku();
        let values = series.quantities();
        let n = values.len();
        let mut report = AnomalyReport::unflagged(n, self.preset.z_threshold());

        if n < MIN_DETECTION_SAMPLE_SIZE {
            report.skipped_detection = true;
            report.diagnostics.push(Diagnostic::new(
                sku,
                DiagnosticKind::InsufficientHistory,
                format!(
                    "{} observations, anomaly detection needs {}; detection skipped",
                    n, MIN_DETECTION_SAMPLE_SIZE
                ),
            ));
            debug!(sku, observations = n, "Skipping anomaly detection");
            return report;
        }

        // n >= 30 here so both are defined
        let mean = stats::mean(&values).unwrap_or(0.0);
        let std = stats::sample_std_or_zero(&values);

        if mean > 0.0 {
            report.cv = Some(std / mean * 100.0);
        }

        if stats::is_constant(&values) || std == 0.0 {
            report.diagnostics.push(Diagnostic::new(
                sku,
                DiagnosticKind::ZeroVariance,
                "demand is constant; no observation can be anomalous",
            ));
            return report;
        }

        let mut threshold = self.preset.z_threshold();
        if let Some(cv) = report.cv {
            if self.check_intermittent && cv > INTERMITTENT_CV_THRESHOLD {
                threshold = INTERMITTENT_Z_THRESHOLD;
                report.is_intermittent = true;
                report.diagnostics.push(Diagnostic::new(
                    sku,
                    DiagnosticKind::IntermittentDemand,
                    format!(
                        "CV {:.1}% exceeds {:.0}%; Z-threshold raised to {:.1}",
                        cv, INTERMITTENT_CV_THRESHOLD, INTERMITTENT_Z_THRESHOLD
                    ),
                ));
            }
        }
        report.applied_z_threshold = threshold;

        for (flag, value) in report.flags.iter_mut().zip(&values) {
            let z = (value - mean) / std;
            flag.z_score = z;
            flag.is_anomaly = z.abs() > threshold;
        }

        report.anomaly_count = report.flags.iter().filter(|f| f.is_anomaly).count();
        report.anomaly_pct = report.anomaly_count as f64 / n as f64 * 100.0;

        if report.anomaly_pct > MAX_ANOMALY_PCT {
            warn!(
                sku,
                anomaly_pct = report.anomaly_pct,
                "High anomaly rate, manual review recommended"
            );
            report.diagnostics.push(Diagnostic::new(
                sku,
                DiagnosticKind::HighAnomalyRate,
                format!(
                    "{:.1}% of observations flagged (over {:.0}%); manual review recommended",
                    report.anomaly_pct, MAX_ANOMALY_PCT
                ),
            ));
        }

        debug!(
            sku,
            anomalies = report.anomaly_count,
            threshold,
            intermittent = report.is_intermittent,
            "Anomaly detection complete"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Granularity;
    use crate::diagnostics::has_kind;
    use chrono::{Duration, NaiveDate};
    use rstest::rstest;

    fn daily(values: &[f64]) -> DemandSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        DemandSeries::from_pairs(
            "SKU-T",
            Granularity::Daily,
            values
                .iter()
                .enumerate()
                .map(|(i, &v)| (start + Duration::days(i as i64), v)),
        )
        .unwrap()
    }

    #[rstest]
    #[case(SmoothingPreset::Conservative, 1.5, 0.1)]
    #[case(SmoothingPreset::Balanced, 2.0, 0.3)]
    #[case(SmoothingPreset::Aggressive, 3.0, 0.5)]
    fn test_preset_parameters(
        #[case] preset: SmoothingPreset,
        #[case] z: f64,
        #[case] alpha: f64,
    ) {
        assert_eq!(preset.z_threshold(), z);
        assert_eq!(preset.alpha(), alpha);
        assert_eq!(preset.to_string().parse::<SmoothingPreset>().unwrap(), preset);
    }

    #[test]
    fn test_spike_is_flagged() {
        let mut values: Vec<f64> = (0..40).map(|i| if i % 2 == 0 { 8.0 } else { 12.0 }).collect();
        values[20] = 30.0;
        let report = AnomalyDetector::new(SmoothingPreset::Balanced).detect(&daily(&values));

        assert!(!report.skipped_detection);
        assert!(!report.is_intermittent);
        assert_eq!(report.anomaly_count, 1);
        assert_eq!(report.anomaly_indices(), vec![20]);
        assert_eq!(report.applied_z_threshold, 2.0);
    }

    #[test]
    fn test_single_huge_spike_still_flagged_under_override() {
        // one 500 among 39 tens pushes CV past 150%
        let mut values = vec![10.0; 40];
        values[20] = 500.0;
        let report = AnomalyDetector::new(SmoothingPreset::Balanced).detect(&daily(&values));

        assert!(report.is_intermittent);
        assert_eq!(report.applied_z_threshold, INTERMITTENT_Z_THRESHOLD);
        assert_eq!(report.anomaly_indices(), vec![20]);
    }

    #[test]
    fn test_short_series_skips_detection() {
        let mut values = vec![10.0; 29];
        values[3] = 1000.0;
        let report = AnomalyDetector::new(SmoothingPreset::Conservative).detect(&daily(&values));

        assert!(report.skipped_detection);
        assert_eq!(report.anomaly_count, 0);
        assert_eq!(report.flags.len(), 29);
        assert!(has_kind(&report.diagnostics, DiagnosticKind::InsufficientHistory));
    }

    #[test]
    fn test_constant_series_reports_zero_variance() {
        let report = AnomalyDetector::new(SmoothingPreset::Balanced).detect(&daily(&[0.0; 35]));
        assert_eq!(report.anomaly_count, 0);
        assert!(report.cv.is_none());
        assert!(has_kind(&report.diagnostics, DiagnosticKind::ZeroVariance));
    }

    #[test]
    fn test_constant_fractional_series_is_not_scored() {
        // rounding in the mean leaves a tiny nonzero spread for 0.1
        let report = AnomalyDetector::new(SmoothingPreset::Aggressive).detect(&daily(&[0.1; 37]));
        assert_eq!(report.anomaly_count, 0);
        assert!(report.flags.iter().all(|flag| !flag.is_anomaly && flag.z_score == 0.0));
        assert!(has_kind(&report.diagnostics, DiagnosticKind::ZeroVariance));
    }

    #[test]
    fn test_intermittent_override_can_be_disabled() {
        let mut values = vec![0.0; 40];
        values[5] = 50.0;
        values[25] = 60.0;

        let on = AnomalyDetector::new(SmoothingPreset::Conservative).detect(&daily(&values));
        assert!(on.is_intermittent);
        assert_eq!(on.applied_z_threshold, INTERMITTENT_Z_THRESHOLD);

        let off = AnomalyDetector::new(SmoothingPreset::Conservative)
            .with_intermittent_check(false)
            .detect(&daily(&values));
        assert!(!off.is_intermittent);
        assert_eq!(off.applied_z_threshold, 1.5);
        assert_eq!(off.anomaly_count, 2);
    }
}
