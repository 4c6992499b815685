//! Holdout backtesting and forecast confidence scoring

use crate::data::Granularity;
use crate::error::Result;
use crate::metrics::{forecast_accuracy, AccuracyMetrics};
use crate::models::moving_average::MovingAverage;
use crate::models::{ForecastMethod, ForecastModel, TrainedForecastModel};
use crate::utils::train_test_split;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Share of history used for training
pub const TRAIN_RATIO: f64 = 0.8;

/// Minimum daily observations for a backtest
pub const MIN_BACKTEST_DAILY: usize = 60;

/// Minimum monthly observations for a backtest
pub const MIN_BACKTEST_MONTHLY: usize = 6;

/// Backtest a moving-average method on an 80/20 split
///
/// The moving average of the training part is a flat forecast compared
/// against every held-out actual. Returns `None` when the history is too
/// short to hold anything out meaningfully.
pub fn backtest(
    values: &[f64],
    granularity: Granularity,
    method: ForecastMethod,
) -> Result<Option<AccuracyMetrics>> {
    let minimum = match granularity {
        Granularity::Daily => MIN_BACKTEST_DAILY,
        Granularity::Monthly => MIN_BACKTEST_MONTHLY,
    };
    if values.len() < minimum {
        return Ok(None);
    }

    let (train, test) = train_test_split(values, TRAIN_RATIO)?;
    if train.is_empty() || test.is_empty() {
        return Ok(None);
    }

    let trained = MovingAverage::for_method(method).train(train)?;
    let forecast = trained.forecast(test.len())?;
    forecast_accuracy(forecast.values(), test).map(Some)
}

/// Confidence band of a forecast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    VeryLow,
    Low,
    Medium,
    High,
}

impl ConfidenceLevel {
    /// Band for a 0-100 score
    pub fn from_score(score: u8) -> Self {
        match score {
            70..=u8::MAX => ConfidenceLevel::High,
            50..=69 => ConfidenceLevel::Medium,
            30..=49 => ConfidenceLevel::Low,
            _ => ConfidenceLevel::VeryLow,
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfidenceLevel::High => write!(f, "High"),
            ConfidenceLevel::Medium => write!(f, "Medium"),
            ConfidenceLevel::Low => write!(f, "Low"),
            ConfidenceLevel::VeryLow => write!(f, "Very Low"),
        }
    }
}

/// Score and band for one forecast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Confidence {
    /// 0 to 100
    pub score: u8,
    pub level: ConfidenceLevel,
}

/// Deduction-based confidence scoring
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfidenceScorer;

impl ConfidenceScorer {
    /// Score a forecast from its CV (percent), history length in days and
    /// backtest MAPE (percent)
    ///
    /// Monthly histories are passed as day equivalents (periods x 30).
    pub fn score(&self, cv: Option<f64>, history_days: f64, mape: Option<f64>) -> Confidence {
        let mut score: i32 = 100;

        if let Some(cv) = cv {
            if cv > 100.0 {
                score -= 30;
            } else if cv >= 50.0 {
                score -= 15;
            }
        }

        if history_days < 60.0 {
            score -= 30;
        } else if history_days < 90.0 {
            score -= 20;
        }

        if let Some(mape) = mape {
            if mape > 50.0 {
                score -= 25;
            } else if mape >= 30.0 {
                score -= 15;
            }
        }

        let score = score.clamp(0, 100) as u8;
        Confidence {
            score,
            level: ConfidenceLevel::from_score(score),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rstest::rstest;

    #[test]
    fn test_backtest_constant_series_is_perfect() {
        let metrics = backtest(&[10.0; 100], Granularity::Daily, ForecastMethod::Ma90)
            .unwrap()
            .unwrap();
        assert_eq!(metrics.test_periods, 20);
        assert_abs_diff_eq!(metrics.mape, 0.0);
        assert_abs_diff_eq!(metrics.rmse, 0.0);
    }

    #[test]
    fn test_backtest_requires_minimum_history() {
        assert!(backtest(&[10.0; 59], Granularity::Daily, ForecastMethod::Ma30)
            .unwrap()
            .is_none());
        assert!(backtest(&[10.0; 5], Granularity::Monthly, ForecastMethod::Ma3)
            .unwrap()
            .is_none());
        assert!(backtest(&[10.0; 6], Granularity::Monthly, ForecastMethod::Ma6)
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_backtest_split_floors() {
        // 63 * 0.8 = 50.4 -> 50 train, 13 test
        let metrics = backtest(&[4.0; 63], Granularity::Daily, ForecastMethod::Ma60)
            .unwrap()
            .unwrap();
        assert_eq!(metrics.test_periods, 13);
    }

    #[rstest]
    #[case(Some(10.0), 120.0, Some(5.0), 100, ConfidenceLevel::High)]
    #[case(Some(120.0), 120.0, None, 70, ConfidenceLevel::High)]
    #[case(Some(60.0), 75.0, Some(40.0), 50, ConfidenceLevel::Medium)]
    #[case(Some(150.0), 30.0, Some(80.0), 15, ConfidenceLevel::VeryLow)]
    #[case(None, 45.0, None, 70, ConfidenceLevel::High)]
    #[case(Some(50.0), 89.0, Some(30.0), 50, ConfidenceLevel::Medium)]
    #[case(Some(100.0), 59.0, None, 55, ConfidenceLevel::Medium)]
    #[case(Some(101.0), 60.0, Some(50.0), 35, ConfidenceLevel::Low)]
    fn test_confidence_deductions(
        #[case] cv: Option<f64>,
        #[case] history_days: f64,
        #[case] mape: Option<f64>,
        #[case] score: u8,
        #[case] level: ConfidenceLevel,
    ) {
        let confidence = ConfidenceScorer.score(cv, history_days, mape);
        assert_eq!(confidence.score, score);
        assert_eq!(confidence.level, level);
    }

    #[test]
    fn test_score_stays_in_range() {
        let worst = ConfidenceScorer.score(Some(f64::MAX), 0.0, Some(f64::MAX));
        assert!(worst.score <= 100);
        assert_eq!(worst.score, 15);
    }
}
