//! Metrics for evaluating forecast performance

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};

/// Forecast accuracy metrics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccuracyMetrics {
    /// Mean Absolute Percentage Error
    pub mape: f64,
    /// Mean Absolute Error
    pub mae: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Number of held-out periods compared
    pub test_periods: usize,
}

/// Calculate accuracy metrics for a forecast vs actual values
///
/// MAPE averages over non-zero actuals only. When every actual is zero the
/// MAPE is 0 for an all-zero forecast and 100 otherwise.
pub fn forecast_accuracy(forecast: &[f64], actual: &[f64]) -> Result<AccuracyMetrics> {
    if forecast.len() != actual.len() || forecast.is_empty() {
        return Err(ForecastError::ValidationError(
            "Forecast and actual values must have the same non-zero length".to_string(),
        ));
    }

    let n = forecast.len() as f64;

    // Calculate errors
    let errors: Vec<f64> = forecast
        .iter()
        .zip(actual.iter())
        .map(|(&f, &a)| a - f)
        .collect();

    let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;
    let rmse = (errors.iter().map(|e| e.powi(2)).sum::<f64>() / n).sqrt();

    let percentage_errors: Vec<f64> = actual
        .iter()
        .zip(errors.iter())
        .filter(|(&a, _)| a != 0.0)
        .map(|(&a, &e)| e.abs() / a.abs() * 100.0)
        .collect();

    let mape = if percentage_errors.is_empty() {
        if forecast.iter().all(|&f| f == 0.0) {
            0.0
        } else {
            100.0
        }
    } else {
        percentage_errors.iter().sum::<f64>() / percentage_errors.len() as f64
    };

    Ok(AccuracyMetrics {
        mape,
        mae,
        rmse,
        test_periods: forecast.len(),
    })
}

/// Signed percentage error `(actual - forecast) / actual * 100`
///
/// Positive means demand exceeded the forecast. Against a zero actual any
/// positive forecast counts as a 100% miss.
pub fn percentage_error(forecast: f64, actual: f64) -> f64 {
    if actual == 0.0 {
        if forecast > 0.0 {
            100.0
        } else {
            0.0
        }
    } else {
        (actual - forecast) / actual * 100.0
    }
}

impl std::fmt::Display for AccuracyMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Forecast Accuracy Metrics ({} periods):", self.test_periods)?;
        writeln!(f, "  MAPE:  {:.2}%", self.mape)?;
        writeln!(f, "  MAE:   {:.4}", self.mae)?;
        writeln!(f, "  RMSE:  {:.4}", self.rmse)?;
        Ok(())
    }
}
