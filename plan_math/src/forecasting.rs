//! Trend estimation for demand series
//!
//! Contains:
//! - Least-squares slope over an evenly spaced series
//! - Percentage trend between a recent and an older window

use crate::{MathError, Result};

/// Least-squares linear fit over `values` indexed `0..n`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    /// Change per period
    pub slope: f64,
    /// Fitted value at index 0
    pub intercept: f64,
}

impl LinearFit {
    /// Fit a line through the series; requires at least two points
    pub fn fit(values: &[f64]) -> Result<Self> {
        if values.len() < 2 {
            return Err(MathError::InsufficientData(format!(
                "Need at least 2 points for a linear fit, have {}",
                values.len()
            )));
        }

        let n = values.len() as f64;
        let x_mean = (n - 1.0) / 2.0;
        let y_mean = values.iter().sum::<f64>() / n;

        let mut numerator = 0.0;
        let mut denominator = 0.0;
        for (i, &y) in values.iter().enumerate() {
            let x = i as f64;
            numerator += (x - x_mean) * (y - y_mean);
            denominator += (x - x_mean) * (x - x_mean);
        }

        if denominator.abs() < 1e-10 {
            return Err(MathError::CalculationError(
                "Cannot calculate slope: x values are too similar".to_string(),
            ));
        }

        let slope = numerator / denominator;
        Ok(Self {
            slope,
            intercept: y_mean - slope * x_mean,
        })
    }
}

/// Slope of the least-squares line, `None` below two points
pub fn linear_slope(values: &[f64]) -> Option<f64> {
    LinearFit::fit(values).ok().map(|fit| fit.slope)
}

/// Percentage change of `recent` over `older`, relative to `|older|`
///
/// Zero when the older mean is zero; a trend off a zero base is undefined.
pub fn trend_pct(recent: f64, older: f64) -> f64 {
    if older == 0.0 || !older.is_finite() || !recent.is_finite() {
        0.0
    } else {
        (recent - older) / older.abs() * 100.0
    }
}
