//! Spread measures for forecast bands
//!
//! Contains:
//! - Residual standard deviation between observations and a fitted path

use crate::stats;
use crate::{MathError, Result};

/// Sample standard deviation of `actual - fitted`
///
/// Both slices must have the same length. Returns `None` when fewer than two
/// residuals exist.
pub fn residual_std(actual: &[f64], fitted: &[f64]) -> Result<Option<f64>> {
    if actual.len() != fitted.len() {
        return Err(MathError::InvalidInput(format!(
            "Residual inputs differ in length: {} vs {}",
            actual.len(),
            fitted.len()
        )));
    }

    let residuals: Vec<f64> = actual
        .iter()
        .zip(fitted)
        .map(|(a, f)| a - f)
        .collect();

    Ok(stats::sample_std(&residuals))
}
