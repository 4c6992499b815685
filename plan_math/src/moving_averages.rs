//! Moving average calculation implementations
//!
//! Contains the averaging primitives used by the demand forecaster:
//! - Simple Moving Average (incremental, fixed window)
//! - Trailing means over a whole series (partial windows at the start)
//! - Simple exponential smoothing path

use crate::{MathError, Result};
use std::collections::VecDeque;

/// Simple Moving Average (SMA) implementation
#[derive(Debug, Clone)]
pub struct SimpleMovingAverage {
    period: usize,
    values: VecDeque<f64>,
    sum: f64,
}

impl SimpleMovingAverage {
    /// Create a new Simple Moving Average with the specified period
    pub fn new(period: usize) -> Result<Self> {
        if period == 0 {
            return Err(MathError::InvalidInput(
                "Period must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            period,
            values: VecDeque::with_capacity(period),
            sum: 0.0,
        })
    }

    /// Update the SMA with a new value
    pub fn update(&mut self, value: f64) -> Result<()> {
        if !value.is_finite() {
            return Err(MathError::InvalidInput(format!(
                "Cannot average non-finite value {}",
                value
            )));
        }

        self.values.push_back(value);
        self.sum += value;

        if self.values.len() > self.period {
            if let Some(old_value) = self.values.pop_front() {
                self.sum -= old_value;
            }
        }

        Ok(())
    }

    /// Get the current SMA value
    pub fn value(&self) -> Result<f64> {
        if self.values.len() < self.period {
            return Err(MathError::InsufficientData(format!(
                "Not enough data for SMA calculation. Need {} values, have {}.",
                self.period,
                self.values.len()
            )));
        }

        Ok(self.sum / self.period as f64)
    }

    /// Mean of whatever is currently in the window, even if it is not full yet
    pub fn partial_value(&self) -> Option<f64> {
        if self.values.is_empty() {
            None
        } else {
            Some(self.sum / self.values.len() as f64)
        }
    }

    /// Get the current period
    pub fn period(&self) -> usize {
        self.period
    }

    /// Reset the SMA, clearing all values
    pub fn reset(&mut self) {
        self.values.clear();
        self.sum = 0.0;
    }
}

/// Trailing mean at every position of `values`
///
/// Position `i` averages `values[i + 1 - window ..= i]`, or everything seen
/// so far while fewer than `window` values exist. The output has the same
/// length as the input.
pub fn trailing_means(values: &[f64], window: usize) -> Result<Vec<f64>> {
    let mut sma = SimpleMovingAverage::new(window)?;
    let mut means = Vec::with_capacity(values.len());

    for &value in values {
        sma.update(value)?;
        // partial_value is Some after the first update
        means.push(sma.partial_value().unwrap_or(value));
    }

    Ok(means)
}

/// Simple exponential smoothing path
///
/// `smoothed[0] = values[0]`, then
/// `smoothed[t] = alpha * values[t] + (1 - alpha) * smoothed[t - 1]`.
pub fn exponential_smoothing(values: &[f64], alpha: f64) -> Result<Vec<f64>> {
    validate_alpha(alpha)?;

    let mut smoothed = Vec::with_capacity(values.len());
    let mut level = match values.first() {
        Some(&first) => first,
        None => return Ok(smoothed),
    };
    smoothed.push(level);

    for &value in &values[1..] {
        level = alpha * value + (1.0 - alpha) * level;
        smoothed.push(level);
    }

    Ok(smoothed)
}

/// Alpha must lie strictly between 0 and 1
pub fn validate_alpha(alpha: f64) -> Result<()> {
    if alpha > 0.0 && alpha < 1.0 {
        Ok(())
    } else {
        Err(MathError::InvalidInput(format!(
            "Alpha must be between 0 and 1, got {}",
            alpha
        )))
    }
}
