//! Forecasting models for demand series
//!
//! Models are trained on the quantities of one SKU's series and produce a
//! flat or fitted projection. Which model the forecaster uses is decided by
//! [`ForecastMethod::select`], a pure function of the data shape.

use crate::data::Granularity;
use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};

/// Forecast result containing predicted values
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastResult {
    /// Forecasted values
    values: Vec<f64>,
    /// Number of periods forecasted
    horizons: usize,
}

impl ForecastResult {
    /// Create a new forecast result
    pub fn new(values: Vec<f64>, horizons: usize) -> Result<Self> {
        if values.len() != horizons {
            return Err(ForecastError::ValidationError(format!(
                "Values length ({}) doesn't match horizons ({})",
                values.len(),
                horizons
            )));
        }

        Ok(Self { values, horizons })
    }

    /// Get the forecasted values
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Get the number of periods forecasted
    pub fn horizons(&self) -> usize {
        self.horizons
    }
}

/// Trained forecast model
pub trait TrainedForecastModel: Debug {
    /// Generate forecast for future periods
    fn forecast(&self, horizons: usize) -> Result<ForecastResult>;

    /// In-sample fitted values, one per training observation
    fn fitted(&self) -> &[f64];

    /// Name of the model
    fn name(&self) -> &str;
}

/// Forecast model that can be trained on a demand history
pub trait ForecastModel: Debug + Clone {
    /// The type of trained model produced
    type Trained: TrainedForecastModel;

    /// Train the model on quantities in date order
    fn train(&self, data: &[f64]) -> Result<Self::Trained>;

    /// Get the name of the model
    fn name(&self) -> &str;
}

/// Moving-average method chosen from available history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ForecastMethod {
    Ma3,
    Ma6,
    Ma12,
    Ma30,
    Ma60,
    Ma90,
}

impl ForecastMethod {
    /// Moving-average window in periods
    pub fn window(&self) -> usize {
        match self {
            ForecastMethod::Ma3 => 3,
            ForecastMethod::Ma6 => 6,
            ForecastMethod::Ma12 => 12,
            ForecastMethod::Ma30 => 30,
            ForecastMethod::Ma60 => 60,
            ForecastMethod::Ma90 => 90,
        }
    }

    /// Pick the method for a series of `len` periods
    ///
    /// Returns `None` below the floor (3 months or 30 days).
    pub fn select(granularity: Granularity, len: usize) -> Option<Self> {
        match granularity {
            Granularity::Monthly => match len {
                n if n >= 12 => Some(ForecastMethod::Ma12),
                n if n >= 6 => Some(ForecastMethod::Ma6),
                n if n >= 3 => Some(ForecastMethod::Ma3),
                _ => None,
            },
            Granularity::Daily => match len {
                n if n >= 90 => Some(ForecastMethod::Ma90),
                n if n >= 60 => Some(ForecastMethod::Ma60),
                n if n >= 30 => Some(ForecastMethod::Ma30),
                _ => None,
            },
        }
    }

    /// Smallest history that yields any method
    pub fn minimum_history(granularity: Granularity) -> usize {
        match granularity {
            Granularity::Monthly => 3,
            Granularity::Daily => 30,
        }
    }
}

impl fmt::Display for ForecastMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MA{}", self.window())
    }
}

pub mod exponential_smoothing;
pub mod moving_average;
