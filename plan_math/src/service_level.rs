//! Service level to safety-factor mapping
//!
//! The four levels planners actually quote use the rounded textbook factors;
//! any other level is resolved through the standard normal inverse CDF.

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

/// Rounded Z factors for the common service levels
const STANDARD_FACTORS: [(f64, f64); 4] = [(90.0, 1.28), (95.0, 1.65), (98.0, 2.05), (99.0, 2.33)];

/// Target in-stock probability, expressed as a percentage
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct ServiceLevel(f64);

impl ServiceLevel {
    /// Create a service level from a percentage strictly between 50 and 100
    pub fn new(percent: f64) -> Result<Self> {
        if percent.is_finite() && percent > 50.0 && percent < 100.0 {
            Ok(Self(percent))
        } else {
            Err(MathError::InvalidInput(format!(
                "Service level must be between 50 and 100 percent, got {}",
                percent
            )))
        }
    }

    /// The percentage value
    pub fn percent(&self) -> f64 {
        self.0
    }

    /// Safety factor (Z) for this service level
    pub fn z_score(&self) -> Result<f64> {
        if let Some(&(_, z)) = STANDARD_FACTORS
            .iter()
            .find(|(level, _)| (level - self.0).abs() < 1e-9)
        {
            return Ok(z);
        }

        let normal = Normal::new(0.0, 1.0)
            .map_err(|e| MathError::CalculationError(format!("Standard normal: {}", e)))?;
        Ok(normal.inverse_cdf(self.0 / 100.0))
    }
}

impl Default for ServiceLevel {
    fn default() -> Self {
        Self(95.0)
    }
}

impl TryFrom<f64> for ServiceLevel {
    type Error = MathError;

    fn try_from(percent: f64) -> Result<Self> {
        Self::new(percent)
    }
}

impl From<ServiceLevel> for f64 {
    fn from(level: ServiceLevel) -> f64 {
        level.0
    }
}

/// Shorthand for `ServiceLevel::new(percent)?.z_score()`
pub fn z_score(percent: f64) -> Result<f64> {
    ServiceLevel::new(percent)?.z_score()
}
