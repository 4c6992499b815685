//! Simple exponential smoothing model

use crate::error::{ForecastError, Result};
use crate::models::{ForecastModel, ForecastResult, TrainedForecastModel};
use plan_math::moving_averages::{exponential_smoothing, validate_alpha};

/// Simple exponential smoothing model
#[derive(Debug, Clone)]
pub struct ExponentialSmoothing {
    /// Name of the model
    name: String,
    /// Smoothing parameter
    alpha: f64,
}

/// Trained exponential smoothing model
#[derive(Debug, Clone)]
pub struct TrainedExponentialSmoothing {
    /// Name of the model
    name: String,
    /// Smoothed level at every training observation
    path: Vec<f64>,
}

impl ExponentialSmoothing {
    /// Create a new exponential smoothing model
    pub fn new(alpha: f64) -> Result<Self> {
        validate_alpha(alpha).map_err(|e| ForecastError::InvalidParameter(e.to_string()))?;

        Ok(Self {
            name: format!("Exponential Smoothing (alpha={})", alpha),
            alpha,
        })
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }
}

impl ForecastModel for ExponentialSmoothing {
    type Trained = TrainedExponentialSmoothing;

    fn train(&self, data: &[f64]) -> Result<Self::Trained> {
        if data.is_empty() {
            return Err(ForecastError::DataError("Empty demand history".to_string()));
        }

        Ok(TrainedExponentialSmoothing {
            name: self.name.clone(),
            path: exponential_smoothing(data, self.alpha)?,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedExponentialSmoothing {
    /// Final smoothed level
    pub fn level(&self) -> f64 {
        // train rejects empty input
        self.path.last().copied().unwrap_or(0.0)
    }
}

impl TrainedForecastModel for TrainedExponentialSmoothing {
    fn forecast(&self, horizon: usize) -> Result<ForecastResult> {
        // In simple exponential smoothing, the forecast is constant at the last level
        ForecastResult::new(vec![self.level(); horizon], horizon)
    }

    fn fitted(&self) -> &[f64] {
        &self.path
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_smoothed_path_and_forecast() {
        let model = ExponentialSmoothing::new(0.5).unwrap();
        let trained = model.train(&[10.0, 20.0, 20.0]).unwrap();

        assert_eq!(trained.fitted(), &[10.0, 15.0, 17.5]);
        assert_abs_diff_eq!(trained.level(), 17.5);
        assert_eq!(trained.forecast(3).unwrap().values(), &[17.5, 17.5, 17.5]);
    }

    #[test]
    fn test_alpha_validation() {
        assert!(matches!(
            ExponentialSmoothing::new(1.0),
            Err(ForecastError::InvalidParameter(_))
        ));
        assert!(ExponentialSmoothing::new(0.3).is_ok());
    }
}
