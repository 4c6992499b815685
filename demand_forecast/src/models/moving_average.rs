//! Moving average model for demand forecasting

use crate::error::{ForecastError, Result};
use crate::models::{ForecastMethod, ForecastModel, ForecastResult, TrainedForecastModel};
use plan_math::moving_averages::trailing_means;

/// Simple moving average model
#[derive(Debug, Clone)]
pub struct MovingAverage {
    /// Name of the model
    name: String,
    /// Window size
    window: usize,
}

/// Trained moving average model
#[derive(Debug, Clone)]
pub struct TrainedMovingAverage {
    /// Name of the model
    name: String,
    /// Window actually used (the configured window, capped at the history)
    effective_window: usize,
    /// Trailing mean at each training observation
    fitted: Vec<f64>,
    /// Mean of the last `effective_window` observations
    last_average: f64,
}

impl MovingAverage {
    /// Create a new moving average model
    pub fn new(window: usize) -> Result<Self> {
        if window == 0 {
            return Err(ForecastError::InvalidParameter(
                "Window size must be positive".to_string(),
            ));
        }

        Ok(Self {
            name: format!("Moving Average (window={})", window),
            window,
        })
    }

    /// Model matching a selected forecast method
    pub fn for_method(method: ForecastMethod) -> Self {
        Self {
            name: format!("Moving Average (window={})", method.window()),
            window: method.window(),
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }
}

impl ForecastModel for MovingAverage {
    type Trained = TrainedMovingAverage;

    fn train(&self, data: &[f64]) -> Result<Self::Trained> {
        if data.is_empty() {
            return Err(ForecastError::DataError("Empty demand history".to_string()));
        }

        // a short backtest training slice may hold fewer points than the window
        let effective_window = self.window.min(data.len());
        let fitted = trailing_means(data, effective_window)?;
        let last_average = data[data.len() - effective_window..].iter().sum::<f64>()
            / effective_window as f64;

        Ok(TrainedMovingAverage {
            name: self.name.clone(),
            effective_window,
            fitted,
            last_average,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedMovingAverage {
    /// Latest moving average value
    pub fn last_average(&self) -> f64 {
        self.last_average
    }

    pub fn effective_window(&self) -> usize {
        self.effective_window
    }

    /// Fitted values over the final window only
    pub fn window_fitted(&self) -> &[f64] {
        &self.fitted[self.fitted.len() - self.effective_window..]
    }
}

impl TrainedForecastModel for TrainedMovingAverage {
    fn forecast(&self, horizon: usize) -> Result<ForecastResult> {
        // For simple MA, the forecast is constant at the last average
        ForecastResult::new(vec![self.last_average; horizon], horizon)
    }

    fn fitted(&self) -> &[f64] {
        &self.fitted
    }

    fn name(&self) -> &str {
        &self.name
    }
}
