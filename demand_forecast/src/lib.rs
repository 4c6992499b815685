//! # Demand Forecast
//!
//! Per-SKU demand forecasting for replenishment planning.
//!
//! ## Features
//!
//! - Aggregation of shipment rows into daily or monthly series
//! - Z-score anomaly detection with an intermittent-demand override
//! - Median or neighbor replacement of anomalies, then exponential smoothing
//! - Monthly seasonal indices, per SKU for high-volume items and per category
//!   otherwise
//! - Moving-average forecasts with trend, seasonal adjustment and bands
//! - 80/20 backtesting and a 0-100 confidence score
//! - Caller-owned memoization keyed on the full input version
//!
//! Data-quality problems never fail a SKU; they come back as
//! [`Diagnostic`]s next to the result. Only malformed input is an error.
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::{Duration, NaiveDate};
//! use demand_forecast::{
//!     aggregate_shipments, DemandObservation, ForecastSettings, Forecaster, Granularity,
//!     SeasonalityModel,
//! };
//! use std::collections::HashMap;
//!
//! let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let rows: Vec<DemandObservation> = (0..60)
//!     .map(|i| DemandObservation::new("widget-1", start + Duration::days(i), 12.0))
//!     .collect();
//!
//! let aggregation = aggregate_shipments(&rows, Granularity::Daily);
//! let seasonality = SeasonalityModel::build(&aggregation.series, &HashMap::new());
//!
//! let forecaster = Forecaster::new(ForecastSettings::default()).unwrap();
//! let series = &aggregation.series[0];
//! let outcome = forecaster
//!     .forecast(series, &seasonality.profile_for(series.sku()))
//!     .unwrap();
//!
//! let forecast = outcome.forecast.unwrap();
//! assert_eq!(forecast.sku, "WIDGET-1");
//! assert!((forecast.forecast_qty[0] - 12.0).abs() < 1e-9);
//! ```

pub mod anomaly;
pub mod backtest;
pub mod cache;
pub mod data;
pub mod diagnostics;
pub mod error;
pub mod forecaster;
pub mod metrics;
pub mod models;
pub mod pattern;
pub mod seasonality;
pub mod smoothing;
pub mod summary;
pub mod tracking;
pub mod utils;

// Re-export commonly used types
pub use crate::anomaly::{AnomalyDetector, AnomalyFlag, AnomalyReport, SmoothingPreset};
pub use crate::backtest::{Confidence, ConfidenceLevel, ConfidenceScorer};
pub use crate::cache::{ForecastCache, ForecastKey};
pub use crate::data::{
    aggregate_by_category, aggregate_shipments, Aggregation, DemandObservation, DemandPoint,
    DemandSeries, Granularity, SkuFailure, UNCATEGORIZED,
};
pub use crate::diagnostics::{Diagnostic, DiagnosticKind};
pub use crate::error::{ForecastError, Result};
pub use crate::forecaster::{DemandForecast, ForecastOutcome, ForecastSettings, Forecaster};
pub use crate::metrics::AccuracyMetrics;
pub use crate::models::{ForecastMethod, ForecastModel, ForecastResult, TrainedForecastModel};
pub use crate::pattern::DemandPattern;
pub use crate::seasonality::{ProfileScope, SeasonalityModel, SeasonalityProfile};
pub use crate::smoothing::{ReplacementMethod, SignalSmoother, SmoothedSeries};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
