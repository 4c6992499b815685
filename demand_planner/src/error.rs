//! Error types for the demand_planner crate

use demand_forecast::ForecastError;
use plan_math::MathError;
use replenishment::PlanningError;
use thiserror::Error;

/// Errors that stop a planning run before any SKU is processed
///
/// Per-SKU problems never surface here; they are collected as failures and
/// diagnostics on the run.
#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Forecast error: {0}")]
    Forecast(#[from] ForecastError),

    #[error("Planning error: {0}")]
    Planning(#[from] PlanningError),

    #[error("Math error: {0}")]
    Math(#[from] MathError),
}

/// Result type for the demand_planner crate
pub type Result<T> = std::result::Result<T, PlannerError>;
