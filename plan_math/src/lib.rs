//! # Plan Math
//!
//! Statistical primitives shared by the demand forecasting and replenishment
//! crates. Everything here is a pure function over slices of `f64` (or a
//! small incremental accumulator), so callers can run it per SKU on any
//! thread without coordination.

use thiserror::Error;

pub mod forecasting;
pub mod moving_averages;
pub mod service_level;
pub mod stats;
pub mod volatility;

/// Errors that can occur in planning calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for planning math operations
pub type Result<T> = std::result::Result<T, MathError>;
