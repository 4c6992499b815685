//! Error types for the demand_forecast crate

use plan_math::MathError;
use thiserror::Error;

/// Custom error types for the demand_forecast crate
///
/// Only malformed input surfaces here. Thin history, flat demand and similar
/// data-quality conditions are reported as [`crate::diagnostics::Diagnostic`]s.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ForecastError {
    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// A single input row could not be used
    #[error("Invalid record for SKU '{sku}': {reason}")]
    InvalidRecord { sku: String, reason: String },

    /// Error related to parameter validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error from the shared statistics layer
    #[error("Math error: {0}")]
    MathError(#[from] MathError),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;
