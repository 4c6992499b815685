//! # Replenishment
//!
//! Turns demand forecasts, vendor lead times and the current supply position
//! into purchase-order suggestions under an MRP net-requirements discipline.
//!
//! ## Pipeline
//!
//! - [`lead_time`]: match PO lines to receipts, take the median delay plus a
//!   fixed buffer, and resolve SKU → vendor → default
//! - [`supply`]: per-SKU on-hand, in-transit, open PO and backorder positions
//! - [`planner`]: safety stock, order-up-to level, net requirement, suggested
//!   quantity and priority
//! - [`summary`]: plan ordering, vendor totals and critical items
//!
//! A defaulted lead time is never silent: the recommendation carries its
//! [`LeadTimeSource`] and a `MissingLeadTimeHistory` diagnostic.
//!
//! ## Usage Example
//!
//! ```rust
//! use replenishment::planner::{compute_requirement, Priority, RequirementInputs};
//!
//! let requirement = compute_requirement(&RequirementInputs {
//!     avg_daily_demand: 5.0,
//!     demand_std_daily: 2.0,
//!     lead_time_days: 10.0,
//!     seasonal_factor: 1.0,
//!     z_score: 1.65,
//!     review_period_days: 0.0,
//!     on_hand_qty: 20.0,
//!     in_transit_qty: 0.0,
//!     open_po_qty: 10.0,
//!     backorder_qty: 5.0,
//! });
//!
//! assert_eq!(requirement.suggested_qty, 36);
//! assert_eq!(requirement.priority, Priority::Critical);
//! ```

use demand_forecast::ForecastError;
use plan_math::MathError;
use thiserror::Error;

pub mod lead_time;
pub mod planner;
pub mod summary;
pub mod supply;

pub use lead_time::{
    LeadTimeConfidence, LeadTimeEstimator, LeadTimeRecord, LeadTimeSettings, LeadTimeSource,
    LeadTimeTable, PoReceiptPair, PurchaseOrderLine, ReceiptLine, ResolvedLeadTime,
};
pub use planner::{
    PlannerSettings, Priority, ReplenishmentPlanner, ReplenishmentRecommendation, Requirement,
};
pub use summary::{PlanSummary, VendorSummary};
pub use supply::{Backorder, InventorySnapshot, OpenPurchaseOrder, SupplyBook, SupplyPosition};

/// Errors that can occur while planning replenishment
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanningError {
    #[error("Invalid record for SKU '{sku}': {reason}")]
    InvalidRecord { sku: String, reason: String },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Forecast error: {0}")]
    Forecast(#[from] ForecastError),

    #[error("Math error: {0}")]
    Math(#[from] MathError),
}

/// Result type for replenishment operations
pub type Result<T> = std::result::Result<T, PlanningError>;
