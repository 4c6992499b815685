//! # Demand Planner
//!
//! Batch orchestration of the demand-forecasting and replenishment crates:
//! aggregate shipments, forecast every SKU in parallel, estimate lead times,
//! and turn forecasts plus supply into purchase suggestions.
//!
//! A run never aborts because of one SKU. Malformed rows fail their SKU and
//! are listed in [`PlanningRun::failures`]; data-quality conditions come back
//! as [`demand_forecast::Diagnostic`]s.
//!
//! ## Example
//!
//! ```rust
//! use chrono::{Duration, NaiveDate};
//! use demand_planner::{Planner, PlanningConfig, PlanningInputs};
//! use demand_forecast::DemandObservation;
//! use replenishment::InventorySnapshot;
//!
//! let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let inputs = PlanningInputs {
//!     shipments: (0..60)
//!         .map(|i| DemandObservation::new("A-1", start + Duration::days(i), 4.0))
//!         .collect(),
//!     inventory: vec![InventorySnapshot::new("A-1", 100.0, 0.0)],
//!     ..PlanningInputs::default()
//! };
//!
//! let run = Planner::new(PlanningConfig::default())
//!     .unwrap()
//!     .run(&inputs)
//!     .unwrap();
//! let rec = run.recommendation("A-1").unwrap();
//! assert_eq!(rec.lead_time_source.to_string(), "default");
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;

pub use config::PlanningConfig;
pub use error::{PlannerError, Result};
pub use pipeline::{Planner, PlanningInputs, PlanningRun};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
