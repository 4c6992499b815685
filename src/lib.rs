//! # Demand Planning
//!
//! Umbrella crate re-exporting the workspace members.
//!
//! ```
//! use demand_planning_workspace::replenishment::lead_time::LeadTimeConfidence;
//!
//! assert_eq!(
//!     LeadTimeConfidence::from_match_count(5),
//!     LeadTimeConfidence::High
//! );
//! ```

pub use demand_forecast;
pub use demand_planner;
pub use plan_math;
pub use replenishment;
