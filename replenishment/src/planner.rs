//! MRP net-requirements planning for one SKU
//!
//! ```text
//! lead_time_demand = avg_daily_demand * lead_time_days * seasonal_factor
//! safety_stock     = z * demand_std_daily * sqrt(lead_time_days)
//! order_up_to      = lead_time_demand + review_period_demand + safety_stock
//! available_supply = on_hand + in_transit + open_po
//! net_requirement  = order_up_to - available_supply + backorders
//! suggested_qty    = max(0, ceil(net_requirement))
//! ```
//!
//! Priority comes from days of supply (`on_hand / avg_daily_demand`), never
//! from the suggested quantity.

use crate::lead_time::{LeadTimeConfidence, LeadTimeSource, LeadTimeTable, ResolvedLeadTime};
use crate::supply::SupplyPosition;
use crate::{PlanningError, Result};
use demand_forecast::{ConfidenceLevel, DemandForecast, Diagnostic, DiagnosticKind};
use plan_math::service_level::ServiceLevel;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Urgency at or above which an item counts as critical
pub const CRITICAL_URGENCY: u8 = 50;

/// Ordering priority from days of supply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Priority {
    /// `<7` Critical, `<14` High, `<30` Medium, otherwise Low
    ///
    /// `None` (no demand, infinite supply) is Low.
    pub fn from_days_of_supply(days_of_supply: Option<f64>) -> Self {
        match days_of_supply {
            Some(days) if days < 7.0 => Priority::Critical,
            Some(days) if days < 14.0 => Priority::High,
            Some(days) if days < 30.0 => Priority::Medium,
            _ => Priority::Low,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Critical => write!(f, "Critical"),
            Priority::High => write!(f, "High"),
            Priority::Medium => write!(f, "Medium"),
            Priority::Low => write!(f, "Low"),
        }
    }
}

/// Inputs of the net-requirements calculation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RequirementInputs {
    pub avg_daily_demand: f64,
    pub demand_std_daily: f64,
    pub lead_time_days: f64,
    /// Mean seasonal index across the lead-time window
    pub seasonal_factor: f64,
    pub z_score: f64,
    pub review_period_days: f64,
    pub on_hand_qty: f64,
    pub in_transit_qty: f64,
    pub open_po_qty: f64,
    pub backorder_qty: f64,
}

/// Result of the net-requirements calculation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    pub lead_time_demand: f64,
    pub safety_stock: f64,
    pub review_period_demand: f64,
    pub order_up_to: f64,
    /// `lead_time_demand + safety_stock`
    pub reorder_point: f64,
    pub available_supply: f64,
    pub below_reorder_point: bool,
    pub net_requirement: f64,
    pub suggested_qty: u64,
    /// `None` without demand
    pub days_of_supply: Option<f64>,
    pub priority: Priority,
    pub urgency_score: u8,
    pub zero_demand: bool,
}

/// Net requirement, suggested quantity and priority
///
/// Without demand there is no reorder signal: the suggested quantity is 0
/// and the priority Low, while the breakdown is still reported.
pub fn compute_requirement(inputs: &RequirementInputs) -> Requirement {
    let zero_demand = inputs.avg_daily_demand <= 0.0;
    let lead_time = inputs.lead_time_days.max(0.0);

    let lead_time_demand = inputs.avg_daily_demand * lead_time * inputs.seasonal_factor;
    let safety_stock = inputs.z_score * inputs.demand_std_daily * lead_time.sqrt();
    let review_period_demand = inputs.avg_daily_demand * inputs.review_period_days;
    let order_up_to = lead_time_demand + review_period_demand + safety_stock;
    let reorder_point = lead_time_demand + safety_stock;

    let available_supply = inputs.on_hand_qty + inputs.in_transit_qty + inputs.open_po_qty;
    let net_requirement = order_up_to - available_supply + inputs.backorder_qty;

    let (suggested_qty, days_of_supply) = if zero_demand {
        (0, None)
    } else {
        (
            net_requirement.ceil().max(0.0) as u64,
            Some(inputs.on_hand_qty / inputs.avg_daily_demand),
        )
    };

    Requirement {
        lead_time_demand,
        safety_stock,
        review_period_demand,
        order_up_to,
        reorder_point,
        available_supply,
        below_reorder_point: available_supply < reorder_point,
        net_requirement,
        suggested_qty,
        days_of_supply,
        priority: Priority::from_days_of_supply(days_of_supply),
        urgency_score: urgency_score(
            days_of_supply,
            inputs.backorder_qty,
            inputs.avg_daily_demand,
        ),
        zero_demand,
    }
}

/// Ordering urgency, 0-100 (higher is more urgent)
///
/// Days of supply scores up to 40 points, backorder cover up to 40 and demand
/// velocity up to 20.
pub fn urgency_score(days_of_supply: Option<f64>, backorder_qty: f64, avg_daily_demand: f64) -> u8 {
    let supply_points = match days_of_supply {
        Some(days) if days < 7.0 => 40,
        Some(days) if days < 14.0 => 30,
        Some(days) if days < 30.0 => 20,
        Some(days) if days < 60.0 => 10,
        _ => 0,
    };

    let backorder_points = if backorder_qty <= 0.0 {
        0
    } else if avg_daily_demand > 0.0 {
        let backorder_days = backorder_qty / avg_daily_demand;
        if backorder_days > 30.0 {
            40
        } else if backorder_days > 14.0 {
            30
        } else if backorder_days > 7.0 {
            20
        } else {
            10
        }
    } else {
        // owed to customers with no demand history
        20
    };

    let velocity_points = if avg_daily_demand > 10.0 {
        20
    } else if avg_daily_demand > 5.0 {
        15
    } else if avg_daily_demand > 1.0 {
        10
    } else if avg_daily_demand > 0.0 {
        5
    } else {
        0
    };

    (supply_points + backorder_points + velocity_points).min(100)
}

/// Planner parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerSettings {
    pub service_level: ServiceLevel,
    pub review_period_days: u32,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            service_level: ServiceLevel::default(),
            review_period_days: 0,
        }
    }
}

/// Purchase suggestion for one SKU with its full breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplenishmentRecommendation {
    pub sku: String,
    pub vendor: Option<String>,
    pub suggested_qty: u64,
    pub safety_stock: f64,
    pub lead_time_demand: f64,
    pub review_period_demand: f64,
    pub order_up_to: f64,
    pub reorder_point: f64,
    pub below_reorder_point: bool,
    pub on_hand_qty: f64,
    pub in_transit_qty: f64,
    pub open_po_qty: f64,
    pub available_supply: f64,
    pub backorder_qty: f64,
    pub net_requirement: f64,
    pub days_of_supply: Option<f64>,
    pub priority: Priority,
    pub urgency_score: u8,
    pub avg_daily_demand: f64,
    pub demand_std_daily: f64,
    pub lead_time_days: f64,
    pub lead_time_source: LeadTimeSource,
    pub lead_time_confidence: LeadTimeConfidence,
    pub lead_time_po_matches: usize,
    pub seasonal_factor: f64,
    pub service_level: f64,
    pub z_score: f64,
    pub unit_cost: Option<f64>,
    /// `suggested_qty * unit_cost`, 0 without a cost
    pub order_value: f64,
    pub forecast_confidence: ConfidenceLevel,
    pub diagnostics: Vec<Diagnostic>,
}

impl ReplenishmentRecommendation {
    /// Vendor name, "Unknown" when none is known
    pub fn vendor_label(&self) -> &str {
        self.vendor.as_deref().unwrap_or("Unknown")
    }

    pub fn is_default_lead_time(&self) -> bool {
        self.lead_time_source == LeadTimeSource::Default
    }
}

/// Converts forecasts and supply into recommendations
#[derive(Debug, Clone)]
pub struct ReplenishmentPlanner {
    settings: PlannerSettings,
    z_score: f64,
}

impl ReplenishmentPlanner {
    pub fn new(settings: PlannerSettings) -> Result<Self> {
        let z_score = settings.service_level.z_score()?;
        Ok(Self { settings, z_score })
    }

    pub fn settings(&self) -> &PlannerSettings {
        &self.settings
    }

    pub fn z_score(&self) -> f64 {
        self.z_score
    }

    /// Resolve the SKU's lead time from `table`, then recommend
    ///
    /// The vendor used for the lead-time cascade is the supply position's,
    /// else the one on the SKU's latest matched PO.
    pub fn plan_sku(
        &self,
        forecast: &DemandForecast,
        table: &LeadTimeTable,
        supply: &SupplyPosition,
    ) -> Result<ReplenishmentRecommendation> {
        let vendor = supply
            .vendor
            .as_deref()
            .or_else(|| table.vendor_for(&forecast.sku));
        let lead_time = table.resolve(&forecast.sku, vendor);
        self.recommend(forecast, &lead_time, supply)
    }

    /// Recommendation for one SKU from its forecast, lead time and supply
    pub fn recommend(
        &self,
        forecast: &DemandForecast,
        lead_time: &ResolvedLeadTime,
        supply: &SupplyPosition,
    ) -> Result<ReplenishmentRecommendation> {
        supply.validate()?;
        if !lead_time.lead_time_days.is_finite() || lead_time.lead_time_days <= 0.0 {
            return Err(PlanningError::InvalidRecord {
                sku: forecast.sku.clone(),
                reason: format!("lead time {} days is not usable", lead_time.lead_time_days),
            });
        }

        let window_days = lead_time.lead_time_days.ceil() as u32;
        let seasonal_factor = forecast.seasonal_factor_over_days(window_days);

        let requirement = compute_requirement(&RequirementInputs {
            avg_daily_demand: forecast.avg_daily_demand,
            demand_std_daily: forecast.demand_std_daily,
            lead_time_days: lead_time.lead_time_days,
            seasonal_factor,
            z_score: self.z_score,
            review_period_days: self.settings.review_period_days as f64,
            on_hand_qty: supply.on_hand_qty,
            in_transit_qty: supply.in_transit_qty,
            open_po_qty: supply.open_po_qty,
            backorder_qty: supply.backorder_qty,
        });

        let mut diagnostics = Vec::new();
        if let Some(diagnostic) = &lead_time.diagnostic {
            diagnostics.push(diagnostic.clone());
        }
        if requirement.zero_demand {
            diagnostics.push(Diagnostic::new(
                forecast.sku.clone(),
                DiagnosticKind::ZeroDemand,
                "average daily demand is zero; no order suggested",
            ));
        }

        debug!(
            sku = %forecast.sku,
            suggested_qty = requirement.suggested_qty,
            priority = %requirement.priority,
            lead_time_source = %lead_time.source,
            "Planned replenishment"
        );

        let vendor = supply.vendor.clone().or_else(|| lead_time.vendor.clone());
        Ok(ReplenishmentRecommendation {
            sku: forecast.sku.clone(),
            vendor,
            suggested_qty: requirement.suggested_qty,
            safety_stock: requirement.safety_stock,
            lead_time_demand: requirement.lead_time_demand,
            review_period_demand: requirement.review_period_demand,
            order_up_to: requirement.order_up_to,
            reorder_point: requirement.reorder_point,
            below_reorder_point: requirement.below_reorder_point,
            on_hand_qty: supply.on_hand_qty,
            in_transit_qty: supply.in_transit_qty,
            open_po_qty: supply.open_po_qty,
            available_supply: requirement.available_supply,
            backorder_qty: supply.backorder_qty,
            net_requirement: requirement.net_requirement,
            days_of_supply: requirement.days_of_supply,
            priority: requirement.priority,
            urgency_score: requirement.urgency_score,
            avg_daily_demand: forecast.avg_daily_demand,
            demand_std_daily: forecast.demand_std_daily,
            lead_time_days: lead_time.lead_time_days,
            lead_time_source: lead_time.source,
            lead_time_confidence: lead_time.confidence,
            lead_time_po_matches: lead_time.po_match_count,
            seasonal_factor,
            service_level: self.settings.service_level.percent(),
            z_score: self.z_score,
            unit_cost: supply.unit_cost,
            order_value: supply
                .unit_cost
                .map_or(0.0, |cost| requirement.suggested_qty as f64 * cost),
            forecast_confidence: forecast.confidence.level,
            diagnostics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rstest::rstest;

    fn inputs() -> RequirementInputs {
        RequirementInputs {
            avg_daily_demand: 5.0,
            demand_std_daily: 2.0,
            lead_time_days: 10.0,
            seasonal_factor: 1.0,
            z_score: 1.65,
            review_period_days: 0.0,
            on_hand_qty: 20.0,
            in_transit_qty: 0.0,
            open_po_qty: 10.0,
            backorder_qty: 5.0,
        }
    }

    #[rstest]
    #[case(Some(0.0), Priority::Critical)]
    #[case(Some(6.99), Priority::Critical)]
    #[case(Some(7.0), Priority::High)]
    #[case(Some(13.9), Priority::High)]
    #[case(Some(14.0), Priority::Medium)]
    #[case(Some(29.9), Priority::Medium)]
    #[case(Some(30.0), Priority::Low)]
    #[case(None, Priority::Low)]
    fn test_priority_boundaries(#[case] days: Option<f64>, #[case] expected: Priority) {
        assert_eq!(Priority::from_days_of_supply(days), expected);
    }

    #[test]
    fn test_breakdown() {
        let r = compute_requirement(&inputs());
        assert_abs_diff_eq!(r.lead_time_demand, 50.0);
        assert_abs_diff_eq!(r.safety_stock, 1.65 * 2.0 * 10f64.sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(r.available_supply, 30.0);
        assert_eq!(r.suggested_qty, 36);
        assert_eq!(r.days_of_supply, Some(4.0));
        assert!(r.below_reorder_point);
    }

    #[test]
    fn test_review_period_raises_order_up_to_only() {
        let r = compute_requirement(&RequirementInputs {
            review_period_days: 7.0,
            ..inputs()
        });
        assert_abs_diff_eq!(r.review_period_demand, 35.0);
        assert_abs_diff_eq!(r.order_up_to - r.reorder_point, 35.0, epsilon = 1e-12);
        assert_eq!(r.suggested_qty, 71);
    }

    #[test]
    fn test_seasonal_factor_scales_lead_time_demand() {
        let r = compute_requirement(&RequirementInputs {
            seasonal_factor: 1.5,
            ..inputs()
        });
        assert_abs_diff_eq!(r.lead_time_demand, 75.0);
    }

    #[test]
    fn test_surplus_never_goes_negative() {
        let r = compute_requirement(&RequirementInputs {
            on_hand_qty: 500.0,
            backorder_qty: 0.0,
            ..inputs()
        });
        assert!(r.net_requirement < 0.0);
        assert_eq!(r.suggested_qty, 0);
        assert_eq!(r.priority, Priority::Low);
    }

    #[test]
    fn test_zero_demand() {
        let r = compute_requirement(&RequirementInputs {
            avg_daily_demand: 0.0,
            demand_std_daily: 0.0,
            ..inputs()
        });
        assert!(r.zero_demand);
        assert_eq!(r.suggested_qty, 0);
        assert_eq!(r.days_of_supply, None);
        assert_eq!(r.priority, Priority::Low);
        // backorders without demand history still score
        assert_eq!(r.urgency_score, 20);
    }

    #[rstest]
    #[case(Some(4.0), 5.0, 5.0, 40 + 10 + 10)]
    #[case(Some(20.0), 200.0, 12.0, 20 + 30 + 20)]
    #[case(Some(45.0), 0.0, 0.5, 10 + 5)]
    #[case(Some(100.0), 400.0, 6.0, 40 + 15)]
    #[case(Some(1.0), 1000.0, 20.0, 100)]
    fn test_urgency_points(
        #[case] days: Option<f64>,
        #[case] backorders: f64,
        #[case] daily: f64,
        #[case] expected: u8,
    ) {
        assert_eq!(urgency_score(days, backorders, daily), expected);
    }

    #[test]
    fn test_planner_resolves_z_once() {
        let planner = ReplenishmentPlanner::new(PlannerSettings::default()).unwrap();
        assert_abs_diff_eq!(planner.z_score(), 1.65);
    }
}
