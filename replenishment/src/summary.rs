//! Plan ordering and roll-ups for buyers

use crate::lead_time::LeadTimeSource;
use crate::planner::{Priority, ReplenishmentRecommendation, CRITICAL_URGENCY};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Sort by vendor, then urgency and order value (both descending), then SKU
pub fn sort_plan(plan: &mut [ReplenishmentRecommendation]) {
    plan.sort_by(|a, b| {
        a.vendor_label()
            .cmp(b.vendor_label())
            .then_with(|| b.urgency_score.cmp(&a.urgency_score))
            .then_with(|| b.order_value.total_cmp(&a.order_value))
            .then_with(|| a.sku.cmp(&b.sku))
    });
}

/// Recommendations with something to order
pub fn order_lines(plan: &[ReplenishmentRecommendation]) -> Vec<&ReplenishmentRecommendation> {
    plan.iter().filter(|r| r.suggested_qty > 0).collect()
}

/// Totals for one vendor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorSummary {
    pub vendor: String,
    pub sku_count: usize,
    pub total_units: u64,
    pub total_value: f64,
    pub backorder_units: f64,
    pub avg_urgency: f64,
}

/// One row per vendor, largest order value first
pub fn vendor_summaries(plan: &[ReplenishmentRecommendation]) -> Vec<VendorSummary> {
    let mut groups: BTreeMap<&str, Vec<&ReplenishmentRecommendation>> = BTreeMap::new();
    for rec in plan {
        groups.entry(rec.vendor_label()).or_default().push(rec);
    }

    let mut summaries: Vec<VendorSummary> = groups
        .into_iter()
        .map(|(vendor, recs)| VendorSummary {
            vendor: vendor.to_string(),
            sku_count: recs.len(),
            total_units: recs.iter().map(|r| r.suggested_qty).sum(),
            total_value: recs.iter().map(|r| r.order_value).sum(),
            backorder_units: recs.iter().map(|r| r.backorder_qty).sum(),
            avg_urgency: recs.iter().map(|r| r.urgency_score as f64).sum::<f64>()
                / recs.len() as f64,
        })
        .collect();
    summaries.sort_by(|a, b| {
        b.total_value
            .total_cmp(&a.total_value)
            .then_with(|| a.vendor.cmp(&b.vendor))
    });
    summaries
}

/// Most urgent items (urgency of 50 or more), shortest supply first on ties
pub fn critical_items(
    plan: &[ReplenishmentRecommendation],
    top_n: usize,
) -> Vec<&ReplenishmentRecommendation> {
    let mut critical: Vec<_> = plan
        .iter()
        .filter(|r| r.urgency_score >= CRITICAL_URGENCY)
        .collect();
    critical.sort_by(|a, b| {
        b.urgency_score
            .cmp(&a.urgency_score)
            .then_with(|| compare_supply(a.days_of_supply, b.days_of_supply))
            .then_with(|| a.sku.cmp(&b.sku))
    });
    critical.truncate(top_n);
    critical
}

// None is infinite supply and sorts last
fn compare_supply(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Headline numbers for a plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanSummary {
    pub total_skus: usize,
    pub skus_to_order: usize,
    pub total_units: u64,
    pub total_value: f64,
    pub skus_with_backorders: usize,
    pub default_lead_time_skus: usize,
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

pub fn plan_summary(plan: &[ReplenishmentRecommendation]) -> PlanSummary {
    let count_priority = |p: Priority| plan.iter().filter(|r| r.priority == p).count();
    PlanSummary {
        total_skus: plan.len(),
        skus_to_order: plan.iter().filter(|r| r.suggested_qty > 0).count(),
        total_units: plan.iter().map(|r| r.suggested_qty).sum(),
        total_value: plan.iter().map(|r| r.order_value).sum(),
        skus_with_backorders: plan.iter().filter(|r| r.backorder_qty > 0.0).count(),
        default_lead_time_skus: plan
            .iter()
            .filter(|r| r.lead_time_source == LeadTimeSource::Default)
            .count(),
        critical: count_priority(Priority::Critical),
        high: count_priority(Priority::High),
        medium: count_priority(Priority::Medium),
        low: count_priority(Priority::Low),
    }
}
