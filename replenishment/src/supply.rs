//! Current supply position per SKU

use crate::{PlanningError, Result};
use demand_forecast::utils::normalize_sku;
use demand_forecast::SkuFailure;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

/// Stock on hand and in transit for one SKU
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventorySnapshot {
    pub sku: String,
    pub on_hand_qty: f64,
    #[serde(default)]
    pub in_transit_qty: f64,
    #[serde(default)]
    pub unit_cost: Option<f64>,
    /// Vendor from item master data
    #[serde(default)]
    pub vendor: Option<String>,
}

impl InventorySnapshot {
    pub fn new(sku: impl Into<String>, on_hand_qty: f64, in_transit_qty: f64) -> Self {
        Self {
            sku: sku.into(),
            on_hand_qty,
            in_transit_qty,
            unit_cost: None,
            vendor: None,
        }
    }
}

/// Open purchase-order quantity for one SKU
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenPurchaseOrder {
    pub sku: String,
    pub open_qty: f64,
    #[serde(default)]
    pub vendor: Option<String>,
}

impl OpenPurchaseOrder {
    pub fn new(sku: impl Into<String>, open_qty: f64) -> Self {
        Self {
            sku: sku.into(),
            open_qty,
            vendor: None,
        }
    }
}

/// Unfilled customer demand for one SKU
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Backorder {
    pub sku: String,
    pub backorder_qty: f64,
}

impl Backorder {
    pub fn new(sku: impl Into<String>, backorder_qty: f64) -> Self {
        Self {
            sku: sku.into(),
            backorder_qty,
        }
    }
}

/// Everything the planner needs to know about supply for one SKU
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SupplyPosition {
    pub sku: String,
    pub on_hand_qty: f64,
    pub in_transit_qty: f64,
    pub open_po_qty: f64,
    pub backorder_qty: f64,
    pub unit_cost: Option<f64>,
    pub vendor: Option<String>,
}

impl SupplyPosition {
    /// A SKU with nothing on hand, on order or owed
    pub fn empty(sku: impl Into<String>) -> Self {
        Self {
            sku: sku.into(),
            ..Self::default()
        }
    }

    /// `on_hand + in_transit + open_po`
    pub fn available_supply(&self) -> f64 {
        self.on_hand_qty + self.in_transit_qty + self.open_po_qty
    }

    /// Reject negative or non-finite quantities and costs
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("on-hand quantity", self.on_hand_qty),
            ("in-transit quantity", self.in_transit_qty),
            ("open PO quantity", self.open_po_qty),
            ("backorder quantity", self.backorder_qty),
        ];
        for (name, value) in fields {
            check_quantity(&self.sku, name, value)?;
        }
        if let Some(cost) = self.unit_cost {
            check_quantity(&self.sku, "unit cost", cost)?;
        }
        Ok(())
    }
}

fn check_quantity(sku: &str, name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(PlanningError::InvalidRecord {
            sku: sku.to_string(),
            reason: format!("{} {} is not a valid quantity", name, value),
        })
    }
}

/// Supply positions keyed by normalized SKU
///
/// Quantities from several rows of the same SKU are summed. A malformed row
/// fails its SKU only; the failure is kept and the SKU has no position.
#[derive(Debug, Clone, Default)]
pub struct SupplyBook {
    positions: BTreeMap<String, SupplyPosition>,
    failed: BTreeSet<String>,
    pub failures: Vec<SkuFailure>,
}

impl SupplyBook {
    pub fn build(
        inventory: &[InventorySnapshot],
        open_orders: &[OpenPurchaseOrder],
        backorders: &[Backorder],
    ) -> Self {
        let mut book = Self::default();

        for row in inventory {
            let sku = normalize_sku(&row.sku);
            let result = check_quantity(&sku, "on-hand quantity", row.on_hand_qty)
                .and_then(|_| check_quantity(&sku, "in-transit quantity", row.in_transit_qty))
                .and_then(|_| match row.unit_cost {
                    Some(cost) => check_quantity(&sku, "unit cost", cost),
                    None => Ok(()),
                });
            book.apply(sku, result, |position| {
                position.on_hand_qty += row.on_hand_qty;
                position.in_transit_qty += row.in_transit_qty;
                if row.unit_cost.is_some() {
                    position.unit_cost = row.unit_cost;
                }
                if position.vendor.is_none() {
                    position.vendor = clean_vendor(row.vendor.as_deref());
                }
            });
        }

        for row in open_orders {
            let sku = normalize_sku(&row.sku);
            let result = check_quantity(&sku, "open PO quantity", row.open_qty);
            book.apply(sku, result, |position| {
                position.open_po_qty += row.open_qty;
                // an open PO names the vendor actually being used
                if let Some(vendor) = clean_vendor(row.vendor.as_deref()) {
                    position.vendor = Some(vendor);
                }
            });
        }

        for row in backorders {
            let sku = normalize_sku(&row.sku);
            let result = check_quantity(&sku, "backorder quantity", row.backorder_qty);
            book.apply(sku, result, |position| {
                position.backorder_qty += row.backorder_qty;
            });
        }

        book
    }

    fn apply(&mut self, sku: String, result: Result<()>, update: impl FnOnce(&mut SupplyPosition)) {
        if sku.is_empty() {
            self.fail(sku, "empty SKU identifier".to_string());
            return;
        }
        if self.failed.contains(&sku) {
            return;
        }
        match result {
            Ok(()) => update(
                self.positions
                    .entry(sku.clone())
                    .or_insert_with(|| SupplyPosition::empty(sku)),
            ),
            Err(PlanningError::InvalidRecord { reason, .. }) => self.fail(sku, reason),
            Err(other) => self.fail(sku, other.to_string()),
        }
    }

    fn fail(&mut self, sku: String, reason: String) {
        warn!(sku = %sku, reason = %reason, "Dropping supply for SKU");
        self.positions.remove(&sku);
        if self.failed.insert(sku.clone()) {
            self.failures.push(SkuFailure { sku, reason });
        }
    }

    /// Position for a SKU; an unknown SKU has an empty position
    pub fn position(&self, sku: &str) -> SupplyPosition {
        let key = normalize_sku(sku);
        self.positions
            .get(&key)
            .cloned()
            .unwrap_or_else(|| SupplyPosition::empty(key))
    }

    /// True if a malformed row was seen for the SKU
    pub fn is_failed(&self, sku: &str) -> bool {
        self.failed.contains(&normalize_sku(sku))
    }

    /// SKUs with a valid position, in order
    pub fn skus(&self) -> impl Iterator<Item = &str> {
        self.positions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

fn clean_vendor(vendor: Option<&str>) -> Option<String> {
    vendor
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_rows_are_summed_per_normalized_sku() {
        let inventory = vec![
            InventorySnapshot::new("a-1", 10.0, 2.0),
            InventorySnapshot::new(" A-1", 5.0, 0.0),
        ];
        let orders = vec![OpenPurchaseOrder::new("A-1", 7.0)];
        let backorders = vec![Backorder::new("a-1 ", 3.0)];
        let book = SupplyBook::build(&inventory, &orders, &backorders);

        let position = book.position("a-1");
        assert_abs_diff_eq!(position.on_hand_qty, 15.0);
        assert_abs_diff_eq!(position.available_supply(), 24.0);
        assert_abs_diff_eq!(position.backorder_qty, 3.0);
        assert_eq!(book.len(), 1);
    }

    #[test]
    fn test_open_po_vendor_wins_over_master_vendor() {
        let mut snapshot = InventorySnapshot::new("A", 1.0, 0.0);
        snapshot.vendor = Some("Master Co".to_string());
        let mut order = OpenPurchaseOrder::new("A", 1.0);
        order.vendor = Some(" Acme ".to_string());

        let book = SupplyBook::build(&[snapshot], &[order], &[]);
        assert_eq!(book.position("A").vendor.as_deref(), Some("Acme"));
    }

    #[test]
    fn test_bad_row_fails_only_its_sku() {
        let inventory = vec![
            InventorySnapshot::new("GOOD", 4.0, 0.0),
            InventorySnapshot::new("BAD", f64::NAN, 0.0),
        ];
        let orders = vec![OpenPurchaseOrder::new("BAD", 5.0)];
        let book = SupplyBook::build(&inventory, &orders, &[]);

        assert!(book.is_failed("bad"));
        assert!(!book.is_failed("GOOD"));
        assert_eq!(book.failures.len(), 1);
        assert_eq!(book.skus().collect::<Vec<_>>(), vec!["GOOD"]);
    }

    #[test]
    fn test_unknown_sku_has_empty_position() {
        let book = SupplyBook::build(&[], &[], &[]);
        let position = book.position("ghost");
        assert_eq!(position.sku, "GHOST");
        assert_eq!(position.available_supply(), 0.0);
        assert!(position.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_negative() {
        let position = SupplyPosition {
            backorder_qty: -1.0,
            ..SupplyPosition::empty("X")
        };
        assert!(matches!(
            position.validate(),
            Err(PlanningError::InvalidRecord { .. })
        ));
    }
}
