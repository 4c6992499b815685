//! Batch planning across SKUs
//!
//! Aggregation, seasonality and lead-time estimation run once per batch; the
//! forecast and the recommendation of each SKU run in parallel with no shared
//! mutable state other than the caller's memo cache.

use crate::config::PlanningConfig;
use crate::error::{PlannerError, Result};
use chrono::{Days, NaiveDate};
use demand_forecast::summary::{summarize_forecasts, ForecastSummary};
use demand_forecast::utils::normalize_sku;
use demand_forecast::{
    aggregate_shipments, DemandForecast, DemandObservation, Diagnostic, DiagnosticKind,
    ForecastCache, Forecaster, SeasonalityModel, SkuFailure,
};
use rayon::prelude::*;
use replenishment::summary::{plan_summary, sort_plan, PlanSummary};
use replenishment::{
    Backorder, InventorySnapshot, LeadTimeEstimator, LeadTimeRecord, OpenPurchaseOrder,
    PoReceiptPair, PurchaseOrderLine, ReceiptLine, ReplenishmentPlanner,
    ReplenishmentRecommendation, SupplyBook,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Already-parsed records from the ingestion layer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanningInputs {
    pub shipments: Vec<DemandObservation>,
    pub inventory: Vec<InventorySnapshot>,
    pub open_orders: Vec<OpenPurchaseOrder>,
    pub backorders: Vec<Backorder>,
    pub po_lines: Vec<PurchaseOrderLine>,
    pub receipts: Vec<ReceiptLine>,
    /// PO/receipt pairs matched upstream
    pub matched_receipts: Vec<PoReceiptPair>,
    /// SKU to category name
    pub categories: HashMap<String, String>,
}

impl PlanningInputs {
    /// Latest shipment, PO or receipt date
    pub fn latest_date(&self) -> Option<NaiveDate> {
        let shipments = self.shipments.iter().map(|r| r.date);
        let receipts = self.receipts.iter().map(|r| r.received);
        let po_lines = self.po_lines.iter().map(|l| l.created);
        let matched = self.matched_receipts.iter().map(|p| p.receipt_date);
        shipments.chain(receipts).chain(po_lines).chain(matched).max()
    }
}

/// Output of one planning run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanningRun {
    pub as_of: Option<NaiveDate>,
    /// One forecast per SKU with enough history, ordered by SKU
    pub forecasts: Vec<DemandForecast>,
    /// Ordered by vendor, then urgency and order value
    pub recommendations: Vec<ReplenishmentRecommendation>,
    pub lead_times: Vec<LeadTimeRecord>,
    pub diagnostics: Vec<Diagnostic>,
    /// SKUs dropped because of malformed input
    pub failures: Vec<SkuFailure>,
}

impl PlanningRun {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn forecast(&self, sku: &str) -> Option<&DemandForecast> {
        let sku = normalize_sku(sku);
        self.forecasts.iter().find(|f| f.sku == sku)
    }

    pub fn recommendation(&self, sku: &str) -> Option<&ReplenishmentRecommendation> {
        let sku = normalize_sku(sku);
        self.recommendations.iter().find(|r| r.sku == sku)
    }

    pub fn diagnostics_for<'a>(&'a self, sku: &str) -> impl Iterator<Item = &'a Diagnostic> {
        let sku = normalize_sku(sku);
        self.diagnostics.iter().filter(move |d| d.sku == sku)
    }

    pub fn forecast_summary(&self, top_n: usize) -> ForecastSummary {
        summarize_forecasts(&self.forecasts, top_n)
    }

    pub fn plan_summary(&self) -> PlanSummary {
        plan_summary(&self.recommendations)
    }
}

/// Runs the whole chain for a batch of SKUs
#[derive(Debug, Clone)]
pub struct Planner {
    config: PlanningConfig,
    forecaster: Forecaster,
    estimator: LeadTimeEstimator,
    replenisher: ReplenishmentPlanner,
}

impl Planner {
    pub fn new(config: PlanningConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            forecaster: Forecaster::new(config.forecast_settings())?,
            estimator: LeadTimeEstimator::new(config.lead_time_settings())?,
            replenisher: ReplenishmentPlanner::new(config.planner_settings()?)?,
            config,
        })
    }

    pub fn config(&self) -> &PlanningConfig {
        &self.config
    }

    /// Plan with a cache that lives for this run only
    pub fn run(&self, inputs: &PlanningInputs) -> Result<PlanningRun> {
        self.run_with_cache(inputs, &ForecastCache::new())
    }

    /// Plan, reusing forecasts memoized in `cache` by earlier runs
    pub fn run_with_cache(
        &self,
        inputs: &PlanningInputs,
        cache: &ForecastCache,
    ) -> Result<PlanningRun> {
        let Some(as_of) = self.config.as_of.or_else(|| inputs.latest_date()) else {
            info!("No dated input records; nothing to plan");
            return Ok(PlanningRun::default());
        };

        let window_start = match self.config.history_window_days {
            Some(days) => Some(
                as_of
                    .checked_sub_days(Days::new(u64::from(days)))
                    .ok_or_else(|| {
                        PlannerError::Config(format!(
                            "history window of {} days before {} is out of range",
                            days, as_of
                        ))
                    })?,
            ),
            None => None,
        };
        let shipments: Vec<DemandObservation> = inputs
            .shipments
            .iter()
            .filter(|r| r.date <= as_of && window_start.map_or(true, |start| r.date > start))
            .cloned()
            .collect();

        let aggregation = aggregate_shipments(&shipments, self.config.granularity);
        let mut failures = aggregation.failures;
        let mut diagnostics: Vec<Diagnostic> = failures.iter().map(failure_diagnostic).collect();

        let categories: HashMap<String, String> = inputs
            .categories
            .iter()
            .map(|(sku, category)| (normalize_sku(sku), category.clone()))
            .collect();
        let seasonality = SeasonalityModel::build(&aggregation.series, &categories);

        let outcomes: Vec<_> = aggregation
            .series
            .par_iter()
            .map(|series| {
                let profile = seasonality.profile_for(series.sku());
                (
                    series.sku().to_string(),
                    self.forecaster.forecast_cached(cache, series, &profile),
                )
            })
            .collect();

        let mut forecasts = Vec::with_capacity(outcomes.len());
        for (sku, outcome) in outcomes {
            match outcome {
                Ok(outcome) => {
                    diagnostics.extend(outcome.diagnostics.iter().cloned());
                    if let Some(forecast) = &outcome.forecast {
                        forecasts.push(forecast.clone());
                    }
                }
                Err(err) => {
                    warn!(sku = %sku, error = %err, "Forecast failed");
                    let failure = SkuFailure {
                        sku,
                        reason: err.to_string(),
                    };
                    diagnostics.push(failure_diagnostic(&failure));
                    failures.push(failure);
                }
            }
        }

        let lead_times = self.estimator.estimate_from_history(
            &inputs.po_lines,
            &inputs.receipts,
            &inputs.matched_receipts,
            as_of,
        );

        let supply = SupplyBook::build(&inputs.inventory, &inputs.open_orders, &inputs.backorders);
        diagnostics.extend(supply.failures.iter().map(failure_diagnostic));
        failures.extend(supply.failures.iter().cloned());

        let planned: Vec<_> = forecasts
            .par_iter()
            .filter(|f| !supply.is_failed(&f.sku))
            .map(|forecast| {
                let position = supply.position(&forecast.sku);
                (
                    forecast.sku.clone(),
                    self.replenisher.plan_sku(forecast, &lead_times, &position),
                )
            })
            .collect();

        let mut recommendations = Vec::with_capacity(planned.len());
        for (sku, planned) in planned {
            match planned {
                Ok(rec) => {
                    diagnostics.extend(rec.diagnostics.iter().cloned());
                    recommendations.push(rec);
                }
                Err(err) => {
                    warn!(sku = %sku, error = %err, "Replenishment failed");
                    let failure = SkuFailure {
                        sku,
                        reason: err.to_string(),
                    };
                    diagnostics.push(failure_diagnostic(&failure));
                    failures.push(failure);
                }
            }
        }
        sort_plan(&mut recommendations);

        let run = PlanningRun {
            as_of: Some(as_of),
            forecasts,
            recommendations,
            lead_times: lead_times.records().into_iter().cloned().collect(),
            diagnostics,
            failures,
        };

        let summary = run.plan_summary();
        debug!(cached_forecasts = cache.len(), "Forecast cache state");
        info!(
            as_of = %as_of,
            skus = aggregation.series.len(),
            forecasts = run.forecasts.len(),
            to_order = summary.skus_to_order,
            total_units = summary.total_units,
            default_lead_times = summary.default_lead_time_skus,
            failures = run.failures.len(),
            diagnostics = run.diagnostics.len(),
            "Planning run complete"
        );

        Ok(run)
    }
}

fn failure_diagnostic(failure: &SkuFailure) -> Diagnostic {
    Diagnostic::new(
        failure.sku.clone(),
        DiagnosticKind::InvalidRecord,
        failure.reason.clone(),
    )
}
