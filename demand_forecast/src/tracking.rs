//! Forecast snapshots compared against realized demand
//!
//! Snapshots are plain values; persisting them between runs is the caller's
//! business.

use crate::backtest::ConfidenceLevel;
use crate::data::DemandObservation;
use crate::forecaster::DemandForecast;
use crate::metrics::percentage_error;
use crate::models::ForecastMethod;
use crate::utils::normalize_sku;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A forecast as it stood on a given date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSnapshot {
    pub sku: String,
    pub snapshot_date: NaiveDate,
    pub horizon_days: u32,
    /// Total forecast quantity over the horizon
    pub forecast_total_qty: f64,
    pub method: ForecastMethod,
    pub confidence: ConfidenceLevel,
}

impl ForecastSnapshot {
    /// Capture a forecast on `snapshot_date`
    pub fn from_forecast(forecast: &DemandForecast, snapshot_date: NaiveDate) -> Self {
        Self {
            sku: forecast.sku.clone(),
            snapshot_date,
            horizon_days: forecast.horizon_days,
            forecast_total_qty: forecast.total_qty(),
            method: forecast.method,
            confidence: forecast.confidence.level,
        }
    }

    /// Last day covered by the snapshot
    pub fn period_end(&self) -> NaiveDate {
        self.snapshot_date + Duration::days(self.horizon_days as i64)
    }
}

/// One snapshot measured against what actually shipped
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastComparison {
    pub sku: String,
    pub snapshot_date: NaiveDate,
    pub horizon_days: u32,
    pub forecast_total_qty: f64,
    pub actual_qty: f64,
    /// `actual - forecast`
    pub error: f64,
    pub abs_error: f64,
    pub pct_error: f64,
    pub abs_pct_error: f64,
    pub method: ForecastMethod,
    pub confidence: ConfidenceLevel,
}

/// Compare every elapsed snapshot with actual demand
///
/// A snapshot is compared once its whole horizon lies on or before `as_of`.
/// Actual demand is the sum of positive shipments after the snapshot date up
/// to and including the end of its horizon; a SKU with no shipments in the
/// window has an actual of zero.
pub fn compare_forecast_vs_actual(
    snapshots: &[ForecastSnapshot],
    actuals: &[DemandObservation],
    as_of: NaiveDate,
) -> Vec<ForecastComparison> {
    let mut by_sku: HashMap<String, Vec<(NaiveDate, f64)>> = HashMap::new();
    for row in actuals.iter().filter(|r| r.quantity > 0.0) {
        by_sku
            .entry(normalize_sku(&row.sku))
            .or_default()
            .push((row.date, row.quantity));
    }

    snapshots
        .iter()
        .filter(|s| s.period_end() <= as_of)
        .map(|snapshot| {
            let end = snapshot.period_end();
            let actual_qty: f64 = by_sku
                .get(&normalize_sku(&snapshot.sku))
                .map(|rows| {
                    rows.iter()
                        .filter(|(date, _)| *date > snapshot.snapshot_date && *date <= end)
                        .map(|(_, qty)| qty)
                        .sum()
                })
                .unwrap_or(0.0);

            let error = actual_qty - snapshot.forecast_total_qty;
            let pct_error = percentage_error(snapshot.forecast_total_qty, actual_qty);
            ForecastComparison {
                sku: snapshot.sku.clone(),
                snapshot_date: snapshot.snapshot_date,
                horizon_days: snapshot.horizon_days,
                forecast_total_qty: snapshot.forecast_total_qty,
                actual_qty,
                error,
                abs_error: error.abs(),
                pct_error,
                abs_pct_error: pct_error.abs(),
                method: snapshot.method,
                confidence: snapshot.confidence,
            }
        })
        .collect()
}

/// Whether forecasts ran high or low in aggregate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BiasDirection {
    OverForecasting,
    UnderForecasting,
    Neutral,
}

impl fmt::Display for BiasDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BiasDirection::OverForecasting => write!(f, "Over-forecasting"),
            BiasDirection::UnderForecasting => write!(f, "Under-forecasting"),
            BiasDirection::Neutral => write!(f, "Neutral"),
        }
    }
}

/// Aggregate bias over a set of comparisons
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastBias {
    pub total_forecast: f64,
    pub total_actual: f64,
    /// `(forecast - actual) / actual * 100`, 0 without actual demand
    pub bias_pct: f64,
    pub direction: BiasDirection,
    pub avg_pct_error: f64,
    pub avg_abs_pct_error: f64,
    pub comparisons: usize,
}

/// Bias summary, `None` for an empty comparison set
pub fn forecast_bias(comparisons: &[ForecastComparison]) -> Option<ForecastBias> {
    if comparisons.is_empty() {
        return None;
    }

    let n = comparisons.len() as f64;
    let total_forecast: f64 = comparisons.iter().map(|c| c.forecast_total_qty).sum();
    let total_actual: f64 = comparisons.iter().map(|c| c.actual_qty).sum();
    let bias_pct = if total_actual > 0.0 {
        (total_forecast - total_actual) / total_actual * 100.0
    } else {
        0.0
    };

    let direction = if bias_pct > 0.0 {
        BiasDirection::OverForecasting
    } else if bias_pct < 0.0 {
        BiasDirection::UnderForecasting
    } else {
        BiasDirection::Neutral
    };

    Some(ForecastBias {
        total_forecast,
        total_actual,
        bias_pct,
        direction,
        avg_pct_error: comparisons.iter().map(|c| c.pct_error).sum::<f64>() / n,
        avg_abs_pct_error: comparisons.iter().map(|c| c.abs_pct_error).sum::<f64>() / n,
        comparisons: comparisons.len(),
    })
}
