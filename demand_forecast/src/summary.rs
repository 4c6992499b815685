//! Dashboard-style aggregates over a set of forecasts

use crate::backtest::ConfidenceLevel;
use crate::forecaster::DemandForecast;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Totals, breakdowns and leaders across forecasts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSummary {
    pub total_skus: usize,
    pub total_forecast_demand: f64,
    /// Mean backtest MAPE over SKUs that could be backtested
    pub avg_mape: Option<f64>,
    pub high_confidence: usize,
    pub medium_confidence: usize,
    pub low_confidence: usize,
    pub very_low_confidence: usize,
    /// Count per pattern label, e.g. "Stable & Flat"
    pub patterns: BTreeMap<String, usize>,
    /// Largest total forecasts, descending
    pub top_skus: Vec<SkuTotal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkuTotal {
    pub sku: String,
    pub forecast_total_qty: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkuAccuracy {
    pub sku: String,
    pub mape: f64,
}

/// Summarize forecasts, listing the `top_n` largest by total quantity
pub fn summarize_forecasts(forecasts: &[DemandForecast], top_n: usize) -> ForecastSummary {
    let count_level = |level: ConfidenceLevel| {
        forecasts
            .iter()
            .filter(|f| f.confidence.level == level)
            .count()
    };

    let mapes: Vec<f64> = forecasts
        .iter()
        .filter_map(|f| f.accuracy.map(|a| a.mape))
        .collect();
    let avg_mape = if mapes.is_empty() {
        None
    } else {
        Some(mapes.iter().sum::<f64>() / mapes.len() as f64)
    };

    let mut patterns = BTreeMap::new();
    for f in forecasts {
        *patterns.entry(f.pattern.to_string()).or_insert(0) += 1;
    }

    let mut totals: Vec<SkuTotal> = forecasts
        .iter()
        .map(|f| SkuTotal {
            sku: f.sku.clone(),
            forecast_total_qty: f.total_qty(),
        })
        .collect();
    totals.sort_by(|a, b| {
        b.forecast_total_qty
            .total_cmp(&a.forecast_total_qty)
            .then_with(|| a.sku.cmp(&b.sku))
    });
    totals.truncate(top_n);

    ForecastSummary {
        total_skus: forecasts.len(),
        total_forecast_demand: forecasts.iter().map(|f| f.total_qty()).sum(),
        avg_mape,
        high_confidence: count_level(ConfidenceLevel::High),
        medium_confidence: count_level(ConfidenceLevel::Medium),
        low_confidence: count_level(ConfidenceLevel::Low),
        very_low_confidence: count_level(ConfidenceLevel::VeryLow),
        patterns,
        top_skus: totals,
    }
}

/// Best (lowest MAPE) and worst (highest MAPE) `top_n` SKUs
///
/// SKUs without backtest metrics are not ranked.
pub fn accuracy_rankings(
    forecasts: &[DemandForecast],
    top_n: usize,
) -> (Vec<SkuAccuracy>, Vec<SkuAccuracy>) {
    let mut ranked: Vec<SkuAccuracy> = forecasts
        .iter()
        .filter_map(|f| {
            f.accuracy.map(|a| SkuAccuracy {
                sku: f.sku.clone(),
                mape: a.mape,
            })
        })
        .collect();
    ranked.sort_by(|a, b| a.mape.total_cmp(&b.mape).then_with(|| a.sku.cmp(&b.sku)));

    let best = ranked.iter().take(top_n).cloned().collect();
    let worst = ranked.iter().rev().take(top_n).cloned().collect();
    (best, worst)
}
