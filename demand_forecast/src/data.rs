//! Demand records and their aggregation into per-SKU series

use crate::error::{ForecastError, Result};
use crate::utils::{month_start, normalize_sku, VersionHasher};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// Category used for SKUs with no category mapping
pub const UNCATEGORIZED: &str = "Uncategorized";

/// One shipment event as delivered by the ingestion layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandObservation {
    /// Stock keeping unit identifier
    pub sku: String,
    /// Shipment date
    pub date: NaiveDate,
    /// Quantity shipped
    pub quantity: f64,
}

impl DemandObservation {
    pub fn new(sku: impl Into<String>, date: NaiveDate, quantity: f64) -> Self {
        Self {
            sku: sku.into(),
            date,
            quantity,
        }
    }
}

/// A single aggregated period of demand
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DemandPoint {
    /// Period date (first of the month for monthly series)
    pub date: NaiveDate,
    /// Total quantity in the period
    pub quantity: f64,
}

/// Period length of a demand series
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Daily,
    Monthly,
}

impl Granularity {
    /// Days represented by one period
    pub fn days_per_period(&self) -> f64 {
        match self {
            Granularity::Daily => 1.0,
            Granularity::Monthly => 30.0,
        }
    }

    /// Collapse a date to the start of its period
    pub fn period_start(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Granularity::Daily => date,
            Granularity::Monthly => month_start(date),
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Granularity::Daily => write!(f, "daily"),
            Granularity::Monthly => write!(f, "monthly"),
        }
    }
}

impl FromStr for Granularity {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "daily" | "d" | "1d" => Ok(Granularity::Daily),
            "monthly" | "m" | "1m" => Ok(Granularity::Monthly),
            other => Err(ForecastError::InvalidParameter(format!(
                "Unsupported granularity: {}",
                other
            ))),
        }
    }
}

/// Chronologically ordered demand for one SKU, one point per period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandSeries {
    sku: String,
    granularity: Granularity,
    points: Vec<DemandPoint>,
}

impl DemandSeries {
    /// Create a series, checking ordering and quantities
    pub fn new(
        sku: impl Into<String>,
        granularity: Granularity,
        points: Vec<DemandPoint>,
    ) -> Result<Self> {
        let sku = sku.into();
        if sku.trim().is_empty() {
            return Err(ForecastError::ValidationError(
                "SKU identifier must not be empty".to_string(),
            ));
        }

        for pair in points.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(ForecastError::ValidationError(format!(
                    "Series for {} is not strictly increasing at {}",
                    sku, pair[1].date
                )));
            }
        }

        if let Some(bad) = points
            .iter()
            .find(|p| !p.quantity.is_finite() || p.quantity < 0.0)
        {
            return Err(ForecastError::InvalidRecord {
                sku,
                reason: format!("quantity {} on {} is not a valid demand", bad.quantity, bad.date),
            });
        }

        Ok(Self {
            sku,
            granularity,
            points,
        })
    }

    /// Build a series from `(date, quantity)` pairs already in order
    pub fn from_pairs(
        sku: impl Into<String>,
        granularity: Granularity,
        pairs: impl IntoIterator<Item = (NaiveDate, f64)>,
    ) -> Result<Self> {
        let points = pairs
            .into_iter()
            .map(|(date, quantity)| DemandPoint { date, quantity })
            .collect();
        Self::new(sku, granularity, points)
    }

    pub fn sku(&self) -> &str {
        &self.sku
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn points(&self) -> &[DemandPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Quantities in date order
    pub fn quantities(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.quantity).collect()
    }

    /// Dates in order
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    /// Sum of all quantities
    pub fn total_volume(&self) -> f64 {
        self.points.iter().map(|p| p.quantity).sum()
    }

    /// Roll a daily series up to calendar months
    pub fn to_monthly(&self) -> DemandSeries {
        if self.granularity == Granularity::Monthly {
            return self.clone();
        }

        let mut buckets: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for point in &self.points {
            *buckets.entry(month_start(point.date)).or_insert(0.0) += point.quantity;
        }

        DemandSeries {
            sku: self.sku.clone(),
            granularity: Granularity::Monthly,
            points: buckets
                .into_iter()
                .map(|(date, quantity)| DemandPoint { date, quantity })
                .collect(),
        }
    }

    /// Keep only points within `window_days` days ending at `as_of` (inclusive)
    pub fn trailing_window(&self, as_of: NaiveDate, window_days: u32) -> DemandSeries {
        let start = as_of - Duration::days(window_days as i64);
        DemandSeries {
            sku: self.sku.clone(),
            granularity: self.granularity,
            points: self
                .points
                .iter()
                .filter(|p| p.date > start && p.date <= as_of)
                .copied()
                .collect(),
        }
    }

    /// Stable content hash over granularity, dates and quantities
    pub fn version_token(&self) -> u64 {
        let mut hasher = VersionHasher::new();
        hasher.write_str(&self.sku);
        hasher.write_str(&self.granularity.to_string());
        for point in &self.points {
            hasher.write_str(&point.date.to_string());
            hasher.write_f64(point.quantity);
        }
        hasher.finish()
    }
}

/// A SKU excluded from processing because of malformed input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkuFailure {
    pub sku: String,
    pub reason: String,
}

impl From<ForecastError> for SkuFailure {
    fn from(err: ForecastError) -> Self {
        match err {
            ForecastError::InvalidRecord { sku, reason } => SkuFailure { sku, reason },
            other => SkuFailure {
                sku: String::new(),
                reason: other.to_string(),
            },
        }
    }
}

/// Output of [`aggregate_shipments`]
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    /// One series per valid SKU, ordered by SKU
    pub series: Vec<DemandSeries>,
    /// SKUs dropped because of malformed rows
    pub failures: Vec<SkuFailure>,
}

fn validate_row(sku: &str, row: &DemandObservation) -> Result<()> {
    if sku.is_empty() {
        return Err(ForecastError::InvalidRecord {
            sku: row.sku.clone(),
            reason: format!("empty SKU identifier on {}", row.date),
        });
    }
    if !row.quantity.is_finite() || row.quantity < 0.0 {
        return Err(ForecastError::InvalidRecord {
            sku: sku.to_string(),
            reason: format!("quantity {} on {} is not a valid demand", row.quantity, row.date),
        });
    }
    Ok(())
}

/// Group shipment rows by `(sku, period)`, summing quantities
///
/// A malformed row fails its SKU only. SKUs with no rows produce no series.
pub fn aggregate_shipments(rows: &[DemandObservation], granularity: Granularity) -> Aggregation {
    let mut buckets: BTreeMap<String, BTreeMap<NaiveDate, f64>> = BTreeMap::new();
    let mut failed: BTreeMap<String, String> = BTreeMap::new();

    for row in rows {
        let sku = normalize_sku(&row.sku);
        if let Err(err) = validate_row(&sku, row) {
            warn!(sku = %sku, error = %err, "Rejecting shipment row");
            failed.entry(sku).or_insert_with(|| match err {
                ForecastError::InvalidRecord { reason, .. } => reason,
                other => other.to_string(),
            });
            continue;
        }

        *buckets
            .entry(sku)
            .or_default()
            .entry(granularity.period_start(row.date))
            .or_insert(0.0) += row.quantity;
    }

    let mut aggregation = Aggregation::default();
    for (sku, periods) in buckets {
        if failed.contains_key(&sku) {
            continue;
        }
        aggregation.series.push(DemandSeries {
            sku,
            granularity,
            points: periods
                .into_iter()
                .map(|(date, quantity)| DemandPoint { date, quantity })
                .collect(),
        });
    }
    aggregation.failures = failed
        .into_iter()
        .map(|(sku, reason)| SkuFailure { sku, reason })
        .collect();

    debug!(
        rows = rows.len(),
        skus = aggregation.series.len(),
        failures = aggregation.failures.len(),
        "Aggregated shipments"
    );
    aggregation
}

/// Sum SKU series into one series per category
///
/// SKUs missing from `categories` land in [`UNCATEGORIZED`]. Keys of
/// `categories` are expected in normalized form.
pub fn aggregate_by_category(
    series: &[DemandSeries],
    categories: &HashMap<String, String>,
) -> Vec<DemandSeries> {
    let mut buckets: BTreeMap<(String, Granularity), BTreeMap<NaiveDate, f64>> = BTreeMap::new();

    for s in series {
        let category = category_of(s.sku(), categories).to_string();
        let periods = buckets.entry((category, s.granularity())).or_default();
        for point in s.points() {
            *periods.entry(point.date).or_insert(0.0) += point.quantity;
        }
    }

    buckets
        .into_iter()
        .map(|((category, granularity), periods)| DemandSeries {
            sku: category,
            granularity,
            points: periods
                .into_iter()
                .map(|(date, quantity)| DemandPoint { date, quantity })
                .collect(),
        })
        .collect()
}

/// Category for a SKU, defaulting to [`UNCATEGORIZED`]
pub fn category_of<'a>(sku: &str, categories: &'a HashMap<String, String>) -> &'a str {
    categories
        .get(sku)
        .map(String::as_str)
        .filter(|c| !c.trim().is_empty())
        .unwrap_or(UNCATEGORIZED)
}
