//! Vendor lead time from purchase-order and receipt history
//!
//! A PO line is matched to the earliest receipt of the same `(po_number, sku)`
//! on or after its creation date. The lead time of a SKU is the median delay
//! of its matched lines plus a fixed buffer. SKUs with fewer than two matches
//! get no computed record and fall back to a vendor estimate (when enabled)
//! or to the default lead time.

use crate::{PlanningError, Result};
use chrono::{Days, NaiveDate};
use demand_forecast::utils::normalize_sku;
use demand_forecast::{Diagnostic, DiagnosticKind};
use plan_math::stats::median;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tracing::debug;

/// Lead time used when a SKU has no usable history
pub const DEFAULT_LEAD_TIME_DAYS: f64 = 90.0;

/// Safety buffer added to every computed median
pub const LEAD_TIME_BUFFER_DAYS: f64 = 5.0;

/// How far back PO and receipt history is considered
pub const LEAD_TIME_LOOKBACK_DAYS: u32 = 730;

/// Longest accepted lookback, one hundred years
pub const MAX_LEAD_TIME_LOOKBACK_DAYS: u32 = 36_500;

/// Matches needed before a lead time is computed
pub const MIN_MATCHES_FOR_ESTIMATE: usize = 2;

/// Matches needed for High confidence
pub const HIGH_CONFIDENCE_MATCHES: usize = 5;

/// Trust in a lead time, from the number of matched POs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadTimeConfidence {
    Low,
    Medium,
    High,
}

impl LeadTimeConfidence {
    /// High for 5 or more matches, Medium for 2 to 4, Low otherwise
    pub fn from_match_count(matches: usize) -> Self {
        if matches >= HIGH_CONFIDENCE_MATCHES {
            LeadTimeConfidence::High
        } else if matches >= MIN_MATCHES_FOR_ESTIMATE {
            LeadTimeConfidence::Medium
        } else {
            LeadTimeConfidence::Low
        }
    }
}

impl fmt::Display for LeadTimeConfidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeadTimeConfidence::High => write!(f, "High"),
            LeadTimeConfidence::Medium => write!(f, "Medium"),
            LeadTimeConfidence::Low => write!(f, "Low"),
        }
    }
}

/// Where a resolved lead time came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadTimeSource {
    /// The SKU's own PO history
    Computed,
    /// The median across the SKU's vendor
    Vendor,
    /// No usable history; the configured default
    Default,
}

impl fmt::Display for LeadTimeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeadTimeSource::Computed => write!(f, "computed"),
            LeadTimeSource::Vendor => write!(f, "vendor"),
            LeadTimeSource::Default => write!(f, "default"),
        }
    }
}

/// A PO line as placed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseOrderLine {
    pub po_number: String,
    pub sku: String,
    #[serde(default)]
    pub vendor: Option<String>,
    pub created: NaiveDate,
}

/// A receipt posted against a PO
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptLine {
    pub po_number: String,
    pub sku: String,
    pub received: NaiveDate,
}

/// A PO already paired with its receipt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoReceiptPair {
    pub sku: String,
    #[serde(default)]
    pub vendor: Option<String>,
    pub po_creation_date: NaiveDate,
    pub receipt_date: NaiveDate,
}

impl PoReceiptPair {
    pub fn new(sku: impl Into<String>, po_creation_date: NaiveDate, receipt_date: NaiveDate) -> Self {
        Self {
            sku: sku.into(),
            vendor: None,
            po_creation_date,
            receipt_date,
        }
    }

    /// Days from PO creation to receipt
    pub fn delay_days(&self) -> i64 {
        (self.receipt_date - self.po_creation_date).num_days()
    }
}

/// Computed lead time for one SKU
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadTimeRecord {
    pub sku: String,
    pub lead_time_days: f64,
    pub po_match_count: usize,
    pub confidence: LeadTimeConfidence,
}

/// Computed lead time across a vendor's SKUs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorLeadTime {
    pub vendor: String,
    pub lead_time_days: f64,
    pub po_match_count: usize,
    pub confidence: LeadTimeConfidence,
}

/// Lead time the planner will use, with its provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLeadTime {
    pub sku: String,
    pub lead_time_days: f64,
    pub source: LeadTimeSource,
    pub confidence: LeadTimeConfidence,
    /// Matched POs of the SKU itself
    pub po_match_count: usize,
    /// Vendor whose estimate was used, for `LeadTimeSource::Vendor`
    pub vendor: Option<String>,
    pub diagnostic: Option<Diagnostic>,
}

impl ResolvedLeadTime {
    pub fn is_default(&self) -> bool {
        self.source == LeadTimeSource::Default
    }
}

/// Estimator parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeadTimeSettings {
    pub lookback_days: u32,
    pub buffer_days: f64,
    pub default_lead_time_days: f64,
    /// Fall back to the vendor median before the default
    pub vendor_fallback: bool,
}

impl Default for LeadTimeSettings {
    fn default() -> Self {
        Self {
            lookback_days: LEAD_TIME_LOOKBACK_DAYS,
            buffer_days: LEAD_TIME_BUFFER_DAYS,
            default_lead_time_days: DEFAULT_LEAD_TIME_DAYS,
            vendor_fallback: false,
        }
    }
}

impl LeadTimeSettings {
    pub fn validate(&self) -> Result<()> {
        if self.lookback_days == 0 {
            return Err(PlanningError::InvalidParameter(
                "Lead time lookback must be at least one day".to_string(),
            ));
        }
        if self.lookback_days > MAX_LEAD_TIME_LOOKBACK_DAYS {
            return Err(PlanningError::InvalidParameter(format!(
                "Lead time lookback must be at most {} days, got {}",
                MAX_LEAD_TIME_LOOKBACK_DAYS, self.lookback_days
            )));
        }
        if !self.buffer_days.is_finite() || self.buffer_days < 0.0 {
            return Err(PlanningError::InvalidParameter(format!(
                "Lead time buffer must be non-negative, got {}",
                self.buffer_days
            )));
        }
        if !self.default_lead_time_days.is_finite() || self.default_lead_time_days <= 0.0 {
            return Err(PlanningError::InvalidParameter(format!(
                "Default lead time must be positive, got {}",
                self.default_lead_time_days
            )));
        }
        Ok(())
    }
}

/// Builds a [`LeadTimeTable`] from PO history
#[derive(Debug, Clone)]
pub struct LeadTimeEstimator {
    settings: LeadTimeSettings,
}

impl LeadTimeEstimator {
    pub fn new(settings: LeadTimeSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self { settings })
    }

    pub fn settings(&self) -> &LeadTimeSettings {
        &self.settings
    }

    /// First day of the history window ending at `as_of`
    ///
    /// Saturates at the earliest representable date.
    pub fn window_start(&self, as_of: NaiveDate) -> NaiveDate {
        as_of
            .checked_sub_days(Days::new(u64::from(self.settings.lookback_days)))
            .unwrap_or(NaiveDate::MIN)
    }

    fn in_window(&self, date: NaiveDate, as_of: NaiveDate) -> bool {
        date >= self.window_start(as_of) && date <= as_of
    }

    /// Pair PO lines with receipts inside the lookback window
    ///
    /// Repeated lines of the same `(po_number, sku)` count once, at their
    /// earliest creation date.
    pub fn match_receipts(
        &self,
        po_lines: &[PurchaseOrderLine],
        receipts: &[ReceiptLine],
        as_of: NaiveDate,
    ) -> Vec<PoReceiptPair> {
        let mut received: HashMap<(String, String), Vec<NaiveDate>> = HashMap::new();
        for receipt in receipts.iter().filter(|r| self.in_window(r.received, as_of)) {
            received
                .entry((receipt.po_number.trim().to_string(), normalize_sku(&receipt.sku)))
                .or_default()
                .push(receipt.received);
        }
        for dates in received.values_mut() {
            dates.sort();
        }

        let mut placed: BTreeMap<(String, String), &PurchaseOrderLine> = BTreeMap::new();
        for line in po_lines.iter().filter(|l| self.in_window(l.created, as_of)) {
            let key = (line.po_number.trim().to_string(), normalize_sku(&line.sku));
            placed
                .entry(key)
                .and_modify(|existing| {
                    if line.created < existing.created {
                        *existing = line;
                    }
                })
                .or_insert(line);
        }

        placed
            .into_iter()
            .filter_map(|(key, line)| {
                let receipt_date = received
                    .get(&key)?
                    .iter()
                    .find(|&&date| date >= line.created)?;
                Some(PoReceiptPair {
                    sku: key.1,
                    vendor: line.vendor.clone(),
                    po_creation_date: line.created,
                    receipt_date: *receipt_date,
                })
            })
            .collect()
    }

    /// Lead times from matched pairs
    ///
    /// Pairs outside the lookback window or with a negative delay are
    /// ignored.
    pub fn estimate(&self, pairs: &[PoReceiptPair], as_of: NaiveDate) -> LeadTimeTable {
        let mut by_sku: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        let mut by_vendor: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        let mut sku_vendors: HashMap<String, (NaiveDate, String)> = HashMap::new();

        for pair in pairs {
            if !self.in_window(pair.po_creation_date, as_of)
                || !self.in_window(pair.receipt_date, as_of)
                || pair.delay_days() < 0
            {
                continue;
            }
            let sku = normalize_sku(&pair.sku);
            if sku.is_empty() {
                continue;
            }
            let delay = pair.delay_days() as f64;
            by_sku.entry(sku.clone()).or_default().push(delay);

            if let Some(vendor) = pair.vendor.as_deref().map(str::trim).filter(|v| !v.is_empty())
            {
                by_vendor.entry(vendor.to_string()).or_default().push(delay);
                // latest PO names the SKU's current vendor
                let newer = sku_vendors
                    .get(&sku)
                    .map_or(true, |(date, _)| pair.po_creation_date >= *date);
                if newer {
                    sku_vendors.insert(sku, (pair.po_creation_date, vendor.to_string()));
                }
            }
        }

        let buffer = self.settings.buffer_days;
        let mut match_counts = HashMap::new();
        let mut skus = HashMap::new();
        for (sku, delays) in by_sku {
            match_counts.insert(sku.clone(), delays.len());
            if let Some(lead_time_days) = buffered_median(&delays, buffer) {
                skus.insert(
                    sku.clone(),
                    LeadTimeRecord {
                        sku,
                        lead_time_days,
                        po_match_count: delays.len(),
                        confidence: LeadTimeConfidence::from_match_count(delays.len()),
                    },
                );
            }
        }

        let mut vendors = HashMap::new();
        for (vendor, delays) in by_vendor {
            if let Some(lead_time_days) = buffered_median(&delays, buffer) {
                vendors.insert(
                    vendor.clone(),
                    VendorLeadTime {
                        vendor,
                        lead_time_days,
                        po_match_count: delays.len(),
                        confidence: LeadTimeConfidence::from_match_count(delays.len()),
                    },
                );
            }
        }

        debug!(
            skus = skus.len(),
            vendors = vendors.len(),
            pairs = pairs.len(),
            "Estimated lead times"
        );

        LeadTimeTable {
            skus,
            vendors,
            match_counts,
            sku_vendors: sku_vendors
                .into_iter()
                .map(|(sku, (_, vendor))| (sku, vendor))
                .collect(),
            default_lead_time_days: self.settings.default_lead_time_days,
            vendor_fallback: self.settings.vendor_fallback,
        }
    }

    /// Match raw lines, add any pre-matched pairs, and estimate
    pub fn estimate_from_history(
        &self,
        po_lines: &[PurchaseOrderLine],
        receipts: &[ReceiptLine],
        matched: &[PoReceiptPair],
        as_of: NaiveDate,
    ) -> LeadTimeTable {
        let mut pairs = self.match_receipts(po_lines, receipts, as_of);
        pairs.extend_from_slice(matched);
        self.estimate(&pairs, as_of)
    }
}

fn buffered_median(delays: &[f64], buffer: f64) -> Option<f64> {
    if delays.len() < MIN_MATCHES_FOR_ESTIMATE {
        return None;
    }
    median(delays).map(|m| m + buffer)
}

/// Lead times by SKU and vendor, resolved with a default
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeadTimeTable {
    skus: HashMap<String, LeadTimeRecord>,
    vendors: HashMap<String, VendorLeadTime>,
    match_counts: HashMap<String, usize>,
    sku_vendors: HashMap<String, String>,
    default_lead_time_days: f64,
    vendor_fallback: bool,
}

impl LeadTimeTable {
    /// An empty table: every SKU resolves to `default_lead_time_days`
    pub fn empty(default_lead_time_days: f64) -> Self {
        Self {
            default_lead_time_days,
            ..Self::default()
        }
    }

    pub fn record(&self, sku: &str) -> Option<&LeadTimeRecord> {
        self.skus.get(&normalize_sku(sku))
    }

    /// Computed records, ordered by SKU
    pub fn records(&self) -> Vec<&LeadTimeRecord> {
        let mut records: Vec<_> = self.skus.values().collect();
        records.sort_by(|a, b| a.sku.cmp(&b.sku));
        records
    }

    pub fn vendor_record(&self, vendor: &str) -> Option<&VendorLeadTime> {
        self.vendors.get(vendor.trim())
    }

    /// Matched POs seen for a SKU, including SKUs below the estimate floor
    pub fn match_count(&self, sku: &str) -> usize {
        self.match_counts
            .get(&normalize_sku(sku))
            .copied()
            .unwrap_or(0)
    }

    /// Vendor on the SKU's most recent matched PO
    pub fn vendor_for(&self, sku: &str) -> Option<&str> {
        self.sku_vendors.get(&normalize_sku(sku)).map(String::as_str)
    }

    pub fn default_lead_time_days(&self) -> f64 {
        self.default_lead_time_days
    }

    /// Lead time for a SKU: its own record, then its vendor, then the default
    ///
    /// Anything but a computed record carries a `MissingLeadTimeHistory`
    /// diagnostic. Confidence follows the SKU's own match count.
    pub fn resolve(&self, sku: &str, vendor: Option<&str>) -> ResolvedLeadTime {
        let key = normalize_sku(sku);
        let matches = self.match_count(&key);

        if let Some(record) = self.skus.get(&key) {
            return ResolvedLeadTime {
                sku: key,
                lead_time_days: record.lead_time_days,
                source: LeadTimeSource::Computed,
                confidence: record.confidence,
                po_match_count: record.po_match_count,
                vendor: None,
                diagnostic: None,
            };
        }

        if self.vendor_fallback {
            let vendor_estimate = vendor
                .or_else(|| self.vendor_for(&key))
                .and_then(|v| self.vendor_record(v));
            if let Some(estimate) = vendor_estimate {
                let message = format!(
                    "{} matched POs for the SKU; using vendor {} median of {:.1} days",
                    matches, estimate.vendor, estimate.lead_time_days
                );
                return ResolvedLeadTime {
                    diagnostic: Some(Diagnostic::new(
                        key.clone(),
                        DiagnosticKind::MissingLeadTimeHistory,
                        message,
                    )),
                    sku: key,
                    lead_time_days: estimate.lead_time_days,
                    source: LeadTimeSource::Vendor,
                    confidence: LeadTimeConfidence::from_match_count(matches),
                    po_match_count: matches,
                    vendor: Some(estimate.vendor.clone()),
                };
            }
        }

        let message = format!(
            "{} matched POs; default lead time of {} days applied",
            matches, self.default_lead_time_days
        );
        ResolvedLeadTime {
            diagnostic: Some(Diagnostic::new(
                key.clone(),
                DiagnosticKind::MissingLeadTimeHistory,
                message,
            )),
            sku: key,
            lead_time_days: self.default_lead_time_days,
            source: LeadTimeSource::Default,
            confidence: LeadTimeConfidence::Low,
            po_match_count: matches,
            vendor: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::Duration;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn estimator() -> LeadTimeEstimator {
        LeadTimeEstimator::new(LeadTimeSettings::default()).unwrap()
    }

    fn pairs_with_delays(sku: &str, delays: &[i64]) -> Vec<PoReceiptPair> {
        delays
            .iter()
            .enumerate()
            .map(|(i, &d)| {
                let created = date(2024, 1, 1) + Duration::days(i as i64 * 7);
                PoReceiptPair::new(sku, created, created + Duration::days(d))
            })
            .collect()
    }

    #[rstest]
    #[case(0, LeadTimeConfidence::Low)]
    #[case(1, LeadTimeConfidence::Low)]
    #[case(2, LeadTimeConfidence::Medium)]
    #[case(4, LeadTimeConfidence::Medium)]
    #[case(5, LeadTimeConfidence::High)]
    #[case(40, LeadTimeConfidence::High)]
    fn test_confidence_from_matches(#[case] matches: usize, #[case] expected: LeadTimeConfidence) {
        assert_eq!(LeadTimeConfidence::from_match_count(matches), expected);
    }

    #[test]
    fn test_even_count_keeps_fractional_median() {
        let table = estimator().estimate(&pairs_with_delays("A", &[10, 11]), date(2024, 6, 1));
        assert_abs_diff_eq!(table.record("A").unwrap().lead_time_days, 15.5);
    }

    #[test]
    fn test_single_match_has_no_record() {
        let table = estimator().estimate(&pairs_with_delays("A", &[12]), date(2024, 6, 1));
        assert!(table.record("A").is_none());
        assert_eq!(table.match_count("a"), 1);

        let resolved = table.resolve("A", None);
        assert!(resolved.is_default());
        assert_eq!(resolved.po_match_count, 1);
        assert_eq!(resolved.confidence, LeadTimeConfidence::Low);
    }

    #[test]
    fn test_negative_and_stale_pairs_are_dropped() {
        let as_of = date(2024, 6, 1);
        let mut pairs = pairs_with_delays("A", &[10, 10]);
        pairs.push(PoReceiptPair::new("A", date(2024, 3, 10), date(2024, 3, 1)));
        pairs.push(PoReceiptPair::new("A", date(2021, 1, 1), date(2021, 3, 1)));

        let table = estimator().estimate(&pairs, as_of);
        let record = table.record("A").unwrap();
        assert_eq!(record.po_match_count, 2);
        assert_abs_diff_eq!(record.lead_time_days, 15.0);
    }

    #[test]
    fn test_match_uses_earliest_receipt_after_creation() {
        let po_lines = vec![
            PurchaseOrderLine {
                po_number: "PO-1".to_string(),
                sku: "a".to_string(),
                vendor: None,
                created: date(2024, 2, 1),
            },
            PurchaseOrderLine {
                po_number: "PO-2".to_string(),
                sku: "A".to_string(),
                vendor: None,
                created: date(2024, 2, 1),
            },
        ];
        let receipts = vec![
            ReceiptLine {
                po_number: "PO-1".to_string(),
                sku: "A".to_string(),
                received: date(2024, 1, 20), // before creation
            },
            ReceiptLine {
                po_number: "PO-1".to_string(),
                sku: "A".to_string(),
                received: date(2024, 2, 21),
            },
            ReceiptLine {
                po_number: "PO-1".to_string(),
                sku: "A".to_string(),
                received: date(2024, 2, 11),
            },
            ReceiptLine {
                po_number: "PO-9".to_string(),
                sku: "A".to_string(),
                received: date(2024, 2, 11),
            },
        ];
        let pairs = estimator().match_receipts(&po_lines, &receipts, date(2024, 6, 1));

        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].sku, "A");
        assert_eq!(pairs[0].delay_days(), 10);
    }

    #[test]
    fn test_vendor_fallback_is_opt_in() {
        let mut pairs = pairs_with_delays("A", &[20, 22, 24]);
        pairs.extend(pairs_with_delays("B", &[30]));
        for pair in pairs.iter_mut() {
            pair.vendor = Some("Acme".to_string());
        }
        let as_of = date(2024, 6, 1);

        let table = estimator().estimate(&pairs, as_of);
        assert_eq!(table.resolve("B", None).source, LeadTimeSource::Default);

        let with_vendor = LeadTimeEstimator::new(LeadTimeSettings {
            vendor_fallback: true,
            ..LeadTimeSettings::default()
        })
        .unwrap()
        .estimate(&pairs, as_of);
        let resolved = with_vendor.resolve("B", None);
        assert_eq!(resolved.source, LeadTimeSource::Vendor);
        assert_eq!(resolved.vendor.as_deref(), Some("Acme"));
        // median of 20, 22, 24, 30
        assert_abs_diff_eq!(resolved.lead_time_days, 28.0);
        assert_eq!(resolved.confidence, LeadTimeConfidence::Low);
        assert!(resolved.diagnostic.is_some());
    }

    #[test]
    fn test_invalid_settings() {
        let settings = LeadTimeSettings {
            default_lead_time_days: 0.0,
            ..LeadTimeSettings::default()
        };
        assert!(LeadTimeEstimator::new(settings).is_err());

        let settings = LeadTimeSettings {
            lookback_days: MAX_LEAD_TIME_LOOKBACK_DAYS + 1,
            ..LeadTimeSettings::default()
        };
        assert!(LeadTimeEstimator::new(settings).is_err());
    }

    #[test]
    fn test_window_start_saturates_at_earliest_date() {
        // bypasses validation to reach an unrepresentable window
        let estimator = LeadTimeEstimator {
            settings: LeadTimeSettings {
                lookback_days: u32::MAX,
                ..LeadTimeSettings::default()
            },
        };
        let as_of = date(2024, 6, 1);
        assert_eq!(estimator.window_start(as_of), NaiveDate::MIN);

        let table = estimator.estimate(&pairs_with_delays("A", &[10, 12]), as_of);
        assert_eq!(table.record("A").unwrap().po_match_count, 2);
    }

    #[test]
    fn test_longest_lookback_reaches_old_history() {
        let estimator = LeadTimeEstimator::new(LeadTimeSettings {
            lookback_days: MAX_LEAD_TIME_LOOKBACK_DAYS,
            ..LeadTimeSettings::default()
        })
        .unwrap();
        let pairs = vec![
            PoReceiptPair::new("A", date(1950, 1, 1), date(1950, 1, 11)),
            PoReceiptPair::new("A", date(1960, 1, 1), date(1960, 1, 11)),
        ];
        let table = estimator.estimate(&pairs, date(2024, 6, 1));
        assert_abs_diff_eq!(table.record("A").unwrap().lead_time_days, 15.0);
    }

    #[test]
    fn test_source_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&LeadTimeSource::Default).unwrap(),
            "\"default\""
        );
    }
}
