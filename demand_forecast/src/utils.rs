//! Utility functions for the demand_forecast crate

use crate::error::{ForecastError, Result};
use chrono::{Datelike, Duration, Months, NaiveDate};

/// Canonical SKU form: trimmed, upper-cased, internal whitespace collapsed
pub fn normalize_sku(sku: &str) -> String {
    sku.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

const FNV_OFFSET_BASIS: u64 = 14695981039346656037;
const FNV_PRIME: u64 = 1099511628211;

/// FNV-1a hash of a byte slice
pub fn fnv1a_hash(data: &[u8]) -> u64 {
    let mut hasher = VersionHasher::new();
    hasher.write_bytes(data);
    hasher.finish()
}

/// Incremental FNV-1a hasher used to build input version tokens
///
/// Unlike `std::collections::hash_map::DefaultHasher` the output is stable
/// across processes and releases, so tokens can be persisted by callers.
#[derive(Debug, Clone, Copy)]
pub struct VersionHasher {
    state: u64,
}

impl VersionHasher {
    pub fn new() -> Self {
        Self {
            state: FNV_OFFSET_BASIS,
        }
    }

    /// Continue hashing from a previously produced token
    pub fn seeded(token: u64) -> Self {
        let mut hasher = Self::new();
        hasher.write_u64(token);
        hasher
    }

    pub fn write_bytes(&mut self, data: &[u8]) {
        for &byte in data {
            self.state ^= byte as u64;
            self.state = self.state.wrapping_mul(FNV_PRIME);
        }
    }

    pub fn write_u64(&mut self, value: u64) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_f64(&mut self, value: f64) {
        self.write_u64(value.to_bits());
    }

    pub fn write_str(&mut self, value: &str) {
        self.write_bytes(value.as_bytes());
        // terminator keeps ("ab", "c") and ("a", "bc") apart
        self.write_bytes(&[0xff]);
    }

    pub fn finish(&self) -> u64 {
        self.state
    }
}

impl Default for VersionHasher {
    fn default() -> Self {
        Self::new()
    }
}

/// Split a series at `floor(len * train_ratio)` into training and test parts
pub fn train_test_split(data: &[f64], train_ratio: f64) -> Result<(&[f64], &[f64])> {
    if !(train_ratio > 0.0 && train_ratio < 1.0) {
        return Err(ForecastError::InvalidParameter(format!(
            "Train ratio must be between 0 and 1, got {}",
            train_ratio
        )));
    }

    let split = (data.len() as f64 * train_ratio).floor() as usize;
    Ok(data.split_at(split))
}

/// First day of the month containing `date`
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Calendar months spanned from `first` to `last`, both inclusive
pub fn months_spanned(first: NaiveDate, last: NaiveDate) -> u32 {
    if last < first {
        return 0;
    }
    let months = (last.year() - first.year()) * 12 + last.month() as i32 - first.month() as i32;
    months as u32 + 1
}

/// The `horizon` days following `last`
pub fn future_days(last: NaiveDate, horizon: usize) -> Vec<NaiveDate> {
    (1..=horizon as i64)
        .map(|offset| last + Duration::days(offset))
        .collect()
}

/// The `horizon` month starts following the month of `last`
pub fn future_month_starts(last: NaiveDate, horizon: usize) -> Result<Vec<NaiveDate>> {
    let start = month_start(last);
    (1..=horizon as u32)
        .map(|offset| {
            start.checked_add_months(Months::new(offset)).ok_or_else(|| {
                ForecastError::DataError(format!(
                    "Date overflow adding {} months to {}",
                    offset, start
                ))
            })
        })
        .collect()
}
