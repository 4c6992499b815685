//! Caller-owned memoization of forecast outcomes
//!
//! Entries are immutable once written and shared as `Arc`s, so concurrent
//! SKU workers only contend on the write lock for cache misses.

use crate::anomaly::SmoothingPreset;
use crate::error::Result;
use crate::forecaster::ForecastOutcome;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{trace, warn};

/// Identity of a forecast computation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ForecastKey {
    pub sku: String,
    pub preset: SmoothingPreset,
    pub horizon_days: u32,
    /// Hash of the demand series and every other forecast input
    pub input_version: u64,
}

/// Memo map from [`ForecastKey`] to a computed outcome
#[derive(Debug, Default)]
pub struct ForecastCache {
    entries: RwLock<HashMap<ForecastKey, Arc<ForecastOutcome>>>,
}

impl ForecastCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached outcome for `key`, if any
    pub fn get(&self, key: &ForecastKey) -> Option<Arc<ForecastOutcome>> {
        let entries = self.entries.read().unwrap_or_else(|poisoned| {
            warn!("Forecast cache read lock was poisoned, recovering");
            poisoned.into_inner()
        });
        entries.get(key).cloned()
    }

    /// Return the cached outcome or compute, store and return it
    ///
    /// Errors from `compute` are returned and nothing is stored.
    pub fn get_or_try_insert<F>(&self, key: ForecastKey, compute: F) -> Result<Arc<ForecastOutcome>>
    where
        F: FnOnce() -> Result<ForecastOutcome>,
    {
        // Fast path: read-only lock for cache hits
        if let Some(hit) = self.get(&key) {
            trace!(sku = %key.sku, "Forecast cache hit");
            return Ok(hit);
        }

        // compute outside the lock; another worker may race us to the same key
        let outcome = Arc::new(compute()?);
        let mut entries = self.entries.write().unwrap_or_else(|poisoned| {
            warn!("Forecast cache write lock was poisoned, recovering");
            poisoned.into_inner()
        });
        Ok(Arc::clone(entries.entry(key).or_insert(outcome)))
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(|poisoned| {
                warn!("Forecast cache write lock was poisoned during clear, recovering");
                poisoned.into_inner()
            })
            .clear();
    }
}
