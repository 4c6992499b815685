//! Monthly seasonal index profiles with SKU/category tiering
//!
//! High-volume SKUs with at least a year of history get their own profile;
//! everything else borrows the profile of its category. Profiles are built
//! once per planning run and shared read-only between SKUs.

use crate::data::{aggregate_by_category, category_of, DemandSeries};
use crate::utils::{months_spanned, VersionHasher};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Share of SKUs (by volume rank) eligible for an individual profile
pub const TOP_VOLUME_SHARE: f64 = 0.2;

/// Months of history needed for an individual profile
pub const MIN_PROFILE_MONTHS: u32 = 12;

/// Granularity a profile was built at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileScope {
    Sku,
    Category,
}

/// Twelve monthly multipliers, 1.0 meaning an average month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalityProfile {
    pub scope: ProfileScope,
    /// SKU or category the profile belongs to
    pub key: String,
    /// January first
    pub monthly_index: [f64; 12],
}

impl SeasonalityProfile {
    /// Profile with every month at 1.0
    pub fn neutral(scope: ProfileScope, key: impl Into<String>) -> Self {
        Self {
            scope,
            key: key.into(),
            monthly_index: [1.0; 12],
        }
    }

    /// Build a profile from a series' history
    ///
    /// `index[m] = mean(observations in month m) / mean(all observations)`.
    /// Months without observations stay at 1.0, as does every month when the
    /// overall mean is zero.
    pub fn from_series(scope: ProfileScope, key: impl Into<String>, series: &DemandSeries) -> Self {
        let mut profile = Self::neutral(scope, key);
        if series.is_empty() {
            return profile;
        }

        let overall = series.total_volume() / series.len() as f64;
        if overall <= 0.0 {
            return profile;
        }

        let mut sums = [0.0f64; 12];
        let mut counts = [0usize; 12];
        for point in series.points() {
            let m = point.date.month0() as usize;
            sums[m] += point.quantity;
            counts[m] += 1;
        }

        for m in 0..12 {
            if counts[m] > 0 {
                profile.monthly_index[m] = sums[m] / counts[m] as f64 / overall;
            }
        }
        profile
    }

    /// Index for a calendar month (1 = January)
    pub fn index_for_month(&self, month: u32) -> f64 {
        match month {
            1..=12 => self.monthly_index[(month - 1) as usize],
            _ => 1.0,
        }
    }

    /// Index for the month containing `date`
    pub fn index_for(&self, date: NaiveDate) -> f64 {
        self.monthly_index[date.month0() as usize]
    }

    /// Mean index over `days` consecutive days after `origin`
    pub fn mean_index_over_days(&self, origin: NaiveDate, days: u32) -> f64 {
        if days == 0 {
            return self.index_for(origin);
        }
        let total: f64 = (1..=days as u64)
            .filter_map(|offset| origin.checked_add_days(chrono::Days::new(offset)))
            .map(|d| self.index_for(d))
            .sum();
        total / days as f64
    }

    pub fn is_neutral(&self) -> bool {
        self.monthly_index.iter().all(|&i| i == 1.0)
    }

    /// Fold this profile into a version hash
    pub fn hash_into(&self, hasher: &mut VersionHasher) {
        hasher.write_str(match self.scope {
            ProfileScope::Sku => "sku",
            ProfileScope::Category => "category",
        });
        hasher.write_str(&self.key);
        for index in self.monthly_index {
            hasher.write_f64(index);
        }
    }
}

/// Resolved profiles for every SKU of a planning run
#[derive(Debug, Clone, Default)]
pub struct SeasonalityModel {
    individual: HashMap<String, Arc<SeasonalityProfile>>,
    by_category: HashMap<String, Arc<SeasonalityProfile>>,
    sku_categories: HashMap<String, String>,
}

impl SeasonalityModel {
    /// Build profiles from the full history of every SKU
    ///
    /// `categories` maps normalized SKU identifiers to category names.
    pub fn build(series: &[DemandSeries], categories: &HashMap<String, String>) -> Self {
        let eligible = individually_eligible(series);

        let individual: HashMap<String, Arc<SeasonalityProfile>> = series
            .iter()
            .filter(|s| eligible.contains(&s.sku()))
            .map(|s| {
                (
                    s.sku().to_string(),
                    Arc::new(SeasonalityProfile::from_series(ProfileScope::Sku, s.sku(), s)),
                )
            })
            .collect();

        let by_category: HashMap<String, Arc<SeasonalityProfile>> =
            aggregate_by_category(series, categories)
                .iter()
                .map(|c| {
                    (
                        c.sku().to_string(),
                        Arc::new(SeasonalityProfile::from_series(
                            ProfileScope::Category,
                            c.sku(),
                            c,
                        )),
                    )
                })
                .collect();

        debug!(
            skus = series.len(),
            individual = individual.len(),
            categories = by_category.len(),
            "Built seasonality profiles"
        );

        Self {
            individual,
            by_category,
            sku_categories: categories.clone(),
        }
    }

    /// The one profile that applies to `sku`
    pub fn profile_for(&self, sku: &str) -> Arc<SeasonalityProfile> {
        if let Some(profile) = self.individual.get(sku) {
            return Arc::clone(profile);
        }

        let category = category_of(sku, &self.sku_categories);
        match self.by_category.get(category) {
            Some(profile) => Arc::clone(profile),
            None => Arc::new(SeasonalityProfile::neutral(ProfileScope::Category, category)),
        }
    }

    pub fn has_individual_profile(&self, sku: &str) -> bool {
        self.individual.contains_key(sku)
    }

    pub fn category_profile(&self, category: &str) -> Option<Arc<SeasonalityProfile>> {
        self.by_category.get(category).cloned()
    }
}

/// SKUs in the top volume share that also span enough months
fn individually_eligible(series: &[DemandSeries]) -> Vec<&str> {
    if series.is_empty() {
        return Vec::new();
    }

    let mut ranked: Vec<&DemandSeries> = series.iter().collect();
    ranked.sort_by(|a, b| {
        b.total_volume()
            .total_cmp(&a.total_volume())
            .then_with(|| a.sku().cmp(b.sku()))
    });

    let top_n = (series.len() as f64 * TOP_VOLUME_SHARE).ceil() as usize;
    ranked
        .into_iter()
        .take(top_n)
        .filter(|s| match (s.first_date(), s.last_date()) {
            (Some(first), Some(last)) => months_spanned(first, last) >= MIN_PROFILE_MONTHS,
            _ => false,
        })
        .map(|s| s.sku())
        .collect()
}
