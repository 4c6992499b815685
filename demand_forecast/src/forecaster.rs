//! Per-SKU demand forecasting
//!
//! One call runs the full chain for a SKU: anomaly detection, cleaning and
//! smoothing, method selection, moving-average base with trend, seasonal
//! adjustment per horizon date, residual bands, backtest and confidence.

use crate::anomaly::{AnomalyDetector, AnomalyReport, SmoothingPreset};
use crate::backtest::{backtest, Confidence, ConfidenceScorer};
use crate::cache::{ForecastCache, ForecastKey};
use crate::data::{DemandSeries, Granularity};
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::error::{ForecastError, Result};
use crate::metrics::AccuracyMetrics;
use crate::models::moving_average::MovingAverage;
use crate::models::{ForecastMethod, ForecastModel};
use crate::pattern::DemandPattern;
use crate::seasonality::{ProfileScope, SeasonalityProfile};
use crate::smoothing::{ReplacementMethod, SignalSmoother, SmoothedSeries};
use crate::utils::{future_days, future_month_starts, VersionHasher};
use chrono::NaiveDate;
use plan_math::forecasting::trend_pct;
use plan_math::stats;
use plan_math::volatility::residual_std;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Recent window for the trend comparison, daily series
pub const RECENT_DAYS: usize = 30;

/// Recent window for the trend comparison, monthly series
pub const RECENT_MONTHS: usize = 1;

/// Fallback band width as a share of the series standard deviation
pub const FALLBACK_VOLATILITY_SHARE: f64 = 0.2;

/// Inputs that shape a forecast besides the series and its profile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastSettings {
    pub preset: SmoothingPreset,
    pub replacement: ReplacementMethod,
    pub check_intermittent: bool,
    /// Forecast horizon in days (monthly series round up to whole months)
    pub horizon_days: u32,
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self {
            preset: SmoothingPreset::Balanced,
            replacement: ReplacementMethod::Median,
            check_intermittent: true,
            horizon_days: 90,
        }
    }
}

impl ForecastSettings {
    pub fn validate(&self) -> Result<()> {
        if self.horizon_days == 0 {
            return Err(ForecastError::InvalidParameter(
                "Forecast horizon must be at least one day".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of forecast periods for a granularity
    pub fn horizon_periods(&self, granularity: Granularity) -> usize {
        match granularity {
            Granularity::Daily => self.horizon_days as usize,
            Granularity::Monthly => self.horizon_days.div_ceil(30) as usize,
        }
    }
}

/// Detection summary carried on a forecast
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnomalySummary {
    pub anomaly_count: usize,
    pub anomaly_pct: f64,
    pub applied_z_threshold: f64,
    pub is_intermittent: bool,
    pub skipped_detection: bool,
}

impl From<&AnomalyReport> for AnomalySummary {
    fn from(report: &AnomalyReport) -> Self {
        Self {
            anomaly_count: report.anomaly_count,
            anomaly_pct: report.anomaly_pct,
            applied_z_threshold: report.applied_z_threshold,
            is_intermittent: report.is_intermittent,
            skipped_detection: report.skipped_detection,
        }
    }
}

/// Forward demand curve for one SKU
///
/// Value object: produced once per (SKU, preset, horizon, input version).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandForecast {
    pub sku: String,
    pub granularity: Granularity,
    pub preset: SmoothingPreset,
    pub method: ForecastMethod,
    pub horizon_days: u32,
    /// Last observed period; the forecast starts after it
    pub origin: NaiveDate,
    pub horizon_dates: Vec<NaiveDate>,
    /// Seasonally adjusted quantity per horizon period
    pub forecast_qty: Vec<f64>,
    pub upper_band: Vec<f64>,
    pub lower_band: Vec<f64>,
    /// Unseasoned forecast per period
    pub base_forecast: f64,
    pub trend_pct: f64,
    /// Band half-width per period
    pub volatility: f64,
    /// Unseasoned forecast per day
    pub avg_daily_demand: f64,
    /// Standard deviation of demand per day
    pub demand_std_daily: f64,
    /// Coefficient of variation of raw demand, percent
    pub cv: Option<f64>,
    pub pattern: DemandPattern,
    pub anomalies: AnomalySummary,
    pub profile_scope: ProfileScope,
    pub profile_key: String,
    pub seasonal_indices: [f64; 12],
    pub history_periods: usize,
    pub accuracy: Option<AccuracyMetrics>,
    pub confidence_score: u8,
    pub confidence: Confidence,
}

impl DemandForecast {
    /// Sum of forecast quantities over the horizon
    pub fn total_qty(&self) -> f64 {
        self.forecast_qty.iter().sum()
    }

    /// The profile this forecast was adjusted with
    pub fn profile(&self) -> SeasonalityProfile {
        SeasonalityProfile {
            scope: self.profile_scope,
            key: self.profile_key.clone(),
            monthly_index: self.seasonal_indices,
        }
    }

    /// Mean seasonal index over `days` days after the forecast origin
    pub fn seasonal_factor_over_days(&self, days: u32) -> f64 {
        self.profile().mean_index_over_days(self.origin, days)
    }
}

/// Everything the forecaster produced for one SKU
#[derive(Debug, Clone)]
pub struct ForecastOutcome {
    pub sku: String,
    /// `None` when the history is below the method floor
    pub forecast: Option<DemandForecast>,
    pub anomalies: AnomalyReport,
    pub smoothed: SmoothedSeries,
    pub diagnostics: Vec<Diagnostic>,
}

/// Produces forecasts from a series and its seasonality profile
#[derive(Debug, Clone, Copy)]
pub struct Forecaster {
    settings: ForecastSettings,
    scorer: ConfidenceScorer,
}

impl Forecaster {
    pub fn new(settings: ForecastSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            settings,
            scorer: ConfidenceScorer,
        })
    }

    pub fn settings(&self) -> &ForecastSettings {
        &self.settings
    }

    /// Version of every input that influences a forecast
    pub fn input_version(&self, series: &DemandSeries, profile: &SeasonalityProfile) -> u64 {
        let mut hasher = VersionHasher::seeded(series.version_token());
        profile.hash_into(&mut hasher);
        hasher.write_str(&self.settings.replacement.to_string());
        hasher.write_bytes(&[self.settings.check_intermittent as u8]);
        hasher.finish()
    }

    /// Memo key for a series under these settings
    pub fn cache_key(&self, series: &DemandSeries, profile: &SeasonalityProfile) -> ForecastKey {
        ForecastKey {
            sku: series.sku().to_string(),
            preset: self.settings.preset,
            horizon_days: self.settings.horizon_days,
            input_version: self.input_version(series, profile),
        }
    }

    /// Forecast through a caller-owned cache
    pub fn forecast_cached(
        &self,
        cache: &ForecastCache,
        series: &DemandSeries,
        profile: &SeasonalityProfile,
    ) -> Result<Arc<ForecastOutcome>> {
        let key = self.cache_key(series, profile);
        cache.get_or_try_insert(key, || self.forecast(series, profile))
    }

    /// Run the full forecasting chain for one SKU
    pub fn forecast(
        &self,
        series: &DemandSeries,
        profile: &SeasonalityProfile,
    ) -> Result<ForecastOutcome> {
        let sku = series.sku().to_string();
        let granularity = series.granularity();
        let preset = self.settings.preset;

        let report = AnomalyDetector::new(preset)
            .with_intermittent_check(self.settings.check_intermittent)
            .detect(series);
        let smoothed = SignalSmoother::new(preset)
            .with_replacement(self.settings.replacement)
            .smooth(series, &report)?;
        let mut diagnostics = report.diagnostics.clone();

        let method = match ForecastMethod::select(granularity, series.len()) {
            Some(method) => method,
            None => {
                diagnostics.push(Diagnostic::new(
                    &sku,
                    DiagnosticKind::InsufficientHistory,
                    format!(
                        "{} {} observations, forecasting needs {}",
                        series.len(),
                        granularity,
                        ForecastMethod::minimum_history(granularity)
                    ),
                ));
                debug!(sku = %sku, observations = series.len(), "No forecast method available");
                return Ok(ForecastOutcome {
                    sku,
                    forecast: None,
                    anomalies: report,
                    smoothed,
                    diagnostics,
                });
            }
        };

        let raw = series.quantities();
        let cleaned = smoothed.cleaned();
        let signal = smoothed.smoothed();

        let trained = MovingAverage::for_method(method).train(&cleaned)?;
        let latest_ma = trained.last_average();

        let recent_len = match granularity {
            Granularity::Daily => RECENT_DAYS,
            Granularity::Monthly => RECENT_MONTHS,
        };
        let trend = if signal.len() > recent_len {
            let (older, recent) = signal.split_at(signal.len() - recent_len);
            match (stats::mean(recent), stats::mean(older)) {
                (Some(r), Some(o)) => trend_pct(r, o),
                _ => 0.0,
            }
        } else {
            0.0
        };

        let base = (latest_ma * (1.0 + trend / 100.0)).max(0.0);

        let window = trained.effective_window();
        let volatility = match residual_std(&cleaned[cleaned.len() - window..], trained.window_fitted())? {
            Some(std) => std,
            None => FALLBACK_VOLATILITY_SHARE * stats::sample_std_or_zero(&raw),
        };

        // series.len() >= 3 past method selection
        let origin = series.last_date().ok_or_else(|| {
            ForecastError::DataError(format!("Series for {} has no observations", sku))
        })?;
        let periods = self.settings.horizon_periods(granularity);
        let horizon_dates = match granularity {
            Granularity::Daily => future_days(origin, periods),
            Granularity::Monthly => future_month_starts(origin, periods)?,
        };

        let forecast_qty: Vec<f64> = horizon_dates
            .iter()
            .map(|&d| base * profile.index_for(d))
            .collect();
        let upper_band = forecast_qty.iter().map(|v| v + volatility).collect();
        let lower_band = forecast_qty
            .iter()
            .map(|v| (v - volatility).max(0.0))
            .collect();

        let days_per_period = granularity.days_per_period();
        let avg_daily_demand = base / days_per_period;
        let demand_std_daily = stats::sample_std_or_zero(&cleaned) / days_per_period.sqrt();

        let cv = stats::coefficient_of_variation(&raw);
        let pattern = DemandPattern::classify(&raw);
        let accuracy = backtest(&cleaned, granularity, method)?;
        let history_days = series.len() as f64 * days_per_period;
        let confidence = self
            .scorer
            .score(cv, history_days, accuracy.map(|a| a.mape));

        debug!(
            sku = %sku,
            method = %method,
            base,
            trend,
            volatility,
            confidence = confidence.score,
            "Forecast complete"
        );

        Ok(ForecastOutcome {
            sku: sku.clone(),
            forecast: Some(DemandForecast {
                sku,
                granularity,
                preset,
                method,
                horizon_days: self.settings.horizon_days,
                origin,
                horizon_dates,
                forecast_qty,
                upper_band,
                lower_band,
                base_forecast: base,
                trend_pct: trend,
                volatility,
                avg_daily_demand,
                demand_std_daily,
                cv,
                pattern,
                anomalies: AnomalySummary::from(&report),
                profile_scope: profile.scope,
                profile_key: profile.key.clone(),
                seasonal_indices: profile.monthly_index,
                history_periods: series.len(),
                accuracy,
                confidence_score: confidence.score,
                confidence,
            }),
            anomalies: report,
            smoothed,
            diagnostics,
        })
    }
}
