//! Run configuration
//!
//! Every field has a default, so `{}` is a valid configuration file.

use crate::error::{PlannerError, Result};
use chrono::NaiveDate;
use demand_forecast::{ForecastSettings, Granularity, ReplacementMethod, SmoothingPreset};
use plan_math::service_level::ServiceLevel;
use replenishment::lead_time::{
    LeadTimeSettings, DEFAULT_LEAD_TIME_DAYS, LEAD_TIME_BUFFER_DAYS, LEAD_TIME_LOOKBACK_DAYS,
    MAX_LEAD_TIME_LOOKBACK_DAYS,
};
use replenishment::PlannerSettings;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Longest accepted shipment history window, one hundred years
pub const MAX_HISTORY_WINDOW_DAYS: u32 = MAX_LEAD_TIME_LOOKBACK_DAYS;

/// Everything that shapes a planning run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanningConfig {
    pub granularity: Granularity,
    pub preset: SmoothingPreset,
    pub replacement: ReplacementMethod,
    pub check_intermittent: bool,
    pub horizon_days: u32,
    /// Percent, strictly between 50 and 100
    pub service_level: f64,
    pub review_period_days: u32,
    pub default_lead_time_days: f64,
    pub lead_time_lookback_days: u32,
    pub lead_time_buffer_days: f64,
    /// Use a vendor median before the default lead time
    pub vendor_lead_time_fallback: bool,
    /// Planning date; derived from the inputs when absent
    pub as_of: Option<NaiveDate>,
    /// Only shipments within this many days before `as_of` are used
    pub history_window_days: Option<u32>,
}

impl Default for PlanningConfig {
    fn default() -> Self {
        Self {
            granularity: Granularity::Daily,
            preset: SmoothingPreset::Balanced,
            replacement: ReplacementMethod::Median,
            check_intermittent: true,
            horizon_days: 90,
            service_level: 95.0,
            review_period_days: 0,
            default_lead_time_days: DEFAULT_LEAD_TIME_DAYS,
            lead_time_lookback_days: LEAD_TIME_LOOKBACK_DAYS,
            lead_time_buffer_days: LEAD_TIME_BUFFER_DAYS,
            vendor_lead_time_fallback: false,
            as_of: None,
            history_window_days: None,
        }
    }
}

impl PlanningConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        self.forecast_settings().validate()?;
        self.lead_time_settings().validate()?;
        ServiceLevel::new(self.service_level)?;
        match self.history_window_days {
            Some(0) => {
                return Err(PlannerError::Config(
                    "history_window_days must be positive when set".to_string(),
                ))
            }
            Some(days) if days > MAX_HISTORY_WINDOW_DAYS => {
                return Err(PlannerError::Config(format!(
                    "history_window_days must be at most {}, got {}",
                    MAX_HISTORY_WINDOW_DAYS, days
                )))
            }
            _ => {}
        }
        Ok(())
    }

    pub fn forecast_settings(&self) -> ForecastSettings {
        ForecastSettings {
            preset: self.preset,
            replacement: self.replacement,
            check_intermittent: self.check_intermittent,
            horizon_days: self.horizon_days,
        }
    }

    pub fn lead_time_settings(&self) -> LeadTimeSettings {
        LeadTimeSettings {
            lookback_days: self.lead_time_lookback_days,
            buffer_days: self.lead_time_buffer_days,
            default_lead_time_days: self.default_lead_time_days,
            vendor_fallback: self.vendor_lead_time_fallback,
        }
    }

    pub fn planner_settings(&self) -> Result<PlannerSettings> {
        Ok(PlannerSettings {
            service_level: ServiceLevel::new(self.service_level)?,
            review_period_days: self.review_period_days,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_object_is_default() {
        assert_eq!(
            PlanningConfig::from_json_str("{}").unwrap(),
            PlanningConfig::default()
        );
    }

    #[test]
    fn test_partial_config() {
        let config = PlanningConfig::from_json_str(
            r#"{"granularity": "monthly", "preset": "aggressive", "service_level": 99,
                "replacement": "neighbor", "as_of": "2024-06-30"}"#,
        )
        .unwrap();
        assert_eq!(config.granularity, Granularity::Monthly);
        assert_eq!(config.preset, SmoothingPreset::Aggressive);
        assert_eq!(config.replacement, ReplacementMethod::Neighbor);
        assert_eq!(config.as_of, NaiveDate::from_ymd_opt(2024, 6, 30));
        assert_eq!(config.horizon_days, 90);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(PlanningConfig::from_json_str(r#"{"service_level": 100}"#).is_err());
        assert!(PlanningConfig::from_json_str(r#"{"horizon_days": 0}"#).is_err());
        assert!(PlanningConfig::from_json_str(r#"{"default_lead_time_days": -1}"#).is_err());
        assert!(PlanningConfig::from_json_str(r#"{"history_window_days": 0}"#).is_err());
        assert!(PlanningConfig::from_json_str(r#"{"preset": "wild"}"#).is_err());
    }

    #[test]
    fn test_out_of_range_windows_are_rejected() {
        assert!(
            PlanningConfig::from_json_str(r#"{"history_window_days": 4000000000}"#).is_err()
        );
        assert!(
            PlanningConfig::from_json_str(r#"{"lead_time_lookback_days": 4000000000}"#).is_err()
        );
        assert!(PlanningConfig::from_json_str(r#"{"history_window_days": 36500}"#).is_ok());
        assert!(PlanningConfig::from_json_str(r#"{"lead_time_lookback_days": 36500}"#).is_ok());
    }
}
