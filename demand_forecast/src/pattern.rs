//! Demand pattern classification (volatility and trend direction)

use plan_math::forecasting::linear_slope;
use plan_math::stats;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Volatility band by coefficient of variation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolatilityClass {
    /// CV below 30%
    Stable,
    /// CV from 30% to 70%
    Moderate,
    Volatile,
}

/// Direction of the least-squares trend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendClass {
    Growing,
    Flat,
    Declining,
}

/// Combined pattern, e.g. "Stable & Growing"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DemandPattern {
    pub volatility: VolatilityClass,
    pub trend: TrendClass,
}

impl DemandPattern {
    /// Classify from a CV (percent) and a slope in units per period
    pub fn from_measures(cv: f64, slope: f64) -> Self {
        let volatility = if cv < 30.0 {
            VolatilityClass::Stable
        } else if cv < 70.0 {
            VolatilityClass::Moderate
        } else {
            VolatilityClass::Volatile
        };

        let trend = if slope > 0.5 {
            TrendClass::Growing
        } else if slope < -0.5 {
            TrendClass::Declining
        } else {
            TrendClass::Flat
        };

        Self { volatility, trend }
    }

    /// Classify a demand history
    ///
    /// An undefined CV (zero mean) counts as stable, an undefined slope
    /// (single point) as flat.
    pub fn classify(values: &[f64]) -> Self {
        let cv = stats::coefficient_of_variation(values).unwrap_or(0.0);
        let slope = linear_slope(values).unwrap_or(0.0);
        Self::from_measures(cv, slope)
    }
}

impl fmt::Display for VolatilityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VolatilityClass::Stable => write!(f, "Stable"),
            VolatilityClass::Moderate => write!(f, "Moderate"),
            VolatilityClass::Volatile => write!(f, "Volatile"),
        }
    }
}

impl fmt::Display for TrendClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendClass::Growing => write!(f, "Growing"),
            TrendClass::Flat => write!(f, "Flat"),
            TrendClass::Declining => write!(f, "Declining"),
        }
    }
}

impl fmt::Display for DemandPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} & {}", self.volatility, self.trend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(10.0, 0.0, "Stable & Flat")]
    #[case(30.0, 0.6, "Moderate & Growing")]
    #[case(69.9, -0.6, "Moderate & Declining")]
    #[case(70.0, 0.5, "Volatile & Flat")]
    fn test_from_measures(#[case] cv: f64, #[case] slope: f64, #[case] expected: &str) {
        assert_eq!(DemandPattern::from_measures(cv, slope).to_string(), expected);
    }

    #[test]
    fn test_classify_growing_series() {
        let values: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let pattern = DemandPattern::classify(&values);
        assert_eq!(pattern.volatility, VolatilityClass::Stable);
        assert_eq!(pattern.trend, TrendClass::Growing);
    }

    #[test]
    fn test_classify_degenerate() {
        let pattern = DemandPattern::classify(&[0.0, 0.0]);
        assert_eq!(pattern.to_string(), "Stable & Flat");
    }
}
