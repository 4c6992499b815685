//! Descriptive statistics over demand samples
//!
//! Thin wrappers over `statrs` that turn its NaN-on-empty convention into
//! `Option`, so callers are forced to handle the degenerate cases (empty
//! series, single observation, zero mean) explicitly.

use statrs::statistics::{Data, OrderStatistics, Statistics};

/// Arithmetic mean, `None` for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().mean())
}

/// Sample standard deviation (n - 1 denominator), `None` below two values
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let std = values.iter().std_dev();
    if std.is_finite() {
        Some(std)
    } else {
        None
    }
}

/// Sample standard deviation, treating fewer than two values as zero spread
pub fn sample_std_or_zero(values: &[f64]) -> f64 {
    sample_std(values).unwrap_or(0.0)
}

/// Median, `None` for an empty slice
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut data = Data::new(values.to_vec());
    Some(data.median())
}

/// Coefficient of variation as a percentage (`std / mean * 100`)
///
/// Returns `None` when the mean is not positive or the standard deviation is
/// undefined; a CV is meaningless for those series.
pub fn coefficient_of_variation(values: &[f64]) -> Option<f64> {
    let mean = mean(values)?;
    if mean <= 0.0 {
        return None;
    }
    let std = sample_std(values)?;
    Some(std / mean * 100.0)
}

/// True when every value equals the first one
pub fn is_constant(values: &[f64]) -> bool {
    match values.first() {
        Some(first) => values.iter().all(|v| v == first),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_mean_and_std() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_abs_diff_eq!(mean(&values).unwrap(), 5.0);
        // sample variance = 32 / 7
        assert_abs_diff_eq!(sample_std(&values).unwrap(), (32.0f64 / 7.0).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_empty_and_single() {
        assert!(mean(&[]).is_none());
        assert!(median(&[]).is_none());
        assert!(sample_std(&[3.0]).is_none());
        assert_eq!(sample_std_or_zero(&[3.0]), 0.0);
    }

    #[test]
    fn test_median_even_and_odd() {
        assert_abs_diff_eq!(median(&[9.0, 11.0, 10.0, 12.0, 13.0]).unwrap(), 11.0);
        assert_abs_diff_eq!(median(&[1.0, 4.0, 2.0, 3.0]).unwrap(), 2.5);
    }

    #[test]
    fn test_constant_series_has_zero_spread() {
        let values = [10.0; 12];
        assert!(is_constant(&values));
        assert_abs_diff_eq!(sample_std(&values).unwrap(), 0.0);
        assert_abs_diff_eq!(coefficient_of_variation(&values).unwrap(), 0.0);
    }

    #[test]
    fn test_cv_undefined_for_zero_mean() {
        assert!(coefficient_of_variation(&[0.0, 0.0, 0.0]).is_none());
    }
}
