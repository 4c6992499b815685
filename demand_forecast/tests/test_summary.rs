use chrono::{Duration, NaiveDate};
use demand_forecast::summary::{accuracy_rankings, summarize_forecasts};
use demand_forecast::tracking::{compare_forecast_vs_actual, forecast_bias, ForecastSnapshot};
use demand_forecast::{
    DemandForecast, DemandObservation, DemandSeries, ForecastSettings, Forecaster, Granularity,
    ProfileScope, SeasonalityProfile,
};
use pretty_assertions::assert_eq;

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn forecast_for(sku: &str, values: &[f64]) -> DemandForecast {
    let series = DemandSeries::from_pairs(
        sku,
        Granularity::Daily,
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| (start() + Duration::days(i as i64), v)),
    )
    .unwrap();
    let forecaster = Forecaster::new(ForecastSettings {
        horizon_days: 30,
        ..ForecastSettings::default()
    })
    .unwrap();
    forecaster
        .forecast(&series, &SeasonalityProfile::neutral(ProfileScope::Category, "ALL"))
        .unwrap()
        .forecast
        .unwrap()
}

fn sample_forecasts() -> Vec<DemandForecast> {
    let steady = forecast_for("STEADY", &[20.0; 100]);
    let small = forecast_for("SMALL", &[2.0; 100]);
    // last fifth of history jumps, so the backtest misses badly
    let mut shifted = vec![10.0; 80];
    shifted.extend(vec![30.0; 20]);
    let shifted = forecast_for("SHIFTED", &shifted);
    vec![steady, small, shifted]
}

#[test]
fn test_summary_counts_and_leaders() {
    let forecasts = sample_forecasts();
    let summary = summarize_forecasts(&forecasts, 2);

    assert_eq!(summary.total_skus, 3);
    let mut leaders: Vec<&str> = summary.top_skus.iter().map(|t| t.sku.as_str()).collect();
    leaders.sort();
    assert_eq!(leaders, vec!["SHIFTED", "STEADY"]);
    assert!(summary.top_skus[0].forecast_total_qty >= summary.top_skus[1].forecast_total_qty);
    assert_eq!(
        summary.high_confidence
            + summary.medium_confidence
            + summary.low_confidence
            + summary.very_low_confidence,
        3
    );
    assert_eq!(summary.patterns.get("Stable & Flat"), Some(&2));
    assert!(summary.avg_mape.is_some());
}

#[test]
fn test_accuracy_rankings_order() {
    let forecasts = sample_forecasts();
    let (best, worst) = accuracy_rankings(&forecasts, 1);

    assert_eq!(best.len(), 1);
    assert_eq!(best[0].mape, 0.0);
    assert_eq!(worst[0].sku, "SHIFTED");
    assert!(worst[0].mape > 50.0);
}

#[test]
fn test_snapshot_round_trip_against_actuals() {
    let forecast = forecast_for("STEADY", &[20.0; 100]);
    let snapshot_date = forecast.origin;
    let snapshot = ForecastSnapshot::from_forecast(&forecast, snapshot_date);
    assert!((snapshot.forecast_total_qty - 600.0).abs() < 1e-6);

    let actuals: Vec<DemandObservation> = (1..=30)
        .map(|d| DemandObservation::new("steady", snapshot_date + Duration::days(d), 25.0))
        .collect();
    let comparisons =
        compare_forecast_vs_actual(&[snapshot], &actuals, snapshot_date + Duration::days(45));

    assert_eq!(comparisons.len(), 1);
    assert!((comparisons[0].actual_qty - 750.0).abs() < 1e-9);

    let bias = forecast_bias(&comparisons).unwrap();
    assert!((bias.bias_pct + 20.0).abs() < 1e-6);
    assert_eq!(bias.direction.to_string(), "Under-forecasting");
}
