use approx::assert_abs_diff_eq;
use chrono::{Duration, NaiveDate};
use demand_forecast::{
    DemandForecast, DemandSeries, DiagnosticKind, ForecastSettings, Forecaster, Granularity,
    ProfileScope, SeasonalityProfile,
};
use pretty_assertions::assert_eq;
use replenishment::planner::{compute_requirement, RequirementInputs};
use replenishment::summary::{critical_items, plan_summary, sort_plan, vendor_summaries};
use replenishment::{
    LeadTimeConfidence, LeadTimeEstimator, LeadTimeSettings, LeadTimeSource, LeadTimeTable,
    PlannerSettings, PoReceiptPair, Priority, ReplenishmentPlanner, SupplyPosition,
};
use rstest::rstest;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// A forecast for a flat series, with daily demand figures overridden
fn forecast(sku: &str, avg_daily: f64, std_daily: f64) -> DemandForecast {
    let start = date(2024, 1, 1);
    let series = DemandSeries::from_pairs(
        sku,
        Granularity::Daily,
        (0..60).map(|i| (start + Duration::days(i), 10.0)),
    )
    .unwrap();
    let mut forecast = Forecaster::new(ForecastSettings::default())
        .unwrap()
        .forecast(&series, &SeasonalityProfile::neutral(ProfileScope::Category, "ALL"))
        .unwrap()
        .forecast
        .unwrap();
    forecast.avg_daily_demand = avg_daily;
    forecast.demand_std_daily = std_daily;
    forecast
}

fn supply(sku: &str, on_hand: f64, open_po: f64, backorders: f64) -> SupplyPosition {
    SupplyPosition {
        on_hand_qty: on_hand,
        open_po_qty: open_po,
        backorder_qty: backorders,
        ..SupplyPosition::empty(sku)
    }
}

fn pairs(sku: &str, delays: &[i64]) -> Vec<PoReceiptPair> {
    delays
        .iter()
        .enumerate()
        .map(|(i, &d)| {
            let created = date(2024, 1, 2) + Duration::days(i as i64 * 10);
            PoReceiptPair::new(sku, created, created + Duration::days(d))
        })
        .collect()
}

#[test]
fn test_lead_time_median_plus_buffer() {
    let estimator = LeadTimeEstimator::new(LeadTimeSettings::default()).unwrap();
    let table = estimator.estimate(&pairs("Z", &[9, 11, 10, 12, 13]), date(2024, 6, 30));

    let record = table.record("Z").unwrap();
    assert_abs_diff_eq!(record.lead_time_days, 16.0);
    assert_eq!(record.po_match_count, 5);
    assert_eq!(record.confidence, LeadTimeConfidence::High);

    let resolved = table.resolve("z", None);
    assert_eq!(resolved.source, LeadTimeSource::Computed);
    assert!(resolved.diagnostic.is_none());
}

#[test]
fn test_net_requirement_breakdown() {
    let planner = ReplenishmentPlanner::new(PlannerSettings::default()).unwrap();
    let table = LeadTimeEstimator::new(LeadTimeSettings {
        buffer_days: 0.0,
        ..LeadTimeSettings::default()
    })
    .unwrap()
    .estimate(&pairs("W", &[10, 10, 10]), date(2024, 6, 30));

    let rec = planner
        .plan_sku(&forecast("W", 5.0, 2.0), &table, &supply("W", 20.0, 10.0, 5.0))
        .unwrap();

    assert_abs_diff_eq!(rec.lead_time_days, 10.0);
    assert_abs_diff_eq!(rec.lead_time_demand, 50.0, epsilon = 1e-9);
    assert_abs_diff_eq!(rec.safety_stock, 10.4355, epsilon = 1e-4);
    assert_abs_diff_eq!(rec.order_up_to, 60.4355, epsilon = 1e-4);
    assert_abs_diff_eq!(rec.available_supply, 30.0);
    assert_abs_diff_eq!(rec.net_requirement, 35.4355, epsilon = 1e-4);
    assert_eq!(rec.suggested_qty, 36);
    assert_eq!(rec.days_of_supply, Some(4.0));
    assert_eq!(rec.priority, Priority::Critical);
    assert!(rec.diagnostics.is_empty());
}

#[test]
fn test_missing_history_defaults_visibly() {
    let planner = ReplenishmentPlanner::new(PlannerSettings::default()).unwrap();
    let table = LeadTimeTable::empty(90.0);

    let rec = planner
        .plan_sku(&forecast("E", 2.0, 1.0), &table, &supply("E", 100.0, 0.0, 0.0))
        .unwrap();

    assert_abs_diff_eq!(rec.lead_time_days, 90.0);
    assert_eq!(rec.lead_time_confidence, LeadTimeConfidence::Low);
    assert_eq!(rec.lead_time_source, LeadTimeSource::Default);
    assert!(rec.is_default_lead_time());
    assert!(rec
        .diagnostics
        .iter()
        .any(|d| d.kind == DiagnosticKind::MissingLeadTimeHistory));

    let json = serde_json::to_value(&rec).unwrap();
    assert_eq!(json["lead_time_source"], "default");
    assert_eq!(json["lead_time_confidence"], "low");
}

#[test]
fn test_zero_demand_gets_no_order() {
    let planner = ReplenishmentPlanner::new(PlannerSettings::default()).unwrap();
    let rec = planner
        .plan_sku(
            &forecast("DEAD", 0.0, 0.0),
            &LeadTimeTable::empty(90.0),
            &supply("DEAD", 0.0, 0.0, 0.0),
        )
        .unwrap();

    assert_eq!(rec.suggested_qty, 0);
    assert_eq!(rec.priority, Priority::Low);
    assert_eq!(rec.days_of_supply, None);
    assert!(rec
        .diagnostics
        .iter()
        .any(|d| d.kind == DiagnosticKind::ZeroDemand));
}

#[test]
fn test_net_requirement_identity_over_grid() {
    for avg in [0.1, 1.0, 3.7, 25.0] {
        for std in [0.0, 0.5, 4.0] {
            for lead_time in [1.0, 16.0, 90.0] {
                for on_hand in [0.0, 12.0, 5_000.0] {
                    for backorders in [0.0, 7.0] {
                        let inputs = RequirementInputs {
                            avg_daily_demand: avg,
                            demand_std_daily: std,
                            lead_time_days: lead_time,
                            seasonal_factor: 1.2,
                            z_score: 2.05,
                            review_period_days: 7.0,
                            on_hand_qty: on_hand,
                            in_transit_qty: 3.0,
                            open_po_qty: 4.0,
                            backorder_qty: backorders,
                        };
                        let r = compute_requirement(&inputs);
                        assert_eq!(
                            r.net_requirement,
                            r.order_up_to - r.available_supply + backorders
                        );
                        assert_eq!(r.suggested_qty as f64, r.net_requirement.ceil().max(0.0));
                    }
                }
            }
        }
    }
}

#[rstest]
#[case(0, LeadTimeSource::Default, LeadTimeConfidence::Low)]
#[case(1, LeadTimeSource::Default, LeadTimeConfidence::Low)]
#[case(2, LeadTimeSource::Computed, LeadTimeConfidence::Medium)]
#[case(4, LeadTimeSource::Computed, LeadTimeConfidence::Medium)]
#[case(5, LeadTimeSource::Computed, LeadTimeConfidence::High)]
#[case(8, LeadTimeSource::Computed, LeadTimeConfidence::High)]
fn test_confidence_tracks_match_count(
    #[case] matches: usize,
    #[case] source: LeadTimeSource,
    #[case] confidence: LeadTimeConfidence,
) {
    let delays: Vec<i64> = (0..matches as i64).map(|i| 20 + i).collect();
    let table = LeadTimeEstimator::new(LeadTimeSettings::default())
        .unwrap()
        .estimate(&pairs("P", &delays), date(2024, 6, 30));

    let resolved = table.resolve("P", None);
    assert_eq!(resolved.source, source);
    assert_eq!(resolved.confidence, confidence);
    assert_eq!(resolved.po_match_count, matches);
    if source == LeadTimeSource::Default {
        assert_abs_diff_eq!(resolved.lead_time_days, 90.0);
    }
}

#[test]
fn test_plan_ordering_and_rollups() {
    let planner = ReplenishmentPlanner::new(PlannerSettings::default()).unwrap();
    let table = LeadTimeTable::empty(30.0);

    let mut a = supply("A", 10.0, 0.0, 50.0);
    a.vendor = Some("Acme".to_string());
    a.unit_cost = Some(2.0);
    let mut b = supply("B", 400.0, 0.0, 0.0);
    b.vendor = Some("Acme".to_string());
    let c = supply("C", 5.0, 0.0, 0.0);

    let mut plan = vec![
        planner.plan_sku(&forecast("B", 5.0, 1.0), &table, &b).unwrap(),
        planner.plan_sku(&forecast("C", 12.0, 3.0), &table, &c).unwrap(),
        planner.plan_sku(&forecast("A", 5.0, 1.0), &table, &a).unwrap(),
    ];
    sort_plan(&mut plan);
    assert_eq!(
        plan.iter().map(|r| r.sku.as_str()).collect::<Vec<_>>(),
        vec!["A", "B", "C"]
    );

    let vendors = vendor_summaries(&plan);
    assert_eq!(vendors[0].vendor, "Acme");
    assert_eq!(vendors[0].sku_count, 2);
    assert_eq!(vendors[1].vendor, "Unknown");

    let critical = critical_items(&plan, 10);
    assert!(critical.iter().all(|r| r.urgency_score >= 50));
    assert_eq!(critical[0].sku, "A");

    let summary = plan_summary(&plan);
    assert_eq!(summary.total_skus, 3);
    assert_eq!(summary.default_lead_time_skus, 3);
    assert_eq!(summary.skus_with_backorders, 1);
}
