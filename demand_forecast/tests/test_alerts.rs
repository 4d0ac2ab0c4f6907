use approx::assert_relative_eq;
use demand_forecast::{
    generate_alerts, recommend, AlertKind, AlertRules, DemandOutlook, HistoricalStats,
    PurchaseStance, Recommendation, Severity,
};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn history() -> HistoricalStats {
    HistoricalStats {
        mean: 100.0,
        std_dev: 10.0,
        days: 200,
    }
}

/// A band tight enough not to trigger the uncertainty rule
fn tight_band(point: &[f64]) -> (Vec<f64>, Vec<f64>) {
    (
        point.iter().map(|p| p * 0.9).collect(),
        point.iter().map(|p| p * 1.1).collect(),
    )
}

fn kinds(point: &[f64]) -> Vec<AlertKind> {
    let (lower, upper) = tight_band(point);
    generate_alerts(point, &lower, &upper, &history(), &AlertRules::default())
        .unwrap()
        .into_iter()
        .map(|a| a.kind)
        .collect()
}

#[test]
fn test_high_demand_flags_day_three() {
    let point = [100.0, 100.0, 125.0, 100.0, 100.0];
    let (lower, upper) = tight_band(&point);

    let alerts = generate_alerts(&point, &lower, &upper, &history(), &AlertRules::default())
        .unwrap();

    assert_eq!(alerts.len(), 1);
    let alert = &alerts[0];
    assert_eq!(alert.kind, AlertKind::HighDemand);
    assert_eq!(alert.severity, Severity::Warning);
    assert_eq!(alert.days, Some(vec![3]));
    assert_eq!(
        alert.message,
        "1 day with unusually high demand (up to 125 units, +25% vs average)"
    );
}

#[test]
fn test_high_demand_not_triggered_below_threshold() {
    assert!(kinds(&[100.0, 100.0, 115.0, 100.0, 100.0]).is_empty());
}

#[test]
fn test_low_demand() {
    let point = [70.0, 100.0, 75.0, 100.0, 100.0];
    let (lower, upper) = tight_band(&point);
    let alerts = generate_alerts(&point, &lower, &upper, &history(), &AlertRules::default())
        .unwrap();

    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].kind, AlertKind::LowDemand);
    assert_eq!(alerts[0].severity, Severity::Info);
    assert_eq!(alerts[0].days, Some(vec![1, 3]));
    assert!(alerts[0].message.starts_with("2 days with unusually low demand"));
}

#[test]
fn test_high_uncertainty() {
    let point = [100.0, 100.0, 100.0];
    let lower = [90.0, 60.0, 95.0];
    let upper = [110.0, 120.0, 105.0];

    let alerts =
        generate_alerts(&point, &lower, &upper, &history(), &AlertRules::default()).unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].kind, AlertKind::HighUncertainty);
    assert_eq!(alerts[0].days, Some(vec![2]));
}

#[rstest]
#[case(65.0, Some(AlertKind::TrendUp))]
#[case(52.0, None)]
#[case(40.0, Some(AlertKind::TrendDown))]
#[case(45.0, None)]
fn test_trend_over_fourteen_days(#[case] second_half: f64, #[case] expected: Option<AlertKind>) {
    let history = HistoricalStats {
        mean: 55.0,
        std_dev: 20.0,
        days: 200,
    };
    let mut point = vec![50.0; 7];
    point.extend(vec![second_half; 7]);
    let (lower, upper) = tight_band(&point);

    let alerts = generate_alerts(&point, &lower, &upper, &history, &AlertRules::default()).unwrap();
    let trend: Vec<_> = alerts
        .iter()
        .filter(|a| matches!(a.kind, AlertKind::TrendUp | AlertKind::TrendDown))
        .collect();

    match expected {
        Some(kind) => {
            assert_eq!(trend.len(), 1);
            assert_eq!(trend[0].kind, kind);
            assert_eq!(trend[0].days, None);
        }
        None => assert!(trend.is_empty()),
    }
}

#[test]
fn test_trend_skipped_for_short_horizon() {
    let point = [50.0, 50.0, 50.0, 90.0, 90.0, 90.0];
    let history = HistoricalStats {
        mean: 70.0,
        std_dev: 30.0,
        days: 100,
    };
    let (lower, upper) = tight_band(&point);
    let alerts = generate_alerts(&point, &lower, &upper, &history, &AlertRules::default()).unwrap();
    assert!(alerts.is_empty());
}

#[test]
fn test_custom_rules() {
    let rules = AlertRules {
        demand_sigma: 1.0,
        ..Default::default()
    };
    let point = [115.0, 100.0, 100.0];
    let (lower, upper) = tight_band(&point);
    let alerts = generate_alerts(&point, &lower, &upper, &history(), &rules).unwrap();
    assert_eq!(alerts[0].kind, AlertKind::HighDemand);
    assert_eq!(alerts[0].days, Some(vec![1]));
}

#[test]
fn test_mismatched_inputs_fail() {
    assert!(generate_alerts(&[1.0], &[], &[1.0], &history(), &AlertRules::default()).is_err());
}

fn flat_recommendation(level: f64, half_width: f64) -> Recommendation {
    let point = vec![level; 4];
    let lower = vec![level - half_width; 4];
    let upper = vec![level + half_width; 4];
    recommend(&point, &lower, &upper, &history(), &AlertRules::default())
        .unwrap()
        .unwrap()
}

#[rstest]
#[case(111.0, DemandOutlook::Rising)]
#[case(110.0, DemandOutlook::Stable)]
#[case(100.0, DemandOutlook::Stable)]
#[case(90.0, DemandOutlook::Stable)]
#[case(89.0, DemandOutlook::Falling)]
fn test_outlook_against_history(#[case] level: f64, #[case] expected: DemandOutlook) {
    let rec = flat_recommendation(level, 5.0);
    assert_eq!(rec.outlook, expected);
    assert_eq!(rec.forecast_mean, level);
    assert_eq!(rec.historical_mean, 100.0);
    assert_relative_eq!(rec.change_pct.unwrap(), level - 100.0, epsilon = 1e-9);
}

#[rstest]
#[case(30.0, PurchaseStance::Conservative)]
#[case(25.0, PurchaseStance::Balanced)]
#[case(20.0, PurchaseStance::Balanced)]
#[case(15.0, PurchaseStance::Confident)]
#[case(10.0, PurchaseStance::Confident)]
fn test_purchase_stance_tiers(#[case] half_width: f64, #[case] expected: PurchaseStance) {
    let rec = flat_recommendation(100.0, half_width);
    assert_eq!(rec.stance, expected);
    assert_relative_eq!(rec.uncertainty_ratio.unwrap(), half_width * 2.0 / 100.0);
}

#[test]
fn test_purchase_quantities_per_stance() {
    let conservative = flat_recommendation(100.0, 30.0);
    assert_eq!(conservative.daily_units, 70.0);
    assert_eq!(conservative.max_daily_units, None);

    let balanced = flat_recommendation(100.0, 20.0);
    assert_eq!(balanced.daily_units, 100.0);
    assert_eq!(balanced.max_daily_units, None);

    let confident = flat_recommendation(100.0, 10.0);
    assert_eq!(confident.daily_units, 100.0);
    assert_eq!(confident.max_daily_units, Some(110.0));
    assert_eq!(
        confident.to_string(),
        "Demand stable (100.0 vs 100.0 historical, +0.0%); confident purchase of 100 units/day, up to 110"
    );
}

#[test]
fn test_recommendation_uses_horizon_means() {
    let point = [80.0, 120.0, 100.0, 100.0];
    let lower = [70.0, 90.0, 90.0, 90.0];
    let upper = [90.0, 150.0, 110.0, 110.0];

    let rec = recommend(&point, &lower, &upper, &history(), &AlertRules::default())
        .unwrap()
        .unwrap();
    // Mean width 25 over mean point 100
    assert_eq!(rec.stance, PurchaseStance::Confident);
    assert_eq!(rec.max_daily_units, Some(115.0));
}

#[test]
fn test_recommendation_thresholds_are_configurable() {
    let rules = AlertRules {
        outlook_rise: 1.02,
        balanced_ratio: 0.05,
        ..Default::default()
    };
    let point = [105.0; 3];
    let lower = [100.0; 3];
    let upper = [110.0; 3];
    let rec = recommend(&point, &lower, &upper, &history(), &rules)
        .unwrap()
        .unwrap();
    assert_eq!(rec.outlook, DemandOutlook::Rising);
    assert_eq!(rec.stance, PurchaseStance::Balanced);
}

#[test]
fn test_recommendation_edge_inputs() {
    let rules = AlertRules::default();
    assert_eq!(recommend(&[], &[], &[], &history(), &rules).unwrap(), None);
    assert!(recommend(&[1.0], &[1.0], &[], &history(), &rules).is_err());

    let no_history = HistoricalStats {
        mean: 0.0,
        std_dev: 0.0,
        days: 30,
    };
    let rec = recommend(&[3.0], &[3.0], &[3.0], &no_history, &rules)
        .unwrap()
        .unwrap();
    assert_eq!(rec.outlook, DemandOutlook::Rising);
    assert_eq!(rec.change_pct, None);
    assert_eq!(rec.stance, PurchaseStance::Confident);
}
