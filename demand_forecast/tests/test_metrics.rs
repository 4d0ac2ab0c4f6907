use approx::assert_relative_eq;
use demand_forecast::metrics::{
    baseline_metrics, mean_absolute_error, mean_absolute_percentage_error,
    root_mean_squared_error,
};
use demand_forecast::{ForecastMetrics, IntervalMetrics};
use rstest::rstest;

#[test]
fn test_reference_example() {
    let actual = [10.0, 20.0, 30.0];
    let predicted = [12.0, 18.0, 33.0];

    let metrics = ForecastMetrics::evaluate(&actual, &predicted).unwrap();
    assert_relative_eq!(metrics.mae, 2.333, epsilon = 1e-3);
    assert_relative_eq!(metrics.rmse, 2.380, epsilon = 1e-3);
    assert_relative_eq!(metrics.mape.unwrap(), 13.33, epsilon = 1e-2);
    assert_relative_eq!(metrics.precision().unwrap(), 86.67, epsilon = 1e-2);
}

#[test]
fn test_free_functions_match_struct() {
    let actual = [5.0, 7.0, 0.0, 4.0];
    let predicted = [6.0, 7.0, 1.0, 2.0];

    let metrics = ForecastMetrics::evaluate(&actual, &predicted).unwrap();
    assert_relative_eq!(metrics.mae, mean_absolute_error(&actual, &predicted).unwrap());
    assert_relative_eq!(
        metrics.rmse,
        root_mean_squared_error(&actual, &predicted).unwrap()
    );
    // The zero actual is skipped: mean(1/5, 0, 2/4) * 100
    assert_relative_eq!(
        mean_absolute_percentage_error(&actual, &predicted)
            .unwrap()
            .unwrap(),
        (0.2 + 0.0 + 0.5) / 3.0 * 100.0,
        epsilon = 1e-9
    );
}

#[rstest]
#[case(vec![0.0], vec![0.0])]
#[case(vec![0.0, 0.0, 0.0], vec![1.0, 2.0, 3.0])]
fn test_mape_undefined_when_all_actuals_zero(
    #[case] actual: Vec<f64>,
    #[case] predicted: Vec<f64>,
) {
    let metrics = ForecastMetrics::evaluate(&actual, &predicted).unwrap();
    assert!(metrics.mape.is_none());
    assert!(format!("{}", metrics).contains("N/A"));
}

#[test]
fn test_mismatched_lengths_fail() {
    assert!(ForecastMetrics::evaluate(&[1.0, 2.0], &[1.0]).is_err());
    assert!(ForecastMetrics::evaluate(&[], &[]).is_err());
}

#[test]
fn test_baseline_repeats_training_mean() {
    let train = [10.0, 20.0, 30.0];
    let test = [20.0, 25.0];

    let baseline = baseline_metrics(&train, &test).unwrap();
    assert_relative_eq!(baseline.mae, 2.5);
    assert_relative_eq!(baseline.mape.unwrap(), 10.0);
}

#[test]
fn test_interval_coverage_and_pinball() {
    let actual = [10.0, 10.0, 10.0, 10.0];
    let lower = [8.0, 9.0, 11.0, 5.0];
    let upper = [12.0, 9.5, 13.0, 15.0];

    let metrics = IntervalMetrics::evaluate(&actual, &lower, &upper, (0.1, 0.9)).unwrap();
    assert_relative_eq!(metrics.coverage, 0.5);
    assert_relative_eq!(metrics.mean_width, (4.0 + 0.5 + 2.0 + 10.0) / 4.0);
    assert!(metrics.lower_pinball > 0.0);
    assert!(metrics.upper_pinball > 0.0);
}
