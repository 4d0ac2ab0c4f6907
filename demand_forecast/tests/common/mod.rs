#![allow(dead_code)]

use chrono::{Datelike, NaiveDate};
use demand_forecast::{DemandSeries, FeatureBuilder, TrainingSet};

pub fn start_date() -> NaiveDate {
    // A Monday
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

pub fn dates(n: usize) -> Vec<NaiveDate> {
    start_date().iter_days().take(n).collect()
}

/// Weekday demand around 80, weekend demand around 40, no trend
pub fn weekly_quantities(dates: &[NaiveDate]) -> Vec<f64> {
    dates
        .iter()
        .enumerate()
        .map(|(i, d)| {
            let level = if d.weekday().num_days_from_monday() >= 5 {
                40.0
            } else {
                80.0
            };
            level + ((i * 13) % 5) as f64 - 2.0
        })
        .collect()
}

pub fn weekly_series(n: usize) -> DemandSeries {
    let dates = dates(n);
    let quantities = weekly_quantities(&dates);
    DemandSeries::from_parts("croissant", "downtown", dates, quantities).unwrap()
}

pub fn weekly_training_set(n: usize) -> TrainingSet {
    FeatureBuilder::new()
        .training_set(&weekly_series(n))
        .unwrap()
}
