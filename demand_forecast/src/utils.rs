//! Utility functions for the demand_forecast crate

use crate::error::{ForecastError, Result};
use chrono::{Duration, NaiveDate};

/// The `horizon` calendar days following `last_date`
pub fn future_dates(last_date: NaiveDate, horizon: usize) -> Result<Vec<NaiveDate>> {
    let mut dates = Vec::with_capacity(horizon);
    let mut current = last_date;

    for _ in 0..horizon {
        current = current
            .checked_add_signed(Duration::days(1))
            .ok_or_else(|| {
                ForecastError::DataError(format!("Date overflow after {}", current))
            })?;
        dates.push(current);
    }

    Ok(dates)
}

/// Index that splits `len` rows at `fraction`, rounded down
pub fn split_index(len: usize, fraction: f64) -> usize {
    ((len as f64 * fraction).floor() as usize).min(len)
}
