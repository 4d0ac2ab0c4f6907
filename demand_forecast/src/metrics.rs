//! Metrics for evaluating forecast performance

use crate::error::{ForecastError, Result};
use demand_math::stats::mean_pinball_loss;
use serde::{Deserialize, Serialize};
use std::fmt;

fn check_lengths(actual: &[f64], predicted: &[f64]) -> Result<()> {
    if actual.len() != predicted.len() || actual.is_empty() {
        return Err(ForecastError::ValidationError(
            "Forecast and actual values must have the same non-zero length".to_string(),
        ));
    }
    Ok(())
}

/// Mean of `|y - y_hat|`
pub fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;
    let total: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).abs())
        .sum();
    Ok(total / actual.len() as f64)
}

/// Square root of the mean of `(y - y_hat)^2`
pub fn root_mean_squared_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;
    let total: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    Ok((total / actual.len() as f64).sqrt())
}

/// Mean absolute percentage error over the points where `y != 0`, in percent
///
/// `None` when every actual value is zero.
pub fn mean_absolute_percentage_error(actual: &[f64], predicted: &[f64]) -> Result<Option<f64>> {
    check_lengths(actual, predicted)?;
    let ratios: Vec<f64> = actual
        .iter()
        .zip(predicted)
        .filter(|(a, _)| **a != 0.0)
        .map(|(a, p)| ((a - p) / a).abs())
        .collect();

    if ratios.is_empty() {
        return Ok(None);
    }
    Ok(Some(ratios.iter().sum::<f64>() / ratios.len() as f64 * 100.0))
}

/// Point-forecast error metrics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastMetrics {
    /// Mean Absolute Error
    pub mae: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Percentage Error; undefined when all actuals are zero
    pub mape: Option<f64>,
}

impl ForecastMetrics {
    pub fn evaluate(actual: &[f64], predicted: &[f64]) -> Result<Self> {
        Ok(Self {
            mae: mean_absolute_error(actual, predicted)?,
            rmse: root_mean_squared_error(actual, predicted)?,
            mape: mean_absolute_percentage_error(actual, predicted)?,
        })
    }

    /// `100 - MAPE`, a display convenience rather than a statistical property
    pub fn precision(&self) -> Option<f64> {
        self.mape.map(|m| 100.0 - m)
    }
}

impl fmt::Display for ForecastMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MAE: {:.2}, RMSE: {:.2}, MAPE: ", self.mae, self.rmse)?;
        match self.mape {
            Some(mape) => write!(f, "{:.2}%", mape),
            None => write!(f, "N/A"),
        }
    }
}

/// Scores of the naive forecast that repeats the training mean
pub fn baseline_metrics(train_target: &[f64], actual: &[f64]) -> Result<ForecastMetrics> {
    let level = demand_math::stats::mean(train_target)?;
    let predicted = vec![level; actual.len()];
    ForecastMetrics::evaluate(actual, &predicted)
}

/// How well a prediction band covers the actual values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntervalMetrics {
    /// Fraction of actual values inside `[lower, upper]`
    pub coverage: f64,
    /// Mean of `upper - lower`
    pub mean_width: f64,
    /// Mean pinball loss of the lower bound at its quantile
    pub lower_pinball: f64,
    /// Mean pinball loss of the upper bound at its quantile
    pub upper_pinball: f64,
}

impl IntervalMetrics {
    pub fn evaluate(
        actual: &[f64],
        lower: &[f64],
        upper: &[f64],
        quantiles: (f64, f64),
    ) -> Result<Self> {
        check_lengths(actual, lower)?;
        check_lengths(actual, upper)?;

        let n = actual.len() as f64;
        let covered = actual
            .iter()
            .zip(lower.iter().zip(upper))
            .filter(|(a, (l, u))| *a >= *l && *a <= *u)
            .count();
        let width: f64 = lower.iter().zip(upper).map(|(l, u)| u - l).sum();

        Ok(Self {
            coverage: covered as f64 / n,
            mean_width: width / n,
            lower_pinball: mean_pinball_loss(actual, lower, quantiles.0)?,
            upper_pinball: mean_pinball_loss(actual, upper, quantiles.1)?,
        })
    }
}
