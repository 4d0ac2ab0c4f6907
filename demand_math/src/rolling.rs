//! Trailing rolling-window statistics
//!
//! A [`RollingWindow`] keeps the most recent `period` observations and reports
//! mean, sample standard deviation, minimum and maximum over whatever it holds.
//! Statistics are available as soon as one value is present (two for the
//! standard deviation), which mirrors a `min_periods = 1` rolling window.

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Fixed-capacity trailing window over a numeric series
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollingWindow {
    period: usize,
    values: VecDeque<f64>,
    sum: f64,
}

/// Snapshot of the four statistics a window reports
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RollingSummary {
    pub mean: Option<f64>,
    pub std_dev: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl RollingWindow {
    /// Create a new rolling window with the specified period
    pub fn new(period: usize) -> Result<Self> {
        if period == 0 {
            return Err(MathError::InvalidInput(
                "Period must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            period,
            values: VecDeque::with_capacity(period + 1),
            sum: 0.0,
        })
    }

    /// Push a new observation, evicting the oldest one once the window is full
    pub fn update(&mut self, value: f64) -> Result<()> {
        if !value.is_finite() {
            return Err(MathError::InvalidInput(format!(
                "Rolling window values must be finite, got {}",
                value
            )));
        }

        self.values.push_back(value);
        self.sum += value;

        if self.values.len() > self.period {
            if let Some(old_value) = self.values.pop_front() {
                self.sum -= old_value;
            }
        }

        Ok(())
    }

    /// Mean of the values currently held
    pub fn mean(&self) -> Result<f64> {
        if self.values.is_empty() {
            return Err(MathError::InsufficientData(
                "Rolling mean needs at least one value".to_string(),
            ));
        }

        Ok(self.sum / self.values.len() as f64)
    }

    /// Sample standard deviation (n - 1 denominator)
    pub fn std_dev(&self) -> Result<f64> {
        let n = self.values.len();
        if n < 2 {
            return Err(MathError::InsufficientData(format!(
                "Sample standard deviation needs at least 2 values, have {}",
                n
            )));
        }

        let mean = self.mean()?;
        let variance = self
            .values
            .iter()
            .map(|&v| (v - mean).powi(2))
            .sum::<f64>()
            / (n - 1) as f64;

        Ok(variance.sqrt())
    }

    /// Smallest value in the window
    pub fn min(&self) -> Result<f64> {
        self.values
            .iter()
            .copied()
            .reduce(f64::min)
            .ok_or_else(|| MathError::InsufficientData("Rolling window is empty".to_string()))
    }

    /// Largest value in the window
    pub fn max(&self) -> Result<f64> {
        self.values
            .iter()
            .copied()
            .reduce(f64::max)
            .ok_or_else(|| MathError::InsufficientData("Rolling window is empty".to_string()))
    }

    /// All four statistics at once, `None` where there is not enough data
    pub fn summary(&self) -> RollingSummary {
        RollingSummary {
            mean: self.mean().ok(),
            std_dev: self.std_dev().ok(),
            min: self.min().ok(),
            max: self.max().ok(),
        }
    }

    /// Sum of the values currently held
    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// Number of values currently held
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the window holds no values yet
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get the configured period
    pub fn period(&self) -> usize {
        self.period
    }

    /// Reset the window, clearing all values
    pub fn reset(&mut self) {
        self.values.clear();
        self.sum = 0.0;
    }
}
