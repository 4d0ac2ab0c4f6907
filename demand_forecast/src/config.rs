//! Run configuration

use crate::alerts::AlertRules;
use crate::error::{ForecastError, Result};
use crate::features::DEFAULT_MIN_TRAINING_ROWS;
use crate::interval::QuantileSettings;
use crate::optimizer::SearchSpace;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings for one forecasting run
///
/// Every field has a default, so a JSON document only needs the fields it
/// overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Days to forecast past the last observation (7-60)
    pub horizon_days: usize,
    /// Hyperparameter search budget (at least 1)
    pub n_trials: usize,
    /// Share of clean rows used for training; the rest is the test set (0.6-0.9)
    pub train_fraction: f64,
    /// Share of the training rows the optimizer fits on; the rest validates
    pub validation_fraction: f64,
    /// Two-sided coverage target of the prediction band, in (0, 1)
    pub confidence_level: f64,
    /// Seed for subsampling and the hyperparameter search
    pub seed: u64,
    /// Clean rows needed before any model is trained
    pub min_training_rows: usize,
    pub quantile: QuantileSettings,
    pub alert_rules: AlertRules,
    pub search_space: SearchSpace,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizon_days: 14,
            n_trials: 20,
            train_fraction: 0.8,
            validation_fraction: 0.8,
            confidence_level: 0.95,
            seed: 42,
            min_training_rows: DEFAULT_MIN_TRAINING_ROWS,
            quantile: QuantileSettings::default(),
            alert_rules: AlertRules::default(),
            search_space: SearchSpace::default(),
        }
    }
}

impl ForecastConfig {
    pub fn validate(&self) -> Result<()> {
        if !(7..=60).contains(&self.horizon_days) {
            return Err(ForecastError::InvalidParameter(format!(
                "horizon_days must be between 7 and 60, got {}",
                self.horizon_days
            )));
        }
        if self.n_trials == 0 {
            return Err(ForecastError::InvalidParameter(
                "n_trials must be at least 1".to_string(),
            ));
        }
        if !(0.6..=0.9).contains(&self.train_fraction) {
            return Err(ForecastError::InvalidParameter(format!(
                "train_fraction must be between 0.6 and 0.9, got {}",
                self.train_fraction
            )));
        }
        if !(self.validation_fraction > 0.0 && self.validation_fraction <= 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "validation_fraction must be in (0, 1], got {}",
                self.validation_fraction
            )));
        }
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "confidence_level must be in (0, 1), got {}",
                self.confidence_level
            )));
        }
        if self.min_training_rows == 0 {
            return Err(ForecastError::InvalidParameter(
                "min_training_rows must be at least 1".to_string(),
            ));
        }
        self.quantile.validate()?;
        self.alert_rules.validate()?;
        self.search_space.validate()?;
        Ok(())
    }

    /// Parse and validate a JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a JSON file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn with_horizon(mut self, horizon_days: usize) -> Self {
        self.horizon_days = horizon_days;
        self
    }

    pub fn with_trials(mut self, n_trials: usize) -> Self {
        self.n_trials = n_trials;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}
