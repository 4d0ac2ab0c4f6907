//! Random-search hyperparameter optimization for the point model
//!
//! Candidates are drawn up front from one seeded generator and then scored
//! in parallel. Every trial fits with the same seed, and ties are resolved in
//! favour of the earliest trial, so the outcome does not depend on thread
//! scheduling.

use crate::error::{ForecastError, Result};
use crate::features::FeatureMatrix;
use crate::metrics::mean_absolute_error;
use crate::models::{BoostingParams, GradientBoosting, Loss, TrainedForecastModel};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Inclusive bounds of the hyperparameter search
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSpace {
    pub max_depth: (usize, usize),
    pub learning_rate: (f64, f64),
    pub n_estimators: (usize, usize),
    pub min_child_weight: (f64, f64),
    pub subsample: (f64, f64),
    pub colsample_bytree: (f64, f64),
    pub reg_alpha: (f64, f64),
    pub reg_lambda: (f64, f64),
}

impl Default for SearchSpace {
    fn default() -> Self {
        Self {
            max_depth: (3, 8),
            learning_rate: (0.01, 0.2),
            n_estimators: (50, 200),
            min_child_weight: (1.0, 5.0),
            subsample: (0.6, 1.0),
            colsample_bytree: (0.6, 1.0),
            reg_alpha: (0.0, 0.5),
            reg_lambda: (0.0, 0.5),
        }
    }
}

impl SearchSpace {
    pub fn validate(&self) -> Result<()> {
        let int_ranges = [
            ("max_depth", self.max_depth),
            ("n_estimators", self.n_estimators),
        ];
        for (name, (low, high)) in int_ranges {
            if low == 0 || low > high {
                return Err(ForecastError::InvalidParameter(format!(
                    "Search range for {} must satisfy 1 <= low <= high, got ({}, {})",
                    name, low, high
                )));
            }
        }

        let float_ranges = [
            ("learning_rate", self.learning_rate),
            ("min_child_weight", self.min_child_weight),
            ("subsample", self.subsample),
            ("colsample_bytree", self.colsample_bytree),
            ("reg_alpha", self.reg_alpha),
            ("reg_lambda", self.reg_lambda),
        ];
        for (name, (low, high)) in float_ranges {
            if !(low.is_finite() && high.is_finite()) || low < 0.0 || low > high {
                return Err(ForecastError::InvalidParameter(format!(
                    "Search range for {} must satisfy 0 <= low <= high, got ({}, {})",
                    name, low, high
                )));
            }
        }

        if self.learning_rate.0 <= 0.0 || self.learning_rate.1 > 1.0 {
            return Err(ForecastError::InvalidParameter(
                "Learning rate range must lie in (0, 1]".to_string(),
            ));
        }
        if self.subsample.0 <= 0.0 || self.subsample.1 > 1.0 {
            return Err(ForecastError::InvalidParameter(
                "Subsample range must lie in (0, 1]".to_string(),
            ));
        }
        if self.colsample_bytree.0 <= 0.0 || self.colsample_bytree.1 > 1.0 {
            return Err(ForecastError::InvalidParameter(
                "Column sample range must lie in (0, 1]".to_string(),
            ));
        }
        Ok(())
    }

    /// Draw one candidate uniformly from the space
    pub fn sample<R: Rng>(&self, rng: &mut R) -> BoostingParams {
        BoostingParams {
            max_depth: rng.gen_range(self.max_depth.0..=self.max_depth.1),
            learning_rate: uniform(rng, self.learning_rate),
            n_estimators: rng.gen_range(self.n_estimators.0..=self.n_estimators.1),
            min_child_weight: uniform(rng, self.min_child_weight),
            subsample: uniform(rng, self.subsample),
            colsample_bytree: uniform(rng, self.colsample_bytree),
            reg_alpha: uniform(rng, self.reg_alpha),
            reg_lambda: uniform(rng, self.reg_lambda),
        }
    }
}

fn uniform<R: Rng>(rng: &mut R, (low, high): (f64, f64)) -> f64 {
    if high > low {
        rng.gen_range(low..=high)
    } else {
        low
    }
}

/// One evaluated candidate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    /// Position in draw order, starting at 0
    pub trial: usize,
    pub params: BoostingParams,
    /// Validation mean absolute error
    pub score: f64,
}

/// Best candidate plus the full trial history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationOutcome {
    pub best: TrialRecord,
    pub trials: Vec<TrialRecord>,
}

impl OptimizationOutcome {
    pub fn best_params(&self) -> BoostingParams {
        self.best.params
    }
}

/// Seeded random search minimizing validation MAE
#[derive(Debug, Clone, PartialEq)]
pub struct HyperparameterOptimizer {
    space: SearchSpace,
    seed: u64,
}

impl Default for HyperparameterOptimizer {
    fn default() -> Self {
        Self {
            space: SearchSpace::default(),
            seed: 42,
        }
    }
}

impl HyperparameterOptimizer {
    pub fn new(space: SearchSpace, seed: u64) -> Result<Self> {
        space.validate()?;
        Ok(Self { space, seed })
    }

    pub fn space(&self) -> &SearchSpace {
        &self.space
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Best parameters after `n_trials` candidates
    pub fn optimize(
        &self,
        x_train: &FeatureMatrix,
        y_train: &[f64],
        x_val: &FeatureMatrix,
        y_val: &[f64],
        n_trials: usize,
    ) -> Result<BoostingParams> {
        self.optimize_with_history(x_train, y_train, x_val, y_val, n_trials)
            .map(|outcome| outcome.best_params())
    }

    /// Like [`HyperparameterOptimizer::optimize`], keeping every trial's score
    pub fn optimize_with_history(
        &self,
        x_train: &FeatureMatrix,
        y_train: &[f64],
        x_val: &FeatureMatrix,
        y_val: &[f64],
        n_trials: usize,
    ) -> Result<OptimizationOutcome> {
        if n_trials == 0 {
            return Err(ForecastError::InvalidParameter(
                "n_trials must be at least 1".to_string(),
            ));
        }
        if x_val.is_empty() || x_val.n_rows() != y_val.len() {
            return Err(ForecastError::ValidationError(format!(
                "Validation split needs matching, non-empty features and target ({} rows, {} targets)",
                x_val.n_rows(),
                y_val.len()
            )));
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let candidates: Vec<BoostingParams> =
            (0..n_trials).map(|_| self.space.sample(&mut rng)).collect();

        let trials = candidates
            .into_par_iter()
            .enumerate()
            .map(|(trial, params)| -> Result<TrialRecord> {
                let model = GradientBoosting::new(params, Loss::SquaredError)
                    .with_seed(self.seed)
                    .fit(x_train, y_train)?;
                let predictions = model.predict(x_val)?;
                let score = mean_absolute_error(y_val, &predictions)?;
                debug!(trial, score, ?params, "scored candidate");
                Ok(TrialRecord {
                    trial,
                    params,
                    score,
                })
            })
            .collect::<Result<Vec<TrialRecord>>>()?;

        let best = trials
            .iter()
            .filter(|t| t.score.is_finite())
            .fold(None::<TrialRecord>, |best, t| match best {
                Some(b) if b.score <= t.score => Some(b),
                _ => Some(*t),
            })
            .ok_or_else(|| {
                ForecastError::TrainingError("No trial produced a finite score".to_string())
            })?;

        info!(
            n_trials,
            best_trial = best.trial,
            best_mae = best.score,
            "hyperparameter search finished"
        );

        Ok(OptimizationOutcome { best, trials })
    }
}
