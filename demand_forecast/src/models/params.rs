//! Hyperparameters of the boosted-tree models

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};

/// Gradient boosting hyperparameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoostingParams {
    /// Maximum depth of each tree
    pub max_depth: usize,
    /// Shrinkage applied to every tree's output
    pub learning_rate: f64,
    /// Number of boosting rounds
    pub n_estimators: usize,
    /// Minimum hessian sum in a child (row count for the objectives used here)
    pub min_child_weight: f64,
    /// Fraction of rows sampled per tree
    pub subsample: f64,
    /// Fraction of columns sampled per tree
    pub colsample_bytree: f64,
    /// L1 regularization on leaf weights
    pub reg_alpha: f64,
    /// L2 regularization on leaf weights
    pub reg_lambda: f64,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            max_depth: 6,
            learning_rate: 0.1,
            n_estimators: 100,
            min_child_weight: 1.0,
            subsample: 1.0,
            colsample_bytree: 1.0,
            reg_alpha: 0.0,
            reg_lambda: 1.0,
        }
    }
}

impl BoostingParams {
    pub fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            return Err(ForecastError::InvalidParameter(
                "max_depth must be at least 1".to_string(),
            ));
        }
        if self.n_estimators == 0 {
            return Err(ForecastError::InvalidParameter(
                "n_estimators must be at least 1".to_string(),
            ));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "learning_rate must be in (0, 1], got {}",
                self.learning_rate
            )));
        }
        if !(self.subsample > 0.0 && self.subsample <= 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "subsample must be in (0, 1], got {}",
                self.subsample
            )));
        }
        if !(self.colsample_bytree > 0.0 && self.colsample_bytree <= 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "colsample_bytree must be in (0, 1], got {}",
                self.colsample_bytree
            )));
        }
        if !(self.min_child_weight >= 0.0) || !(self.reg_alpha >= 0.0) || !(self.reg_lambda >= 0.0)
        {
            return Err(ForecastError::InvalidParameter(
                "min_child_weight, reg_alpha and reg_lambda must be non-negative".to_string(),
            ));
        }
        Ok(())
    }

    /// Same parameters with fewer trees, for the quantile models
    ///
    /// The tree count becomes `max(min_trees, n_estimators * tree_fraction)`.
    pub fn lighter(&self, tree_fraction: f64, min_trees: usize) -> Self {
        let scaled = (self.n_estimators as f64 * tree_fraction).floor() as usize;
        Self {
            n_estimators: scaled.max(min_trees).max(1),
            ..*self
        }
    }
}
