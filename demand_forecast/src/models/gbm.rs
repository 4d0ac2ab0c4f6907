//! Gradient boosting over regression trees

use super::params::BoostingParams;
use super::tree::{Gradients, RegressionTree, TreeConfig};
use super::{ForecastModel, TrainedForecastModel};
use crate::error::{ForecastError, Result};
use crate::features::FeatureMatrix;
use demand_math::stats::quantile;
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

/// Training objective
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Loss {
    /// Mean squared error; the model estimates the conditional mean
    SquaredError,
    /// Pinball loss at `alpha`; the model estimates the conditional `alpha`-quantile
    Quantile { alpha: f64 },
}

impl Loss {
    pub fn validate(&self) -> Result<()> {
        match self {
            Loss::SquaredError => Ok(()),
            Loss::Quantile { alpha } if *alpha > 0.0 && *alpha < 1.0 => Ok(()),
            Loss::Quantile { alpha } => Err(ForecastError::InvalidParameter(format!(
                "Quantile level must be in (0, 1), got {}",
                alpha
            ))),
        }
    }

    /// Constant prediction the boosting starts from
    fn base_score(&self, y: &[f64]) -> Result<f64> {
        match self {
            Loss::SquaredError => Ok(demand_math::stats::mean(y)?),
            Loss::Quantile { alpha } => Ok(quantile(y, *alpha)?),
        }
    }

    /// First and second derivative of the loss with respect to the prediction
    fn derivatives(&self, actual: f64, predicted: f64) -> (f64, f64) {
        match self {
            Loss::SquaredError => (predicted - actual, 1.0),
            Loss::Quantile { alpha } => {
                if actual > predicted {
                    (-alpha, 1.0)
                } else {
                    (1.0 - alpha, 1.0)
                }
            }
        }
    }
}

/// Boosted-tree learner; `fit` produces a [`BoostedModel`]
#[derive(Debug, Clone, PartialEq)]
pub struct GradientBoosting {
    params: BoostingParams,
    loss: Loss,
    seed: u64,
}

impl GradientBoosting {
    pub fn new(params: BoostingParams, loss: Loss) -> Self {
        Self {
            params,
            loss,
            seed: 0,
        }
    }

    /// Seed for row and column subsampling
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn params(&self) -> &BoostingParams {
        &self.params
    }

    pub fn loss(&self) -> Loss {
        self.loss
    }

    pub fn fit(&self, x: &FeatureMatrix, y: &[f64]) -> Result<BoostedModel> {
        self.params.validate()?;
        self.loss.validate()?;

        if x.is_empty() {
            return Err(ForecastError::TrainingError(
                "Cannot fit on an empty feature matrix".to_string(),
            ));
        }
        if x.n_rows() != y.len() {
            return Err(ForecastError::TrainingError(format!(
                "Feature rows ({}) don't match target length ({})",
                x.n_rows(),
                y.len()
            )));
        }
        if x.n_features() == 0 {
            return Err(ForecastError::TrainingError(
                "Cannot fit without feature columns".to_string(),
            ));
        }
        if y.iter().any(|v| !v.is_finite())
            || x.rows().iter().flatten().any(|v| !v.is_finite())
        {
            return Err(ForecastError::TrainingError(
                "Training data contains non-finite values".to_string(),
            ));
        }

        let rows = x.rows();
        let n_rows = x.n_rows();
        let n_features = x.n_features();
        let row_budget = sample_size(n_rows, self.params.subsample);
        let column_budget = sample_size(n_features, self.params.colsample_bytree);

        let tree_config = TreeConfig {
            max_depth: self.params.max_depth,
            min_child_weight: self.params.min_child_weight,
            reg_alpha: self.params.reg_alpha,
            reg_lambda: self.params.reg_lambda,
        };

        let base_score = self.loss.base_score(y)?;
        let mut predictions = vec![base_score; n_rows];
        let mut grad = vec![0.0; n_rows];
        let mut hess = vec![0.0; n_rows];
        let mut importance = vec![0.0; n_features];
        let mut trees = Vec::with_capacity(self.params.n_estimators);
        let mut rng = StdRng::seed_from_u64(self.seed);

        for round in 0..self.params.n_estimators {
            for i in 0..n_rows {
                let (g, h) = self.loss.derivatives(y[i], predictions[i]);
                grad[i] = g;
                hess[i] = h;
            }

            let sampled_rows = draw(&mut rng, n_rows, row_budget);
            let sampled_features = draw(&mut rng, n_features, column_budget);

            let mut tree = RegressionTree::fit(
                rows,
                &Gradients {
                    grad: &grad,
                    hess: &hess,
                },
                &sampled_rows,
                &sampled_features,
                &tree_config,
                &mut importance,
            );

            match self.loss {
                Loss::SquaredError => tree.scale(self.params.learning_rate),
                Loss::Quantile { alpha } => {
                    let learning_rate = self.params.learning_rate;
                    let current = &predictions;
                    tree.refit_leaves(rows, &sampled_rows, &|leaf_rows: &[usize]| {
                        let residuals: Vec<f64> =
                            leaf_rows.iter().map(|&r| y[r] - current[r]).collect();
                        quantile(&residuals, alpha).unwrap_or(0.0) * learning_rate
                    });
                }
            }

            for (prediction, row) in predictions.iter_mut().zip(rows) {
                *prediction += tree.predict_row(row);
            }

            if predictions.iter().any(|p| !p.is_finite()) {
                return Err(ForecastError::TrainingError(format!(
                    "Predictions diverged at boosting round {}",
                    round
                )));
            }

            trees.push(tree);
        }

        debug!(
            trees = trees.len(),
            rows = n_rows,
            features = n_features,
            loss = ?self.loss,
            "fitted boosted model"
        );

        Ok(BoostedModel {
            feature_names: x.feature_names().to_vec(),
            loss: self.loss,
            base_score,
            trees,
            gain_importance: importance,
        })
    }
}

fn sample_size(total: usize, fraction: f64) -> usize {
    ((total as f64 * fraction).round() as usize).clamp(1, total)
}

/// Sorted random subset of `0..total` of size `amount`; the full range when `amount == total`
fn draw(rng: &mut StdRng, total: usize, amount: usize) -> Vec<usize> {
    if amount >= total {
        return (0..total).collect();
    }
    let mut picked = sample(rng, total, amount).into_vec();
    picked.sort_unstable();
    picked
}

/// Fitted ensemble: base score plus the sum of tree outputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoostedModel {
    feature_names: Vec<String>,
    loss: Loss,
    base_score: f64,
    trees: Vec<RegressionTree>,
    gain_importance: Vec<f64>,
}

impl BoostedModel {
    pub fn loss(&self) -> Loss {
        self.loss
    }

    pub fn base_score(&self) -> f64 {
        self.base_score
    }

    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Raw prediction for one row in fit-time column order
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        self.base_score + self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>()
    }

    /// Total split gain per feature, normalized to sum to 1, highest first
    ///
    /// A model whose trees never split has no gain to share out; every
    /// feature then gets 0.0.
    pub fn feature_importance(&self) -> Vec<(String, f64)> {
        let total: f64 = self.gain_importance.iter().sum();
        let mut ranking: Vec<(String, f64)> = self
            .feature_names
            .iter()
            .zip(&self.gain_importance)
            .map(|(name, &gain)| {
                let share = if total > 0.0 { gain / total } else { 0.0 };
                (name.clone(), share)
            })
            .collect();
        ranking.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        ranking
    }
}

impl TrainedForecastModel for BoostedModel {
    /// Raw predictions; the columns of `x` are reordered to the fit-time order
    fn predict(&self, x: &FeatureMatrix) -> Result<Vec<f64>> {
        let aligned = x.align_to(&self.feature_names)?;
        Ok(aligned.rows().iter().map(|row| self.predict_row(row)).collect())
    }

    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }
}

impl ForecastModel for GradientBoosting {
    type Trained = BoostedModel;

    fn train(&self, x: &FeatureMatrix, y: &[f64]) -> Result<BoostedModel> {
        self.fit(x, y)
    }

    fn name(&self) -> &str {
        match self.loss {
            Loss::SquaredError => "gbm-squared-error",
            Loss::Quantile { .. } => "gbm-quantile",
        }
    }
}
