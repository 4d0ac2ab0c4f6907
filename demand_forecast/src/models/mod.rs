//! Boosted-tree forecasting models

use crate::error::Result;
use crate::features::FeatureMatrix;

pub mod gbm;
pub mod params;
pub mod tree;

pub use gbm::{BoostedModel, GradientBoosting, Loss};
pub use params::BoostingParams;
pub use tree::{RegressionTree, TreeNode};

/// A learner that can be trained on a feature matrix
pub trait ForecastModel {
    /// The fitted model produced by [`ForecastModel::train`]
    type Trained: TrainedForecastModel;

    /// Fit on `x` with target `y`
    fn train(&self, x: &FeatureMatrix, y: &[f64]) -> Result<Self::Trained>;

    /// Short identifier used in logs
    fn name(&self) -> &str;
}

/// A fitted model
pub trait TrainedForecastModel {
    /// One prediction per row of `x`
    fn predict(&self, x: &FeatureMatrix) -> Result<Vec<f64>>;

    /// Column order the model was fitted with
    fn feature_names(&self) -> &[String];
}
