//! Point forecaster: one squared-error boosted model with non-negative output

use crate::error::Result;
use crate::features::FeatureMatrix;
use crate::models::{
    BoostedModel, BoostingParams, ForecastModel, GradientBoosting, Loss, TrainedForecastModel,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Fits the point model with given (or default) hyperparameters
#[derive(Debug, Clone, PartialEq)]
pub struct PointForecaster {
    params: BoostingParams,
    seed: u64,
}

impl Default for PointForecaster {
    fn default() -> Self {
        Self::new(BoostingParams::default())
    }
}

impl PointForecaster {
    pub fn new(params: BoostingParams) -> Self {
        Self { params, seed: 0 }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn params(&self) -> &BoostingParams {
        &self.params
    }

    pub fn fit(&self, x: &FeatureMatrix, y: &[f64]) -> Result<PointModel> {
        let model = GradientBoosting::new(self.params, Loss::SquaredError)
            .with_seed(self.seed)
            .fit(x, y)?;
        debug!(rows = x.n_rows(), trees = model.n_trees(), "fitted point model");
        Ok(PointModel {
            model,
            params: self.params,
        })
    }
}

impl ForecastModel for PointForecaster {
    type Trained = PointModel;

    fn train(&self, x: &FeatureMatrix, y: &[f64]) -> Result<PointModel> {
        self.fit(x, y)
    }

    fn name(&self) -> &str {
        "point"
    }
}

/// Fitted point model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointModel {
    model: BoostedModel,
    params: BoostingParams,
}

impl PointModel {
    pub fn params(&self) -> &BoostingParams {
        &self.params
    }

    pub fn booster(&self) -> &BoostedModel {
        &self.model
    }

    /// Predictions before clipping at zero
    pub fn predict_raw(&self, x: &FeatureMatrix) -> Result<Vec<f64>> {
        self.model.predict(x)
    }

    /// Gain-based importance, normalized and sorted descending
    pub fn feature_importance(&self) -> Vec<(String, f64)> {
        self.model.feature_importance()
    }
}

impl TrainedForecastModel for PointModel {
    /// Demand predictions, negative raw outputs clipped to zero
    fn predict(&self, x: &FeatureMatrix) -> Result<Vec<f64>> {
        Ok(self
            .predict_raw(x)?
            .into_iter()
            .map(|v| v.max(0.0))
            .collect())
    }

    fn feature_names(&self) -> &[String] {
        self.model.feature_names()
    }
}
