//! Prediction intervals from a pair of quantile models
//!
//! The two bounds are fitted independently of the point model, so nothing
//! stops them from crossing it. [`clamp_band`] restores `0 <= lower <= point
//! <= upper` after the fact; how often it had to intervene is logged as a
//! model-quality signal.

use crate::error::{ForecastError, Result};
use crate::features::FeatureMatrix;
use crate::models::{BoostedModel, BoostingParams, GradientBoosting, Loss, TrainedForecastModel};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Tree budget of the quantile models relative to the point model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuantileSettings {
    /// Fraction of the point model's trees
    pub tree_fraction: f64,
    /// Floor on the number of trees
    pub min_trees: usize,
}

impl Default for QuantileSettings {
    fn default() -> Self {
        Self {
            tree_fraction: 0.5,
            min_trees: 50,
        }
    }
}

impl QuantileSettings {
    pub fn validate(&self) -> Result<()> {
        if !(self.tree_fraction > 0.0 && self.tree_fraction <= 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "Quantile tree fraction must be in (0, 1], got {}",
                self.tree_fraction
            )));
        }
        if self.min_trees == 0 {
            return Err(ForecastError::InvalidParameter(
                "Quantile models need at least one tree".to_string(),
            ));
        }
        Ok(())
    }
}

/// Lower and upper quantile levels for a two-sided band at `confidence_level`
pub fn quantile_levels(confidence_level: f64) -> Result<(f64, f64)> {
    if !(confidence_level > 0.0 && confidence_level < 1.0) {
        return Err(ForecastError::InvalidParameter(format!(
            "Confidence level must be in (0, 1), got {}",
            confidence_level
        )));
    }
    let lower = (1.0 - confidence_level) / 2.0;
    Ok((lower, 1.0 - lower))
}

/// Fits the lower and upper quantile models
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalEstimator {
    confidence_level: f64,
    params: BoostingParams,
    seed: u64,
}

impl IntervalEstimator {
    /// Estimator whose models use a lighter copy of `point_params`
    pub fn new(
        confidence_level: f64,
        point_params: &BoostingParams,
        settings: &QuantileSettings,
    ) -> Result<Self> {
        quantile_levels(confidence_level)?;
        settings.validate()?;
        Ok(Self {
            confidence_level,
            params: point_params.lighter(settings.tree_fraction, settings.min_trees),
            seed: 0,
        })
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn confidence_level(&self) -> f64 {
        self.confidence_level
    }

    pub fn params(&self) -> &BoostingParams {
        &self.params
    }

    /// `(q_lo, q_hi)`
    pub fn quantiles(&self) -> (f64, f64) {
        let lower = (1.0 - self.confidence_level) / 2.0;
        (lower, 1.0 - lower)
    }

    pub fn fit(&self, x: &FeatureMatrix, y: &[f64]) -> Result<IntervalModel> {
        let (q_lo, q_hi) = self.quantiles();

        let lower = GradientBoosting::new(self.params, Loss::Quantile { alpha: q_lo })
            .with_seed(self.seed)
            .fit(x, y)?;
        let upper = GradientBoosting::new(self.params, Loss::Quantile { alpha: q_hi })
            .with_seed(self.seed)
            .fit(x, y)?;

        debug!(q_lo, q_hi, trees = self.params.n_estimators, "fitted quantile models");

        Ok(IntervalModel {
            lower,
            upper,
            confidence_level: self.confidence_level,
        })
    }
}

/// Fitted lower and upper quantile models
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalModel {
    lower: BoostedModel,
    upper: BoostedModel,
    confidence_level: f64,
}

impl IntervalModel {
    pub fn confidence_level(&self) -> f64 {
        self.confidence_level
    }

    pub fn lower_model(&self) -> &BoostedModel {
        &self.lower
    }

    pub fn upper_model(&self) -> &BoostedModel {
        &self.upper
    }

    /// Raw `(lower, upper)` predictions, unclamped
    pub fn predict(&self, x: &FeatureMatrix) -> Result<(Vec<f64>, Vec<f64>)> {
        Ok((self.lower.predict(x)?, self.upper.predict(x)?))
    }
}

/// Bounds after the consistency clamp
#[derive(Debug, Clone, PartialEq)]
pub struct ClampedBand {
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
    /// Points where the raw bounds were inverted or excluded the point forecast
    pub inversions: usize,
}

/// Force `0 <= lower <= point <= upper` for each position
///
/// `lower = min(max(lower, 0), point)` and `upper = max(upper, point)`.
/// `point` is expected to be non-negative already.
pub fn clamp_band(point: &[f64], lower: &[f64], upper: &[f64]) -> Result<ClampedBand> {
    if point.len() != lower.len() || point.len() != upper.len() {
        return Err(ForecastError::ValidationError(format!(
            "Band lengths disagree: {} points, {} lower, {} upper",
            point.len(),
            lower.len(),
            upper.len()
        )));
    }

    let mut inversions = 0;
    let mut clamped_lower = Vec::with_capacity(point.len());
    let mut clamped_upper = Vec::with_capacity(point.len());

    for ((&p, &l), &u) in point.iter().zip(lower).zip(upper) {
        if l > u || l > p || u < p || l < 0.0 {
            inversions += 1;
        }
        clamped_lower.push(l.max(0.0).min(p));
        clamped_upper.push(u.max(p));
    }

    if inversions > 0 {
        warn!(
            inversions,
            points = point.len(),
            "quantile bounds were inconsistent with the point forecast and were clamped"
        );
    }

    Ok(ClampedBand {
        lower: clamped_lower,
        upper: clamped_upper,
        inversions,
    })
}
