//! Trained state of one forecasting run
//!
//! A [`ModelArtifact`] bundles the point and quantile models with the
//! metadata needed to use them again. It is returned to the caller, never
//! cached by the crate, and can be written to and read from a JSON file.

use crate::error::{ForecastError, Result};
use crate::features::FeatureMatrix;
use crate::forecast::BandPrediction;
use crate::forecaster::{PointForecaster, PointModel};
use crate::interval::{clamp_band, IntervalEstimator, IntervalModel, QuantileSettings};
use crate::models::{BoostingParams, TrainedForecastModel};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    point: PointModel,
    interval: IntervalModel,
    params: BoostingParams,
    feature_names: Vec<String>,
    confidence_level: f64,
    seed: u64,
}

impl ModelArtifact {
    /// Fit the point model and both quantile models on the same data
    pub fn fit(
        x: &FeatureMatrix,
        y: &[f64],
        params: BoostingParams,
        confidence_level: f64,
        quantile: &QuantileSettings,
        seed: u64,
    ) -> Result<Self> {
        let point = PointForecaster::new(params).with_seed(seed).fit(x, y)?;
        let interval = IntervalEstimator::new(confidence_level, &params, quantile)?
            .with_seed(seed)
            .fit(x, y)?;

        info!(
            rows = x.n_rows(),
            features = x.n_features(),
            confidence_level,
            "model artifact trained"
        );

        Ok(Self {
            point,
            interval,
            params,
            feature_names: x.feature_names().to_vec(),
            confidence_level,
            seed,
        })
    }

    pub fn point_model(&self) -> &PointModel {
        &self.point
    }

    pub fn interval_model(&self) -> &IntervalModel {
        &self.interval
    }

    pub fn params(&self) -> &BoostingParams {
        &self.params
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn confidence_level(&self) -> f64 {
        self.confidence_level
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Banded predictions for rows whose columns match the fit-time set
    ///
    /// Columns may come in any order; a different column set is a
    /// [`ForecastError::SchemaMismatch`].
    pub fn predict(&self, x: &FeatureMatrix) -> Result<BandPrediction> {
        let aligned = x.align_to(&self.feature_names)?;
        self.predict_aligned(&aligned)
    }

    /// Banded predictions for future-day rows
    ///
    /// Fit-time columns the rows lack are filled with zero.
    pub fn predict_future(&self, x: &FeatureMatrix) -> Result<BandPrediction> {
        let (aligned, filled) = x.align_filling_missing(&self.feature_names);
        if !filled.is_empty() {
            debug!(?filled, "zero-filled columns missing from future rows");
        }
        self.predict_aligned(&aligned)
    }

    fn predict_aligned(&self, x: &FeatureMatrix) -> Result<BandPrediction> {
        let point = self.point.predict(x)?;
        let (lower_raw, upper_raw) = self.interval.predict(x)?;
        let band = clamp_band(&point, &lower_raw, &upper_raw)?;

        Ok(BandPrediction {
            point,
            lower: band.lower,
            upper: band.upper,
            inversions: band.inversions,
        })
    }

    /// Point-model feature importance, highest first
    pub fn feature_importance(&self) -> Vec<(String, f64)> {
        self.point.feature_importance()
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let artifact: Self = serde_json::from_str(json)?;
        artifact.check_consistency()?;
        Ok(artifact)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let artifact: Self = serde_json::from_reader(reader)?;
        artifact.check_consistency()?;
        Ok(artifact)
    }

    fn check_consistency(&self) -> Result<()> {
        let models = [
            self.point.feature_names(),
            self.interval.lower_model().feature_names(),
            self.interval.upper_model().feature_names(),
        ];
        if models.iter().any(|names| *names != self.feature_names.as_slice()) {
            return Err(ForecastError::DataError(
                "Artifact models disagree on feature columns".to_string(),
            ));
        }
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(ForecastError::DataError(format!(
                "Artifact confidence level {} is outside (0, 1)",
                self.confidence_level
            )));
        }
        Ok(())
    }
}
