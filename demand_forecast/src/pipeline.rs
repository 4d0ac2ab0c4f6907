//! End-to-end forecasting run for one product at one location
//!
//! Stages, in order: feature construction, hyperparameter optimization,
//! model fitting, prediction. A failure in any of them aborts the run with a
//! [`ForecastError::Stage`] naming the stage; no fallback forecast is made.

use crate::alerts::{generate_alerts, recommend, Alert, Recommendation};
use crate::artifact::ModelArtifact;
use crate::config::ForecastConfig;
use crate::data::{DemandSeries, HistoricalStats};
use crate::error::{ForecastError, PipelineStage, Result};
use crate::features::{model_columns, FeatureBuilder, FeatureMatrix, TrainingSet};
use crate::forecast::{BandPrediction, ForecastResult};
use crate::interval::quantile_levels;
use crate::metrics::{baseline_metrics, ForecastMetrics, IntervalMetrics};
use crate::models::BoostingParams;
use crate::optimizer::{HyperparameterOptimizer, TrialRecord};
use crate::utils::{future_dates, split_index};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Scores on the held-out test rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestEvaluation {
    pub dates: Vec<NaiveDate>,
    pub actual: Vec<f64>,
    pub prediction: BandPrediction,
    pub metrics: ForecastMetrics,
    /// Same metrics for a forecast repeating the training mean
    pub baseline: ForecastMetrics,
    pub interval: IntervalMetrics,
}

/// Everything one run produces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastReport {
    pub product: String,
    pub location: String,
    pub forecast: ForecastResult,
    /// `None` when the split left no test rows
    pub evaluation: Option<TestEvaluation>,
    pub alerts: Vec<Alert>,
    /// `None` only for an empty horizon
    pub recommendation: Option<Recommendation>,
    /// Feature name and normalized gain, highest first
    pub feature_importance: Vec<(String, f64)>,
    pub history: HistoricalStats,
    pub best_params: BoostingParams,
    /// Optimizer trials; empty when defaults were used
    pub trials: Vec<TrialRecord>,
    pub artifact: ModelArtifact,
}

impl ForecastReport {
    pub fn metrics(&self) -> Option<&ForecastMetrics> {
        self.evaluation.as_ref().map(|e| &e.metrics)
    }
}

/// Runs the forecasting stages under one configuration
#[derive(Debug, Clone)]
pub struct DemandForecaster {
    config: ForecastConfig,
    builder: FeatureBuilder,
}

impl DemandForecaster {
    pub fn new(config: ForecastConfig) -> Result<Self> {
        config.validate()?;
        let builder = FeatureBuilder::new().with_min_training_rows(config.min_training_rows);
        Ok(Self { config, builder })
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    pub fn feature_builder(&self) -> &FeatureBuilder {
        &self.builder
    }

    pub fn run(&self, series: &DemandSeries) -> Result<ForecastReport> {
        info!(
            product = series.product(),
            location = series.location(),
            observations = series.len(),
            horizon = self.config.horizon_days,
            "starting forecast run"
        );

        let dataset = self
            .builder
            .training_set(series)
            .map_err(|e| e.at_stage(PipelineStage::FeatureConstruction))?;

        let (train, test) =
            dataset.split_at(split_index(dataset.len(), self.config.train_fraction));

        let (best_params, trials) = self
            .select_params(&train)
            .map_err(|e| e.at_stage(PipelineStage::Optimization))?;

        let artifact = ModelArtifact::fit(
            &train.features,
            &train.target,
            best_params,
            self.config.confidence_level,
            &self.config.quantile,
            self.config.seed,
        )
        .map_err(|e| e.at_stage(PipelineStage::Fitting))?;

        let (evaluation, forecast, history, alerts, recommendation) = self
            .predict_stage(&artifact, series, &train, &test)
            .map_err(|e| e.at_stage(PipelineStage::Prediction))?;

        if let Some(evaluation) = &evaluation {
            info!(
                test_rows = evaluation.actual.len(),
                metrics = %evaluation.metrics,
                baseline = %evaluation.baseline,
                coverage = evaluation.interval.coverage,
                "test evaluation"
            );
        }
        if let Some(recommendation) = &recommendation {
            info!(%recommendation, "purchase recommendation");
        }
        info!(
            horizon = forecast.len(),
            alerts = alerts.len(),
            "forecast run finished"
        );

        Ok(ForecastReport {
            product: series.product().to_string(),
            location: series.location().to_string(),
            forecast,
            evaluation,
            alerts,
            recommendation,
            feature_importance: artifact.feature_importance(),
            history,
            best_params,
            trials,
            artifact,
        })
    }

    /// Optimize on the inner train/validation split, or fall back to defaults
    /// when there is no validation data
    fn select_params(&self, train: &TrainingSet) -> Result<(BoostingParams, Vec<TrialRecord>)> {
        let (inner, validation) =
            train.split_at(split_index(train.len(), self.config.validation_fraction));

        if inner.is_empty() || validation.is_empty() {
            warn!(
                train_rows = train.len(),
                "no validation split; using default hyperparameters"
            );
            return Ok((BoostingParams::default(), Vec::new()));
        }

        let optimizer =
            HyperparameterOptimizer::new(self.config.search_space, self.config.seed)?;
        let outcome = optimizer.optimize_with_history(
            &inner.features,
            &inner.target,
            &validation.features,
            &validation.target,
            self.config.n_trials,
        )?;

        Ok((outcome.best_params(), outcome.trials))
    }

    fn predict_stage(
        &self,
        artifact: &ModelArtifact,
        series: &DemandSeries,
        train: &TrainingSet,
        test: &TrainingSet,
    ) -> Result<(
        Option<TestEvaluation>,
        ForecastResult,
        HistoricalStats,
        Vec<Alert>,
        Option<Recommendation>,
    )> {
        let evaluation = if test.is_empty() {
            None
        } else {
            Some(self.evaluate(artifact, train, test)?)
        };

        let forecast = self.forecast_horizon(artifact, series, self.config.horizon_days)?;
        let history = series.historical_stats()?;
        let alerts = generate_alerts(
            forecast.point(),
            forecast.lower(),
            forecast.upper(),
            &history,
            &self.config.alert_rules,
        )?;
        let recommendation = recommend(
            forecast.point(),
            forecast.lower(),
            forecast.upper(),
            &history,
            &self.config.alert_rules,
        )?;

        Ok((evaluation, forecast, history, alerts, recommendation))
    }

    fn evaluate(
        &self,
        artifact: &ModelArtifact,
        train: &TrainingSet,
        test: &TrainingSet,
    ) -> Result<TestEvaluation> {
        let prediction = artifact.predict(&test.features)?;
        let metrics = ForecastMetrics::evaluate(&test.target, &prediction.point)?;
        let baseline = baseline_metrics(&train.target, &test.target)?;
        let interval = IntervalMetrics::evaluate(
            &test.target,
            &prediction.lower,
            &prediction.upper,
            quantile_levels(artifact.confidence_level())?,
        )?;

        Ok(TestEvaluation {
            dates: test.dates.clone(),
            actual: test.target.clone(),
            prediction,
            metrics,
            baseline,
            interval,
        })
    }

    /// Forecast `horizon` days past the end of `series`
    ///
    /// Each day is featurized from the observed history plus the point
    /// predictions already made, then its prediction is fed back before the
    /// next day.
    pub fn forecast_horizon(
        &self,
        artifact: &ModelArtifact,
        series: &DemandSeries,
        horizon: usize,
    ) -> Result<ForecastResult> {
        let last_date = series.last_date().ok_or_else(|| {
            ForecastError::DataError("Cannot forecast an empty series".to_string())
        })?;
        let dates = future_dates(last_date, horizon)?;
        let names = model_columns();
        let mut state = self.builder.state_after(series)?;

        let mut band = BandPrediction {
            point: Vec::with_capacity(horizon),
            lower: Vec::with_capacity(horizon),
            upper: Vec::with_capacity(horizon),
            inversions: 0,
        };

        for &date in &dates {
            let row = FeatureMatrix::new(names.clone(), vec![state.future_row(date)])?;
            let step = artifact.predict_future(&row)?;
            let point = step.point.first().copied().ok_or_else(|| {
                ForecastError::DataError(format!("No prediction produced for {}", date))
            })?;

            band.point.extend(step.point);
            band.lower.extend(step.lower);
            band.upper.extend(step.upper);
            band.inversions += step.inversions;
            state.observe(point)?;
        }

        if band.inversions > 0 {
            warn!(
                inversions = band.inversions,
                horizon, "horizon band needed clamping"
            );
        }

        ForecastResult::from_band(dates, band)
    }
}
