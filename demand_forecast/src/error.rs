//! Error types for the demand_forecast crate

use polars::prelude::PolarsError;
use std::fmt;
use thiserror::Error;

/// Stage of a forecasting run, used to tell the caller where a run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    FeatureConstruction,
    Optimization,
    Fitting,
    Prediction,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::FeatureConstruction => "feature construction",
            PipelineStage::Optimization => "hyperparameter optimization",
            PipelineStage::Fitting => "model fitting",
            PipelineStage::Prediction => "prediction",
        };
        f.write_str(name)
    }
}

/// Custom error types for the demand_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Not enough clean feature rows to train a model
    #[error(
        "Insufficient history: {available} clean rows after dropping incomplete lags, at least {required} required"
    )]
    InsufficientHistory { required: usize, available: usize },

    /// Prediction matrix does not carry the columns the model was fitted on
    #[error("Schema mismatch: missing columns {missing:?}, unexpected columns {unexpected:?}")]
    SchemaMismatch {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Error related to parameter validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Numerical failure while fitting a boosted model
    #[error("Training error: {0}")]
    TrainingError(String),

    /// A pipeline stage failed
    #[error("Forecast failed during {stage}: {source}")]
    Stage {
        stage: PipelineStage,
        #[source]
        source: Box<ForecastError>,
    },

    /// Error from numeric helpers
    #[error("Math error: {0}")]
    MathError(#[from] demand_math::MathError),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from CSV export
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Error from JSON (de)serialization
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}

impl ForecastError {
    /// Wrap this error with the stage it happened in
    ///
    /// Errors that already carry a stage are returned unchanged.
    pub fn at_stage(self, stage: PipelineStage) -> Self {
        match self {
            err @ ForecastError::Stage { .. } => err,
            err => ForecastError::Stage {
                stage,
                source: Box::new(err),
            },
        }
    }

    /// Stage the error was raised in, if it went through the pipeline
    pub fn stage(&self) -> Option<PipelineStage> {
        match self {
            ForecastError::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// The underlying error with any stage wrapper removed
    pub fn root_cause(&self) -> &ForecastError {
        match self {
            ForecastError::Stage { source, .. } => source.root_cause(),
            err => err,
        }
    }

    /// Whether the run stopped because the series was too short or sparse
    pub fn is_insufficient_history(&self) -> bool {
        matches!(
            self.root_cause(),
            ForecastError::InsufficientHistory { .. }
        )
    }
}
