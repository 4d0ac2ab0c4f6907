//! # Demand Forecast
//!
//! Daily demand forecasting for one product at one location.
//!
//! ## Features
//!
//! - Leak-free feature construction: calendar and cyclical encodings, fixed
//!   business-calendar event flags, lags and trailing rolling statistics
//! - Gradient-boosted regression trees with squared-error and pinball losses
//! - Seeded random hyperparameter search, parallelized with rayon
//! - Prediction intervals from two quantile models, clamped around the point forecast
//! - Test-set metrics against a naive mean baseline
//! - Rule-based alerts over the forecast horizon
//!
//! ## Quick Start
//!
//! ```no_run
//! use chrono::NaiveDate;
//! use demand_forecast::{DemandForecaster, DemandSeries, ForecastConfig};
//!
//! let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let dates: Vec<NaiveDate> = start.iter_days().take(120).collect();
//! let quantities = (0..120).map(|i| if i % 7 >= 5 { 40.0 } else { 80.0 }).collect();
//! let series = DemandSeries::from_parts("croissant", "downtown", dates, quantities)?;
//!
//! let forecaster = DemandForecaster::new(ForecastConfig::default())?;
//! let report = forecaster.run(&series)?;
//!
//! for alert in &report.alerts {
//!     println!("{}", alert);
//! }
//! # Ok::<(), demand_forecast::ForecastError>(())
//! ```

pub mod alerts;
pub mod artifact;
pub mod config;
pub mod data;
pub mod error;
pub mod features;
pub mod forecast;
pub mod forecaster;
pub mod interval;
pub mod metrics;
pub mod models;
pub mod optimizer;
pub mod pipeline;
pub mod utils;

pub use alerts::{
    generate_alerts, recommend, Alert, AlertKind, AlertRules, DemandOutlook, PurchaseStance,
    Recommendation, Severity,
};
pub use artifact::ModelArtifact;
pub use config::ForecastConfig;
pub use data::{DemandSeries, HistoricalStats, TimeSeriesRecord};
pub use error::{ForecastError, PipelineStage, Result};
pub use features::{FeatureBuilder, FeatureMatrix, FeatureTable, TrainingSet};
pub use forecast::{BandPrediction, ForecastResult};
pub use forecaster::{PointForecaster, PointModel};
pub use interval::{clamp_band, IntervalEstimator, IntervalModel, QuantileSettings};
pub use metrics::{ForecastMetrics, IntervalMetrics};
pub use models::{BoostingParams, ForecastModel, Loss, TrainedForecastModel};
pub use optimizer::{HyperparameterOptimizer, OptimizationOutcome, SearchSpace, TrialRecord};
pub use pipeline::{DemandForecaster, ForecastReport, TestEvaluation};

/// Version of the demand_forecast crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the demand_forecast crate
pub const NAME: &str = env!("CARGO_PKG_NAME");
