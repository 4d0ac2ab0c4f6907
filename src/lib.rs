//! # Demand Forecast Workspace
//!
//! Facade over the workspace crates:
//!
//! - [`math`]: rolling windows, lag buffers and slice statistics
//! - [`forecast`]: feature construction, boosted models, intervals, alerts and
//!   the end-to-end pipeline
//!
//! ## Example
//!
//! ```
//! use demand_forecast_workspace::forecast::{ForecastConfig, ForecastMetrics};
//!
//! let config = ForecastConfig::default();
//! assert_eq!(config.horizon_days, 14);
//!
//! let metrics = ForecastMetrics::evaluate(&[10.0, 20.0, 30.0], &[12.0, 18.0, 33.0]).unwrap();
//! assert!((metrics.mae - 7.0 / 3.0).abs() < 1e-9);
//! ```

pub use demand_forecast as forecast;
pub use demand_math as math;

pub use demand_forecast::{
    DemandForecaster, DemandSeries, ForecastConfig, ForecastError, ForecastReport,
    ForecastResult, ModelArtifact,
};
