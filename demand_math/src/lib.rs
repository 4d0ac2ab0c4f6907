//! # Demand Math
//!
//! Numeric building blocks for daily demand features: trailing rolling
//! windows, lag buffers, differences, and a few slice statistics used by the
//! quantile models.

use thiserror::Error;

pub mod lags;
pub mod rolling;
pub mod stats;

pub use lags::{difference, LagBuffer};
pub use rolling::{RollingSummary, RollingWindow};

/// Errors that can occur in demand math calculations
#[derive(Error, Debug)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for demand math operations
pub type Result<T> = std::result::Result<T, MathError>;
