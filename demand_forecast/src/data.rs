//! Daily demand series for a single product at a single location

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use polars::prelude::{DataFrame, NamedFrom, Series};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// One observation: units sold on a calendar day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesRecord {
    /// Calendar day of the observation
    pub date: NaiveDate,
    /// Units sold that day
    pub quantity: f64,
}

impl TimeSeriesRecord {
    pub fn new(date: NaiveDate, quantity: f64) -> Self {
        Self { date, quantity }
    }
}

/// Long-run baseline of a series, used by the alert rules
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoricalStats {
    /// Mean daily quantity over the whole history
    pub mean: f64,
    /// Sample standard deviation over the whole history (0 with fewer than 2 days)
    pub std_dev: f64,
    /// Number of observed days
    pub days: usize,
}

/// Validated daily series for one (product, location) selection
///
/// Records are strictly ascending by date with one record per day. Missing
/// calendar days are allowed and are never imputed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemandSeries {
    product: String,
    location: String,
    records: Vec<TimeSeriesRecord>,
}

impl DemandSeries {
    /// Create a series, rejecting unsorted, duplicated, negative or non-finite records
    pub fn new(
        product: impl Into<String>,
        location: impl Into<String>,
        records: Vec<TimeSeriesRecord>,
    ) -> Result<Self> {
        let product = product.into();
        let location = location.into();

        if product.trim().is_empty() {
            return Err(ForecastError::DataError(
                "Product identifier must not be empty".to_string(),
            ));
        }
        if location.trim().is_empty() {
            return Err(ForecastError::DataError(
                "Location identifier must not be empty".to_string(),
            ));
        }

        for record in &records {
            if !record.quantity.is_finite() || record.quantity < 0.0 {
                return Err(ForecastError::DataError(format!(
                    "Quantity on {} must be a non-negative number, got {}",
                    record.date, record.quantity
                )));
            }
        }

        for pair in records.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(ForecastError::DataError(format!(
                    "Records must be strictly ascending by date: {} follows {}",
                    pair[1].date, pair[0].date
                )));
            }
        }

        Ok(Self {
            product,
            location,
            records,
        })
    }

    /// Create a series from parallel date and quantity vectors
    pub fn from_parts(
        product: impl Into<String>,
        location: impl Into<String>,
        dates: Vec<NaiveDate>,
        quantities: Vec<f64>,
    ) -> Result<Self> {
        if dates.len() != quantities.len() {
            return Err(ForecastError::DataError(format!(
                "Dates length ({}) doesn't match quantities length ({})",
                dates.len(),
                quantities.len()
            )));
        }

        let records = dates
            .into_iter()
            .zip(quantities)
            .map(|(date, quantity)| TimeSeriesRecord::new(date, quantity))
            .collect();

        Self::new(product, location, records)
    }

    pub fn product(&self) -> &str {
        &self.product
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// Get the records in date order
    pub fn records(&self) -> &[TimeSeriesRecord] {
        &self.records
    }

    /// Get the dates as a vector
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.records.iter().map(|r| r.date).collect()
    }

    /// Get the quantities as a vector
    pub fn quantities(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.quantity).collect()
    }

    /// Date of the most recent observation
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.records.last().map(|r| r.date)
    }

    /// Check if the series is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Get the length of the series
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Mean and sample standard deviation over the entire history
    pub fn historical_stats(&self) -> Result<HistoricalStats> {
        if self.records.is_empty() {
            return Err(ForecastError::DataError(
                "No observations available".to_string(),
            ));
        }

        let quantities = self.quantities();
        let mean = quantities.iter().mean();
        let std_dev = if quantities.len() < 2 {
            0.0
        } else {
            quantities.iter().std_dev()
        };

        Ok(HistoricalStats {
            mean,
            std_dev,
            days: quantities.len(),
        })
    }

    /// Convert to a two-column DataFrame (`date`, `quantity`)
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let date_series = Series::new(
            "date",
            self.records
                .iter()
                .map(|r| r.date.to_string())
                .collect::<Vec<String>>(),
        );
        let quantity_series = Series::new("quantity", self.quantities());

        Ok(DataFrame::new(vec![date_series, quantity_series])?)
    }
}
