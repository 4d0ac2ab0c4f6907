//! Feature construction for daily demand series
//!
//! Every row is built from an incremental [`FeatureState`] that has only seen
//! the observations strictly before that row's date, so lag and rolling
//! columns can never read the value they are meant to help predict. The same
//! state is advanced with predictions when the model forecasts future days.
//!
//! Lags count observations, not calendar days: on a series with gaps, `lag_7`
//! is the seventh preceding record.

use crate::data::DemandSeries;
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use demand_math::{difference, LagBuffer, RollingWindow};
use polars::prelude::{DataFrame, NamedFrom, Series};
use tracing::debug;

pub mod calendar;
pub mod matrix;

pub use calendar::{CalendarFeatures, EventFlags, CALENDAR_COLUMNS, EVENT_COLUMNS};
pub use matrix::{FeatureMatrix, TrainingSet};

/// Autoregressive lag offsets
pub const LAGS: [usize; 6] = [1, 2, 3, 7, 14, 30];

/// Trailing rolling-window lengths
pub const WINDOWS: [usize; 3] = [7, 14, 30];

/// Lags a row must have to be usable for training
pub const ESSENTIAL_LAGS: [usize; 2] = [1, 7];

/// Difference columns; they read the current day's quantity and are not model inputs
pub const DIFF_COLUMNS: [&str; 2] = ["diff_1", "diff_7"];

/// Minimum clean rows needed to train
pub const DEFAULT_MIN_TRAINING_ROWS: usize = 50;

const ROLLING_STATS: [&str; 4] = ["mean", "std", "min", "max"];

pub fn lag_column(lag: usize) -> String {
    format!("lag_{}", lag)
}

/// Names of the columns the models are trained on, in matrix order
pub fn model_columns() -> Vec<String> {
    let mut columns: Vec<String> = LAGS.iter().map(|&lag| lag_column(lag)).collect();
    for window in WINDOWS {
        for stat in ROLLING_STATS {
            columns.push(format!("rolling_{}_{}", stat, window));
        }
    }
    columns.extend(CALENDAR_COLUMNS.iter().map(|c| c.to_string()));
    columns.extend(EVENT_COLUMNS.iter().map(|c| c.to_string()));
    columns
}

/// Every column of a [`FeatureTable`]: model columns followed by the differences
pub fn table_columns() -> Vec<String> {
    let mut columns = model_columns();
    columns.extend(DIFF_COLUMNS.iter().map(|c| c.to_string()));
    columns
}

/// History seen so far: lag buffer plus one rolling window per length
#[derive(Debug, Clone)]
pub struct FeatureState {
    lags: LagBuffer,
    windows: Vec<RollingWindow>,
}

impl FeatureState {
    pub fn new() -> Result<Self> {
        let depth = LAGS.iter().copied().max().unwrap_or(1);
        let windows = WINDOWS
            .iter()
            .map(|&w| RollingWindow::new(w))
            .collect::<demand_math::Result<Vec<_>>>()?;

        Ok(Self {
            lags: LagBuffer::new(depth)?,
            windows,
        })
    }

    /// Feed the quantity observed (or predicted) for the next day
    pub fn observe(&mut self, quantity: f64) -> Result<()> {
        self.lags.push(quantity);
        for window in &mut self.windows {
            window.update(quantity)?;
        }
        Ok(())
    }

    /// Number of days observed so far
    pub fn observed(&self) -> usize {
        self.lags.len()
    }

    /// Model-column values for `date`, using only what was observed before it
    pub fn model_values(&self, date: NaiveDate) -> Vec<Option<f64>> {
        let mut values: Vec<Option<f64>> = LAGS.iter().map(|&lag| self.lags.lag(lag)).collect();

        for window in &self.windows {
            let summary = window.summary();
            values.extend([summary.mean, summary.std_dev, summary.min, summary.max]);
        }

        values.extend(CalendarFeatures::from_date(date).values().map(Some));
        values.extend(EventFlags::from_date(date).values().map(Some));
        values
    }

    /// Dense model row for a future day; missing history becomes zero
    pub fn future_row(&self, date: NaiveDate) -> Vec<f64> {
        self.model_values(date)
            .into_iter()
            .map(|v| v.unwrap_or(0.0))
            .collect()
    }
}

/// Features for one record
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub date: NaiveDate,
    /// The target; always present for rows built from observed records
    pub quantity: Option<f64>,
    /// One value per [`table_columns`] entry, `None` where history is too short
    pub values: Vec<Option<f64>>,
}

/// Feature rows for a whole series, in the series' order
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    columns: Vec<String>,
    rows: Vec<FeatureRow>,
}

impl FeatureTable {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Value of `column` in row `row`; `None` when null or unknown
    pub fn value(&self, row: usize, column: &str) -> Option<f64> {
        let index = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.values[index])
    }

    /// All values of a column, `None` for an unknown column name
    pub fn column_values(&self, column: &str) -> Option<Vec<Option<f64>>> {
        let index = self.column_index(column)?;
        Some(self.rows.iter().map(|r| r.values[index]).collect())
    }

    /// Clean the table into a training set
    ///
    /// Rows missing the target or any essential lag are dropped. Remaining
    /// nulls in model columns are forward-filled, then backward-filled, then
    /// set to zero. Fails when fewer than `min_rows` rows survive.
    pub fn to_training_set(&self, min_rows: usize) -> Result<TrainingSet> {
        let essential: Vec<usize> = ESSENTIAL_LAGS
            .iter()
            .filter_map(|&lag| self.column_index(&lag_column(lag)))
            .collect();

        let kept: Vec<&FeatureRow> = self
            .rows
            .iter()
            .filter(|row| {
                row.quantity.is_some() && essential.iter().all(|&i| row.values[i].is_some())
            })
            .collect();

        debug!(
            total_rows = self.rows.len(),
            clean_rows = kept.len(),
            "dropped rows with missing essential features"
        );

        if kept.len() < min_rows {
            return Err(ForecastError::InsufficientHistory {
                required: min_rows,
                available: kept.len(),
            });
        }

        let names = model_columns();
        let mut columns = Vec::with_capacity(names.len());
        for name in &names {
            let index = self.column_index(name).ok_or_else(|| {
                ForecastError::DataError(format!("Feature column '{}' is missing", name))
            })?;
            let raw: Vec<Option<f64>> = kept.iter().map(|row| row.values[index]).collect();
            columns.push(fill_gaps(&raw));
        }

        let rows = (0..kept.len())
            .map(|r| columns.iter().map(|column| column[r]).collect())
            .collect();

        TrainingSet::new(
            kept.iter().map(|row| row.date).collect(),
            FeatureMatrix::new(names, rows)?,
            kept.iter().filter_map(|row| row.quantity).collect(),
        )
    }

    /// Export as a DataFrame with `date`, `quantity` and every feature column
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let mut series = vec![
            Series::new(
                "date",
                self.rows
                    .iter()
                    .map(|r| r.date.to_string())
                    .collect::<Vec<String>>(),
            ),
            Series::new(
                "quantity",
                self.rows.iter().map(|r| r.quantity).collect::<Vec<Option<f64>>>(),
            ),
        ];

        for (i, name) in self.columns.iter().enumerate() {
            let values: Vec<Option<f64>> = self.rows.iter().map(|r| r.values[i]).collect();
            series.push(Series::new(name.as_str(), values));
        }

        Ok(DataFrame::new(series)?)
    }
}

/// Forward fill, then backward fill, then zero
fn fill_gaps(values: &[Option<f64>]) -> Vec<f64> {
    let mut filled = values.to_vec();

    let mut last = None;
    for value in filled.iter_mut() {
        match value {
            Some(v) => last = Some(*v),
            None => *value = last,
        }
    }

    let mut next = None;
    for value in filled.iter_mut().rev() {
        match value {
            Some(v) => next = Some(*v),
            None => *value = next,
        }
    }

    filled.into_iter().map(|v| v.unwrap_or(0.0)).collect()
}

/// Builds feature tables and replays history for horizon forecasting
#[derive(Debug, Clone)]
pub struct FeatureBuilder {
    min_training_rows: usize,
}

impl Default for FeatureBuilder {
    fn default() -> Self {
        Self {
            min_training_rows: DEFAULT_MIN_TRAINING_ROWS,
        }
    }
}

impl FeatureBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the clean-row floor used by [`FeatureBuilder::training_set`]
    pub fn with_min_training_rows(mut self, min_training_rows: usize) -> Self {
        self.min_training_rows = min_training_rows;
        self
    }

    pub fn min_training_rows(&self) -> usize {
        self.min_training_rows
    }

    /// One feature row per record, same order as the series
    pub fn build_features(&self, series: &DemandSeries) -> Result<FeatureTable> {
        let quantities = series.quantities();
        let diff_1 = difference(&quantities, 1);
        let diff_7 = difference(&quantities, 7);

        let mut state = FeatureState::new()?;
        let mut rows = Vec::with_capacity(series.len());

        for (i, record) in series.records().iter().enumerate() {
            let mut values = state.model_values(record.date);
            values.push(diff_1[i]);
            values.push(diff_7[i]);

            rows.push(FeatureRow {
                date: record.date,
                quantity: Some(record.quantity),
                values,
            });
            state.observe(record.quantity)?;
        }

        Ok(FeatureTable {
            columns: table_columns(),
            rows,
        })
    }

    /// Build features and clean them into a training set
    pub fn training_set(&self, series: &DemandSeries) -> Result<TrainingSet> {
        self.build_features(series)?
            .to_training_set(self.min_training_rows)
    }

    /// Feature state after observing the whole series
    pub fn state_after(&self, series: &DemandSeries) -> Result<FeatureState> {
        let mut state = FeatureState::new()?;
        for record in series.records() {
            state.observe(record.quantity)?;
        }
        Ok(state)
    }
}
