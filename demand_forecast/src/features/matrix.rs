//! Dense, named feature matrices handed to the models

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Row-major numeric matrix with an ordered list of column names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureMatrix {
    feature_names: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl FeatureMatrix {
    /// Create a matrix, checking every row has one value per feature
    pub fn new(feature_names: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self> {
        if let Some((i, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != feature_names.len())
        {
            return Err(ForecastError::ValidationError(format!(
                "Row {} has {} values but {} feature names were given",
                i,
                row.len(),
                feature_names.len()
            )));
        }

        Ok(Self {
            feature_names,
            rows,
        })
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&[f64]> {
        self.rows.get(index).map(|r| r.as_slice())
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All values of one column
    pub fn column(&self, index: usize) -> Vec<f64> {
        self.rows.iter().map(|r| r[index]).collect()
    }

    /// Copy of the rows in `start..end`
    pub fn slice(&self, start: usize, end: usize) -> Self {
        let end = end.min(self.rows.len());
        let start = start.min(end);
        Self {
            feature_names: self.feature_names.clone(),
            rows: self.rows[start..end].to_vec(),
        }
    }

    /// Stack two matrices with identical schemas
    pub fn concat(&self, other: &Self) -> Result<Self> {
        if self.feature_names != other.feature_names {
            return Err(ForecastError::ValidationError(
                "Cannot concatenate matrices with different feature columns".to_string(),
            ));
        }

        let mut rows = self.rows.clone();
        rows.extend(other.rows.iter().cloned());

        Ok(Self {
            feature_names: self.feature_names.clone(),
            rows,
        })
    }

    /// Reorder columns to match `expected`
    ///
    /// The column sets must be identical; otherwise the schema mismatch is an
    /// error on the caller's side.
    pub fn align_to(&self, expected: &[String]) -> Result<Self> {
        if self.feature_names == expected {
            return Ok(self.clone());
        }

        let (missing, unexpected) = self.schema_diff(expected);
        if !missing.is_empty() || !unexpected.is_empty() {
            return Err(ForecastError::SchemaMismatch {
                missing,
                unexpected,
            });
        }

        Ok(self.project(expected, false))
    }

    /// Reorder columns to match `expected`, zero-filling columns this matrix lacks
    ///
    /// Only meant for rows built for future days, which cannot carry realized
    /// values for every column. Extra columns are dropped. Returns the names of
    /// the filled columns.
    pub fn align_filling_missing(&self, expected: &[String]) -> (Self, Vec<String>) {
        let (missing, _) = self.schema_diff(expected);
        (self.project(expected, true), missing)
    }

    fn schema_diff(&self, expected: &[String]) -> (Vec<String>, Vec<String>) {
        let missing = expected
            .iter()
            .filter(|name| !self.feature_names.contains(name))
            .cloned()
            .collect();
        let unexpected = self
            .feature_names
            .iter()
            .filter(|name| !expected.contains(name))
            .cloned()
            .collect();
        (missing, unexpected)
    }

    fn project(&self, expected: &[String], fill_missing: bool) -> Self {
        let index: HashMap<&str, usize> = self
            .feature_names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), i))
            .collect();
        let positions: Vec<Option<usize>> = expected
            .iter()
            .map(|name| index.get(name.as_str()).copied())
            .collect();

        let rows = self
            .rows
            .iter()
            .map(|row| {
                positions
                    .iter()
                    .map(|pos| match pos {
                        Some(i) => row[*i],
                        None if fill_missing => 0.0,
                        None => f64::NAN,
                    })
                    .collect()
            })
            .collect();

        Self {
            feature_names: expected.to_vec(),
            rows,
        }
    }
}

/// Cleaned feature matrix with its target and dates, ready for training
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSet {
    pub dates: Vec<NaiveDate>,
    pub features: FeatureMatrix,
    pub target: Vec<f64>,
}

impl TrainingSet {
    pub fn new(dates: Vec<NaiveDate>, features: FeatureMatrix, target: Vec<f64>) -> Result<Self> {
        if dates.len() != features.n_rows() || target.len() != features.n_rows() {
            return Err(ForecastError::ValidationError(format!(
                "Training set parts disagree: {} dates, {} rows, {} targets",
                dates.len(),
                features.n_rows(),
                target.len()
            )));
        }

        Ok(Self {
            dates,
            features,
            target,
        })
    }

    pub fn len(&self) -> usize {
        self.target.len()
    }

    pub fn is_empty(&self) -> bool {
        self.target.is_empty()
    }

    /// Temporal split: rows before `index` and rows from `index` on
    pub fn split_at(&self, index: usize) -> (Self, Self) {
        let index = index.min(self.len());
        let head = Self {
            dates: self.dates[..index].to_vec(),
            features: self.features.slice(0, index),
            target: self.target[..index].to_vec(),
        };
        let tail = Self {
            dates: self.dates[index..].to_vec(),
            features: self.features.slice(index, self.len()),
            target: self.target[index..].to_vec(),
        };
        (head, tail)
    }

    /// Temporal split at `floor(len * fraction)`
    pub fn split_fraction(&self, fraction: f64) -> (Self, Self) {
        self.split_at(crate::utils::split_index(self.len(), fraction))
    }
}
