//! Forecast outputs: banded predictions and dated horizon forecasts

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

/// Point predictions with their clamped band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandPrediction {
    pub point: Vec<f64>,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
    /// Positions where the raw quantile bounds had to be corrected
    pub inversions: usize,
}

impl BandPrediction {
    pub fn len(&self) -> usize {
        self.point.len()
    }

    pub fn is_empty(&self) -> bool {
        self.point.is_empty()
    }
}

#[derive(Debug, Serialize)]
struct ForecastCsvRow {
    date: NaiveDate,
    prediction: f64,
    lower: f64,
    upper: f64,
}

/// Dated forecast over the horizon
///
/// All sequences have the same length, every value is non-negative and
/// `lower <= point <= upper` holds at every position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    dates: Vec<NaiveDate>,
    point: Vec<f64>,
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl ForecastResult {
    pub fn new(
        dates: Vec<NaiveDate>,
        point: Vec<f64>,
        lower: Vec<f64>,
        upper: Vec<f64>,
    ) -> Result<Self> {
        let n = dates.len();
        if point.len() != n || lower.len() != n || upper.len() != n {
            return Err(ForecastError::ValidationError(format!(
                "Forecast sequences disagree: {} dates, {} points, {} lower, {} upper",
                n,
                point.len(),
                lower.len(),
                upper.len()
            )));
        }

        for i in 0..n {
            let (l, p, u) = (lower[i], point[i], upper[i]);
            if !(l.is_finite() && p.is_finite() && u.is_finite()) {
                return Err(ForecastError::ValidationError(format!(
                    "Non-finite forecast on {}",
                    dates[i]
                )));
            }
            if l < 0.0 || l > p || p > u {
                return Err(ForecastError::ValidationError(format!(
                    "Forecast on {} violates 0 <= lower <= point <= upper ({}, {}, {})",
                    dates[i], l, p, u
                )));
            }
        }

        Ok(Self {
            dates,
            point,
            lower,
            upper,
        })
    }

    /// Attach dates to a band
    pub fn from_band(dates: Vec<NaiveDate>, band: BandPrediction) -> Result<Self> {
        Self::new(dates, band.point, band.lower, band.upper)
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn point(&self) -> &[f64] {
        &self.point
    }

    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Sum of the point forecast over the horizon
    pub fn total_demand(&self) -> f64 {
        self.point.iter().sum()
    }

    /// Write `date,prediction,lower,upper` rows with a header
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        for i in 0..self.len() {
            csv_writer.serialize(ForecastCsvRow {
                date: self.dates[i],
                prediction: self.point[i],
                lower: self.lower[i],
                upper: self.upper[i],
            })?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    pub fn to_csv_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path)?;
        self.write_csv(file)
    }

    pub fn to_csv_string(&self) -> Result<String> {
        let mut buffer = Vec::new();
        self.write_csv(&mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| ForecastError::DataError(format!("CSV output is not UTF-8: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dates(n: u32) -> Vec<NaiveDate> {
        (1..=n)
            .map(|d| NaiveDate::from_ymd_opt(2024, 7, d).unwrap())
            .collect()
    }

    #[test]
    fn test_rejects_broken_band() {
        let result = ForecastResult::new(dates(1), vec![5.0], vec![6.0], vec![7.0]);
        assert!(result.is_err());

        let result = ForecastResult::new(dates(2), vec![5.0], vec![4.0], vec![7.0]);
        assert!(result.is_err());
    }

    #[test]
    fn test_csv_export() {
        let forecast =
            ForecastResult::new(dates(2), vec![5.0, 6.5], vec![4.0, 6.0], vec![7.0, 8.0]).unwrap();
        let csv = forecast.to_csv_string().unwrap();
        assert_eq!(
            csv,
            "date,prediction,lower,upper\n2024-07-01,5.0,4.0,7.0\n2024-07-02,6.5,6.0,8.0\n"
        );
        assert_eq!(forecast.total_demand(), 11.5);
    }
}
