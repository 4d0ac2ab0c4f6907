//! Lag buffer for autoregressive features

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Keeps the last `depth` observations so lag `k` (1 = previous value) can be read
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LagBuffer {
    depth: usize,
    values: VecDeque<f64>,
}

impl LagBuffer {
    /// Create a buffer able to answer lags up to `depth`
    pub fn new(depth: usize) -> Result<Self> {
        if depth == 0 {
            return Err(MathError::InvalidInput(
                "Lag depth must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            depth,
            values: VecDeque::with_capacity(depth + 1),
        })
    }

    /// Record the newest observation
    pub fn push(&mut self, value: f64) {
        self.values.push_back(value);
        if self.values.len() > self.depth {
            self.values.pop_front();
        }
    }

    /// Value observed `k` steps ago, `None` while history is too short
    pub fn lag(&self, k: usize) -> Option<f64> {
        if k == 0 || k > self.values.len() {
            return None;
        }
        self.values.get(self.values.len() - k).copied()
    }

    /// Number of observations held
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing has been pushed yet
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Maximum lag this buffer can answer
    pub fn depth(&self) -> usize {
        self.depth
    }
}

/// Difference between consecutive observations `period` apart
///
/// The first `period` entries are `None`.
pub fn difference(values: &[f64], period: usize) -> Vec<Option<f64>> {
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            if period == 0 || i < period {
                None
            } else {
                Some(v - values[i - period])
            }
        })
        .collect()
}
