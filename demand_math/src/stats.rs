//! Summary statistics over plain slices

use crate::{MathError, Result};

/// Arithmetic mean
pub fn mean(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(MathError::InsufficientData(
            "Mean of an empty slice".to_string(),
        ));
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Empirical quantile with linear interpolation between order statistics
///
/// `q` must lie in `[0, 1]`. Matches the default method of most dataframe
/// libraries (`(n - 1) * q` positioning).
pub fn quantile(values: &[f64], q: f64) -> Result<f64> {
    if values.is_empty() {
        return Err(MathError::InsufficientData(
            "Quantile of an empty slice".to_string(),
        ));
    }
    if !(0.0..=1.0).contains(&q) {
        return Err(MathError::InvalidInput(format!(
            "Quantile must be within [0, 1], got {}",
            q
        )));
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let position = (sorted.len() - 1) as f64 * q;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let weight = position - lower as f64;

    Ok(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

/// Pinball (quantile) loss of a single prediction at quantile `q`
pub fn pinball_loss(actual: f64, predicted: f64, q: f64) -> f64 {
    let residual = actual - predicted;
    if residual >= 0.0 {
        q * residual
    } else {
        (q - 1.0) * residual
    }
}

/// Mean pinball loss over aligned slices
pub fn mean_pinball_loss(actual: &[f64], predicted: &[f64], q: f64) -> Result<f64> {
    if actual.len() != predicted.len() || actual.is_empty() {
        return Err(MathError::InvalidInput(
            "Actual and predicted values must have the same non-zero length".to_string(),
        ));
    }

    let total: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(&a, &p)| pinball_loss(a, p, q))
        .sum();

    Ok(total / actual.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_quantile_interpolation() {
        let values = [4.0, 1.0, 3.0, 2.0];
        assert_relative_eq!(quantile(&values, 0.0).unwrap(), 1.0);
        assert_relative_eq!(quantile(&values, 0.5).unwrap(), 2.5);
        assert_relative_eq!(quantile(&values, 1.0).unwrap(), 4.0);
        assert_relative_eq!(quantile(&values, 0.25).unwrap(), 1.75);
    }

    #[test]
    fn test_quantile_errors() {
        assert!(quantile(&[], 0.5).is_err());
        assert!(quantile(&[1.0], 1.5).is_err());
    }

    #[test]
    fn test_pinball_loss_is_asymmetric() {
        // under-prediction is charged q, over-prediction 1 - q
        assert_relative_eq!(pinball_loss(10.0, 8.0, 0.9), 1.8);
        assert_relative_eq!(pinball_loss(10.0, 12.0, 0.9), 0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_mean() {
        assert_relative_eq!(mean(&[1.0, 2.0, 3.0]).unwrap(), 2.0);
        assert!(mean(&[]).is_err());
    }
}
