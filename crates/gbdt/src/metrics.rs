//! Regression evaluation metrics.

/// Root mean squared error.
pub fn rmse(targets: &[f64], predictions: &[f64]) -> f64 {
    debug_assert_eq!(targets.len(), predictions.len());
    if targets.is_empty() {
        return 0.0;
    }

    let sum: f64 = targets
        .iter()
        .zip(predictions)
        .map(|(t, p)| {
            let d = p - t;
            d * d
        })
        .sum();

    (sum / targets.len() as f64).sqrt()
}

/// Root mean squared logarithmic error.
///
/// Predictions are clamped at zero before the log transform; targets are
/// assumed non-negative.
pub fn rmsle(targets: &[f64], predictions: &[f64]) -> f64 {
    debug_assert_eq!(targets.len(), predictions.len());
    if targets.is_empty() {
        return 0.0;
    }

    let sum: f64 = targets
        .iter()
        .zip(predictions)
        .map(|(t, p)| {
            let d = p.max(0.0).ln_1p() - t.ln_1p();
            d * d
        })
        .sum();

    (sum / targets.len() as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rmse_of_exact_predictions_is_zero() {
        assert_eq!(rmse(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]), 0.0);
    }

    #[test]
    fn rmse_of_constant_offset() {
        // every prediction off by 2
        assert!((rmse(&[1.0, 2.0], &[3.0, 4.0]) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn rmsle_clamps_negative_predictions() {
        // -5 is treated as 0: error is ln(1 + 3) per element
        let expected = 4.0f64.ln();
        assert!((rmsle(&[3.0], &[-5.0]) - expected).abs() < 1e-12);
    }

    #[test]
    fn rmsle_of_exact_predictions_is_zero() {
        assert_eq!(rmsle(&[0.0, 10.0, 100.0], &[0.0, 10.0, 100.0]), 0.0);
    }

    #[test]
    fn empty_inputs_give_zero() {
        assert_eq!(rmse(&[], &[]), 0.0);
        assert_eq!(rmsle(&[], &[]), 0.0);
    }
}
