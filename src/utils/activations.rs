//! Activation functions and their numerically stable loss forms
//!
//! This module provides the activations used by the stacked model:
//! - Sigmoid, for every autoencoder encode and decode stage
//! - Softplus, for the binary cross-entropy written in logit space
//! - Softmax / log-softmax, for the classification layer

/// Sigmoid activation function.
///
/// Returns the sigmoid of the input: 1 / (1 + exp(-x)).
/// Branches on the sign so `exp` never overflows.
pub fn sigmoid(x: f32) -> f32 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Sigmoid derivative assuming s = sigmoid(z).
///
/// Returns the derivative: s * (1 - s)
pub fn sigmoid_derivative(s: f32) -> f32 {
    s * (1.0 - s)
}

/// Sigmoid applied in-place.
pub fn sigmoid_inplace(data: &mut [f32]) {
    for value in data.iter_mut() {
        *value = sigmoid(*value);
    }
}

/// Softplus: ln(1 + exp(x)), stable for large |x|.
pub fn softplus(x: f32) -> f32 {
    x.max(0.0) + (-x.abs()).exp().ln_1p()
}

/// Binary cross-entropy of target `x` against `sigmoid(a)`, given the logit `a`.
///
/// `-(x ln σ(a) + (1-x) ln(1-σ(a))) = x·softplus(-a) + (1-x)·softplus(a)`,
/// which never evaluates `ln(0)`.
pub fn binary_cross_entropy_with_logit(x: f32, a: f32) -> f32 {
    x * softplus(-a) + (1.0 - x) * softplus(a)
}

/// Softmax activation function applied row-wise.
///
/// Converts logits to probabilities for each row. Uses the max-subtraction
/// trick for numerical stability to avoid overflow with large values.
///
/// # Arguments
/// * `outputs` - Flat array containing row-major matrix data
/// * `rows` - Number of rows in the matrix
/// * `cols` - Number of columns in the matrix
pub fn softmax_rows(outputs: &mut [f32], rows: usize, cols: usize) {
    if cols == 0 {
        return;
    }
    assert_eq!(outputs.len(), rows * cols, "outputs length mismatch in softmax_rows");

    for row in outputs.chunks_exact_mut(cols).take(rows) {
        let max_value = row_max(row);

        let mut sum = 0.0f32;
        for value in row.iter_mut() {
            *value = (*value - max_value).exp();
            sum += *value;
        }

        let inv_sum = 1.0f32 / sum;
        for value in row.iter_mut() {
            *value *= inv_sum;
        }
    }
}

/// Log-softmax of a single row of logits.
pub fn log_softmax_row(logits: &[f32], out: &mut [f32]) {
    assert_eq!(logits.len(), out.len(), "log_softmax_row length mismatch");
    if logits.is_empty() {
        return;
    }
    let max_value = row_max(logits);
    let log_sum = logits
        .iter()
        .map(|&v| (v - max_value).exp())
        .sum::<f32>()
        .ln();
    for (o, &v) in out.iter_mut().zip(logits) {
        *o = v - max_value - log_sum;
    }
}

/// Index of the largest value in `row` (first one on ties).
pub fn argmax(row: &[f32]) -> usize {
    let mut best = 0usize;
    for (i, &value) in row.iter().enumerate().skip(1) {
        if value > row[best] {
            best = i;
        }
    }
    best
}

fn row_max(row: &[f32]) -> f32 {
    row.iter().copied().fold(f32::NEG_INFINITY, f32::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-6;

    #[test]
    fn test_sigmoid_zero() {
        assert!((sigmoid(0.0) - 0.5).abs() < EPSILON);
    }

    #[test]
    fn test_sigmoid_extremes_stay_in_range() {
        assert!(sigmoid(-100.0) >= 0.0 && sigmoid(-100.0) < 1e-30);
        assert!(sigmoid(100.0) <= 1.0);
        assert!(sigmoid(-1000.0).is_finite());
    }

    #[test]
    fn test_sigmoid_derivative_at_half() {
        assert!((sigmoid_derivative(0.5) - 0.25).abs() < EPSILON);
    }

    #[test]
    fn test_softplus_matches_naive() {
        for &x in &[-3.0f32, -0.5, 0.0, 0.5, 3.0] {
            let naive = (1.0 + x.exp()).ln();
            assert!((softplus(x) - naive).abs() < 1e-5);
        }
        assert!((softplus(200.0) - 200.0).abs() < 1e-3);
    }

    #[test]
    fn test_bce_with_logit_matches_direct_form() {
        let x = 0.3f32;
        let a = 0.8f32;
        let z = sigmoid(a);
        let direct = -(x * z.ln() + (1.0 - x) * (1.0 - z).ln());
        assert!((binary_cross_entropy_with_logit(x, a) - direct).abs() < 1e-5);
    }

    #[test]
    fn test_bce_saturated_logit_is_finite() {
        assert!(binary_cross_entropy_with_logit(1.0, -500.0).is_finite());
        assert!(binary_cross_entropy_with_logit(0.0, 500.0).is_finite());
    }

    #[test]
    fn test_softmax_numerical_stability() {
        let mut data = vec![1000.0, 1001.0, 1002.0];
        softmax_rows(&mut data, 1, 3);
        let sum: f32 = data.iter().sum();
        assert!((sum - 1.0).abs() < EPSILON);
        assert!(!data.iter().any(|&x| x.is_nan() || x.is_infinite()));
    }

    #[test]
    fn test_log_softmax_consistent_with_softmax() {
        let logits = [0.1f32, -1.2, 2.0];
        let mut probs = logits.to_vec();
        softmax_rows(&mut probs, 1, 3);
        let mut log_probs = [0.0f32; 3];
        log_softmax_row(&logits, &mut log_probs);
        for (p, lp) in probs.iter().zip(log_probs.iter()) {
            assert!((p.ln() - lp).abs() < 1e-5);
        }
    }

    #[test]
    fn test_argmax_first_on_tie() {
        assert_eq!(argmax(&[0.2, 0.5, 0.5]), 1);
        assert_eq!(argmax(&[3.0]), 0);
    }
}
