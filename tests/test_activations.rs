// Tests for activation functions: sigmoid, softplus, binary cross-entropy,
// softmax and log-softmax.

use approx::assert_relative_eq;
use rust_stacked_autoencoders::utils::activations::{
    argmax, binary_cross_entropy_with_logit, log_softmax_row, sigmoid, sigmoid_derivative,
    sigmoid_inplace, softmax_rows, softplus,
};

#[test]
fn test_sigmoid_known_values() {
    assert_relative_eq!(sigmoid(0.0), 0.5);
    assert_relative_eq!(sigmoid(2.0), 1.0 / (1.0 + (-2.0f32).exp()), epsilon = 1e-7);
    assert_relative_eq!(sigmoid(-2.0), 1.0 - sigmoid(2.0), epsilon = 1e-7);
}

#[test]
fn test_sigmoid_saturates_without_nan() {
    assert_eq!(sigmoid(200.0), 1.0);
    assert_eq!(sigmoid(-200.0), 0.0);
    assert!(sigmoid(-1000.0).is_finite());
}

#[test]
fn test_sigmoid_derivative_peak() {
    assert_relative_eq!(sigmoid_derivative(sigmoid(0.0)), 0.25);
    assert!(sigmoid_derivative(sigmoid(10.0)) < 1e-4);
}

#[test]
fn test_sigmoid_inplace_matches_scalar() {
    let mut data = vec![-3.0, -0.5, 0.0, 0.5, 3.0];
    let expected: Vec<f32> = data.iter().map(|&x| sigmoid(x)).collect();
    sigmoid_inplace(&mut data);
    assert_eq!(data, expected);
}

#[test]
fn test_softplus_limits() {
    assert_relative_eq!(softplus(0.0), std::f32::consts::LN_2, epsilon = 1e-7);
    assert_relative_eq!(softplus(100.0), 100.0);
    assert!(softplus(-100.0) >= 0.0 && softplus(-100.0) < 1e-30);
}

#[test]
fn test_cross_entropy_matches_log_form() {
    for &(x, a) in &[(1.0f32, 0.3f32), (0.0, -1.2), (0.4, 2.0), (0.9, -0.7)] {
        let z = sigmoid(a);
        let direct = -(x * z.ln() + (1.0 - x) * (1.0 - z).ln());
        assert_relative_eq!(binary_cross_entropy_with_logit(x, a), direct, epsilon = 1e-5);
    }
}

#[test]
fn test_cross_entropy_finite_when_saturated() {
    // ln(1 - sigmoid(120)) would be ln(0) in the direct form.
    let loss = binary_cross_entropy_with_logit(0.0, 120.0);
    assert!(loss.is_finite());
    assert_relative_eq!(loss, 120.0, epsilon = 1e-3);
}

#[test]
fn test_softmax_rows_normalized() {
    let mut data = vec![1.0, 2.0, 3.0, 1000.0, 1000.0, 1000.0];
    softmax_rows(&mut data, 2, 3);
    for row in data.chunks(3) {
        assert_relative_eq!(row.iter().sum::<f32>(), 1.0, epsilon = 1e-6);
    }
    assert!(data[2] > data[1] && data[1] > data[0]);
    assert_relative_eq!(data[3], 1.0 / 3.0, epsilon = 1e-6);
}

#[test]
fn test_log_softmax_consistent_with_softmax() {
    let logits = vec![0.5, -1.0, 2.5, 0.0];
    let mut probs = logits.clone();
    softmax_rows(&mut probs, 1, 4);
    let mut log_probs = vec![0.0; 4];
    log_softmax_row(&logits, &mut log_probs);
    for (p, lp) in probs.iter().zip(&log_probs) {
        assert_relative_eq!(p.ln(), *lp, epsilon = 1e-5);
    }
}

#[test]
fn test_argmax_first_on_ties() {
    assert_eq!(argmax(&[0.1, 0.7, 0.2]), 1);
    assert_eq!(argmax(&[0.5, 0.5, 0.1]), 0);
    assert_eq!(argmax(&[-2.0, -1.0, -1.0]), 1);
}
