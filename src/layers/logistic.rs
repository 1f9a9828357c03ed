//! Multi-class logistic regression head
//!
//! `p(class | x) = softmax(x·W + b)` with zero-initialized `W` and `b`.
//! Predictions are the arg-max class.

use crate::error::{check_len, Result, SdaError};
use crate::layers::r#trait::Layer;
use crate::utils::activations::{argmax, log_softmax_row, softmax_rows};
use crate::utils::linalg::{add_row_bias, matmul};

/// Linear-plus-softmax classification layer.
#[derive(Debug, Clone)]
pub struct LogisticLayer {
    n_in: usize,
    n_out: usize,
    weights: Vec<f32>,
    biases: Vec<f32>,
}

impl LogisticLayer {
    /// Create a classification layer with all parameters at zero.
    pub fn new(n_in: usize, n_out: usize) -> Self {
        Self {
            n_in,
            n_out,
            weights: vec![0.0f32; n_in * n_out],
            biases: vec![0.0f32; n_out],
        }
    }

    pub fn n_in(&self) -> usize {
        self.n_in
    }

    pub fn n_out(&self) -> usize {
        self.n_out
    }

    fn logits(&self, input: &[f32], batch_size: usize) -> Vec<f32> {
        let mut logits = vec![0.0f32; batch_size * self.n_out];
        matmul(input, &self.weights, &mut logits, batch_size, self.n_in, self.n_out);
        add_row_bias(&mut logits, &self.biases);
        logits
    }

    fn check_batch(&self, input: &[f32], labels: &[usize], batch_size: usize) -> Result<()> {
        check_len("classifier input", batch_size * self.n_in, input.len())?;
        check_len("label vector", batch_size, labels.len())?;
        if let Some(&label) = labels.iter().find(|&&l| l >= self.n_out) {
            return Err(SdaError::UnsupportedLabelType(format!(
                "label {} is not a class index in [0, {})",
                label, self.n_out
            )));
        }
        Ok(())
    }

    /// Class probabilities, `batch_size × n_out`.
    pub fn probabilities(&self, input: &[f32], batch_size: usize) -> Result<Vec<f32>> {
        check_len("classifier input", batch_size * self.n_in, input.len())?;
        let mut probs = vec![0.0f32; batch_size * self.n_out];
        self.forward(input, &mut probs, batch_size);
        Ok(probs)
    }

    /// Most probable class of each example.
    pub fn predict(&self, input: &[f32], batch_size: usize) -> Result<Vec<usize>> {
        check_len("classifier input", batch_size * self.n_in, input.len())?;
        if self.n_out == 0 {
            return Ok(vec![0; batch_size]);
        }
        // Softmax is monotone, so the logits give the same arg-max.
        let logits = self.logits(input, batch_size);
        Ok(logits.chunks_exact(self.n_out).map(argmax).collect())
    }

    /// `-mean_i log p(y_i | x_i)` over the batch.
    pub fn negative_log_likelihood(
        &self,
        input: &[f32],
        labels: &[usize],
        batch_size: usize,
    ) -> Result<f32> {
        self.check_batch(input, labels, batch_size)?;
        if batch_size == 0 {
            return Ok(0.0);
        }
        let logits = self.logits(input, batch_size);
        let mut log_probs = vec![0.0f32; self.n_out];
        let mut total = 0.0f32;
        for (row, &label) in logits.chunks_exact(self.n_out).zip(labels) {
            log_softmax_row(row, &mut log_probs);
            total -= log_probs[label];
        }
        Ok(total / batch_size as f32)
    }

    /// Fraction of examples whose arg-max class differs from the label.
    pub fn error_rate(&self, input: &[f32], labels: &[usize], batch_size: usize) -> Result<f32> {
        self.check_batch(input, labels, batch_size)?;
        if batch_size == 0 {
            return Ok(0.0);
        }
        let predictions = self.predict(input, batch_size)?;
        let wrong = predictions
            .iter()
            .zip(labels)
            .filter(|(p, y)| p != y)
            .count();
        Ok(wrong as f32 / batch_size as f32)
    }

    /// Negative log-likelihood and its gradient with respect to the logits,
    /// `(p - onehot(y)) / batch_size`.
    pub fn loss_delta(
        &self,
        input: &[f32],
        labels: &[usize],
        batch_size: usize,
    ) -> Result<(f32, Vec<f32>)> {
        let loss = self.negative_log_likelihood(input, labels, batch_size)?;
        let mut delta = self.probabilities(input, batch_size)?;
        let scale = 1.0 / batch_size.max(1) as f32;
        if self.n_out > 0 {
            for (row, &label) in delta.chunks_exact_mut(self.n_out).zip(labels) {
                row[label] -= 1.0;
                for v in row.iter_mut() {
                    *v *= scale;
                }
            }
        }
        Ok((loss, delta))
    }
}

impl Layer for LogisticLayer {
    fn forward(&self, input: &[f32], output: &mut [f32], batch_size: usize) {
        assert_eq!(
            input.len(),
            batch_size * self.n_in,
            "classifier: input length mismatch"
        );
        output.copy_from_slice(&self.logits(input, batch_size));
        softmax_rows(output, batch_size, self.n_out);
    }

    fn weights(&self) -> &[f32] {
        &self.weights
    }

    fn biases(&self) -> &[f32] {
        &self.biases
    }

    fn parameters_mut(&mut self) -> (&mut [f32], &mut [f32]) {
        (&mut self.weights, &mut self.biases)
    }

    fn input_size(&self) -> usize {
        self.n_in
    }

    fn output_size(&self) -> usize {
        self.n_out
    }
}
