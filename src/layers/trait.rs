//! Layer trait shared by the encode stages and the classification head
//!
//! Both layer kinds in the stacked model are affine maps `x·W + b` followed by
//! a fixed activation, so the parameter gradients and the input gradient have
//! one closed form given the gradient with respect to the pre-activation.

use crate::optimizers::Optimizer;
use crate::utils::linalg::{column_sums, matmul_transpose_a_acc, matmul_transpose_b};

/// Gradients of a loss with respect to one affine layer's `(W, b)`.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseGradients {
    /// `∂loss/∂W`, row-major `[input_size × output_size]`
    pub weights: Vec<f32>,
    /// `∂loss/∂b`, length `output_size`
    pub biases: Vec<f32>,
}

impl DenseGradients {
    /// Returns the first non-finite entry, if any.
    pub fn first_non_finite(&self) -> Option<f32> {
        self.weights
            .iter()
            .chain(self.biases.iter())
            .copied()
            .find(|v| !v.is_finite())
    }
}

/// Core trait for the layers of a stacked denoising autoencoder.
///
/// Implementors expose their weight matrix (`[input_size × output_size]`,
/// row-major) and bias vector; backward propagation and the gradient step are
/// provided on top of those.
///
/// # Example
///
/// ```ignore
/// let mut hidden = vec![0.0f32; batch_size * layer.output_size()];
/// layer.forward(&input, &mut hidden, batch_size);
///
/// let grads = layer.backward(&input, &delta, None, batch_size);
/// layer.apply_gradients(&grads, &mut sgd);
/// ```
pub trait Layer {
    /// Forward propagation: writes the activated output for `batch_size` rows.
    ///
    /// # Panics
    ///
    /// Implementations may panic if input/output dimensions don't match expected sizes.
    fn forward(&self, input: &[f32], output: &mut [f32], batch_size: usize);

    /// Weight matrix, row-major `[input_size × output_size]`.
    fn weights(&self) -> &[f32];

    /// Bias vector of length `output_size`.
    fn biases(&self) -> &[f32];

    /// Mutable access to weights and biases together, for an atomic update.
    fn parameters_mut(&mut self) -> (&mut [f32], &mut [f32]);

    /// Get the input size of the layer.
    fn input_size(&self) -> usize;

    /// Get the output size of the layer.
    fn output_size(&self) -> usize;

    /// Backward propagation through the affine part of the layer.
    ///
    /// `delta` is the gradient of the loss with respect to the layer's
    /// pre-activation (`batch_size × output_size`). Returns the parameter
    /// gradients and, when `grad_input` is given, writes `delta · Wᵀ` into it.
    fn backward(
        &self,
        input: &[f32],
        delta: &[f32],
        grad_input: Option<&mut [f32]>,
        batch_size: usize,
    ) -> DenseGradients {
        let (n_in, n_out) = (self.input_size(), self.output_size());
        assert_eq!(input.len(), batch_size * n_in, "backward: input length mismatch");
        assert_eq!(delta.len(), batch_size * n_out, "backward: delta length mismatch");

        let mut weights = vec![0.0f32; n_in * n_out];
        matmul_transpose_a_acc(input, delta, &mut weights, batch_size, n_in, n_out);
        let biases = column_sums(delta, n_out);

        if let Some(grad_input) = grad_input {
            matmul_transpose_b(delta, self.weights(), grad_input, batch_size, n_out, n_in);
        }

        DenseGradients { weights, biases }
    }

    /// Apply one optimizer step to weights and biases.
    fn apply_gradients(&mut self, gradients: &DenseGradients, optimizer: &mut dyn Optimizer) {
        let (weights, biases) = self.parameters_mut();
        optimizer.update(weights, &gradients.weights);
        optimizer.update(biases, &gradients.biases);
    }

    /// Number of trainable parameters used by the forward pass.
    fn parameter_count(&self) -> usize {
        self.weights().len() + self.biases().len()
    }
}
