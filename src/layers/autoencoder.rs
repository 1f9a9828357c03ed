//! Denoising autoencoder layer with tied weights
//!
//! The layer owns one weight matrix `W` (`n_visible × n_hidden`), an encode
//! bias `b` and a decode bias `b'`. The decode weights are always `Wᵀ`; they
//! are read through `W` on every decode and never stored separately.
//!
//! ```text
//! x̃ = corrupt(x)                  stochastic masking
//! y = sigmoid(x̃·W + b)            hidden code from the corrupted input
//! z = sigmoid(y·Wᵀ + b')          reconstruction
//! L = mean_i -Σ_k [x log z + (1-x) log(1-z)]
//! ```

use crate::corruption::{corrupt, DEFAULT_KEEP_PROBABILITY};
use crate::layers::r#trait::Layer;
use crate::optimizers::Optimizer;
use crate::utils::activations::{binary_cross_entropy_with_logit, sigmoid, sigmoid_inplace};
use crate::utils::linalg::{
    add_row_bias, column_sums, matmul, matmul_transpose_a_acc, matmul_transpose_b, transpose,
};
use crate::utils::rng::SimpleRng;

/// Gradients of the reconstruction cost with respect to `(W, b, b')`.
#[derive(Debug, Clone, PartialEq)]
pub struct AutoencoderGradients {
    /// Mean reconstruction cost of the minibatch the gradients came from.
    pub loss: f32,
    /// `∂L/∂W`, row-major `[n_visible × n_hidden]`
    pub weights: Vec<f32>,
    /// `∂L/∂b`
    pub hidden_bias: Vec<f32>,
    /// `∂L/∂b'`
    pub visible_bias: Vec<f32>,
}

impl AutoencoderGradients {
    /// Returns the first non-finite gradient entry, if any.
    pub fn first_non_finite(&self) -> Option<f32> {
        self.weights
            .iter()
            .chain(self.hidden_bias.iter())
            .chain(self.visible_bias.iter())
            .copied()
            .find(|v| !v.is_finite())
    }
}

/// One denoising autoencoder of the stack.
#[derive(Debug, Clone)]
pub struct DenoisingAutoencoder {
    n_visible: usize,
    n_hidden: usize,
    weights: Vec<f32>,
    hidden_bias: Vec<f32>,
    visible_bias: Vec<f32>,
    keep_probability: f32,
}

impl DenoisingAutoencoder {
    /// Create an autoencoder with uniform initialization of `W` in
    /// `[-sqrt(6/(n_visible+n_hidden)), sqrt(6/(n_visible+n_hidden))]`
    /// and zero biases.
    ///
    /// # Example
    ///
    /// ```
    /// use rust_stacked_autoencoders::layers::DenoisingAutoencoder;
    /// use rust_stacked_autoencoders::utils::SimpleRng;
    ///
    /// let mut rng = SimpleRng::new(42);
    /// let da = DenoisingAutoencoder::new(784, 500, &mut rng);
    /// assert_eq!(da.n_visible(), 784);
    /// assert_eq!(da.n_hidden(), 500);
    /// assert!(da.hidden_bias().iter().all(|&b| b == 0.0));
    /// ```
    pub fn new(n_visible: usize, n_hidden: usize, rng: &mut SimpleRng) -> Self {
        let limit = (6.0f32 / (n_visible + n_hidden) as f32).sqrt();
        let weights = (0..n_visible * n_hidden)
            .map(|_| rng.gen_range_f32(-limit, limit))
            .collect();

        Self {
            n_visible,
            n_hidden,
            weights,
            hidden_bias: vec![0.0f32; n_hidden],
            visible_bias: vec![0.0f32; n_visible],
            keep_probability: DEFAULT_KEEP_PROBABILITY,
        }
    }

    /// Set the probability of keeping each input unit during corruption.
    ///
    /// # Panics
    ///
    /// Panics if `keep_probability` is outside `[0, 1]`.
    pub fn with_keep_probability(mut self, keep_probability: f32) -> Self {
        assert!(
            (0.0..=1.0).contains(&keep_probability),
            "keep_probability must be in range [0.0, 1.0]"
        );
        self.keep_probability = keep_probability;
        self
    }

    pub fn n_visible(&self) -> usize {
        self.n_visible
    }

    pub fn n_hidden(&self) -> usize {
        self.n_hidden
    }

    pub fn keep_probability(&self) -> f32 {
        self.keep_probability
    }

    /// Encode bias `b`.
    pub fn hidden_bias(&self) -> &[f32] {
        &self.hidden_bias
    }

    /// Decode bias `b'`.
    pub fn visible_bias(&self) -> &[f32] {
        &self.visible_bias
    }

    pub fn visible_bias_mut(&mut self) -> &mut [f32] {
        &mut self.visible_bias
    }

    /// Decode weights `W' = Wᵀ` (`n_hidden × n_visible`), computed from the current `W`.
    pub fn decode_weights(&self) -> Vec<f32> {
        transpose(&self.weights, self.n_visible, self.n_hidden)
    }

    /// Clean hidden representation `sigmoid(x·W + b)`.
    pub fn encode(&self, input: &[f32], batch_size: usize) -> Vec<f32> {
        let mut hidden = vec![0.0f32; batch_size * self.n_hidden];
        self.forward(input, &mut hidden, batch_size);
        hidden
    }

    /// Hidden representation of a freshly corrupted copy of `input`.
    pub fn encode_corrupted(
        &self,
        input: &[f32],
        batch_size: usize,
        rng: &mut SimpleRng,
    ) -> Vec<f32> {
        let corrupted = corrupt(input, self.keep_probability, rng);
        self.encode(&corrupted, batch_size)
    }

    /// Reconstruction `sigmoid(y·Wᵀ + b')`.
    pub fn decode(&self, hidden: &[f32], batch_size: usize) -> Vec<f32> {
        let mut z = self.decode_logits(hidden, batch_size);
        sigmoid_inplace(&mut z);
        z
    }

    fn decode_logits(&self, hidden: &[f32], batch_size: usize) -> Vec<f32> {
        assert_eq!(
            hidden.len(),
            batch_size * self.n_hidden,
            "decode: hidden length mismatch"
        );
        let mut logits = vec![0.0f32; batch_size * self.n_visible];
        matmul_transpose_b(
            hidden,
            &self.weights,
            &mut logits,
            batch_size,
            self.n_hidden,
            self.n_visible,
        );
        add_row_bias(&mut logits, &self.visible_bias);
        logits
    }

    /// Mean reconstruction cost of `input` under a fresh corruption mask.
    pub fn reconstruction_loss(
        &self,
        input: &[f32],
        batch_size: usize,
        rng: &mut SimpleRng,
    ) -> f32 {
        let corrupted = corrupt(input, self.keep_probability, rng);
        self.reconstruction_loss_from(input, &corrupted, batch_size)
    }

    /// Mean reconstruction cost of `clean` given an already corrupted copy.
    pub fn reconstruction_loss_from(&self, clean: &[f32], corrupted: &[f32], batch_size: usize) -> f32 {
        assert_eq!(clean.len(), corrupted.len(), "clean/corrupted length mismatch");
        if batch_size == 0 {
            return 0.0;
        }
        let hidden = self.encode(corrupted, batch_size);
        let logits = self.decode_logits(&hidden, batch_size);
        let total: f32 = clean
            .iter()
            .zip(logits.iter())
            .map(|(&x, &a)| binary_cross_entropy_with_logit(x, a))
            .sum();
        total / batch_size as f32
    }

    /// Reconstruction cost and its gradients with respect to `(W, b, b')`.
    ///
    /// `W` receives a contribution from both the encode path and the tied
    /// decode path.
    pub fn reconstruction_gradients(
        &self,
        clean: &[f32],
        corrupted: &[f32],
        batch_size: usize,
    ) -> AutoencoderGradients {
        let (nv, nh) = (self.n_visible, self.n_hidden);
        assert_eq!(clean.len(), batch_size * nv, "reconstruction: input length mismatch");
        assert_eq!(corrupted.len(), clean.len(), "clean/corrupted length mismatch");

        let hidden = self.encode(corrupted, batch_size);
        let logits = self.decode_logits(&hidden, batch_size);
        let scale = 1.0 / batch_size.max(1) as f32;

        let mut loss = 0.0f32;
        let mut delta_z = vec![0.0f32; batch_size * nv];
        for ((d, &x), &a) in delta_z.iter_mut().zip(clean).zip(&logits) {
            loss += binary_cross_entropy_with_logit(x, a);
            *d = (sigmoid(a) - x) * scale;
        }

        let visible_bias = column_sums(&delta_z, nv);

        // Back through the tied decoder into the hidden code.
        let mut delta_hidden = vec![0.0f32; batch_size * nh];
        matmul(&delta_z, &self.weights, &mut delta_hidden, batch_size, nv, nh);
        for (d, &y) in delta_hidden.iter_mut().zip(&hidden) {
            *d *= y * (1.0 - y);
        }
        let hidden_bias = column_sums(&delta_hidden, nh);

        let mut weights = vec![0.0f32; nv * nh];
        matmul_transpose_a_acc(corrupted, &delta_hidden, &mut weights, batch_size, nv, nh);
        matmul_transpose_a_acc(&delta_z, &hidden, &mut weights, batch_size, nv, nh);

        AutoencoderGradients {
            loss: loss * scale,
            weights,
            hidden_bias,
            visible_bias,
        }
    }

    /// Apply one optimizer step to `W`, `b` and `b'` together.
    pub fn apply_reconstruction_gradients(
        &mut self,
        gradients: &AutoencoderGradients,
        optimizer: &mut dyn Optimizer,
    ) {
        optimizer.update(&mut self.weights, &gradients.weights);
        optimizer.update(&mut self.hidden_bias, &gradients.hidden_bias);
        optimizer.update(&mut self.visible_bias, &gradients.visible_bias);
    }
}

impl Layer for DenoisingAutoencoder {
    fn forward(&self, input: &[f32], output: &mut [f32], batch_size: usize) {
        assert_eq!(
            input.len(),
            batch_size * self.n_visible,
            "encode: input length mismatch"
        );
        matmul(
            input,
            &self.weights,
            output,
            batch_size,
            self.n_visible,
            self.n_hidden,
        );
        add_row_bias(output, &self.hidden_bias);
        sigmoid_inplace(output);
    }

    fn weights(&self) -> &[f32] {
        &self.weights
    }

    fn biases(&self) -> &[f32] {
        &self.hidden_bias
    }

    fn parameters_mut(&mut self) -> (&mut [f32], &mut [f32]) {
        (&mut self.weights, &mut self.hidden_bias)
    }

    fn input_size(&self) -> usize {
        self.n_visible
    }

    fn output_size(&self) -> usize {
        self.n_hidden
    }

    /// Counts `W`, `b` and `b'`; the decode weights are shared with `W`.
    fn parameter_count(&self) -> usize {
        self.weights.len() + self.hidden_bias.len() + self.visible_bias.len()
    }
}
