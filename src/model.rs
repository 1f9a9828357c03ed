//! Stacked denoising autoencoder model
//!
//! An ordered chain of denoising autoencoders topped by a logistic regression
//! layer. The clean hidden representation of layer `i` is the input of layer
//! `i + 1`; the top representation feeds the classifier. Once pretrained, the
//! encode stages plus the classifier are treated as one feed-forward network.

use crate::config::TrainingConfig;
use crate::corruption::DEFAULT_KEEP_PROBABILITY;
use crate::error::{check_len, Result, SdaError};
use crate::layers::{DenoisingAutoencoder, DenseGradients, Layer, LogisticLayer};
use crate::optimizers::Optimizer;
use crate::utils::activations::sigmoid_derivative;
use crate::utils::rng::SimpleRng;

/// Gradients of the supervised cost with respect to every encode stage and
/// the classifier.
#[derive(Debug, Clone)]
pub struct StackGradients {
    /// Mean negative log-likelihood of the minibatch.
    pub loss: f32,
    /// One entry per autoencoder, bottom to top; covers `(W, b)` only.
    pub layers: Vec<DenseGradients>,
    pub classifier: DenseGradients,
}

impl StackGradients {
    /// Returns the first non-finite gradient entry, if any.
    pub fn first_non_finite(&self) -> Option<f32> {
        self.layers
            .iter()
            .chain(std::iter::once(&self.classifier))
            .find_map(DenseGradients::first_non_finite)
    }
}

/// Stack of denoising autoencoders with a classification head.
#[derive(Debug, Clone)]
pub struct StackedDenoisingAutoencoder {
    layers: Vec<DenoisingAutoencoder>,
    classifier: LogisticLayer,
}

impl StackedDenoisingAutoencoder {
    /// Build a stack for `n_ins` input features, one autoencoder per entry of
    /// `hidden_layers_sizes`, and `n_outs` classes.
    ///
    /// # Example
    ///
    /// ```
    /// use rust_stacked_autoencoders::model::StackedDenoisingAutoencoder;
    /// use rust_stacked_autoencoders::utils::SimpleRng;
    ///
    /// let mut rng = SimpleRng::new(1);
    /// let sda = StackedDenoisingAutoencoder::new(784, &[500, 500, 500], 10, &mut rng).unwrap();
    /// assert_eq!(sda.n_layers(), 3);
    /// assert!(StackedDenoisingAutoencoder::new(784, &[], 10, &mut rng).is_err());
    /// ```
    pub fn new(
        n_ins: usize,
        hidden_layers_sizes: &[usize],
        n_outs: usize,
        rng: &mut SimpleRng,
    ) -> Result<Self> {
        Self::with_keep_probability(n_ins, hidden_layers_sizes, n_outs, DEFAULT_KEEP_PROBABILITY, rng)
    }

    /// Build a stack from the layer sizes and corruption level in `config`.
    pub fn from_config(
        n_ins: usize,
        n_outs: usize,
        config: &TrainingConfig,
        rng: &mut SimpleRng,
    ) -> Result<Self> {
        config.validate()?;
        Self::with_keep_probability(
            n_ins,
            &config.hidden_layers_sizes,
            n_outs,
            config.corruption_keep_probability,
            rng,
        )
    }

    fn with_keep_probability(
        n_ins: usize,
        hidden_layers_sizes: &[usize],
        n_outs: usize,
        keep_probability: f32,
        rng: &mut SimpleRng,
    ) -> Result<Self> {
        if hidden_layers_sizes.is_empty() {
            return Err(SdaError::Configuration(
                "a stacked autoencoder needs at least one hidden layer".to_string(),
            ));
        }
        if n_ins == 0 || n_outs == 0 || hidden_layers_sizes.contains(&0) {
            return Err(SdaError::Configuration(format!(
                "layer sizes must be positive (inputs {}, hidden {:?}, outputs {})",
                n_ins, hidden_layers_sizes, n_outs
            )));
        }
        if !(0.0..=1.0).contains(&keep_probability) {
            return Err(SdaError::Configuration(format!(
                "keep probability {} outside [0, 1]",
                keep_probability
            )));
        }

        let mut layers = Vec::with_capacity(hidden_layers_sizes.len());
        let mut n_visible = n_ins;
        for &n_hidden in hidden_layers_sizes {
            layers.push(
                DenoisingAutoencoder::new(n_visible, n_hidden, rng)
                    .with_keep_probability(keep_probability),
            );
            n_visible = n_hidden;
        }
        let classifier = LogisticLayer::new(n_visible, n_outs);

        Self::from_parts(layers, classifier)
    }

    /// Assemble a stack from existing layers, checking the size chain.
    pub fn from_parts(layers: Vec<DenoisingAutoencoder>, classifier: LogisticLayer) -> Result<Self> {
        if layers.is_empty() {
            return Err(SdaError::Configuration(
                "a stacked autoencoder needs at least one hidden layer".to_string(),
            ));
        }
        for (i, pair) in layers.windows(2).enumerate() {
            if pair[0].n_hidden() != pair[1].n_visible() {
                return Err(SdaError::ShapeMismatch(format!(
                    "layer {} outputs {} units but layer {} expects {}",
                    i,
                    pair[0].n_hidden(),
                    i + 1,
                    pair[1].n_visible()
                )));
            }
        }
        let top = layers[layers.len() - 1].n_hidden();
        if classifier.n_in() != top {
            return Err(SdaError::ShapeMismatch(format!(
                "top layer outputs {} units but the classifier expects {}",
                top,
                classifier.n_in()
            )));
        }
        Ok(Self { layers, classifier })
    }

    pub fn n_layers(&self) -> usize {
        self.layers.len()
    }

    /// Input width of the whole stack.
    pub fn n_ins(&self) -> usize {
        self.layers[0].n_visible()
    }

    /// Number of classes.
    pub fn n_outs(&self) -> usize {
        self.classifier.n_out()
    }

    pub fn layers(&self) -> &[DenoisingAutoencoder] {
        &self.layers
    }

    pub fn classifier(&self) -> &LogisticLayer {
        &self.classifier
    }

    pub(crate) fn layer_mut(&mut self, index: usize) -> &mut DenoisingAutoencoder {
        &mut self.layers[index]
    }

    /// Trainable parameters of all autoencoders (including decode biases) and the classifier.
    pub fn parameter_count(&self) -> usize {
        self.layers.iter().map(Layer::parameter_count).sum::<usize>()
            + self.classifier.parameter_count()
    }

    /// Clean output of the first `depth` encode stages (`depth = 0` returns
    /// the input itself).
    pub fn hidden_representation(
        &self,
        input: &[f32],
        depth: usize,
        batch_size: usize,
    ) -> Result<Vec<f32>> {
        check_len("stack input", batch_size * self.n_ins(), input.len())?;
        if depth > self.layers.len() {
            return Err(SdaError::ShapeMismatch(format!(
                "requested depth {} of a {}-layer stack",
                depth,
                self.layers.len()
            )));
        }
        let mut current = input.to_vec();
        for layer in &self.layers[..depth] {
            check_len("layer input", batch_size * layer.n_visible(), current.len())?;
            current = layer.encode(&current, batch_size);
        }
        Ok(current)
    }

    /// Class probabilities for every example of the batch.
    pub fn forward(&self, input: &[f32], batch_size: usize) -> Result<Vec<f32>> {
        let top = self.hidden_representation(input, self.layers.len(), batch_size)?;
        self.classifier.probabilities(&top, batch_size)
    }

    pub fn predict(&self, input: &[f32], batch_size: usize) -> Result<Vec<usize>> {
        let top = self.hidden_representation(input, self.layers.len(), batch_size)?;
        self.classifier.predict(&top, batch_size)
    }

    pub fn negative_log_likelihood(
        &self,
        input: &[f32],
        labels: &[usize],
        batch_size: usize,
    ) -> Result<f32> {
        check_len("label vector", batch_size, labels.len())?;
        let top = self.hidden_representation(input, self.layers.len(), batch_size)?;
        self.classifier.negative_log_likelihood(&top, labels, batch_size)
    }

    pub fn error_rate(&self, input: &[f32], labels: &[usize], batch_size: usize) -> Result<f32> {
        check_len("label vector", batch_size, labels.len())?;
        let top = self.hidden_representation(input, self.layers.len(), batch_size)?;
        self.classifier.error_rate(&top, labels, batch_size)
    }

    /// Negative log-likelihood of the batch and its gradient with respect to
    /// every encode stage's `(W, b)` and the classifier's `(W, b)`.
    ///
    /// Decode biases do not take part in the supervised pipeline.
    pub fn supervised_gradients(
        &self,
        input: &[f32],
        labels: &[usize],
        batch_size: usize,
    ) -> Result<StackGradients> {
        check_len("stack input", batch_size * self.n_ins(), input.len())?;
        check_len("label vector", batch_size, labels.len())?;

        let mut hiddens: Vec<Vec<f32>> = Vec::with_capacity(self.layers.len());
        for (i, layer) in self.layers.iter().enumerate() {
            let layer_input: &[f32] = if i == 0 { input } else { &hiddens[i - 1] };
            let hidden = layer.encode(layer_input, batch_size);
            hiddens.push(hidden);
        }
        let top = &hiddens[hiddens.len() - 1];

        let (loss, delta) = self.classifier.loss_delta(top, labels, batch_size)?;
        let mut grad_hidden = vec![0.0f32; top.len()];
        let classifier = self
            .classifier
            .backward(top, &delta, Some(&mut grad_hidden), batch_size);

        let mut layers = Vec::with_capacity(self.layers.len());
        for (i, layer) in self.layers.iter().enumerate().rev() {
            // grad_hidden becomes the pre-activation delta of layer i.
            for (d, &h) in grad_hidden.iter_mut().zip(&hiddens[i]) {
                *d *= sigmoid_derivative(h);
            }
            if i == 0 {
                layers.push(layer.backward(input, &grad_hidden, None, batch_size));
            } else {
                let mut grad_input = vec![0.0f32; batch_size * layer.n_visible()];
                layers.push(layer.backward(
                    &hiddens[i - 1],
                    &grad_hidden,
                    Some(&mut grad_input),
                    batch_size,
                ));
                grad_hidden = grad_input;
            }
        }
        layers.reverse();

        Ok(StackGradients {
            loss,
            layers,
            classifier,
        })
    }

    /// Apply one joint optimizer step to every encode stage and the classifier.
    ///
    /// # Panics
    ///
    /// Panics if `gradients` was computed for a stack of a different shape.
    pub fn apply_gradients(&mut self, gradients: &StackGradients, optimizer: &mut dyn Optimizer) {
        assert_eq!(
            gradients.layers.len(),
            self.layers.len(),
            "gradients cover a different number of layers"
        );
        for (layer, grads) in self.layers.iter_mut().zip(&gradients.layers) {
            layer.apply_gradients(grads, optimizer);
        }
        self.classifier.apply_gradients(&gradients.classifier, optimizer);
    }
}
