//! Greedy layer-wise pretraining
//!
//! Each autoencoder is trained on its own reconstruction cost, bottom to top.
//! Layer `i` sees the clean hidden representation produced by layers
//! `0..i` after they finished pretraining; no gradient reaches them.
//! Every layer runs the full epoch count with minibatches in index order.

use crate::config::TrainingConfig;
use crate::corruption::corrupt;
use crate::data::LabeledSet;
use crate::error::{check_finite, check_len, Phase, Result, SdaError};
use crate::layers::{DenoisingAutoencoder, Layer};
use crate::model::StackedDenoisingAutoencoder;
use crate::optimizers::{Optimizer, SGD};
use crate::utils::rng::SimpleRng;
use log::{debug, info};
use serde::Serialize;
use std::time::Instant;

/// Mean reconstruction cost of every pretraining epoch, per layer.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PretrainingReport {
    /// `layer_costs[i][e]` is layer `i`'s mean minibatch cost in epoch `e`.
    pub layer_costs: Vec<Vec<f32>>,
}

impl PretrainingReport {
    /// Cost of the last epoch of each layer.
    pub fn final_costs(&self) -> Vec<Option<f32>> {
        self.layer_costs.iter().map(|c| c.last().copied()).collect()
    }
}

/// Pretraining driver.
pub struct Pretrainer {
    epochs: usize,
    batch_size: usize,
    optimizer: SGD,
}

impl Pretrainer {
    pub fn new(epochs: usize, learning_rate: f32, batch_size: usize) -> Self {
        Self {
            epochs,
            batch_size,
            optimizer: SGD::new(learning_rate),
        }
    }

    pub fn from_config(config: &TrainingConfig) -> Self {
        Self::new(
            config.pretraining_epochs,
            config.pretraining_lr,
            config.batch_size,
        )
    }

    /// Pretrain every layer of `model` in order on the training inputs.
    pub fn pretrain(
        &mut self,
        model: &mut StackedDenoisingAutoencoder,
        train: &LabeledSet,
        rng: &mut SimpleRng,
    ) -> Result<PretrainingReport> {
        if self.batch_size == 0 {
            return Err(SdaError::Configuration(
                "batch_size must be greater than 0".to_string(),
            ));
        }
        check_len("training example width", model.n_ins(), train.n_features())?;

        let n_batches = train.n_batches(self.batch_size);
        if n_batches == 0 && self.epochs > 0 {
            return Err(SdaError::Configuration(format!(
                "training partition of {} examples holds no full minibatch of {}",
                train.len(),
                self.batch_size
            )));
        }

        let n_rows = n_batches * self.batch_size;
        let mut layer_input = train.inputs()[..n_rows * train.n_features()].to_vec();
        let mut report = PretrainingReport::default();

        for index in 0..model.n_layers() {
            let start = Instant::now();
            info!(
                "Pre-training layer {} ({} -> {})",
                index,
                model.layers()[index].n_visible(),
                model.layers()[index].n_hidden()
            );
            let costs = self.pretrain_layer(model.layer_mut(index), index, &layer_input, rng)?;
            info!(
                "Layer {} pretrained in {:.2} s",
                index,
                start.elapsed().as_secs_f32()
            );
            report.layer_costs.push(costs);

            if index + 1 < model.n_layers() {
                layer_input = model.layers()[index].encode(&layer_input, n_rows);
            }
        }

        Ok(report)
    }

    /// Run all epochs of reconstruction training for one autoencoder.
    ///
    /// `inputs` holds whole minibatches only; returns the mean cost per epoch.
    pub fn pretrain_layer(
        &mut self,
        layer: &mut DenoisingAutoencoder,
        layer_index: usize,
        inputs: &[f32],
        rng: &mut SimpleRng,
    ) -> Result<Vec<f32>> {
        let batch_len = self.batch_size * layer.input_size();
        if batch_len == 0 || inputs.len() % batch_len != 0 {
            return Err(SdaError::ShapeMismatch(format!(
                "layer {} input of {} values is not a whole number of {}-example minibatches",
                layer_index,
                inputs.len(),
                self.batch_size
            )));
        }
        let n_batches = inputs.len() / batch_len;
        let phase = Phase::Pretraining { layer: layer_index };
        let mut epoch_costs = Vec::with_capacity(self.epochs);

        for epoch in 0..self.epochs {
            let mut total = 0.0f32;
            for (batch_index, clean) in inputs.chunks_exact(batch_len).enumerate() {
                let iteration = epoch * n_batches + batch_index;
                let corrupted = corrupt(clean, layer.keep_probability(), rng);
                let grads = layer.reconstruction_gradients(clean, &corrupted, self.batch_size);

                check_finite(phase, iteration, "reconstruction cost", &[grads.loss])?;
                if let Some(value) = grads.first_non_finite() {
                    return Err(SdaError::NumericDivergence {
                        phase,
                        iteration,
                        quantity: "reconstruction gradient",
                        value,
                    });
                }

                layer.apply_reconstruction_gradients(&grads, &mut self.optimizer);
                debug!("layer {} minibatch {} cost {:.6}", layer_index, iteration, grads.loss);
                total += grads.loss;
            }

            let mean = if n_batches == 0 { 0.0 } else { total / n_batches as f32 };
            info!(
                "Pre-training layer {}, epoch {}, cost {:.6} (lr {})",
                layer_index,
                epoch,
                mean,
                self.optimizer.learning_rate()
            );
            epoch_costs.push(mean);
        }

        Ok(epoch_costs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_set(rows: usize, width: usize) -> LabeledSet {
        let inputs = (0..rows * width)
            .map(|i| ((i * 7) % 11) as f32 / 11.0)
            .collect();
        LabeledSet::new(inputs, vec![0; rows], width).unwrap()
    }

    #[test]
    fn test_report_has_one_row_per_layer_and_epoch() {
        let mut rng = SimpleRng::new(9);
        let mut model = StackedDenoisingAutoencoder::new(6, &[4, 3], 2, &mut rng).unwrap();
        let train = tiny_set(10, 6);
        let report = Pretrainer::new(3, 0.1, 5)
            .pretrain(&mut model, &train, &mut rng)
            .unwrap();
        assert_eq!(report.layer_costs.len(), 2);
        assert!(report.layer_costs.iter().all(|c| c.len() == 3));
        assert!(report.final_costs().iter().all(|c| c.unwrap() > 0.0));
    }

    #[test]
    fn test_zero_epochs_leaves_parameters() {
        let mut rng = SimpleRng::new(9);
        let mut model = StackedDenoisingAutoencoder::new(6, &[4], 2, &mut rng).unwrap();
        let before = model.layers()[0].weights().to_vec();
        Pretrainer::new(0, 0.1, 5)
            .pretrain(&mut model, &tiny_set(10, 6), &mut rng)
            .unwrap();
        assert_eq!(model.layers()[0].weights(), before.as_slice());
    }

    #[test]
    fn test_rejects_width_mismatch() {
        let mut rng = SimpleRng::new(9);
        let mut model = StackedDenoisingAutoencoder::new(5, &[4], 2, &mut rng).unwrap();
        let err = Pretrainer::new(1, 0.1, 5)
            .pretrain(&mut model, &tiny_set(10, 6), &mut rng)
            .unwrap_err();
        assert!(matches!(err, SdaError::ShapeMismatch(_)));
    }

    #[test]
    fn test_divergence_is_fatal() {
        let mut rng = SimpleRng::new(9);
        let mut layer = DenoisingAutoencoder::new(3, 2, &mut rng);
        let inputs = vec![f32::NAN, 0.5, 0.5];
        let err = Pretrainer::new(1, 0.1, 1)
            .pretrain_layer(&mut layer, 0, &inputs, &mut SimpleRng::new(1))
            .unwrap_err();
        assert!(matches!(
            err,
            SdaError::NumericDivergence {
                phase: Phase::Pretraining { layer: 0 },
                ..
            }
        ));
    }
}
