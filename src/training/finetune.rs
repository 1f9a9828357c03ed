//! Supervised fine-tuning of the whole stack
//!
//! After pretraining, every encode stage plus the classifier forms one
//! network trained on the negative log-likelihood. Each minibatch produces
//! one joint update of all `(W, b)` pairs; decode biases are left alone.
//! Validation runs every `validation_frequency` minibatches, counted across
//! epochs, and early stopping decides when to finish.

use crate::config::TrainingConfig;
use crate::data::{DataSplits, LabeledSet};
use crate::error::{check_finite, check_len, Phase, Result, SdaError};
use crate::model::StackedDenoisingAutoencoder;
use crate::optimizers::SGD;
use crate::training::early_stopping::{EarlyStopping, EarlyStoppingOutcome, Improvement};
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::Serialize;
use std::time::Instant;

/// Result of the fine-tuning phase.
#[derive(Debug, Clone, Serialize)]
pub struct FineTuningReport {
    pub outcome: EarlyStoppingOutcome,
    /// Minibatch updates applied.
    pub iterations: usize,
    /// Epochs started, including a final partial one.
    pub epochs: usize,
    /// Mean training cost of each epoch over the minibatches it ran.
    pub epoch_costs: Vec<f32>,
    /// True if patience ran out before `training_epochs` completed.
    pub stopped_early: bool,
}

/// Mean of the per-minibatch error rates over all full minibatches of `set`.
///
/// Batches are evaluated in parallel and summed in index order.
pub fn mean_error_rate(
    model: &StackedDenoisingAutoencoder,
    set: &LabeledSet,
    batch_size: usize,
) -> Result<f32> {
    let n_batches = set.n_batches(batch_size);
    if n_batches == 0 {
        return Err(SdaError::Configuration(format!(
            "partition of {} examples holds no full minibatch of {}",
            set.len(),
            batch_size
        )));
    }
    let errors = (0..n_batches)
        .into_par_iter()
        .map(|index| {
            let batch = set.batch(index, batch_size);
            model.error_rate(batch.inputs, batch.labels, batch_size)
        })
        .collect::<Result<Vec<f32>>>()?;
    Ok(errors.iter().sum::<f32>() / n_batches as f32)
}

/// Every partition must hold at least one full minibatch.
pub(crate) fn check_full_batches(splits: &DataSplits, batch_size: usize) -> Result<()> {
    for (name, set) in [
        ("training", &splits.train),
        ("validation", &splits.valid),
        ("test", &splits.test),
    ] {
        if set.n_batches(batch_size) == 0 {
            return Err(SdaError::Configuration(format!(
                "{} partition of {} examples holds no full minibatch of {}",
                name,
                set.len(),
                batch_size
            )));
        }
    }
    Ok(())
}

/// Fine-tuning driver.
pub struct FineTuner {
    config: TrainingConfig,
    optimizer: SGD,
    early_stopping: EarlyStopping,
}

impl FineTuner {
    pub fn new(config: &TrainingConfig) -> Self {
        Self {
            config: config.clone(),
            optimizer: SGD::new(config.learning_rate),
            early_stopping: EarlyStopping::from_config(config),
        }
    }

    /// Early-stopping state of the most recent run.
    pub fn early_stopping(&self) -> &EarlyStopping {
        &self.early_stopping
    }

    /// Train all parameters jointly until patience or `training_epochs` runs out.
    ///
    /// Each call starts from fresh early-stopping state.
    pub fn finetune(
        &mut self,
        model: &mut StackedDenoisingAutoencoder,
        splits: &DataSplits,
    ) -> Result<FineTuningReport> {
        let batch_size = self.config.batch_size;
        if batch_size == 0 {
            return Err(SdaError::Configuration(
                "batch_size must be greater than 0".to_string(),
            ));
        }
        check_len("example width", model.n_ins(), splits.n_features())?;
        splits.check_labels(model.n_outs())?;

        check_full_batches(splits, batch_size)?;
        let n_train_batches = splits.train.n_batches(batch_size);
        self.early_stopping = EarlyStopping::from_config(&self.config);

        let validation_frequency = self.config.validation_frequency(n_train_batches);
        if validation_frequency > n_train_batches {
            warn!(
                "validation every {} minibatches but an epoch has only {}",
                validation_frequency, n_train_batches
            );
        }
        info!(
            "Fine-tuning: {} minibatches per epoch, validating every {}, patience {}",
            n_train_batches,
            validation_frequency,
            self.early_stopping.patience()
        );

        let start = Instant::now();
        let mut iterations = 0usize;
        let mut epochs = 0usize;
        let mut epoch_costs = Vec::new();
        let mut stopped_early = false;

        'epochs: for epoch in 0..self.config.training_epochs {
            epochs = epoch + 1;
            let mut epoch_total = 0.0f32;
            let mut epoch_batches = 0usize;

            for minibatch_index in 0..n_train_batches {
                let iteration = epoch * n_train_batches + minibatch_index;
                let batch = splits.train.batch(minibatch_index, batch_size);

                let grads = model.supervised_gradients(batch.inputs, batch.labels, batch_size)?;
                check_finite(Phase::FineTuning, iteration, "training cost", &[grads.loss])?;
                if let Some(value) = grads.first_non_finite() {
                    return Err(SdaError::NumericDivergence {
                        phase: Phase::FineTuning,
                        iteration,
                        quantity: "fine-tuning gradient",
                        value,
                    });
                }
                model.apply_gradients(&grads, &mut self.optimizer);
                debug!("iteration {} cost {:.6}", iteration, grads.loss);

                iterations = iteration + 1;
                epoch_total += grads.loss;
                epoch_batches += 1;

                if (iteration + 1) % validation_frequency == 0 {
                    self.validate(model, splits, iteration, epoch, minibatch_index, n_train_batches)?;
                }

                if self.early_stopping.should_stop(iteration) {
                    stopped_early = true;
                    epoch_costs.push(epoch_total / epoch_batches as f32);
                    break 'epochs;
                }
            }

            epoch_costs.push(epoch_total / epoch_batches as f32);
        }

        let outcome = self.early_stopping.outcome();
        info!(
            "Optimization complete with best validation score of {:.4} %, with test performance {:.4} % ({:.2} s)",
            outcome.best_validation_loss * 100.0,
            outcome.test_score * 100.0,
            start.elapsed().as_secs_f32()
        );

        Ok(FineTuningReport {
            outcome,
            iterations,
            epochs,
            epoch_costs,
            stopped_early,
        })
    }

    fn validate(
        &mut self,
        model: &StackedDenoisingAutoencoder,
        splits: &DataSplits,
        iteration: usize,
        epoch: usize,
        minibatch_index: usize,
        n_train_batches: usize,
    ) -> Result<()> {
        let batch_size = self.config.batch_size;
        let validation_error = mean_error_rate(model, &splits.valid, batch_size)?;
        info!(
            "epoch {}, minibatch {}/{}, validation error {:.4} %",
            epoch,
            minibatch_index + 1,
            n_train_batches,
            validation_error * 100.0
        );

        let improvement = self.early_stopping.observe(iteration, validation_error, || {
            mean_error_rate(model, &splits.test, batch_size)
        })?;
        if improvement.is_better() {
            info!(
                "     epoch {}, minibatch {}/{}, test error of best model {:.4} %{}",
                epoch,
                minibatch_index + 1,
                n_train_batches,
                self.early_stopping.test_score() * 100.0,
                if improvement == Improvement::Significant {
                    format!(" (patience now {})", self.early_stopping.patience())
                } else {
                    String::new()
                }
            );
        }
        Ok(())
    }
}
