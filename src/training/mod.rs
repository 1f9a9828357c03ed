//! Training drivers
//!
//! - `pretrain`: greedy layer-wise reconstruction training
//! - `finetune`: joint supervised training of the whole stack
//! - `early_stopping`: patience rule shared by fine-tuning

pub mod early_stopping;
pub mod finetune;
pub mod pretrain;

pub use early_stopping::{EarlyStopping, EarlyStoppingOutcome, Improvement};
pub use finetune::{mean_error_rate, FineTuner, FineTuningReport};
pub use pretrain::{Pretrainer, PretrainingReport};

use crate::config::TrainingConfig;
use crate::data::DataSplits;
use crate::error::{check_len, Result};
use crate::model::StackedDenoisingAutoencoder;
use crate::utils::rng::SimpleRng;
use log::info;
use serde::Serialize;
use std::time::Instant;

/// Outcome of a full training run.
#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    pub pretraining: PretrainingReport,
    pub fine_tuning: FineTuningReport,
}

/// Pretrain every layer of `model`, then fine-tune the whole stack.
///
/// `rng` drives the corruption masks; the model keeps whatever parameters
/// the last fine-tuning update left.
pub fn train(
    model: &mut StackedDenoisingAutoencoder,
    splits: &DataSplits,
    config: &TrainingConfig,
    rng: &mut SimpleRng,
) -> Result<TrainingReport> {
    config.validate()?;
    check_len("example width", model.n_ins(), splits.n_features())?;
    splits.check_labels(model.n_outs())?;
    finetune::check_full_batches(splits, config.batch_size)?;

    info!(
        "Training {} autoencoder layers, {} parameters, {} training examples",
        model.n_layers(),
        model.parameter_count(),
        splits.train.len()
    );

    let start = Instant::now();
    let pretraining = Pretrainer::from_config(config).pretrain(model, &splits.train, rng)?;
    info!("Pretraining ran for {:.2} s", start.elapsed().as_secs_f32());

    let start = Instant::now();
    let fine_tuning = FineTuner::new(config).finetune(model, splits)?;
    info!("Fine-tuning ran for {:.2} s", start.elapsed().as_secs_f32());

    Ok(TrainingReport {
        pretraining,
        fine_tuning,
    })
}
