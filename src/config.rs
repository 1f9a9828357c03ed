//! Configuration structures for training
//!
//! This module provides the hyperparameters of both training phases and the
//! early-stopping rule, loadable from JSON files. Omitted fields take the
//! defaults of the classic MNIST setup.

use crate::corruption::DEFAULT_KEEP_PROBABILITY;
use crate::error::{Result, SdaError};
use serde::{Deserialize, Serialize};
use std::fs;

/// Hyperparameters for pretraining, fine-tuning and early stopping.
///
/// # Example
///
/// ```json
/// {
///   "hidden_layers_sizes": [500, 500, 500],
///   "batch_size": 20,
///   "pretraining_epochs": 5,
///   "pretraining_lr": 0.1,
///   "learning_rate": 0.1,
///   "training_epochs": 1000,
///   "patience": 10000,
///   "patience_increase": 2.0,
///   "improvement_threshold": 0.995
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Fine-tuning step size
    pub learning_rate: f32,

    /// Epochs of reconstruction training per autoencoder layer
    pub pretraining_epochs: usize,

    /// Pretraining step size
    pub pretraining_lr: f32,

    /// Upper bound on fine-tuning epochs
    pub training_epochs: usize,

    /// Hidden sizes of the stacked autoencoders, bottom to top
    pub hidden_layers_sizes: Vec<usize>,

    /// Examples per minibatch
    pub batch_size: usize,

    /// Probability of keeping each input unit when corrupting
    pub corruption_keep_probability: f32,

    /// Minimum number of fine-tuning iterations before stopping
    pub patience: usize,

    /// Factor applied to the iteration count when a significant improvement is found
    pub patience_increase: f64,

    /// Relative improvement of the validation error considered significant
    pub improvement_threshold: f32,

    /// Minibatches between validation checks (default: once per epoch,
    /// or every `patience / 2` minibatches if that is sooner)
    pub validation_frequency: Option<usize>,

    /// Seed for weight initialization and corruption masks
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            pretraining_epochs: 5,
            pretraining_lr: 0.1,
            training_epochs: 1000,
            hidden_layers_sizes: vec![500, 500, 500],
            batch_size: 20,
            corruption_keep_probability: DEFAULT_KEEP_PROBABILITY,
            patience: 10_000,
            patience_increase: 2.0,
            improvement_threshold: 0.995,
            validation_frequency: None,
            seed: 1234,
        }
    }
}

impl TrainingConfig {
    /// Check every option is in its valid range.
    pub fn validate(&self) -> Result<()> {
        if self.hidden_layers_sizes.is_empty() {
            return Err(invalid("hidden_layers_sizes must contain at least one layer"));
        }
        if let Some(i) = self.hidden_layers_sizes.iter().position(|&s| s == 0) {
            return Err(invalid(format!("hidden layer {} has size 0", i)));
        }
        if self.batch_size == 0 {
            return Err(invalid("batch_size must be greater than 0"));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(invalid("learning_rate must be positive"));
        }
        if !(self.pretraining_lr.is_finite() && self.pretraining_lr > 0.0) {
            return Err(invalid("pretraining_lr must be positive"));
        }
        if !(self.corruption_keep_probability > 0.0 && self.corruption_keep_probability <= 1.0) {
            return Err(invalid("corruption_keep_probability must be in range (0.0, 1.0]"));
        }
        if !(self.patience_increase.is_finite() && self.patience_increase >= 1.0) {
            return Err(invalid("patience_increase must be at least 1.0"));
        }
        if !(self.improvement_threshold > 0.0 && self.improvement_threshold <= 1.0) {
            return Err(invalid("improvement_threshold must be in range (0.0, 1.0]"));
        }
        if self.validation_frequency == Some(0) {
            return Err(invalid("validation_frequency must be greater than 0"));
        }
        Ok(())
    }

    /// Minibatches between validation checks for a training set of
    /// `n_train_batches` minibatches.
    pub fn validation_frequency(&self, n_train_batches: usize) -> usize {
        self.validation_frequency
            .unwrap_or_else(|| n_train_batches.min(self.patience / 2))
            .max(1)
    }
}

fn invalid(message: impl Into<String>) -> SdaError {
    SdaError::Configuration(message.into())
}

/// Loads a training configuration from a JSON file.
///
/// Reads the file at `path`, deserializes it into a `TrainingConfig` and
/// validates it.
///
/// # Examples
///
/// ```no_run
/// use rust_stacked_autoencoders::config::load_config;
///
/// let cfg = load_config("config/sda_mnist.json").unwrap();
/// assert!(!cfg.hidden_layers_sizes.is_empty());
/// ```
pub fn load_config(path: &str) -> Result<TrainingConfig> {
    let contents = fs::read_to_string(path)?;
    let config: TrainingConfig = serde_json::from_str(&contents)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = TrainingConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.hidden_layers_sizes, vec![500, 500, 500]);
        assert_eq!(config.batch_size, 20);
    }

    #[test]
    fn test_empty_hidden_layers_rejected() {
        let config = TrainingConfig {
            hidden_layers_sizes: vec![],
            ..TrainingConfig::default()
        };
        assert!(matches!(config.validate(), Err(SdaError::Configuration(_))));
    }

    #[test]
    fn test_non_positive_rates_rejected() {
        let config = TrainingConfig {
            learning_rate: 0.0,
            ..TrainingConfig::default()
        };
        assert!(config.validate().is_err());

        let config = TrainingConfig {
            pretraining_lr: -0.1,
            ..TrainingConfig::default()
        };
        assert!(config.validate().is_err());

        let config = TrainingConfig {
            batch_size: 0,
            ..TrainingConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_frequency_default() {
        let config = TrainingConfig::default();
        assert_eq!(config.validation_frequency(2500), 2500);
        assert_eq!(config.validation_frequency(20_000), 5000);

        let config = TrainingConfig {
            patience: 1,
            ..TrainingConfig::default()
        };
        assert_eq!(config.validation_frequency(10), 1);

        let config = TrainingConfig {
            validation_frequency: Some(7),
            ..TrainingConfig::default()
        };
        assert_eq!(config.validation_frequency(100), 7);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: TrainingConfig =
            serde_json::from_str(r#"{ "hidden_layers_sizes": [8, 4], "batch_size": 5 }"#).unwrap();
        assert_eq!(config.hidden_layers_sizes, vec![8, 4]);
        assert_eq!(config.batch_size, 5);
        assert_eq!(config.patience, 10_000);
        assert!((config.improvement_threshold - 0.995).abs() < 1e-6);
    }
}
