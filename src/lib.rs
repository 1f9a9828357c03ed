//! Stacked Denoising Autoencoders
//!
//! Deep classifiers built from tied-weight denoising autoencoders, trained
//! in two phases: greedy layer-wise pretraining on corrupted reconstruction,
//! then supervised fine-tuning of the whole stack with patience-based early
//! stopping.
//!
//! # Modules
//!
//! - `layers`: Layer trait, denoising autoencoder and softmax classifier
//! - `model`: the stacked network
//! - `training`: pretraining, fine-tuning and early stopping drivers
//! - `optimizers`: Optimizer trait and plain SGD
//! - `corruption`: masking noise
//! - `data`: labeled partitions and minibatch slicing
//! - `config`: training hyperparameters
//! - `error`: crate error type
//! - `utils`: RNG, activation functions and matrix helpers

pub mod config;
pub mod corruption;
pub mod data;
pub mod error;
pub mod layers;
pub mod model;
pub mod optimizers;
pub mod training;
pub mod utils;

pub use config::TrainingConfig;
pub use error::{Result, SdaError};
pub use model::StackedDenoisingAutoencoder;
pub use training::{train, TrainingReport};
