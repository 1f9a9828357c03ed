//! Layer abstractions for the stacked model
//!
//! This module provides the Layer trait together with the two layer kinds of
//! a stacked denoising autoencoder: the tied-weight denoising autoencoder
//! used for every hidden stage, and the logistic regression head.

mod r#trait;
pub mod autoencoder;
pub mod logistic;

// Re-export the Layer trait for convenience
pub use r#trait::{DenseGradients, Layer};
pub use autoencoder::{AutoencoderGradients, DenoisingAutoencoder};
pub use logistic::LogisticLayer;
