//! Optimizer abstractions for parameter updates
//!
//! Both training phases of a stacked denoising autoencoder use plain gradient
//! descent with a constant step size: `param ← param - lr · grad`. The
//! pretraining driver owns one optimizer at `pretraining_lr`, the fine-tuning
//! driver another at `learning_rate`.
//!
//! # Example
//!
//! ```ignore
//! use rust_stacked_autoencoders::optimizers::{Optimizer, SGD};
//!
//! let mut optimizer = SGD::new(0.1);
//! optimizer.update(&mut weights, &gradients);
//! ```

pub mod sgd;

pub use sgd::SGD;

/// Core trait for optimizers.
///
/// Layers hand each parameter buffer together with its gradient to the
/// optimizer; the optimizer never sees the model structure. The trait is
/// object safe so layers can take `&mut dyn Optimizer`.
pub trait Optimizer {
    /// Update parameters in-place from their gradients.
    ///
    /// # Panics
    ///
    /// Implementations may panic if parameters and gradients have different lengths.
    fn update(&mut self, parameters: &mut [f32], gradients: &[f32]);

    /// Get the learning rate for this optimizer.
    fn learning_rate(&self) -> f32;
}
