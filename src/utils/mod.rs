//! Shared utilities for the stacked autoencoder implementation
//!
//! This module provides the seeded random number generator, activation
//! functions and the small row-major matrix kernels used by every layer.

pub mod activations;
pub mod linalg;
pub mod rng;

pub use activations::{argmax, sigmoid, sigmoid_derivative, softmax_rows};
pub use rng::SimpleRng;
