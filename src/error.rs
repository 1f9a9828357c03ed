//! Error types for stacked denoising autoencoder training
//!
//! Every detected invariant violation is fatal: there is no retry or
//! recovery path anywhere in the library. Normal termination of training is
//! governed only by early stopping, never by an error.

use std::fmt;

/// Training phase in which a numeric divergence was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Greedy layer-wise pretraining of the autoencoder at the given depth.
    Pretraining { layer: usize },
    /// Joint supervised fine-tuning of the whole stack.
    FineTuning,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Pretraining { layer } => write!(f, "pretraining of layer {}", layer),
            Phase::FineTuning => write!(f, "fine-tuning"),
        }
    }
}

/// Errors raised by model construction, data handling and training.
#[derive(Debug, thiserror::Error)]
pub enum SdaError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Unsupported label type: {0}")]
    UnsupportedLabelType(String),

    #[error("Numeric divergence during {phase} at iteration {iteration}: {quantity} is {value}")]
    NumericDivergence {
        phase: Phase,
        iteration: usize,
        quantity: &'static str,
        value: f32,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SdaError>;

/// Ensure `expected == actual`, describing the mismatch with `what`.
pub(crate) fn check_len(what: &str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(SdaError::ShapeMismatch(format!(
            "{}: expected {} values, got {}",
            what, expected, actual
        )));
    }
    Ok(())
}

/// Ensure every value in `values` is finite.
pub(crate) fn check_finite(
    phase: Phase,
    iteration: usize,
    quantity: &'static str,
    values: &[f32],
) -> Result<()> {
    if let Some(&value) = values.iter().find(|v| !v.is_finite()) {
        return Err(SdaError::NumericDivergence {
            phase,
            iteration,
            quantity,
            value,
        });
    }
    Ok(())
}
