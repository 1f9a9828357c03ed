//! Patience-based early stopping
//!
//! The controller sees the mean validation error every few minibatches. A
//! new best validation error records the iteration and triggers one test-set
//! evaluation; an improvement beyond `improvement_threshold` also raises the
//! patience to `iteration * patience_increase`. Training stops once the
//! iteration count reaches the patience. Weights are never checkpointed: the
//! controller reports when the best score happened, not the weights that
//! produced it.

use crate::config::TrainingConfig;
use crate::error::Result;
use serde::Serialize;

/// How a validation score compared with the best one so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Improvement {
    /// Not better than the best validation error.
    None,
    /// Better, but by less than the improvement threshold.
    Marginal,
    /// Better by more than the improvement threshold; patience was extended.
    Significant,
}

impl Improvement {
    pub fn is_better(self) -> bool {
        self != Improvement::None
    }
}

/// Reported result of fine-tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EarlyStoppingOutcome {
    /// Lowest mean validation error seen (`+inf` if never validated).
    pub best_validation_loss: f32,
    /// Mean test error measured when the best validation error was seen.
    pub test_score: f32,
    /// Iteration of the best validation error.
    pub best_iteration: Option<usize>,
}

/// Early-stopping state machine.
#[derive(Debug, Clone)]
pub struct EarlyStopping {
    best_validation_loss: f32,
    best_iteration: Option<usize>,
    test_score: f32,
    patience: usize,
    patience_increase: f64,
    improvement_threshold: f32,
}

impl EarlyStopping {
    pub fn new(patience: usize, patience_increase: f64, improvement_threshold: f32) -> Self {
        Self {
            best_validation_loss: f32::INFINITY,
            best_iteration: None,
            test_score: 0.0,
            patience,
            patience_increase,
            improvement_threshold,
        }
    }

    pub fn from_config(config: &TrainingConfig) -> Self {
        Self::new(
            config.patience,
            config.patience_increase,
            config.improvement_threshold,
        )
    }

    pub fn patience(&self) -> usize {
        self.patience
    }

    pub fn best_validation_loss(&self) -> f32 {
        self.best_validation_loss
    }

    pub fn best_iteration(&self) -> Option<usize> {
        self.best_iteration
    }

    pub fn test_score(&self) -> f32 {
        self.test_score
    }

    /// Record the validation error measured at `iteration`.
    ///
    /// `test_error` is only evaluated when the validation error is a new
    /// best; its error aborts the observation with no state change.
    pub fn observe<F>(
        &mut self,
        iteration: usize,
        validation_error: f32,
        test_error: F,
    ) -> Result<Improvement>
    where
        F: FnOnce() -> Result<f32>,
    {
        let better = validation_error < self.best_validation_loss;
        if !better {
            return Ok(Improvement::None);
        }

        let test_score = test_error()?;

        let improvement =
            if validation_error < self.best_validation_loss * self.improvement_threshold {
                let extended = (iteration as f64 * self.patience_increase) as usize;
                self.patience = self.patience.max(extended);
                Improvement::Significant
            } else {
                Improvement::Marginal
            };

        self.best_validation_loss = validation_error;
        self.best_iteration = Some(iteration);
        self.test_score = test_score;
        Ok(improvement)
    }

    /// True once `iteration` has reached the current patience.
    pub fn should_stop(&self, iteration: usize) -> bool {
        iteration >= self.patience
    }

    pub fn outcome(&self) -> EarlyStoppingOutcome {
        EarlyStoppingOutcome {
            best_validation_loss: self.best_validation_loss,
            test_score: self.test_score,
            best_iteration: self.best_iteration,
        }
    }
}
