//! Tests for the patience-based early-stopping rule
//!
//! This file covers:
//! - A scripted validation sequence with its exact best/patience trace
//! - Test-set evaluation happening only on a new best
//! - Stopping inside a fine-tuning run

use rust_stacked_autoencoders::config::TrainingConfig;
use rust_stacked_autoencoders::data::{DataSplits, LabeledSet};
use rust_stacked_autoencoders::model::StackedDenoisingAutoencoder;
use rust_stacked_autoencoders::training::{EarlyStopping, FineTuner, Improvement};
use rust_stacked_autoencoders::utils::SimpleRng;
use std::cell::Cell;

// ============================================================================
// Scripted Trace
// ============================================================================

mod trace_tests {
    use super::*;

    #[test]
    fn test_scripted_validation_sequence() {
        let mut es = EarlyStopping::new(10, 2.0, 0.995);
        let script = [
            (1, 0.5, Improvement::Significant, 0.5),
            (2, 0.4, Improvement::Significant, 0.4),
            (3, 0.41, Improvement::None, 0.4),
            (4, 0.39, Improvement::Significant, 0.39),
            (5, 0.38, Improvement::Significant, 0.38),
        ];

        for &(iteration, validation, expected, best) in &script {
            let result = es.observe(iteration, validation, || Ok(validation / 2.0)).unwrap();
            assert_eq!(result, expected, "iteration {}", iteration);
            assert_eq!(es.best_validation_loss(), best, "iteration {}", iteration);
            // 2 * iteration never exceeds the starting patience here.
            assert_eq!(es.patience(), 10, "iteration {}", iteration);
            assert!(!es.should_stop(iteration));
        }

        let outcome = es.outcome();
        assert_eq!(outcome.best_validation_loss, 0.38);
        assert_eq!(outcome.best_iteration, Some(5));
        assert_eq!(outcome.test_score, 0.19);
    }

    #[test]
    fn test_patience_grows_past_start() {
        let mut es = EarlyStopping::new(10, 2.0, 0.995);
        es.observe(1, 0.5, || Ok(0.5)).unwrap();
        es.observe(6, 0.2, || Ok(0.2)).unwrap();
        assert_eq!(es.patience(), 12);
        assert!(!es.should_stop(11));
        assert!(es.should_stop(12));
    }

    #[test]
    fn test_fractional_increase_truncates() {
        let mut es = EarlyStopping::new(1, 1.5, 0.995);
        es.observe(7, 0.3, || Ok(0.3)).unwrap();
        assert_eq!(es.patience(), 10);
    }

    #[test]
    fn test_equal_score_is_not_better() {
        let mut es = EarlyStopping::new(10, 2.0, 0.995);
        es.observe(1, 0.3, || Ok(0.1)).unwrap();
        assert_eq!(es.observe(2, 0.3, || Ok(0.9)).unwrap(), Improvement::None);
        assert_eq!(es.best_iteration(), Some(1));
        assert_eq!(es.test_score(), 0.1);
    }

    #[test]
    fn test_test_set_evaluated_once_per_new_best() {
        let calls = Cell::new(0);
        let mut es = EarlyStopping::new(100, 2.0, 0.995);
        for (i, &v) in [0.5, 0.6, 0.45, 0.45, 0.7, 0.3].iter().enumerate() {
            es.observe(i, v, || {
                calls.set(calls.get() + 1);
                Ok(v)
            })
            .unwrap();
        }
        assert_eq!(calls.get(), 3);
    }
}

// ============================================================================
// Fine-Tuning Integration
// ============================================================================

mod finetune_stopping_tests {
    use super::*;

    fn constant_splits(rows: usize) -> DataSplits {
        let make = || {
            let inputs = (0..rows * 3).map(|i| (i % 3) as f32 / 3.0).collect();
            let labels = (0..rows).map(|i| i % 2).collect();
            LabeledSet::new(inputs, labels, 3).unwrap()
        };
        DataSplits::new(make(), make(), make()).unwrap()
    }

    #[test]
    fn test_stop_breaks_out_of_all_epochs() {
        let config = TrainingConfig {
            hidden_layers_sizes: vec![2],
            batch_size: 2,
            training_epochs: 100,
            patience: 5,
            patience_increase: 1.0,
            validation_frequency: Some(2),
            ..TrainingConfig::default()
        };
        let mut rng = SimpleRng::new(6);
        let mut model = StackedDenoisingAutoencoder::from_config(3, 2, &config, &mut rng).unwrap();

        let report = FineTuner::new(&config)
            .finetune(&mut model, &constant_splits(6))
            .unwrap();

        // Three minibatches per epoch; iteration 5 closes epoch 1.
        assert!(report.stopped_early);
        assert_eq!(report.iterations, 6);
        assert_eq!(report.epochs, 2);
        assert_eq!(report.epoch_costs.len(), 2);
    }

    #[test]
    fn test_validation_counted_across_epochs() {
        let config = TrainingConfig {
            hidden_layers_sizes: vec![2],
            batch_size: 2,
            training_epochs: 2,
            patience: 1000,
            validation_frequency: Some(4),
            ..TrainingConfig::default()
        };
        let mut rng = SimpleRng::new(6);
        let mut model = StackedDenoisingAutoencoder::from_config(3, 2, &config, &mut rng).unwrap();

        let report = FineTuner::new(&config)
            .finetune(&mut model, &constant_splits(6))
            .unwrap();

        // Six iterations, validated after the fourth (iteration index 3) only.
        assert_eq!(report.iterations, 6);
        assert_eq!(report.outcome.best_iteration, Some(3));
        assert!(!report.stopped_early);
    }
}
