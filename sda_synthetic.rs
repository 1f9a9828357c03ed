use rust_stacked_autoencoders::config::load_config;
use rust_stacked_autoencoders::data::{separable_two_class, DataSplits};
use rust_stacked_autoencoders::training::mean_error_rate;
use rust_stacked_autoencoders::utils::SimpleRng;
use rust_stacked_autoencoders::{train, Result, StackedDenoisingAutoencoder, TrainingConfig};
use std::env;
use std::process;
use std::time::Instant;

// Synthetic problem size.
const NUM_FEATURES: usize = 16;
const NUM_CLASSES: usize = 2;
const TRAIN_SAMPLES: usize = 1000;
const VALID_SAMPLES: usize = 200;
const TEST_SAMPLES: usize = 200;

fn default_config() -> TrainingConfig {
    TrainingConfig {
        hidden_layers_sizes: vec![12, 8],
        batch_size: 10,
        pretraining_epochs: 5,
        training_epochs: 50,
        patience: 2000,
        ..TrainingConfig::default()
    }
}

fn build_splits(rng: &mut SimpleRng) -> Result<DataSplits> {
    let train = separable_two_class(TRAIN_SAMPLES, NUM_FEATURES, rng)?;
    let valid = separable_two_class(VALID_SAMPLES, NUM_FEATURES, rng)?;
    let test = separable_two_class(TEST_SAMPLES, NUM_FEATURES, rng)?;
    DataSplits::new(train, valid, test)
}

fn run(config: &TrainingConfig) -> Result<()> {
    let program_start = Instant::now();
    let mut rng = SimpleRng::new(config.seed);

    println!("Generating synthetic data...");
    let splits = build_splits(&mut rng)?;

    println!("Building stacked denoising autoencoder...");
    let mut model =
        StackedDenoisingAutoencoder::from_config(NUM_FEATURES, NUM_CLASSES, config, &mut rng)?;

    println!("Training...");
    let report = train(&mut model, &splits, config, &mut rng)?;

    println!("{}", serde_json::to_string_pretty(&report)?);

    let test_error = mean_error_rate(&model, &splits.test, config.batch_size)?;
    println!("\n=== Summary ===");
    println!("Test accuracy of final model: {:.2}%", (1.0 - test_error) * 100.0);
    println!(
        "Total program time: {:.2} seconds",
        program_start.elapsed().as_secs_f64()
    );
    Ok(())
}

/// Config from the first command-line argument, or the built-in default.
fn config_from_args(args: &[String]) -> Result<TrainingConfig> {
    match args.get(1) {
        Some(path) => load_config(path),
        None => Ok(default_config()),
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    let config = match config_from_args(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Could not load config: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run(&config) {
        eprintln!("Training failed: {}", e);
        process::exit(1);
    }
}
