//! Stochastic input corruption for denoising autoencoders
//!
//! Each unit of the input is independently kept with probability `p` and
//! zeroed otherwise. A fresh mask is drawn on every call; masks are never
//! cached between minibatches.

use crate::utils::rng::SimpleRng;

/// Keep-probability of the classic denoising autoencoder setup.
pub const DEFAULT_KEEP_PROBABILITY: f32 = 0.9;

/// Return a corrupted copy of `input`.
///
/// # Panics
///
/// Panics if `keep_probability` is outside `[0, 1]`.
pub fn corrupt(input: &[f32], keep_probability: f32, rng: &mut SimpleRng) -> Vec<f32> {
    let mut output = input.to_vec();
    corrupt_inplace(&mut output, keep_probability, rng);
    output
}

/// Zero each entry of `data` independently with probability `1 - keep_probability`.
pub fn corrupt_inplace(data: &mut [f32], keep_probability: f32, rng: &mut SimpleRng) {
    assert!(
        (0.0..=1.0).contains(&keep_probability),
        "keep_probability must be in range [0.0, 1.0]"
    );

    for value in data.iter_mut() {
        if !rng.gen_bernoulli(keep_probability) {
            *value = 0.0;
        }
    }
}
