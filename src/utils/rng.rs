//! Seeded random number generator.
//!
//! A lightweight xorshift PRNG threaded explicitly through weight
//! initialization and input corruption, so a training run is fully
//! reproducible from its seed.

/// Simple xorshift RNG, passed around by `&mut` rather than held globally.
#[derive(Debug, Clone)]
pub struct SimpleRng {
    state: u64,
}

impl SimpleRng {
    /// Create a new RNG with explicit seed (if zero, use a fixed value).
    pub fn new(seed: u64) -> Self {
        let state = if seed == 0 { 0x9e3779b97f4a7c15 } else { seed };
        Self { state }
    }

    /// Basic xorshift to generate u32.
    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        (x >> 32) as u32
    }

    /// Convert to [0, 1).
    pub fn next_f32(&mut self) -> f32 {
        // 24 bits keep the result strictly below 1.0 after rounding to f32.
        (self.next_u32() >> 8) as f32 / (1u32 << 24) as f32
    }

    /// Uniform sample in [low, high).
    pub fn gen_range_f32(&mut self, low: f32, high: f32) -> f32 {
        low + (high - low) * self.next_f32()
    }

    /// Bernoulli trial: `true` with probability `p`.
    ///
    /// `p >= 1.0` always succeeds and `p <= 0.0` never does, without
    /// depending on the edge values of `next_f32`.
    pub fn gen_bernoulli(&mut self, p: f32) -> bool {
        if p >= 1.0 {
            // Still consume a draw so mask streams stay aligned across keep rates.
            self.next_u32();
            return true;
        }
        self.next_f32() < p
    }
}
