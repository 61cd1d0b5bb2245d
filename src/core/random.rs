//! Injectable randomness for the simulator and the path synthesizer.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

pub trait RandomSource: Send {
    /// Draws a value uniformly from `[low, high]`.
    fn uniform(&mut self, low: f64, high: f64) -> f64;
}

/// Builds a fresh random source, one per ticker task or chart session.
pub type RandomFactory = Arc<dyn Fn() -> Box<dyn RandomSource> + Send + Sync>;

/// Adapts any `rand` generator.
pub struct RngSource<R: Rng + Send>(R);

impl RngSource<StdRng> {
    pub fn from_entropy() -> Self {
        RngSource(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        RngSource(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng + Send> RandomSource for RngSource<R> {
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        if low.is_nan() || high.is_nan() || low >= high {
            return low;
        }
        self.0.gen_range(low..=high)
    }
}

/// Replays fixed unit fractions, mapped onto the requested range, in a cycle.
#[derive(Debug, Clone)]
pub struct SequenceSource {
    fractions: Vec<f64>,
    next: usize,
}

impl SequenceSource {
    pub fn new(fractions: Vec<f64>) -> Self {
        Self { fractions, next: 0 }
    }
}

impl RandomSource for SequenceSource {
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        if self.fractions.is_empty() {
            return low + (high - low) / 2.0;
        }
        let fraction = self.fractions[self.next % self.fractions.len()].clamp(0.0, 1.0);
        self.next += 1;
        low + fraction * (high - low)
    }
}

pub fn entropy_factory() -> RandomFactory {
    Arc::new(|| Box::new(RngSource::from_entropy()) as Box<dyn RandomSource>)
}

pub fn seeded_factory(seed: u64) -> RandomFactory {
    Arc::new(move || Box::new(RngSource::seeded(seed)) as Box<dyn RandomSource>)
}
