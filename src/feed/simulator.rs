//! Multiplicative random-walk stepper used whenever the oracle has no price.

use crate::core::RandomSource;

/// Moves `price` by a symmetric relative shock drawn from
/// `[-volatility, +volatility]`. No drift.
pub fn step(price: f64, volatility: f64, rng: &mut dyn RandomSource) -> f64 {
    let shock = rng.uniform(-volatility, volatility);
    price * (1.0 + shock)
}
