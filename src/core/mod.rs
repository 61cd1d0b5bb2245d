//! Core business logic abstractions

pub mod asset;
pub mod cache;
pub mod config;
pub mod log;
pub mod price;
pub mod random;

// Re-export main types for cleaner imports
pub use asset::AssetClass;
pub use price::{PriceOracle, PriceSource, PriceUpdate};
pub use random::{RandomFactory, RandomSource};
