//! Pricing abstractions and core types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Where a ticker's price came from on a given tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceSource {
    Oracle,
    Simulated,
}

/// One tick of a symbol, delivered to every subscriber of that symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceUpdate {
    pub symbol: String,
    pub price: f64,
    /// Starts at 1 for the first tick of a subscription entry.
    pub sequence: u64,
    pub source: PriceSource,
}

/// Best-effort external price lookup.
///
/// Implementations never fail: every error collapses to `None`, which tells
/// the ticker to simulate instead.
#[async_trait]
pub trait PriceOracle: Send + Sync {
    async fn fetch(&self, symbol: &str) -> Option<f64>;
}
