pub mod coincap;

use crate::core::PriceOracle;
use crate::core::config::ProvidersConfig;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub use coincap::{CoinCapOracle, OfflineOracle};

/// Picks the oracle described by `providers`, or the offline one.
pub fn build_oracle(providers: &ProvidersConfig, offline: bool) -> Result<Arc<dyn PriceOracle>> {
    match (&providers.coincap, offline) {
        (Some(coincap), false) => {
            debug!(base_url = %coincap.base_url, "Using CoinCap oracle");
            let oracle =
                CoinCapOracle::new(&coincap.base_url, Duration::from_millis(coincap.timeout_ms))?;
            Ok(Arc::new(oracle))
        }
        _ => {
            debug!("Running without a price oracle");
            Ok(Arc::new(OfflineOracle))
        }
    }
}
