//! Live price tickers

pub mod registry;
pub mod simulator;

pub use registry::{PriceFeed, SubscriptionHandle, UpdateCallback};
