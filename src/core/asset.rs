//! Instrument classes and the per-class behaviour of the feed

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    #[serde(alias = "stock")]
    Equity,
    Crypto,
    #[serde(alias = "etf")]
    Fund,
    #[serde(alias = "nft")]
    DigitalCollectible,
}

impl AssetClass {
    /// Only crypto instruments are looked up with the price oracle.
    pub fn uses_oracle(&self) -> bool {
        matches!(self, AssetClass::Crypto)
    }
}

impl Display for AssetClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                AssetClass::Equity => "equity",
                AssetClass::Crypto => "crypto",
                AssetClass::Fund => "fund",
                AssetClass::DigitalCollectible => "digital_collectible",
            }
        )
    }
}

impl FromStr for AssetClass {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "equity" | "stock" => Ok(AssetClass::Equity),
            "crypto" => Ok(AssetClass::Crypto),
            "fund" | "etf" => Ok(AssetClass::Fund),
            "digital_collectible" | "nft" => Ok(AssetClass::DigitalCollectible),
            _ => Err(anyhow::anyhow!("Invalid asset class: {}", s)),
        }
    }
}
