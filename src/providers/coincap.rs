use crate::core::PriceOracle;
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

/// Tickers the oracle knows, mapped to CoinCap asset ids.
const ASSET_IDS: &[(&str, &str)] = &[
    ("BTC", "bitcoin"),
    ("ETH", "ethereum"),
    ("SOL", "solana"),
    ("DOGE", "dogecoin"),
    ("ADA", "cardano"),
    ("XRP", "xrp"),
    ("LTC", "litecoin"),
    ("DOT", "polkadot"),
];

pub fn asset_id(symbol: &str) -> Option<&'static str> {
    ASSET_IDS
        .iter()
        .find(|(ticker, _)| ticker.eq_ignore_ascii_case(symbol))
        .map(|(_, id)| *id)
}

// CoinCapOracle implementation for PriceOracle
pub struct CoinCapOracle {
    base_url: String,
    client: reqwest::Client,
}

impl CoinCapOracle {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("livefeed/0.1")
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client for CoinCap")?;
        Ok(CoinCapOracle {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    async fn fetch_quote(&self, asset_id: &str) -> Result<f64> {
        let url = format!("{}/v2/assets/{}", self.base_url, asset_id);
        debug!("Requesting price data from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for asset: {}", e, asset_id))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for asset: {}",
                response.status(),
                asset_id
            ));
        }

        let text = response.text().await?;
        let data: CoinCapAssetResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response for {}: {}", asset_id, e))?;

        let price = data
            .data
            .price_usd
            .ok_or_else(|| anyhow!("No price found for asset: {}", asset_id))?
            .to_f64()
            .ok_or_else(|| anyhow!("Unparseable price for asset: {}", asset_id))?;

        if !price.is_finite() || price <= 0.0 {
            return Err(anyhow!("Invalid price {} for asset: {}", price, asset_id));
        }
        Ok(price)
    }
}

#[derive(Debug, Deserialize)]
struct CoinCapAssetResponse {
    data: CoinCapAsset,
}

#[derive(Debug, Deserialize)]
struct CoinCapAsset {
    #[serde(alias = "priceUsd")]
    price_usd: Option<PriceField>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PriceField {
    Number(f64),
    Text(String),
}

impl PriceField {
    fn to_f64(&self) -> Option<f64> {
        match self {
            PriceField::Number(value) => Some(*value),
            PriceField::Text(text) => text.trim().parse().ok(),
        }
    }
}

#[async_trait]
impl PriceOracle for CoinCapOracle {
    #[instrument(name = "CoinCapPriceFetch", skip(self), fields(symbol = %symbol))]
    async fn fetch(&self, symbol: &str) -> Option<f64> {
        let Some(asset_id) = asset_id(symbol) else {
            debug!("Symbol not covered by CoinCap, skipping request");
            return None;
        };

        match self.fetch_quote(asset_id).await {
            Ok(price) => Some(price),
            Err(e) => {
                debug!(error = %e, "CoinCap lookup failed");
                None
            }
        }
    }
}

/// Oracle used when no upstream is configured or the feed runs offline.
pub struct OfflineOracle;

#[async_trait]
impl PriceOracle for OfflineOracle {
    async fn fetch(&self, _symbol: &str) -> Option<f64> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn create_mock_server(asset_id: &str, response: ResponseTemplate) -> MockServer {
        let mock_server = MockServer::start().await;
        let request_path = format!("/v2/assets/{asset_id}");

        Mock::given(method("GET"))
            .and(path(request_path))
            .respond_with(response)
            .mount(&mock_server)
            .await;

        mock_server
    }

    fn oracle_for(server: &MockServer) -> CoinCapOracle {
        CoinCapOracle::new(&server.uri(), Duration::from_secs(2)).unwrap()
    }

    #[test]
    fn test_asset_id_whitelist() {
        assert_eq!(asset_id("BTC"), Some("bitcoin"));
        assert_eq!(asset_id("eth"), Some("ethereum"));
        assert_eq!(asset_id("AAPL"), None);
    }

    #[tokio::test]
    async fn test_successful_price_fetch_from_string_field() {
        let body = r#"{"data": {"id": "bitcoin", "priceUsd": "61234.56"}, "timestamp": 1}"#;
        let mock_server =
            create_mock_server("bitcoin", ResponseTemplate::new(200).set_body_string(body)).await;

        let price = oracle_for(&mock_server).fetch("BTC").await;
        assert_eq!(price, Some(61234.56));
    }

    #[tokio::test]
    async fn test_successful_price_fetch_from_number_field() {
        let body = r#"{"data": {"priceUsd": 3120.5}}"#;
        let mock_server =
            create_mock_server("ethereum", ResponseTemplate::new(200).set_body_string(body)).await;

        let price = oracle_for(&mock_server).fetch("ETH").await;
        assert_eq!(price, Some(3120.5));
    }

    #[tokio::test]
    async fn test_server_error_yields_none() {
        let mock_server = create_mock_server("bitcoin", ResponseTemplate::new(500)).await;

        assert_eq!(oracle_for(&mock_server).fetch("BTC").await, None);
    }

    #[tokio::test]
    async fn test_malformed_payloads_yield_none() {
        for body in [
            r#"{"data": {"priceUsd": "not-a-number"}}"#,
            r#"{"data": {"name": "Bitcoin"}}"#,
            r#"{"results": []}"#,
            r#"{"data": {"priceUsd": "-4.0"}}"#,
            "",
        ] {
            let mock_server =
                create_mock_server("bitcoin", ResponseTemplate::new(200).set_body_string(body))
                    .await;
            assert_eq!(
                oracle_for(&mock_server).fetch("BTC").await,
                None,
                "body {body:?} should not produce a price"
            );
        }
    }

    #[tokio::test]
    async fn test_unmapped_symbol_makes_no_request() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        assert_eq!(oracle_for(&mock_server).fetch("AAPL").await, None);
    }

    #[tokio::test]
    async fn test_slow_upstream_is_time_boxed() {
        let body = r#"{"data": {"priceUsd": "1.0"}}"#;
        let mock_server = create_mock_server(
            "solana",
            ResponseTemplate::new(200)
                .set_body_string(body)
                .set_delay(Duration::from_millis(500)),
        )
        .await;
        let oracle = CoinCapOracle::new(&mock_server.uri(), Duration::from_millis(50)).unwrap();

        assert_eq!(oracle.fetch("SOL").await, None);
    }

    #[tokio::test]
    async fn test_offline_oracle_never_prices() {
        assert_eq!(OfflineOracle.fetch("BTC").await, None);
    }
}
