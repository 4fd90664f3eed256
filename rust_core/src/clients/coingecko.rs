//! CoinGecko API Client
//!
//! Polls the `/simple` endpoints for the ticker: spot price, market cap,
//! 24h volume, 24h change and the feed's last-update timestamp.

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::{Client, Request};
use std::collections::HashMap;
use std::time::Duration;

use super::price_source::PriceSource;
use crate::error::FetchError;
use crate::models::PriceReading;

pub const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3";
pub const DEFAULT_PLATFORM: &str = "ethereum";

/// Connection settings for [`CoinGeckoClient`]
#[derive(Debug, Clone)]
pub struct CoinGeckoConfig {
    pub base_url: String,
    /// Asset platform contract addresses are resolved on
    pub platform: String,
    pub timeout: Duration,
}

impl Default for CoinGeckoConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            platform: DEFAULT_PLATFORM.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// CoinGecko `/simple` price client
pub struct CoinGeckoClient {
    client: Client,
    config: CoinGeckoConfig,
}

/// `{ "<asset>": { "usd": 1.0, "usd_market_cap": .., "last_updated_at": .. } }`
type SimplePriceResponse = HashMap<String, HashMap<String, Option<f64>>>;

impl CoinGeckoClient {
    pub fn new(config: CoinGeckoConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent("BlockClockTicker/1.0")
            .build()
            .context("Failed to create CoinGecko HTTP client")?;

        Ok(Self { client, config })
    }

    /// Contract addresses go through `/simple/token_price`, anything else is a coin id
    fn is_contract(asset: &str) -> bool {
        asset.starts_with("0x")
    }

    fn build_request(&self, asset: &str, quote_currency: &str) -> Result<Request, FetchError> {
        let base = self.config.base_url.trim_end_matches('/');
        let flags = [
            ("vs_currencies", quote_currency),
            ("include_market_cap", "true"),
            ("include_24hr_vol", "true"),
            ("include_24hr_change", "true"),
            ("include_last_updated_at", "true"),
        ];

        let request = if Self::is_contract(asset) {
            let url = format!("{}/simple/token_price/{}", base, self.config.platform);
            self.client
                .get(url)
                .query(&[("contract_addresses", asset)])
                .query(&flags)
        } else {
            let url = format!("{}/simple/price", base);
            self.client.get(url).query(&[("ids", asset)]).query(&flags)
        };

        Ok(request.build()?)
    }
}

#[async_trait]
impl PriceSource for CoinGeckoClient {
    fn provider_name(&self) -> &str {
        "CoinGecko"
    }

    async fn fetch(&self, asset: &str, quote_currency: &str) -> Result<PriceReading, FetchError> {
        let request = self.build_request(asset, quote_currency)?;
        debug!("Fetching {} price from CoinGecko: {}", asset, request.url());

        let response = self.client.execute(request).await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        parse_simple_price(&body, asset, quote_currency)
    }
}

/// Pull one asset's reading out of a `/simple` response body
fn parse_simple_price(body: &str, asset: &str, quote_currency: &str) -> Result<PriceReading, FetchError> {
    let parsed: SimplePriceResponse =
        serde_json::from_str(body).map_err(|e| FetchError::Malformed(e.to_string()))?;

    let fields = parsed
        .get(asset)
        .ok_or_else(|| FetchError::Malformed(format!("no entry for {}", asset)))?;
    let field = |key: &str| fields.get(key).copied().flatten();

    let price = field(quote_currency).ok_or_else(|| {
        FetchError::Malformed(format!("no {} price for {}", quote_currency, asset))
    })?;

    Ok(PriceReading {
        price,
        market_cap: field(&format!("{}_market_cap", quote_currency)).unwrap_or(0.0),
        volume: field(&format!("{}_24h_vol", quote_currency)).unwrap_or(0.0),
        percent_change_24h: field(&format!("{}_24h_change", quote_currency)).unwrap_or(0.0),
        last_updated_epoch: field("last_updated_at").map(|ts| ts as i64).unwrap_or(0),
    })
}
