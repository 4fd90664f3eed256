// Shared models for the BlockClock ticker
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ============================================================================
// Token configuration
// ============================================================================

/// Which price feed a token is polled from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedKind {
    #[default]
    Coingecko,
}

/// Per-token display and alert settings, loaded once at startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenConfig {
    #[serde(rename = "type", default)]
    pub feed: FeedKind,
    pub symbol: String,
    /// Text shown under the symbol on the device label (e.g. "USD")
    #[serde(default)]
    pub display_currency: String,
    /// Contract address, or the feed's native asset id (e.g. "ethereum")
    pub contract_address: String,
    /// Quote currency requested from the feed (e.g. "usd")
    #[serde(rename = "currency")]
    pub quote_currency: String,
    #[serde(rename = "light_price_above", default)]
    pub price_above: f64,
    #[serde(rename = "light_price_below", default)]
    pub price_below: f64,
    #[serde(rename = "light_percent", default)]
    pub percent_change: f64,
    #[serde(rename = "notify", default)]
    pub notify_enabled: bool,
    #[serde(rename = "show_duration_seconds")]
    pub dwell_seconds: u64,
}

impl TokenConfig {
    /// Feed ids are matched case-sensitively, so lower-case them once up front
    pub fn normalized(mut self) -> Self {
        self.contract_address = self.contract_address.trim().to_lowercase();
        self.quote_currency = self.quote_currency.trim().to_lowercase();
        self
    }

    pub fn dwell(&self) -> Duration {
        Duration::from_secs(self.dwell_seconds)
    }
}

// ============================================================================
// Readings & decisions
// ============================================================================

/// One poll's market snapshot for a token. Never retained across cycles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceReading {
    pub price: f64,
    pub market_cap: f64,
    pub volume: f64,
    pub percent_change_24h: f64,
    pub last_updated_epoch: i64,
}

impl PriceReading {
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        if self.last_updated_epoch <= 0 {
            return None;
        }
        Utc.timestamp_opt(self.last_updated_epoch, 0).single()
    }
}

/// Alert light shown on the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightState {
    Off,
    Above,
    Below,
}

impl LightState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Above => "above",
            Self::Below => "below",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertDecision {
    pub light_state: LightState,
    pub notify: bool,
}

impl AlertDecision {
    pub const fn off() -> Self {
        Self {
            light_state: LightState::Off,
            notify: false,
        }
    }
}
