//! Price Source Trait
//!
//! Common interface for the feeds the ticker polls. The scheduler only ever
//! talks to a `dyn PriceSource`, so tests can swap in an in-memory feed.

use async_trait::async_trait;

use crate::error::FetchError;
use crate::models::PriceReading;

/// A market data feed that can produce a fresh [`PriceReading`]
///
/// Implementations must be Send + Sync for use in async contexts and are
/// expected to enforce their own request timeout.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Get the provider's display name (e.g., "CoinGecko")
    fn provider_name(&self) -> &str;

    /// Fetch the current reading for one asset
    ///
    /// # Arguments
    /// * `asset` - Contract address, or the feed's native asset id
    /// * `quote_currency` - Lower-case currency code (e.g. "usd")
    async fn fetch(&self, asset: &str, quote_currency: &str) -> Result<PriceReading, FetchError>;
}
