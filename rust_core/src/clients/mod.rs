pub mod blockclock;
pub mod coingecko;
pub mod price_source;

// Re-export commonly used types
pub use blockclock::{BlockClockClient, BlockClockConfig, DeviceDriver, LightColors};
pub use coingecko::{CoinGeckoClient, CoinGeckoConfig};
pub use price_source::PriceSource;
