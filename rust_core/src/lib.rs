//! BlockClock Core - price-to-display decision engine.
//!
//! This crate provides:
//! - Token configuration and per-poll price readings
//! - Threshold evaluation for the alert lights (above / below / off)
//! - Fixed-width price formatting for the device's digit display
//! - Capability traits for the price feed, the display and alert delivery
//! - CoinGecko and BlockClock HTTP clients implementing those traits

pub mod alerts;
pub mod clients;
pub mod error;
pub mod models;
pub mod utils;

pub use alerts::{decide, trigger, Notifier, Trigger};
pub use clients::{DeviceDriver, PriceSource};
pub use error::{DeviceError, FetchError, NotifyError};
pub use models::{AlertDecision, FeedKind, LightState, PriceReading, TokenConfig};
pub use utils::display::format_price;

/// Crate version, logged at service startup
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
