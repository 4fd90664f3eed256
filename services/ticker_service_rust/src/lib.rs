//! BlockClock ticker service: configuration, rotation loop and e-mail alerts

pub mod config;
pub mod email_client;
pub mod formatters;
pub mod scheduler;

pub use config::{SmtpSettings, TickerConfig};
pub use email_client::EmailClient;
pub use scheduler::{TickerScheduler, TickerStats, TickerStatsSnapshot, UpdateSettings};
