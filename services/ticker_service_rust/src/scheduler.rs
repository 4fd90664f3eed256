//! Token rotation for the BlockClock display
//!
//! One sequential loop walks the token list forever:
//! - fetch the token's price (never two fetches at once)
//! - evaluate the alert thresholds
//! - hand the display update to a detached task and move on
//! - dwell on the token, waking early only for shutdown
//!
//! Updates for consecutive tokens may overlap on the device. Whichever
//! command lands last is what the screen shows.

use anyhow::{bail, Result};
use blockclock_rust_core::{
    decide, format_price, AlertDecision, DeviceDriver, DeviceError, LightState, Notifier,
    PriceReading, PriceSource, TokenConfig,
};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinSet;

use crate::formatters;

/// Display tuning shared by every token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateSettings {
    /// Screen position of the two-line symbol/currency label
    pub label_position: u8,
    /// Pause between the price text and the label so the device can settle
    pub label_delay: Duration,
    pub show_currency_symbol: bool,
}

impl Default for UpdateSettings {
    fn default() -> Self {
        Self {
            label_position: 6,
            label_delay: Duration::from_secs(1),
            show_currency_symbol: false,
        }
    }
}

/// Where alerts go, when alerts are configured at all
#[derive(Clone)]
pub struct AlertChannel {
    pub notifier: Arc<dyn Notifier>,
    pub recipient: String,
}

/// Counters for the ticker
#[derive(Debug, Default)]
pub struct TickerStats {
    pub rotations: AtomicU64,
    pub fetches: AtomicU64,
    pub fetch_failures: AtomicU64,
    pub updates_dispatched: AtomicU64,
    pub device_errors: AtomicU64,
    pub alerts_sent: AtomicU64,
    pub notify_errors: AtomicU64,
}

impl TickerStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> TickerStatsSnapshot {
        TickerStatsSnapshot {
            rotations: self.rotations.load(Ordering::Relaxed),
            fetches: self.fetches.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            updates_dispatched: self.updates_dispatched.load(Ordering::Relaxed),
            device_errors: self.device_errors.load(Ordering::Relaxed),
            alerts_sent: self.alerts_sent.load(Ordering::Relaxed),
            notify_errors: self.notify_errors.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickerStatsSnapshot {
    pub rotations: u64,
    pub fetches: u64,
    pub fetch_failures: u64,
    pub updates_dispatched: u64,
    pub device_errors: u64,
    pub alerts_sent: u64,
    pub notify_errors: u64,
}

/// Pushes one evaluated reading to the device and, if asked, the notifier
#[derive(Clone)]
pub struct DisplayUpdater {
    device: Arc<dyn DeviceDriver>,
    alerts: Option<AlertChannel>,
    settings: UpdateSettings,
    stats: Arc<TickerStats>,
}

impl DisplayUpdater {
    /// Lights, then price text, then label, then the alert.
    ///
    /// A failed device command is logged and counted; the remaining commands
    /// still run.
    pub async fn apply(&self, token: &TokenConfig, reading: &PriceReading, decision: AlertDecision) {
        let text = format_price(reading.price);
        info!(
            "{} {} {} lights={}",
            token.symbol,
            text,
            token.display_currency,
            decision.light_state.as_str()
        );

        let result = self.device.show_lights(decision.light_state).await;
        self.check_device(&token.symbol, "lights", result);

        let result = self
            .device
            .show_text(&text, self.settings.show_currency_symbol)
            .await;
        self.check_device(&token.symbol, "text", result);

        if !self.settings.label_delay.is_zero() {
            tokio::time::sleep(self.settings.label_delay).await;
        }

        let result = self
            .device
            .show_label(
                self.settings.label_position,
                &token.symbol,
                &token.display_currency,
            )
            .await;
        self.check_device(&token.symbol, "label", result);

        if decision.notify {
            self.send_alert(token, reading, decision.light_state).await;
        }
    }

    fn check_device(&self, symbol: &str, command: &str, result: Result<(), DeviceError>) {
        if let Err(e) = result {
            self.stats.device_errors.fetch_add(1, Ordering::Relaxed);
            warn!("BlockClock {} failed for {}: {}", command, symbol, e);
        }
    }

    async fn send_alert(&self, token: &TokenConfig, reading: &PriceReading, state: LightState) {
        let Some(channel) = &self.alerts else {
            debug!("Alert for {} skipped: e-mail not configured", token.symbol);
            return;
        };

        let subject = formatters::alert_subject(token);
        let body = formatters::alert_body(token, reading);

        match channel
            .notifier
            .send(&body, &subject, &channel.recipient)
            .await
        {
            Ok(()) => {
                self.stats.alerts_sent.fetch_add(1, Ordering::Relaxed);
                info!(
                    "Alert sent for {} ({}) to {}",
                    token.symbol,
                    state.as_str(),
                    channel.recipient
                );
            }
            Err(e) => {
                self.stats.notify_errors.fetch_add(1, Ordering::Relaxed);
                warn!("Alert for {} failed: {}", token.symbol, e);
            }
        }
    }
}

pub struct TickerScheduler {
    tokens: Vec<TokenConfig>,
    source: Arc<dyn PriceSource>,
    updater: DisplayUpdater,
    stats: Arc<TickerStats>,
}

impl TickerScheduler {
    pub fn new(
        mut tokens: Vec<TokenConfig>,
        sort_by_symbol: bool,
        source: Arc<dyn PriceSource>,
        device: Arc<dyn DeviceDriver>,
    ) -> Self {
        if sort_by_symbol {
            // sort_by_key is stable, so equal symbols keep their configured order
            tokens.sort_by_key(|t| t.symbol.to_lowercase());
        }

        let stats = Arc::new(TickerStats::new());
        Self {
            tokens,
            source,
            updater: DisplayUpdater {
                device,
                alerts: None,
                settings: UpdateSettings::default(),
                stats: stats.clone(),
            },
            stats,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>, recipient: impl Into<String>) -> Self {
        self.updater.alerts = Some(AlertChannel {
            notifier,
            recipient: recipient.into(),
        });
        self
    }

    pub fn with_settings(mut self, settings: UpdateSettings) -> Self {
        self.updater.settings = settings;
        self
    }

    /// Tokens in rotation order
    pub fn tokens(&self) -> &[TokenConfig] {
        &self.tokens
    }

    pub fn stats(&self) -> Arc<TickerStats> {
        self.stats.clone()
    }

    /// Rotate through the tokens until `shutdown` flips to `true`.
    ///
    /// The device is paused once before the first fetch and resumed exactly
    /// once on the way out, after any in-flight updates are aborted.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<TickerStatsSnapshot> {
        if self.tokens.is_empty() {
            bail!("No tokens configured");
        }

        info!(
            "Ticker starting: {} tokens via {}",
            self.tokens.len(),
            self.source.provider_name()
        );

        if let Err(e) = self.updater.device.pause().await {
            self.stats.device_errors.fetch_add(1, Ordering::Relaxed);
            warn!("BlockClock pause failed: {}", e);
        }

        let mut updates: JoinSet<()> = JoinSet::new();

        'rotation: loop {
            for token in &self.tokens {
                if *shutdown.borrow() {
                    break 'rotation;
                }

                reap_finished(&mut updates);
                self.poll(token, &mut updates).await;

                if dwell(token.dwell(), &mut shutdown).await {
                    break 'rotation;
                }
            }

            let rotations = self.stats.rotations.fetch_add(1, Ordering::Relaxed) + 1;
            info!("Rotation {} complete: {:?}", rotations, self.stats.snapshot());
        }

        info!("Shutdown requested, stopping ticker");

        // The device must not receive late commands after it is handed back
        updates.shutdown().await;

        if let Err(e) = self.updater.device.resume().await {
            self.stats.device_errors.fetch_add(1, Ordering::Relaxed);
            warn!("BlockClock resume failed: {}", e);
        }

        let snapshot = self.stats.snapshot();
        info!("Ticker stopped: {:?}", snapshot);
        Ok(snapshot)
    }

    /// Fetch and evaluate one token. The display update runs detached.
    async fn poll(&self, token: &TokenConfig, updates: &mut JoinSet<()>) {
        self.stats.fetches.fetch_add(1, Ordering::Relaxed);

        let reading = match self
            .source
            .fetch(&token.contract_address, &token.quote_currency)
            .await
        {
            Ok(reading) => reading,
            Err(e) => {
                self.stats.fetch_failures.fetch_add(1, Ordering::Relaxed);
                warn!("Price fetch failed for {}: {}", token.symbol, e);
                return;
            }
        };

        let decision = decide(&reading, token);
        debug!(
            "{} price={} change={:.2}% -> {:?}",
            token.symbol, reading.price, reading.percent_change_24h, decision
        );

        self.stats.updates_dispatched.fetch_add(1, Ordering::Relaxed);
        let updater = self.updater.clone();
        let token = token.clone();
        updates.spawn(async move {
            updater.apply(&token, &reading, decision).await;
        });
    }
}

fn reap_finished(updates: &mut JoinSet<()>) {
    while let Some(result) = updates.try_join_next() {
        if let Err(e) = result {
            warn!("Display update task failed: {}", e);
        }
    }
}

/// Sleep for `period`; returns `true` if shutdown was requested meanwhile.
///
/// A dropped sender is not a shutdown request.
async fn dwell(period: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    let stop = async {
        let closed = shutdown.wait_for(|stopped| *stopped).await.is_err();
        if closed {
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        _ = tokio::time::sleep(period) => false,
        _ = stop => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = UpdateSettings::default();
        assert_eq!(settings.label_position, 6);
        assert_eq!(settings.label_delay, Duration::from_secs(1));
        assert!(!settings.show_currency_symbol);
    }

    #[test]
    fn test_stats_snapshot() {
        let stats = TickerStats::new();
        stats.fetches.fetch_add(3, Ordering::Relaxed);
        stats.fetch_failures.fetch_add(1, Ordering::Relaxed);

        let snap = stats.snapshot();
        assert_eq!(snap.fetches, 3);
        assert_eq!(snap.fetch_failures, 1);
        assert_eq!(snap.alerts_sent, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dwell_runs_full_period() {
        let (_tx, mut rx) = watch::channel(false);
        let start = tokio::time::Instant::now();

        assert!(!dwell(Duration::from_secs(30), &mut rx).await);
        assert!(start.elapsed() >= Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dwell_wakes_on_shutdown() {
        let (tx, mut rx) = watch::channel(false);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            let _ = tx.send(true);
        });

        let start = tokio::time::Instant::now();
        assert!(dwell(Duration::from_secs(30), &mut rx).await);
        assert!(start.elapsed() < Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dwell_ignores_dropped_sender() {
        let (tx, mut rx) = watch::channel(false);
        drop(tx);

        assert!(!dwell(Duration::from_secs(10), &mut rx).await);
    }
}
