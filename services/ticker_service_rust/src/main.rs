use anyhow::{Context, Result};
use blockclock_rust_core::clients::{
    BlockClockClient, BlockClockConfig, CoinGeckoClient, CoinGeckoConfig,
};
use dotenv::dotenv;
use env_logger::Env;
use log::{error, info, warn};
use std::sync::Arc;
use ticker_service_rust::{EmailClient, TickerConfig, TickerScheduler};
use tokio::sync::watch;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init_from_env(Env::new().default_filter_or("info"));

    info!(
        "Starting BlockClock ticker v{}...",
        blockclock_rust_core::VERSION
    );

    let cfg = TickerConfig::load()?;
    info!(
        "Config: device={} tokens={} sort_symbols={} alerts={}",
        cfg.device_address,
        cfg.tokens.len(),
        cfg.sort_symbols,
        if cfg.smtp.is_some() { "email" } else { "disabled" },
    );

    let source = CoinGeckoClient::new(CoinGeckoConfig {
        base_url: cfg.coingecko_base_url.clone(),
        platform: cfg.token_platform.clone(),
        timeout: cfg.http_timeout,
    })?;

    let device = BlockClockClient::new(BlockClockConfig {
        base_url: cfg.device_address.clone(),
        password: cfg.device_password.clone(),
        colors: cfg.light_colors.clone(),
        timeout: cfg.http_timeout,
    })?;

    let mut scheduler = TickerScheduler::new(
        cfg.tokens.clone(),
        cfg.sort_symbols,
        Arc::new(source),
        Arc::new(device),
    )
    .with_settings(cfg.display.clone());

    match &cfg.smtp {
        Some(smtp) => {
            let email = EmailClient::new(smtp, cfg.http_timeout)
                .context("Failed to set up e-mail alerts")?;
            scheduler = scheduler.with_notifier(Arc::new(email), smtp.notify_address.clone());
            info!("E-mail alerts to {} via {}:{}", smtp.notify_address, smtp.server, smtp.port);
        }
        None => warn!("SMTP settings incomplete, alerts will only be logged"),
    }

    let order: Vec<&str> = scheduler.tokens().iter().map(|t| t.symbol.as_str()).collect();
    info!("Rotation order: {}", order.join(", "));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        info!("Received shutdown signal");
        let _ = shutdown_tx.send(true);
    });

    let stats = scheduler.run(shutdown_rx).await?;
    info!(
        "Exiting: rotations={} fetches={} fetch_failures={} alerts_sent={}",
        stats.rotations, stats.fetches, stats.fetch_failures, stats.alerts_sent
    );

    Ok(())
}

/// Resolves on SIGINT, or SIGTERM on unix. Never resolves if no listener can be installed.
async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("Unable to listen for shutdown signal: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!("Unable to listen for SIGTERM: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
