use anyhow::{anyhow, bail, Context, Result};
use blockclock_rust_core::clients::LightColors;
use blockclock_rust_core::TokenConfig;
use serde::Deserialize;
use std::env;
use std::fs;
use std::time::Duration;

use crate::scheduler::UpdateSettings;

pub const DEFAULT_CONFIG_PATH: &str = "config.json";

#[derive(Debug, Clone)]
pub struct TickerConfig {
    pub tokens: Vec<TokenConfig>,
    pub sort_symbols: bool,

    pub device_address: String,
    pub device_password: Option<String>,
    pub light_colors: LightColors,

    pub display: UpdateSettings,
    pub http_timeout: Duration,

    pub coingecko_base_url: String,
    pub token_platform: String,

    /// `None` unless every SMTP setting and the recipient are present
    pub smtp: Option<SmtpSettings>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpSettings {
    pub server: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub notify_address: String,
}

/// On-disk layout of `config.json`
#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    sort_symbols: bool,
    #[serde(default)]
    block_clock_address: String,
    #[serde(default)]
    block_clock_password: String,
    #[serde(default)]
    smtp_server: String,
    #[serde(default)]
    smtp_port: String,
    #[serde(default)]
    smtp_user: String,
    #[serde(default)]
    smtp_pass: String,
    #[serde(default)]
    notify_address: String,
    #[serde(default)]
    tokens: Vec<TokenConfig>,

    #[serde(default = "default_label_position")]
    label_position: u8,
    #[serde(default = "default_label_delay_ms")]
    label_delay_ms: u64,
    #[serde(default)]
    show_currency_symbol: bool,
    #[serde(default = "default_http_timeout_secs")]
    http_timeout_secs: u64,
    #[serde(default = "default_coingecko_base_url")]
    coingecko_base_url: String,
    #[serde(default = "default_token_platform")]
    token_platform: String,
    #[serde(default)]
    light_color_above: Option<String>,
    #[serde(default)]
    light_color_below: Option<String>,
}

fn default_label_position() -> u8 {
    6
}

fn default_label_delay_ms() -> u64 {
    1000
}

fn default_http_timeout_secs() -> u64 {
    10
}

fn default_coingecko_base_url() -> String {
    blockclock_rust_core::clients::coingecko::DEFAULT_BASE_URL.to_string()
}

fn default_token_platform() -> String {
    blockclock_rust_core::clients::coingecko::DEFAULT_PLATFORM.to_string()
}

impl ConfigFile {
    fn apply_env_overrides(&mut self) {
        if let Ok(address) = env::var("BLOCKCLOCK_ADDRESS") {
            self.block_clock_address = address;
        }
        if let Ok(password) = env::var("BLOCKCLOCK_PASSWORD") {
            self.block_clock_password = password;
        }
        if let Ok(pass) = env::var("SMTP_PASS") {
            self.smtp_pass = pass;
        }
        self.sort_symbols = parse_bool_env("TICKER_SORT_SYMBOLS", self.sort_symbols);
    }
}

impl TickerConfig {
    /// Read `$TICKER_CONFIG_PATH` (default `config.json`) and apply env overrides
    pub fn load() -> Result<Self> {
        let path = env::var("TICKER_CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {path}"))?;

        let mut file: ConfigFile =
            serde_json::from_str(&raw).with_context(|| format!("Failed to parse {path}"))?;
        file.apply_env_overrides();

        Self::from_file(file)
    }

    /// Parse a config document without consulting the environment
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let file: ConfigFile = serde_json::from_str(raw).context("Failed to parse config")?;
        Self::from_file(file)
    }

    fn from_file(file: ConfigFile) -> Result<Self> {
        let device_address = file.block_clock_address.trim().to_string();
        if device_address.is_empty() {
            bail!("block_clock_address must be set (e.g. http://192.168.1.20)");
        }

        if file.tokens.is_empty() {
            bail!("tokens must contain at least one entry");
        }
        let tokens = file
            .tokens
            .into_iter()
            .map(TokenConfig::normalized)
            .collect::<Vec<_>>();
        for (idx, token) in tokens.iter().enumerate() {
            validate_token(token).with_context(|| format!("Invalid token #{idx}"))?;
        }

        if file.http_timeout_secs == 0 {
            bail!("http_timeout_secs must be > 0");
        }

        let smtp = smtp_settings(
            &file.smtp_server,
            &file.smtp_port,
            &file.smtp_user,
            &file.smtp_pass,
            &file.notify_address,
        )?;

        let defaults = LightColors::default();
        let light_colors = LightColors {
            above: file.light_color_above.unwrap_or(defaults.above),
            below: file.light_color_below.unwrap_or(defaults.below),
        };

        let password = file.block_clock_password;

        Ok(Self {
            tokens,
            sort_symbols: file.sort_symbols,
            device_address,
            device_password: (!password.is_empty()).then_some(password),
            light_colors,
            display: UpdateSettings {
                label_position: file.label_position,
                label_delay: Duration::from_millis(file.label_delay_ms),
                show_currency_symbol: file.show_currency_symbol,
            },
            http_timeout: Duration::from_secs(file.http_timeout_secs),
            coingecko_base_url: file.coingecko_base_url,
            token_platform: file.token_platform,
            smtp,
        })
    }
}

fn validate_token(token: &TokenConfig) -> Result<()> {
    if token.symbol.trim().is_empty() {
        bail!("symbol must be set");
    }
    if token.contract_address.is_empty() {
        bail!("{}: contract_address must be set", token.symbol);
    }
    if token.quote_currency.is_empty() {
        bail!("{}: currency must be set", token.symbol);
    }
    if token.dwell_seconds == 0 {
        bail!("{}: show_duration_seconds must be > 0", token.symbol);
    }
    Ok(())
}

/// E-mail alerts need every setting; anything missing disables them
fn smtp_settings(
    server: &str,
    port: &str,
    user: &str,
    password: &str,
    notify_address: &str,
) -> Result<Option<SmtpSettings>> {
    let fields = [server, port, user, password, notify_address];
    if fields.iter().any(|f| f.trim().is_empty()) {
        return Ok(None);
    }

    let port = port
        .trim()
        .parse::<u16>()
        .map_err(|_| anyhow!("Invalid smtp_port: {port} (expected integer)"))?;

    Ok(Some(SmtpSettings {
        server: server.trim().to_string(),
        port,
        user: user.trim().to_string(),
        password: password.to_string(),
        notify_address: notify_address.trim().to_string(),
    }))
}

fn parse_bool_env(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "y" | "on"))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "sort_symbols": true,
        "block_clock_address": "http://192.168.1.20",
        "block_clock_password": "",
        "smtp_server": "smtp.example.com",
        "smtp_port": "587",
        "smtp_user": "ticker@example.com",
        "smtp_pass": "secret",
        "notify_address": "me@example.com",
        "tokens": [
            {
                "type": "coingecko",
                "currency": "USD",
                "symbol": "ETH",
                "display_currency": "USD",
                "contract_address": "ethereum",
                "light_price_above": 4000,
                "light_price_below": 2000,
                "show_duration_seconds": 30,
                "notify": true
            },
            {
                "type": "coingecko",
                "currency": "usd",
                "symbol": "UNI",
                "display_currency": "USD",
                "contract_address": "0x1F9840A85d5aF5bf1D1762F925BDADdC4201F984",
                "light_percent": 5,
                "show_duration_seconds": 15
            }
        ]
    }"#;

    #[test]
    fn test_parse_sample() {
        let cfg = TickerConfig::from_json_str(SAMPLE).unwrap();

        assert!(cfg.sort_symbols);
        assert_eq!(cfg.device_address, "http://192.168.1.20");
        assert_eq!(cfg.device_password, None);
        assert_eq!(cfg.tokens.len(), 2);
        assert_eq!(cfg.tokens[0].quote_currency, "usd");
        assert_eq!(
            cfg.tokens[1].contract_address,
            "0x1f9840a85d5af5bf1d1762f925bdaddc4201f984"
        );

        assert_eq!(cfg.display.label_position, 6);
        assert_eq!(cfg.display.label_delay, Duration::from_secs(1));
        assert!(!cfg.display.show_currency_symbol);
        assert_eq!(cfg.http_timeout, Duration::from_secs(10));
        assert_eq!(cfg.token_platform, "ethereum");
        assert_eq!(cfg.light_colors, LightColors::default());

        let smtp = cfg.smtp.unwrap();
        assert_eq!(smtp.port, 587);
        assert_eq!(smtp.notify_address, "me@example.com");
    }

    #[test]
    fn test_smtp_disabled_when_incomplete() {
        let cfg = TickerConfig::from_json_str(&SAMPLE.replace("\"secret\"", "\"\"")).unwrap();
        assert!(cfg.smtp.is_none());

        assert!(smtp_settings("smtp.example.com", "587", "u", "p", "").unwrap().is_none());
        assert!(smtp_settings("", "587", "u", "p", "to@x.com").unwrap().is_none());
    }

    #[test]
    fn test_bad_smtp_port() {
        let err = smtp_settings("smtp.example.com", "abc", "u", "p", "to@x.com").unwrap_err();
        assert!(err.to_string().contains("smtp_port"));
    }

    #[test]
    fn test_requires_device_address() {
        let raw = SAMPLE.replace("http://192.168.1.20", "");
        assert!(TickerConfig::from_json_str(&raw).is_err());
    }

    #[test]
    fn test_requires_tokens() {
        let raw = r#"{"block_clock_address": "http://clock.local", "tokens": []}"#;
        let err = TickerConfig::from_json_str(raw).unwrap_err();
        assert!(err.to_string().contains("at least one"));
    }

    #[test]
    fn test_rejects_zero_dwell() {
        let raw = SAMPLE.replace("\"show_duration_seconds\": 15", "\"show_duration_seconds\": 0");
        assert!(TickerConfig::from_json_str(&raw).is_err());
    }

    #[test]
    fn test_negative_percent_is_accepted() {
        // a negative light_percent only arms the downside check
        let raw = SAMPLE.replace("\"light_percent\": 5", "\"light_percent\": -5");
        let cfg = TickerConfig::from_json_str(&raw).unwrap();
        assert_eq!(cfg.tokens[1].percent_change, -5.0);
    }

    #[test]
    fn test_optional_overrides() {
        let raw = r#"{
            "block_clock_address": "http://clock.local",
            "block_clock_password": "hunter2",
            "label_position": 3,
            "label_delay_ms": 0,
            "show_currency_symbol": true,
            "light_color_above": "0000ff40",
            "tokens": [{
                "currency": "eur",
                "symbol": "BTC",
                "contract_address": "bitcoin",
                "show_duration_seconds": 60
            }]
        }"#;
        let cfg = TickerConfig::from_json_str(raw).unwrap();

        assert_eq!(cfg.device_password.as_deref(), Some("hunter2"));
        assert_eq!(cfg.display.label_position, 3);
        assert!(cfg.display.label_delay.is_zero());
        assert!(cfg.display.show_currency_symbol);
        assert_eq!(cfg.light_colors.above, "0000ff40");
        assert_eq!(cfg.light_colors.below, "ff000040");
        assert!(!cfg.sort_symbols);
        assert!(cfg.smtp.is_none());
    }

    #[test]
    fn test_parse_bool_env_default() {
        assert!(parse_bool_env("NON_EXISTENT_TICKER_VAR_XYZ", true));
        assert!(!parse_bool_env("NON_EXISTENT_TICKER_VAR_XYZ", false));
    }
}
