//! BlockClock device client
//!
//! The device exposes a plain HTTP GET API on the local network. Every
//! command is one request; the path carries the arguments.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::{Client, Url};
use std::time::Duration;

use crate::error::DeviceError;
use crate::models::LightState;

/// Display commands the ticker issues
#[async_trait]
pub trait DeviceDriver: Send + Sync {
    /// Suspend the device's own rotation so the ticker owns the screen
    async fn pause(&self) -> Result<(), DeviceError>;

    /// Hand the screen back to the device's built-in behaviour
    async fn resume(&self) -> Result<(), DeviceError>;

    async fn show_lights(&self, state: LightState) -> Result<(), DeviceError>;

    /// Render large text across the digit cells
    async fn show_text(&self, text: &str, show_currency_symbol: bool) -> Result<(), DeviceError>;

    /// Render a two-line label at a screen position
    async fn show_label(&self, position: u8, over: &str, under: &str) -> Result<(), DeviceError>;
}

/// Light colours as `rrggbbaa` hex
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightColors {
    pub above: String,
    pub below: String,
}

impl Default for LightColors {
    fn default() -> Self {
        Self {
            above: "00ff0040".to_string(), // green
            below: "ff000040".to_string(), // red
        }
    }
}

#[derive(Debug, Clone)]
pub struct BlockClockConfig {
    /// e.g. "http://192.168.1.20"
    pub base_url: String,
    pub password: Option<String>,
    pub colors: LightColors,
    pub timeout: Duration,
}

/// HTTP client for a BlockClock on the local network
pub struct BlockClockClient {
    client: Client,
    base_url: Url,
    password: Option<String>,
    colors: LightColors,
}

impl BlockClockClient {
    pub fn new(config: BlockClockConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .with_context(|| format!("Invalid BlockClock address: {}", config.base_url))?;
        if base_url.cannot_be_a_base() {
            return Err(anyhow!("Invalid BlockClock address: {}", config.base_url));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to create BlockClock HTTP client")?;

        Ok(Self {
            client,
            base_url,
            password: config.password.filter(|p| !p.is_empty()),
            colors: config.colors,
        })
    }

    /// Build `{base}/api/{segments..}`, percent-encoding each segment
    fn command_url(&self, segments: &[&str]) -> Result<Url, DeviceError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| DeviceError::InvalidEndpoint(self.base_url.to_string()))?;
            path.pop_if_empty().push("api").extend(segments);
        }
        Ok(url)
    }

    async fn send(&self, command: &str, url: Url) -> Result<(), DeviceError> {
        debug!("BlockClock {}: {}", command, url);

        let mut request = self.client.get(url);
        if let Some(password) = &self.password {
            request = request.basic_auth("", Some(password));
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeviceError::Rejected {
                command: command.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    fn lights_url(&self, state: LightState) -> Result<Url, DeviceError> {
        match state {
            LightState::Off => self.command_url(&["lights", "off"]),
            LightState::Above => self.command_url(&["lights", &self.colors.above]),
            LightState::Below => self.command_url(&["lights", &self.colors.below]),
        }
    }

    fn text_url(&self, text: &str, show_currency_symbol: bool) -> Result<Url, DeviceError> {
        let mut url = self.command_url(&["show", "text", text])?;
        if show_currency_symbol {
            url.query_pairs_mut().append_pair("sym", "$");
        }
        Ok(url)
    }

    fn label_url(&self, position: u8, over: &str, under: &str) -> Result<Url, DeviceError> {
        self.command_url(&["ou_text", &position.to_string(), over, under])
    }
}

#[async_trait]
impl DeviceDriver for BlockClockClient {
    async fn pause(&self) -> Result<(), DeviceError> {
        let url = self.command_url(&["action", "pause"])?;
        self.send("pause", url).await
    }

    async fn resume(&self) -> Result<(), DeviceError> {
        let mut url = self.command_url(&["action", "update"])?;
        url.query_pairs_mut().append_pair("rate", "5");
        self.send("resume", url).await
    }

    async fn show_lights(&self, state: LightState) -> Result<(), DeviceError> {
        let url = self.lights_url(state)?;
        self.send("lights", url).await
    }

    async fn show_text(&self, text: &str, show_currency_symbol: bool) -> Result<(), DeviceError> {
        let url = self.text_url(text, show_currency_symbol)?;
        self.send("text", url).await
    }

    async fn show_label(&self, position: u8, over: &str, under: &str) -> Result<(), DeviceError> {
        let url = self.label_url(position, over, under)?;
        self.send("label", url).await
    }
}
