//! Agent runtime status client
//!
//! The agent process exposes `GET /status` returning `{"load": <percent>}`.
//! The dashboard only reads the load figure.

use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::config::SystemStatusConfig;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub load: Option<f64>,
}

impl StatusResponse {
    /// Load clamped to 0..=100; missing reads as 0
    pub fn load_pct(&self) -> u8 {
        self.load.unwrap_or(0.0).clamp(0.0, 100.0).round() as u8
    }
}

pub struct SystemStatusClient {
    client: Client,
    url: String,
}

impl SystemStatusClient {
    pub fn new(config: &SystemStatusConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| Error::SystemStatus(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }

    /// Fetch current load percentage
    pub async fn fetch_load(&self) -> Result<u8> {
        let response = self.client.get(&self.url).send().await?;

        if !response.status().is_success() {
            return Err(Error::SystemStatus(format!(
                "{} returned {}",
                self.url,
                response.status()
            )));
        }

        let status: StatusResponse = response.json().await?;
        debug!("System load: {:?}", status.load);
        Ok(status.load_pct())
    }
}
