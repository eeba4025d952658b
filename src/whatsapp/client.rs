//! HTTP client for the WhatsApp bridge sidecar.
//!
//! All WhatsApp operations go through this client, which communicates with
//! the baileys-based Node.js bridge via HTTP.

use std::path::Path;

use base64::Engine as _;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{BridgeError, Outbound};

/// Default port the WhatsApp bridge listens on.
pub const DEFAULT_BRIDGE_PORT: u16 = 3001;

/// HTTP connect timeout for the reqwest client.
const CONNECT_TIMEOUT_SECS: u64 = 5;

/// HTTP request timeout for normal operations.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Number of health-check retries before giving up.
const HEALTH_CHECK_RETRIES: u32 = 5;

/// Delay between health-check attempts in milliseconds.
const HEALTH_CHECK_DELAY_MS: u64 = 2000;

/// Client for the WhatsApp HTTP bridge.
#[derive(Debug, Clone)]
pub struct BridgeClient {
    client: reqwest::Client,
    base_url: String,
}

/// Connection status from the sidecar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeStatus {
    /// Whether the sidecar is connected to WhatsApp.
    pub connected: bool,
    /// The phone number linked, if connected.
    pub phone_number: Option<String>,
}

/// Response envelope from the bridge HTTP API.
#[derive(Deserialize)]
struct BridgeResponse<T> {
    #[allow(dead_code)]
    success: bool,
    data: Option<T>,
    error: Option<String>,
}

impl BridgeClient {
    /// Create a new client pointing at the given base URL.
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "failed to build HTTP client with timeouts, using default");
                reqwest::Client::default()
            });
        Self { client, base_url }
    }

    /// Create a client using the default bridge port.
    pub fn default_url() -> Self {
        Self::new(format!("http://127.0.0.1:{DEFAULT_BRIDGE_PORT}"))
    }

    /// Check whether the sidecar is healthy and connected to WhatsApp.
    pub async fn health_check(&self) -> Result<bool, BridgeError> {
        let url = format!("{}/status", self.base_url);
        match self.client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => {
                let body: BridgeResponse<BridgeStatus> = resp.json().await?;
                Ok(body.data.is_some_and(|s| s.connected))
            }
            Ok(_) => Ok(false),
            Err(_) => Ok(false),
        }
    }

    /// Wait for the sidecar to become healthy, retrying with a fixed delay.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::NotRunning`] after all retries fail.
    pub async fn wait_healthy(&self) -> Result<(), BridgeError> {
        for attempt in 0..HEALTH_CHECK_RETRIES {
            if self.health_check().await.unwrap_or(false) {
                return Ok(());
            }
            if attempt < HEALTH_CHECK_RETRIES.saturating_sub(1) {
                tokio::time::sleep(std::time::Duration::from_millis(HEALTH_CHECK_DELAY_MS)).await;
            }
        }
        Err(BridgeError::NotRunning)
    }

    /// Get the current connection status from the sidecar.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError`] if the sidecar is unreachable.
    pub async fn status(&self) -> Result<BridgeStatus, BridgeError> {
        let url = format!("{}/status", self.base_url);
        let resp = self.client.get(&url).send().await?;
        let body: BridgeResponse<BridgeStatus> = resp.json().await?;
        body.data.ok_or(BridgeError::NotRunning)
    }

    /// Get a QR code for WhatsApp Web linking (base64 PNG).
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Failed`] when no QR is available (already
    /// linked, or the sidecar is still starting).
    pub async fn get_qr(&self) -> Result<String, BridgeError> {
        let url = format!("{}/qr", self.base_url);
        let resp = self.client.get(&url).send().await?;
        let body: BridgeResponse<String> = resp.json().await?;
        body.data.ok_or_else(|| {
            BridgeError::Failed(
                body.error
                    .unwrap_or_else(|| "no QR code available".to_owned()),
            )
        })
    }

    /// Fetch the pairing QR and write it to `path` as a PNG for the operator.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Failed`] if the QR is unavailable, is not
    /// valid base64, or cannot be written.
    pub async fn save_qr_png(&self, path: &Path) -> Result<(), BridgeError> {
        let encoded = self.get_qr().await?;
        write_qr_png(&encoded, path).await
    }

    /// Returns the base URL of the sidecar.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Decode a QR payload (possibly data-URL prefixed base64) and write it to
/// `path` as a PNG. Used for both fetched and pushed QR codes.
///
/// # Errors
///
/// Returns [`BridgeError::Failed`] if the payload is not valid base64 or
/// the file cannot be written.
pub async fn write_qr_png(encoded: &str, path: &Path) -> Result<(), BridgeError> {
    let raw = encoded.rsplit(',').next().unwrap_or(encoded);
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(raw)
        .map_err(|e| BridgeError::Failed(format!("QR is not valid base64: {e}")))?;
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| BridgeError::Failed(format!("failed to write QR PNG: {e}")))?;
    debug!(path = %path.display(), "pairing QR saved");
    Ok(())
}

#[async_trait::async_trait]
impl Outbound for BridgeClient {
    async fn send_text(&self, jid: &str, text: &str) -> Result<(), BridgeError> {
        let url = format!("{}/send", self.base_url);
        let body = serde_json::json!({ "jid": jid, "text": text });
        let resp = self.client.post(&url).json(&body).send().await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body_text = resp.text().await.unwrap_or_default();
            warn!(%status, "WhatsApp send failed: {body_text}");
            return Err(BridgeError::NotConnected);
        }
        debug!(jid, "message sent via WhatsApp");
        Ok(())
    }
}
