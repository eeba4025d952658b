//! Liveness probe for the companion inference/scripting process.
//!
//! The companion is an external HTTP service; the bot never supervises it,
//! it only asks whether it is alive. A failed probe degrades status
//! reporting and makes AI-mode calls fail fast, it never crashes the bot.

use tracing::debug;

/// Probe timeout: the ping must answer within a couple of seconds.
const PING_TIMEOUT_SECS: u64 = 2;

/// HTTP liveness probe against the companion's `/ping` endpoint.
#[derive(Debug, Clone)]
pub struct CompanionProbe {
    client: reqwest::Client,
    base_url: String,
}

impl CompanionProbe {
    /// Create a probe for the companion at `base_url`.
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(PING_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self { client, base_url }
    }

    /// Whether the companion answered the ping in time.
    ///
    /// Any transport error or non-2xx status counts as down.
    pub async fn ping(&self) -> bool {
        let url = format!("{}/ping", self.base_url);
        let alive = match self.client.get(&url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        };
        debug!(alive, url = %url, "companion liveness probe");
        alive
    }

    /// Returns the base URL of the companion.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}
