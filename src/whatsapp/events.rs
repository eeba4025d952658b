//! Incoming bridge events.
//!
//! The sidecar queues events (inbound messages, connection changes,
//! pairing QR refreshes) and hands them out through a long-poll endpoint.
//! The listener runs as a background task, forwards events over an mpsc
//! channel in the order the bridge queued them, and reconnects with capped
//! exponential backoff when the sidecar goes away.

use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// One event drained from the sidecar queue.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BridgeEvent {
    /// An inbound message, or the echo of one of our own sends.
    Message {
        /// Conversation JID.
        jid: String,
        /// Text content.
        text: String,
        /// True when the message is our own outbound echo.
        from_me: bool,
        /// Bridge-assigned id, passed through for log correlation.
        id: Option<String>,
    },
    /// A fresh pairing QR is available (the account is not linked yet).
    Qr {
        /// Base64 PNG payload, possibly data-URL prefixed.
        data: String,
    },
    /// WhatsApp connection established.
    Connected,
    /// WhatsApp connection lost.
    Disconnected {
        /// Reason reported by the sidecar, if any.
        reason: Option<String>,
    },
}

/// Long-poll request timeout. The sidecar parks the request until events
/// arrive or its own shorter window expires.
const POLL_TIMEOUT_SECS: u64 = 60;
/// Initial reconnect backoff.
const BACKOFF_START_MS: u64 = 1000;
/// Backoff ceiling.
const BACKOFF_CAP_MS: u64 = 30_000;

/// Background long-poll loop against the sidecar's event queue.
pub struct EventListener {
    client: reqwest::Client,
    poll_url: String,
    tx: mpsc::Sender<BridgeEvent>,
}

impl EventListener {
    /// Spawn the listener task for the bridge at `base_url`.
    ///
    /// The task ends when every receiver of the channel is dropped.
    pub fn spawn(base_url: &str, tx: mpsc::Sender<BridgeEvent>) -> tokio::task::JoinHandle<()> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(POLL_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        let listener = Self {
            client,
            poll_url: format!("{base_url}/events/poll"),
            tx,
        };
        tokio::spawn(listener.run())
    }

    async fn run(self) {
        let mut backoff_ms = BACKOFF_START_MS;
        info!(url = %self.poll_url, "listening for bridge events");
        loop {
            match self.poll_once().await {
                Ok(events) => {
                    backoff_ms = BACKOFF_START_MS;
                    for event in events {
                        debug!(?event, "bridge event");
                        if self.tx.send(event).await.is_err() {
                            debug!("event receiver dropped, stopping listener");
                            return;
                        }
                    }
                }
                Err(e) if e.is_timeout() => {
                    // Empty long-poll window; ask again immediately.
                }
                Err(e) => {
                    warn!(error = %e, backoff_ms, "event poll failed, backing off");
                    tokio::time::sleep(std::time::Duration::from_millis(backoff_ms)).await;
                    backoff_ms = backoff_ms.saturating_mul(2).min(BACKOFF_CAP_MS);
                }
            }
        }
    }

    async fn poll_once(&self) -> Result<Vec<BridgeEvent>, reqwest::Error> {
        let resp = self.client.get(&self.poll_url).send().await?;
        resp.error_for_status()?.json().await
    }
}
