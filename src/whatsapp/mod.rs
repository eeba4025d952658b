//! WhatsApp adapter: HTTP bridge client and event listener.
//!
//! All session/protocol work (QR pairing, connection lifecycle, message
//! delivery) lives in a baileys-based Node.js sidecar; this module talks to
//! it over HTTP and long-polls for incoming messages.

pub mod client;
pub mod events;

use async_trait::async_trait;

/// Errors from the WhatsApp adapter.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// HTTP request to the sidecar failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The sidecar is not running or not reachable.
    #[error("bridge not running")]
    NotRunning,

    /// The sidecar is running but WhatsApp is not connected (needs QR scan).
    #[error("not connected to WhatsApp")]
    NotConnected,

    /// Bridge operation failed with a message from the sidecar.
    #[error("bridge operation failed: {0}")]
    Failed(String),
}

/// Outbound message capability.
///
/// The engine dispatcher, the admin notifier, and the campaign initiator
/// all send through this seam so they can be exercised against a fake
/// transport in tests.
#[async_trait]
pub trait Outbound: Send + Sync {
    /// Send a text message to the given JID.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError`] if delivery to the sidecar fails.
    async fn send_text(&self, jid: &str, text: &str) -> Result<(), BridgeError>;
}

/// Normalize a raw phone number to the transport JID form.
///
/// Numbers already carrying a domain suffix pass through unchanged.
pub fn normalize_jid(number: &str) -> String {
    let trimmed = number.trim();
    if trimmed.contains('@') {
        trimmed.to_string()
    } else {
        let digits: String = trimmed.chars().filter(char::is_ascii_digit).collect();
        format!("{digits}@s.whatsapp.net")
    }
}

/// Extract the bare phone number from a JID (`"9198...@s.whatsapp.net"` → `"9198..."`).
pub fn jid_to_number(jid: &str) -> &str {
    jid.split('@').next().unwrap_or(jid)
}
