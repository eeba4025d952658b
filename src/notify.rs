//! Escalation sink: out-of-band notifications to the admin.
//!
//! The candidate-facing flow ends silently; completion and failure are
//! reported to a fixed admin number instead. Notification is best-effort:
//! a failed send is logged and never rolls back state already committed.

use std::sync::Arc;

use tracing::{info, warn};

use crate::qualify::QualificationRecord;
use crate::whatsapp::{jid_to_number, normalize_jid, Outbound};

/// Sends human-readable escalations to the configured admin.
pub struct AdminNotifier {
    outbound: Arc<dyn Outbound>,
}

impl std::fmt::Debug for AdminNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminNotifier").finish()
    }
}

impl AdminNotifier {
    /// Create a notifier sending through the given transport.
    pub fn new(outbound: Arc<dyn Outbound>) -> Self {
        Self { outbound }
    }

    /// Tell the admin a screening completed, with the collected fields.
    ///
    /// Best-effort: failure is logged and swallowed.
    pub async fn notify_complete(
        &self,
        admin_number: &str,
        sender: &str,
        record: &QualificationRecord,
    ) {
        let number = jid_to_number(sender);
        let message = format!(
            "\u{2705} Info collected from user: {number}\n{}",
            record.summary()
        );
        self.send(admin_number, &message).await;
    }

    /// Tell the admin that processing a candidate's message failed.
    ///
    /// Best-effort: failure is logged and swallowed.
    pub async fn notify_error(&self, admin_number: &str, sender: &str, detail: &str) {
        let number = jid_to_number(sender);
        let message = format!("\u{26a0}\u{fe0f} Bot error for user: {number}\n{detail}");
        self.send(admin_number, &message).await;
    }

    /// Send an arbitrary admin message (exposed via the admin API).
    ///
    /// # Errors
    ///
    /// Returns the transport error so the API can report sent/failed.
    pub async fn notify_raw(
        &self,
        recipient: &str,
        message: &str,
    ) -> Result<(), crate::whatsapp::BridgeError> {
        self.outbound
            .send_text(&normalize_jid(recipient), message)
            .await
    }

    async fn send(&self, admin_number: &str, message: &str) {
        if admin_number.is_empty() {
            warn!("no admin number configured, dropping escalation");
            return;
        }
        match self
            .outbound
            .send_text(&normalize_jid(admin_number), message)
            .await
        {
            Ok(()) => info!(admin = admin_number, "admin notified"),
            Err(e) => warn!(error = %e, admin = admin_number, "failed to notify admin"),
        }
    }
}
