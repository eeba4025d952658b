//! Inbound-message dispatcher: strategy selection and outcome delivery.
//!
//! One call per inbound candidate message. The dispatcher snapshots the
//! settings, runs the selected strategy, and delivers the outcome: reply to
//! the candidate, or escalate to the admin. A message never produces both.

use std::sync::Arc;

use tracing::{error, warn};

use crate::notify::AdminNotifier;
use crate::settings::SettingsHandle;
use crate::whatsapp::Outbound;

use super::strategy::{LlmStrategy, ReplyStrategy, ScriptedStrategy};
use super::{EngineError, Outcome};

/// Routes inbound messages to a strategy and delivers the outcome.
pub struct Dispatcher {
    scripted: ScriptedStrategy,
    llm: Option<LlmStrategy>,
    settings: Arc<SettingsHandle>,
    outbound: Arc<dyn Outbound>,
    notifier: AdminNotifier,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("llm_configured", &self.llm.is_some())
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Assemble a dispatcher. `llm` may be absent; enabling AI mode without
    /// one escalates each message to the admin instead of replying.
    pub fn new(
        scripted: ScriptedStrategy,
        llm: Option<LlmStrategy>,
        settings: Arc<SettingsHandle>,
        outbound: Arc<dyn Outbound>,
        notifier: AdminNotifier,
    ) -> Self {
        Self {
            scripted,
            llm,
            settings,
            outbound,
            notifier,
        }
    }

    /// Process one inbound message end to end.
    ///
    /// Never returns an error: failures are escalated to the admin. A send
    /// failure after state was committed is logged as a lost prompt; the
    /// session stays at the advanced step and the next inbound message is
    /// answered from there.
    pub async fn dispatch(&self, sender: &str, text: &str) {
        let settings = self.settings.snapshot().await;

        let result = if settings.ai_mode {
            match &self.llm {
                Some(llm) => llm.respond(sender, text, &settings).await,
                None => Err(EngineError::NoProvider),
            }
        } else {
            self.scripted.respond(sender, text, &settings).await
        };

        match result {
            Ok(Outcome::Reply(reply)) => {
                if let Err(e) = self.outbound.send_text(sender, &reply).await {
                    warn!(sender, error = %e, "reply send failed, prompt lost");
                }
            }
            Ok(Outcome::Complete(record)) => {
                self.notifier
                    .notify_complete(&settings.admin_number, sender, &record)
                    .await;
            }
            Ok(Outcome::Silent) => {}
            Err(e) => {
                error!(sender, error = %e, "message handling failed");
                self.notifier
                    .notify_error(&settings.admin_number, sender, &e.to_string())
                    .await;
            }
        }
    }
}
