//! Campaign initiator: first-contact seeding of candidate numbers.
//!
//! Takes a batch of phone numbers, sends each the configured opening
//! messages in order, and ensures a gate-step session exists so the first
//! reply enters the scripted flow. Failures are isolated per number: one
//! bad number never aborts the batch.

use std::sync::Arc;

use serde::Serialize;
use tokio::time::{sleep, Duration};
use tracing::{info, warn};

use crate::settings::SettingsHandle;
use crate::store::SessionStore;
use crate::whatsapp::{normalize_jid, Outbound};

/// Outcome counts for one seeding run.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct CampaignReport {
    /// Numbers taken from the batch (after the per-batch cap).
    pub attempted: usize,
    /// Numbers that received every opening message.
    pub seeded: usize,
    /// Numbers skipped over a session or send failure.
    pub failed: usize,
}

/// Sends opening messages and seeds gate-step sessions.
pub struct Campaign {
    outbound: Arc<dyn Outbound>,
    store: SessionStore,
    settings: Arc<SettingsHandle>,
}

impl std::fmt::Debug for Campaign {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Campaign").finish_non_exhaustive()
    }
}

impl Campaign {
    /// Build a campaign initiator over the shared transport and store.
    pub fn new(
        outbound: Arc<dyn Outbound>,
        store: SessionStore,
        settings: Arc<SettingsHandle>,
    ) -> Self {
        Self {
            outbound,
            store,
            settings,
        }
    }

    /// Seed up to `numbers_per_batch` numbers from `numbers`.
    ///
    /// For each number: ensure a gate-step session (a no-op when the
    /// candidate already has one), then send the opening messages in order,
    /// pausing `message_delay_ms` after every send to stay under rate
    /// limits. Session creation happens first so a reply racing the later
    /// messages still lands in the flow.
    pub async fn seed(&self, numbers: &[String]) -> CampaignReport {
        let settings = self.settings.snapshot().await;
        let batch: Vec<&String> = numbers.iter().take(settings.numbers_per_batch).collect();
        let delay = Duration::from_millis(settings.message_delay_ms);

        let mut report = CampaignReport {
            attempted: batch.len(),
            ..CampaignReport::default()
        };

        for number in batch {
            let jid = normalize_jid(number);

            if let Err(e) = self.store.create(&jid).await {
                warn!(number = number.as_str(), error = %e, "session seed failed, skipping number");
                report.failed = report.failed.saturating_add(1);
                continue;
            }

            let mut sent_all = true;
            for message in &settings.initial_messages {
                match self.outbound.send_text(&jid, message).await {
                    Ok(()) => sleep(delay).await,
                    Err(e) => {
                        warn!(number = number.as_str(), error = %e, "opening message send failed");
                        sent_all = false;
                        break;
                    }
                }
            }

            if sent_all {
                report.seeded = report.seeded.saturating_add(1);
            } else {
                report.failed = report.failed.saturating_add(1);
            }
        }

        info!(
            attempted = report.attempted,
            seeded = report.seeded,
            failed = report.failed,
            "campaign batch finished"
        );
        report
    }
}
