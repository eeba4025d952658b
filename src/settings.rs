//! Runtime-mutable bot settings behind an immutable-snapshot handle.
//!
//! Components never read ambient global state: each message handler takes a
//! snapshot at the start of its work and uses only that. The single
//! administrative update path swaps the whole snapshot (last-write-wins),
//! which is what makes hot-reload safe without partial-merge semantics.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::config::SifterConfig;
use crate::qualify::Thresholds;

/// The runtime-mutable slice of configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotSettings {
    /// Phone number of the human admin who receives escalations.
    pub admin_number: String,
    /// Opening messages sent by the campaign initiator, in order.
    pub initial_messages: Vec<String>,
    /// Maximum numbers processed in one seeding run.
    pub numbers_per_batch: usize,
    /// Pause between successive outbound sends, in milliseconds.
    pub message_delay_ms: u64,
    /// Qualification thresholds.
    pub thresholds: Thresholds,
    /// When true, the LLM strategy replaces the scripted flow.
    pub ai_mode: bool,
}

impl BotSettings {
    /// Derive the initial settings snapshot from loaded configuration.
    pub fn from_config(config: &SifterConfig) -> Self {
        Self {
            admin_number: config.bot.admin_number.clone(),
            initial_messages: config.campaign.initial_messages.clone(),
            numbers_per_batch: config.campaign.numbers_per_batch,
            message_delay_ms: config.campaign.message_delay_ms,
            thresholds: config.thresholds,
            ai_mode: config.bot.ai_mode,
        }
    }
}

/// Shared handle over the current settings snapshot.
#[derive(Debug)]
pub struct SettingsHandle {
    current: RwLock<Arc<BotSettings>>,
}

impl SettingsHandle {
    /// Wrap an initial snapshot.
    pub fn new(settings: BotSettings) -> Self {
        Self {
            current: RwLock::new(Arc::new(settings)),
        }
    }

    /// The current immutable snapshot.
    pub async fn snapshot(&self) -> Arc<BotSettings> {
        Arc::clone(&*self.current.read().await)
    }

    /// Replace the snapshot wholesale (admin update path).
    pub async fn replace(&self, settings: BotSettings) {
        *self.current.write().await = Arc::new(settings);
    }
}
