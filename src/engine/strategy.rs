//! Reply strategies: the scripted flow and the free-form LLM fallback.
//!
//! The dispatcher selects a strategy per message from the current settings
//! snapshot. The scripted strategy delegates to the conversation engine;
//! the LLM strategy answers free-form from the chat transcript and never
//! computes qualification or completes a session.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::providers::{ChatTurn, CompletionProvider, CompletionRequest, Role};
use crate::settings::BotSettings;
use crate::store::SessionStore;

use super::{ConversationEngine, EngineError, Outcome, SenderLocks};

/// Chat-log step id for candidate turns in AI mode.
pub const AI_USER_STEP: &str = "user";
/// Chat-log step id for bot turns in AI mode.
pub const AI_BOT_STEP: &str = "bot";

/// Transcript turns passed to the provider as context.
const HISTORY_TURNS: usize = 20;

/// How an inbound message becomes an outcome.
#[async_trait]
pub trait ReplyStrategy: Send + Sync {
    /// Produce the outcome for one inbound message.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] on store or provider failure.
    async fn respond(
        &self,
        sender: &str,
        text: &str,
        settings: &BotSettings,
    ) -> Result<Outcome, EngineError>;
}

/// The default strategy: drive the scripted screening flow.
#[derive(Debug)]
pub struct ScriptedStrategy {
    engine: Arc<ConversationEngine>,
}

impl ScriptedStrategy {
    /// Wrap the engine as a strategy.
    pub fn new(engine: Arc<ConversationEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl ReplyStrategy for ScriptedStrategy {
    async fn respond(
        &self,
        sender: &str,
        text: &str,
        settings: &BotSettings,
    ) -> Result<Outcome, EngineError> {
        self.engine.handle(sender, text, &settings.thresholds).await
    }
}

/// Free-form conversational strategy backed by a completion provider.
///
/// Replies from the recent transcript under the configured persona prompt.
/// Sessions are neither advanced nor completed here; the transcript is the
/// only state touched.
pub struct LlmStrategy {
    provider: Arc<dyn CompletionProvider>,
    store: SessionStore,
    system_prompt: String,
    locks: SenderLocks,
}

impl std::fmt::Debug for LlmStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmStrategy")
            .field("model", &self.provider.model_id())
            .finish_non_exhaustive()
    }
}

impl LlmStrategy {
    /// Build the strategy over a provider, transcript store, and persona.
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        store: SessionStore,
        system_prompt: String,
    ) -> Self {
        Self {
            provider,
            store,
            system_prompt,
            locks: SenderLocks::default(),
        }
    }
}

#[async_trait]
impl ReplyStrategy for LlmStrategy {
    async fn respond(
        &self,
        sender: &str,
        text: &str,
        _settings: &BotSettings,
    ) -> Result<Outcome, EngineError> {
        let lock = self.locks.for_sender(sender).await;
        let _guard = lock.lock().await;

        let history = self.store.history(sender).await?;
        let skip = history.len().saturating_sub(HISTORY_TURNS);
        let turns = history
            .into_iter()
            .skip(skip)
            .map(|entry| ChatTurn {
                role: if entry.step == AI_BOT_STEP {
                    Role::Assistant
                } else {
                    Role::User
                },
                text: entry.message,
            })
            .collect();

        let reply = self
            .provider
            .complete(CompletionRequest {
                system: self.system_prompt.clone(),
                history: turns,
                user: text.to_string(),
            })
            .await?;

        // Transcript writes follow the provider call so a failed completion
        // leaves no half-recorded exchange.
        self.store.log_message(sender, AI_USER_STEP, text).await?;
        self.store.log_message(sender, AI_BOT_STEP, &reply).await?;

        debug!(sender, model = self.provider.model_id(), "AI reply produced");
        Ok(Outcome::Reply(reply))
    }
}
