//! Conversation engine: the per-sender screening state machine.
//!
//! Consumes one inbound message at a time, advances the sender's session
//! through the scripted flow, and produces exactly one outcome: a reply for
//! the candidate, a completion (admin is notified, candidate is not), or an
//! error (ditto). Mutations are serialized per sender; messages for
//! different senders proceed independently.

pub mod dispatch;
pub mod strategy;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::candidates::{CandidateError, CandidateSink};
use crate::flow::Flow;
use crate::qualify::{qualify, QualificationRecord, Thresholds};
use crate::store::{SessionStatus, SessionStore, StoreError};
use crate::whatsapp::jid_to_number;

/// Errors surfaced while processing one inbound message.
///
/// All of these stop at the dispatcher boundary and become an admin
/// escalation; nothing propagates to the candidate-facing channel.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Session store read/write failed; the step was not advanced.
    #[error("session store failure: {0}")]
    Store(#[from] StoreError),
    /// Candidate store write failed at the terminal step.
    #[error("candidate store failure: {0}")]
    Candidate(#[from] CandidateError),
    /// The completion provider failed (AI mode).
    #[error("completion provider failure: {0}")]
    Provider(#[from] crate::providers::ProviderError),
    /// AI mode is enabled but no provider is configured.
    #[error("AI mode enabled but no completion provider configured")]
    NoProvider,
}

/// The single outcome of processing one inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Send this text back to the candidate.
    Reply(String),
    /// The flow finished; notify the admin, send nothing to the candidate.
    Complete(QualificationRecord),
    /// Send nothing: gate not cleared, or the session is already terminal.
    Silent,
}

/// Keyed mutexes guaranteeing at-most-one in-flight mutation per sender.
///
/// Tokio mutexes are fair, so waiters acquire in lock-request order. With
/// spawn-per-message dispatch that matches arrival order only as far as the
/// spawned tasks reach the lock in order; the guaranteed property is mutual
/// exclusion (no lost update), not a strict arrival ordering.
#[derive(Debug, Default)]
pub struct SenderLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl SenderLocks {
    /// The lock for `sender`, created on first use.
    pub async fn for_sender(&self, sender: &str) -> Arc<Mutex<()>> {
        let mut map = self.locks.lock().await;
        Arc::clone(
            map.entry(sender.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }
}

/// The scripted screening state machine.
pub struct ConversationEngine {
    flow: Arc<Flow>,
    store: SessionStore,
    candidates: Arc<dyn CandidateSink>,
    locks: SenderLocks,
}

impl std::fmt::Debug for ConversationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationEngine")
            .field("flow_len", &self.flow.len())
            .finish_non_exhaustive()
    }
}

impl ConversationEngine {
    /// Build an engine over the given flow, session store, and candidate sink.
    pub fn new(flow: Arc<Flow>, store: SessionStore, candidates: Arc<dyn CandidateSink>) -> Self {
        Self {
            flow,
            store,
            candidates,
            locks: SenderLocks::default(),
        }
    }

    /// Process one inbound message from `sender`.
    ///
    /// Holds the sender's lock for the full read-modify-write (plus the
    /// terminal candidate upsert), so re-entrant delivery for the same
    /// sender waits. There is no message-id deduplication: delivering the
    /// same text twice advances twice.
    ///
    /// Commit ordering at the terminal step: candidate upsert first, then
    /// the terminal session write. If either fails the session stays at the
    /// pre-terminal step, so the candidate's next message can retry.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] on store or candidate-sink failure; the
    /// session step is not advanced in that case.
    pub async fn handle(
        &self,
        sender: &str,
        text: &str,
        thresholds: &Thresholds,
    ) -> Result<Outcome, EngineError> {
        let lock = self.locks.for_sender(sender).await;
        let _guard = lock.lock().await;

        let mut session = match self.store.get(sender).await? {
            Some(session) => session,
            None => self.store.create(sender).await?,
        };

        // Terminal silence: completed sessions are never mutated again.
        if session.status == SessionStatus::Complete {
            debug!(sender, "message after terminal step, ignoring");
            return Ok(Outcome::Silent);
        }

        let Some(current) = self.flow.step(session.step) else {
            debug!(sender, step = session.step, "step out of range, ignoring");
            return Ok(Outcome::Silent);
        };
        let current_id = current.id.clone();

        // FAQ side channel: answer and re-ask, never advance.
        if let Some(faq) = self.flow.detect_faq(text) {
            let prompt = self
                .flow
                .prompt(session.step, &session.answers)
                .unwrap_or_default();
            return Ok(Outcome::Reply(format!("{}\n\n{prompt}", faq.response)));
        }

        // Gate step: a non-affirmative first reply leaves the session
        // untouched and sends nothing.
        if session.step == 0 && !self.flow.gate_matches(text) {
            debug!(sender, "gate not cleared");
            return Ok(Outcome::Silent);
        }

        session.answers.insert(current_id.clone(), text.to_string());
        let next = session.step.saturating_add(1);

        if next >= self.flow.len() {
            let record = qualify(&session.answers, thresholds);
            self.candidates
                .upsert(jid_to_number(sender), &record)
                .await?;

            session.step = next;
            session.status = SessionStatus::Complete;
            self.store.save(&session).await?;
            self.log_answer(sender, &current_id, text).await;

            debug!(sender, qualified = record.qualified, "screening complete");
            return Ok(Outcome::Complete(record));
        }

        session.step = next;
        self.store.save(&session).await?;
        self.log_answer(sender, &current_id, text).await;

        let prompt = self.flow.prompt(next, &session.answers).unwrap_or_default();
        Ok(Outcome::Reply(prompt))
    }

    /// Append to the audit transcript. Best-effort: the session advance is
    /// already committed, so a failed append must not turn the outcome
    /// into an error.
    async fn log_answer(&self, sender: &str, step_id: &str, text: &str) {
        if let Err(e) = self.store.log_message(sender, step_id, text).await {
            warn!(sender, step_id, error = %e, "chat log append failed");
        }
    }
}
