//! Session persistence and the append-only chat log.
//!
//! The [`SessionStore`] is the sole owner of session records: one row per
//! sender holding the current step index and the collected answers as JSON.
//! Terminal sessions are retained (status `complete`) for qualification
//! queries and audit. The chat log is append-only, one row per captured
//! answer, and is used for the diagnostic history endpoint and as the
//! AI-mode transcript.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::debug;

/// Errors from session store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// SQLite query failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    /// Answers column held invalid JSON.
    #[error("corrupt answers for {sender}: {source}")]
    CorruptAnswers {
        /// Sender whose row is corrupt.
        sender: String,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
}

/// Lifecycle status of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// The candidate is somewhere in the scripted flow.
    Active,
    /// The flow finished; no further prompts are sent.
    Complete,
}

impl SessionStatus {
    /// String form stored in SQLite.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Complete => "complete",
        }
    }

    fn parse(s: &str) -> Self {
        match s {
            "complete" => Self::Complete,
            _ => Self::Active,
        }
    }
}

/// Per-sender conversation state.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// Transport identifier of the candidate (JID).
    pub sender: String,
    /// Index of the current step in the flow.
    pub step: usize,
    /// Captured answers keyed by step id.
    pub answers: BTreeMap<String, String>,
    /// Whether the flow is still running.
    pub status: SessionStatus,
}

impl Session {
    /// A fresh session at the gate step.
    pub fn new(sender: &str) -> Self {
        Self {
            sender: sender.to_string(),
            step: 0,
            answers: BTreeMap::new(),
            status: SessionStatus::Active,
        }
    }
}

/// One line of the reconstructed per-sender transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatLogEntry {
    /// When the answer was captured (SQLite `datetime('now')`, UTC).
    pub timestamp: String,
    /// Step id the answer was captured under.
    pub step: String,
    /// Raw inbound text.
    pub message: String,
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS sessions (
    sender      TEXT PRIMARY KEY,
    step        INTEGER NOT NULL,
    answers     TEXT NOT NULL,
    status      TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS chat_log (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    sender      TEXT NOT NULL,
    step        TEXT NOT NULL,
    message     TEXT NOT NULL,
    timestamp   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_chat_log_sender ON chat_log(sender);
"#;

/// Open (or create) the bot database at `path` and return a pool.
///
/// # Errors
///
/// Returns an error if the file cannot be created or opened.
pub async fn open_db(path: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
}

/// SQLite-backed store for sessions and the chat log.
///
/// No retry logic: a failed write is surfaced to the caller, who decides
/// whether to escalate.
#[derive(Clone)]
pub struct SessionStore {
    db: SqlitePool,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore").finish()
    }
}

impl SessionStore {
    /// Create a store on the given pool, running schema setup.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema statements fail.
    pub async fn init(db: SqlitePool) -> Result<Self, StoreError> {
        sqlx::raw_sql(SCHEMA).execute(&db).await?;
        Ok(Self { db })
    }

    /// Load the session for `sender`, if one exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on query failure or a corrupt answers column.
    pub async fn get(&self, sender: &str) -> Result<Option<Session>, StoreError> {
        let row: Option<(i64, String, String)> =
            sqlx::query_as("SELECT step, answers, status FROM sessions WHERE sender = ?1")
                .bind(sender)
                .fetch_optional(&self.db)
                .await?;

        let Some((step, answers_json, status)) = row else {
            return Ok(None);
        };

        let answers: BTreeMap<String, String> =
            serde_json::from_str(&answers_json).map_err(|source| StoreError::CorruptAnswers {
                sender: sender.to_string(),
                source,
            })?;

        Ok(Some(Session {
            sender: sender.to_string(),
            step: usize::try_from(step).unwrap_or(0),
            answers,
            status: SessionStatus::parse(&status),
        }))
    }

    /// Create a step-0 session for `sender` if none exists yet.
    ///
    /// Safe against the campaign-seeding vs inbound-message race: the
    /// insert is a no-op when a row is already present, and the existing
    /// row is returned.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on write or read-back failure.
    pub async fn create(&self, sender: &str) -> Result<Session, StoreError> {
        sqlx::query(
            "INSERT INTO sessions (sender, step, answers, status, created_at, updated_at) \
             VALUES (?1, 0, '{}', 'active', datetime('now'), datetime('now')) \
             ON CONFLICT(sender) DO NOTHING",
        )
        .bind(sender)
        .execute(&self.db)
        .await?;

        debug!(sender, "session ensured");
        match self.get(sender).await? {
            Some(session) => Ok(session),
            None => Ok(Session::new(sender)),
        }
    }

    /// Durably write `session`, overwriting any prior record for the sender.
    ///
    /// Idempotent: saving the same session twice leaves the same row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write fails. Not retried here.
    pub async fn save(&self, session: &Session) -> Result<(), StoreError> {
        let answers_json = serde_json::to_string(&session.answers).map_err(|source| {
            StoreError::CorruptAnswers {
                sender: session.sender.clone(),
                source,
            }
        })?;
        let step = i64::try_from(session.step).unwrap_or(i64::MAX);

        sqlx::query(
            "INSERT INTO sessions (sender, step, answers, status, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, datetime('now'), datetime('now')) \
             ON CONFLICT(sender) DO UPDATE SET \
                 step = excluded.step, \
                 answers = excluded.answers, \
                 status = excluded.status, \
                 updated_at = datetime('now')",
        )
        .bind(&session.sender)
        .bind(step)
        .bind(&answers_json)
        .bind(session.status.as_str())
        .execute(&self.db)
        .await?;

        debug!(sender = %session.sender, step = session.step, "session saved");
        Ok(())
    }

    /// Number of sessions still in the flow (diagnostic).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on query failure.
    pub async fn count_active(&self) -> Result<u64, StoreError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM sessions WHERE status = 'active'")
                .fetch_one(&self.db)
                .await?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    /// Append one captured answer to the audit log.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the insert fails.
    pub async fn log_message(
        &self,
        sender: &str,
        step_id: &str,
        text: &str,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO chat_log (sender, step, message, timestamp) \
             VALUES (?1, ?2, ?3, datetime('now'))",
        )
        .bind(sender)
        .bind(step_id)
        .bind(text)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    /// Reconstruct the transcript for `sender`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on query failure.
    pub async fn history(&self, sender: &str) -> Result<Vec<ChatLogEntry>, StoreError> {
        let rows: Vec<(String, String, String)> = sqlx::query_as(
            "SELECT timestamp, step, message FROM chat_log WHERE sender = ?1 ORDER BY id ASC",
        )
        .bind(sender)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(timestamp, step, message)| ChatLogEntry {
                timestamp,
                step,
                message,
            })
            .collect())
    }
}
