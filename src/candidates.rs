//! Candidate store capability: where completed screenings land.
//!
//! The upstream system of record is external; [`CandidateSink`] is the seam
//! the engine writes through. The bundled implementation keeps candidates in
//! the bot's own SQLite database, keyed by phone with overwrite-on-conflict.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::debug;

use crate::qualify::QualificationRecord;

/// Errors from the candidate sink.
#[derive(Debug, thiserror::Error)]
pub enum CandidateError {
    /// The backing store rejected the operation.
    #[error("candidate store error: {0}")]
    Store(String),
}

impl From<sqlx::Error> for CandidateError {
    fn from(e: sqlx::Error) -> Self {
        CandidateError::Store(e.to_string())
    }
}

/// A stored candidate row: phone plus the screening outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    /// Candidate phone number (digits, no transport suffix).
    pub phone: String,
    /// The screening outcome.
    #[serde(flatten)]
    pub record: QualificationRecord,
}

/// Write/read access to the candidate store.
#[async_trait]
pub trait CandidateSink: Send + Sync {
    /// Upsert the screening outcome for `phone` (overwrite by phone).
    ///
    /// # Errors
    ///
    /// Returns [`CandidateError`] if the write fails; the caller decides
    /// whether to escalate.
    async fn upsert(&self, phone: &str, record: &QualificationRecord)
        -> Result<(), CandidateError>;

    /// All candidates that cleared the thresholds.
    ///
    /// # Errors
    ///
    /// Returns [`CandidateError`] on query failure.
    async fn query_qualified(&self) -> Result<Vec<Candidate>, CandidateError>;
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS candidates (
    phone       TEXT PRIMARY KEY,
    company     TEXT NOT NULL,
    experience  REAL,
    ctc         REAL,
    notice      REAL,
    product     TEXT NOT NULL,
    qualified   INTEGER NOT NULL,
    updated_at  TEXT NOT NULL
);
"#;

/// Candidate sink backed by the bot's SQLite database.
#[derive(Clone)]
pub struct SqliteCandidateSink {
    db: SqlitePool,
}

impl std::fmt::Debug for SqliteCandidateSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteCandidateSink").finish()
    }
}

impl SqliteCandidateSink {
    /// Create a sink on the given pool, running schema setup.
    ///
    /// # Errors
    ///
    /// Returns [`CandidateError`] if the schema statements fail.
    pub async fn init(db: SqlitePool) -> Result<Self, CandidateError> {
        sqlx::raw_sql(SCHEMA).execute(&db).await?;
        Ok(Self { db })
    }
}

#[async_trait]
impl CandidateSink for SqliteCandidateSink {
    async fn upsert(
        &self,
        phone: &str,
        record: &QualificationRecord,
    ) -> Result<(), CandidateError> {
        sqlx::query(
            "INSERT INTO candidates \
                 (phone, company, experience, ctc, notice, product, qualified, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, datetime('now')) \
             ON CONFLICT(phone) DO UPDATE SET \
                 company = excluded.company, \
                 experience = excluded.experience, \
                 ctc = excluded.ctc, \
                 notice = excluded.notice, \
                 product = excluded.product, \
                 qualified = excluded.qualified, \
                 updated_at = datetime('now')",
        )
        .bind(phone)
        .bind(&record.company)
        .bind(record.experience)
        .bind(record.ctc)
        .bind(record.notice)
        .bind(&record.product)
        .bind(record.qualified)
        .execute(&self.db)
        .await?;

        debug!(phone, qualified = record.qualified, "candidate upserted");
        Ok(())
    }

    async fn query_qualified(&self) -> Result<Vec<Candidate>, CandidateError> {
        let rows: Vec<(String, String, Option<f64>, Option<f64>, Option<f64>, String)> =
            sqlx::query_as(
                "SELECT phone, company, experience, ctc, notice, product \
                 FROM candidates WHERE qualified = 1 ORDER BY updated_at DESC",
            )
            .fetch_all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(phone, company, experience, ctc, notice, product)| Candidate {
                phone,
                record: QualificationRecord {
                    company,
                    experience,
                    ctc,
                    notice,
                    product,
                    qualified: true,
                },
            })
            .collect())
    }
}
