//! Tests for the session store and chat log.

use sifter::store::{SessionStatus, SessionStore, StoreError};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

// A single connection keeps the in-memory database alive and shared.
async fn mem_pool() -> SqlitePool {
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory pool")
}

async fn store() -> SessionStore {
    SessionStore::init(mem_pool().await)
        .await
        .expect("schema setup")
}

#[tokio::test]
async fn get_returns_none_for_unknown_sender() {
    let store = store().await;
    let session = store.get("1@s.whatsapp.net").await.expect("query ok");
    assert!(session.is_none());
}

#[tokio::test]
async fn create_starts_at_the_gate_step() {
    let store = store().await;
    let session = store.create("1@s.whatsapp.net").await.expect("create ok");

    assert_eq!(session.step, 0);
    assert!(session.answers.is_empty());
    assert_eq!(session.status, SessionStatus::Active);
}

#[tokio::test]
async fn create_is_a_noop_when_a_session_exists() {
    let store = store().await;
    let mut session = store.create("1@s.whatsapp.net").await.expect("create ok");
    session.step = 3;
    session
        .answers
        .insert("company".to_owned(), "Acme".to_owned());
    store.save(&session).await.expect("save ok");

    // Seeding the same number again must not reset progress.
    let again = store.create("1@s.whatsapp.net").await.expect("create ok");
    assert_eq!(again.step, 3);
    assert_eq!(again.answers.get("company").map(String::as_str), Some("Acme"));
}

#[tokio::test]
async fn save_then_get_round_trips() {
    let store = store().await;
    let mut session = store.create("1@s.whatsapp.net").await.expect("create ok");
    session.step = 5;
    session.answers.insert("ctc".to_owned(), "7 LPA".to_owned());
    session.status = SessionStatus::Complete;
    store.save(&session).await.expect("save ok");

    let loaded = store
        .get("1@s.whatsapp.net")
        .await
        .expect("query ok")
        .expect("session exists");
    assert_eq!(loaded, session);
}

#[tokio::test]
async fn save_is_idempotent() {
    let store = store().await;
    let session = store.create("1@s.whatsapp.net").await.expect("create ok");
    store.save(&session).await.expect("first save");
    store.save(&session).await.expect("second save");

    let loaded = store
        .get("1@s.whatsapp.net")
        .await
        .expect("query ok")
        .expect("session exists");
    assert_eq!(loaded.step, session.step);
}

#[tokio::test]
async fn count_active_excludes_complete_sessions() {
    let store = store().await;
    let mut a = store.create("1@s.whatsapp.net").await.expect("create a");
    store.create("2@s.whatsapp.net").await.expect("create b");

    assert_eq!(store.count_active().await.expect("count"), 2);

    a.status = SessionStatus::Complete;
    store.save(&a).await.expect("save a");
    assert_eq!(store.count_active().await.expect("count"), 1);
}

#[tokio::test]
async fn history_preserves_insertion_order() {
    let store = store().await;
    store
        .log_message("1@s.whatsapp.net", "interest", "yes")
        .await
        .expect("log 1");
    store
        .log_message("1@s.whatsapp.net", "company", "Acme")
        .await
        .expect("log 2");
    store
        .log_message("2@s.whatsapp.net", "interest", "ok")
        .await
        .expect("other sender");

    let history = store.history("1@s.whatsapp.net").await.expect("history");
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].step, "interest");
    assert_eq!(history[0].message, "yes");
    assert_eq!(history[1].step, "company");
}

#[tokio::test]
async fn corrupt_answers_column_is_reported() {
    let pool = mem_pool().await;
    let store = SessionStore::init(pool.clone()).await.expect("schema");

    sqlx::query(
        "INSERT INTO sessions (sender, step, answers, status, created_at, updated_at) \
         VALUES ('bad@s.whatsapp.net', 1, 'not json', 'active', datetime('now'), datetime('now'))",
    )
    .execute(&pool)
    .await
    .expect("raw insert");

    let result = store.get("bad@s.whatsapp.net").await;
    assert!(matches!(
        result,
        Err(StoreError::CorruptAnswers { sender, .. }) if sender == "bad@s.whatsapp.net"
    ));
}
