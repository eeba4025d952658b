//! Tests for per-sender serialization of message handling.

use std::sync::Arc;

use sifter::qualify::Thresholds;

use crate::common::{engine_with, RecordingSink};

const SENDER: &str = "919876543210@s.whatsapp.net";

#[tokio::test]
async fn concurrent_messages_from_one_sender_lose_no_update() {
    let (engine, store) = engine_with(Arc::new(RecordingSink::default())).await;
    let engine = Arc::new(engine);
    let thresholds = Thresholds::default();

    engine.handle(SENDER, "yes", &thresholds).await.expect("gate");

    // Two answers racing on separate tasks must apply one after the other.
    let a = tokio::spawn({
        let engine = Arc::clone(&engine);
        async move { engine.handle(SENDER, "Acme", &Thresholds::default()).await }
    });
    let b = tokio::spawn({
        let engine = Arc::clone(&engine);
        async move { engine.handle(SENDER, "30 days", &Thresholds::default()).await }
    });
    a.await.expect("task a").expect("handle a");
    b.await.expect("task b").expect("handle b");

    let session = store
        .get(SENDER)
        .await
        .expect("query ok")
        .expect("session exists");
    assert_eq!(session.step, 3);
    assert_eq!(session.answers.len(), 3);
}

#[tokio::test]
async fn different_senders_proceed_independently() {
    let (engine, store) = engine_with(Arc::new(RecordingSink::default())).await;
    let engine = Arc::new(engine);

    let mut handles = Vec::new();
    for i in 0..5u32 {
        let engine = Arc::clone(&engine);
        handles.push(tokio::spawn(async move {
            let jid = format!("91000000000{i}@s.whatsapp.net");
            engine
                .handle(&jid, "yes", &Thresholds::default())
                .await
                .expect("gate");
            engine
                .handle(&jid, "Acme", &Thresholds::default())
                .await
                .expect("company");
        }));
    }
    for handle in handles {
        handle.await.expect("task");
    }

    for i in 0..5u32 {
        let jid = format!("91000000000{i}@s.whatsapp.net");
        let session = store
            .get(&jid)
            .await
            .expect("query ok")
            .expect("session exists");
        assert_eq!(session.step, 2, "sender {jid} should be at step 2");
    }
}
