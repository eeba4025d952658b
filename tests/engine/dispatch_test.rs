//! Tests for the dispatcher: strategy routing and outcome delivery.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use sifter::engine::dispatch::Dispatcher;
use sifter::engine::strategy::{LlmStrategy, ScriptedStrategy};
use sifter::notify::AdminNotifier;
use sifter::settings::{BotSettings, SettingsHandle};
use sifter::whatsapp::Outbound;

use crate::common::{engine_with, EchoProvider, RecordingOutbound, RecordingSink, SCREENING_ANSWERS};

const SENDER: &str = "919876543210@s.whatsapp.net";
const ADMIN_JID: &str = "918888888888@s.whatsapp.net";

fn settings(ai_mode: bool) -> Arc<SettingsHandle> {
    Arc::new(SettingsHandle::new(BotSettings {
        admin_number: "918888888888".to_owned(),
        initial_messages: Vec::new(),
        numbers_per_batch: 50,
        message_delay_ms: 0,
        thresholds: sifter::qualify::Thresholds::default(),
        ai_mode,
    }))
}

async fn dispatcher_with(
    sink: Arc<RecordingSink>,
    outbound: Arc<RecordingOutbound>,
    llm: Option<LlmStrategy>,
    ai_mode: bool,
) -> Dispatcher {
    let (engine, _store) = engine_with(sink).await;
    let transport: Arc<dyn Outbound> = outbound;
    Dispatcher::new(
        ScriptedStrategy::new(Arc::new(engine)),
        llm,
        settings(ai_mode),
        Arc::clone(&transport),
        AdminNotifier::new(transport),
    )
}

#[tokio::test]
async fn replies_go_to_the_candidate() {
    let outbound = Arc::new(RecordingOutbound::default());
    let dispatcher = dispatcher_with(
        Arc::new(RecordingSink::default()),
        Arc::clone(&outbound),
        None,
        false,
    )
    .await;

    dispatcher.dispatch(SENDER, "yes").await;

    let sent = outbound.sent_to(SENDER);
    assert_eq!(sent, ["Currently in which company are you working?"]);
    assert!(outbound.sent_to(ADMIN_JID).is_empty());
}

#[tokio::test]
async fn gate_rejection_sends_nothing() {
    let outbound = Arc::new(RecordingOutbound::default());
    let dispatcher = dispatcher_with(
        Arc::new(RecordingSink::default()),
        Arc::clone(&outbound),
        None,
        false,
    )
    .await;

    dispatcher.dispatch(SENDER, "wrong number").await;

    assert!(outbound.sent.lock().expect("outbound lock").is_empty());
}

#[tokio::test]
async fn completion_notifies_the_admin_not_the_candidate() {
    let outbound = Arc::new(RecordingOutbound::default());
    let dispatcher = dispatcher_with(
        Arc::new(RecordingSink::default()),
        Arc::clone(&outbound),
        None,
        false,
    )
    .await;

    dispatcher.dispatch(SENDER, "yes").await;
    for answer in SCREENING_ANSWERS {
        dispatcher.dispatch(SENDER, answer).await;
    }

    // The candidate got one prompt per intermediate step and nothing for
    // the terminal message.
    assert_eq!(outbound.sent_to(SENDER).len(), 6);

    let admin = outbound.sent_to(ADMIN_JID);
    assert_eq!(admin.len(), 1);
    assert!(admin[0].starts_with("\u{2705} Info collected from user: 919876543210"));
    assert!(admin[0].contains("company: Acme Corp"));
}

#[tokio::test]
async fn engine_failure_escalates_to_the_admin() {
    let sink = Arc::new(RecordingSink::default());
    let outbound = Arc::new(RecordingOutbound::default());
    let dispatcher =
        dispatcher_with(Arc::clone(&sink), Arc::clone(&outbound), None, false).await;

    dispatcher.dispatch(SENDER, "yes").await;
    for answer in &SCREENING_ANSWERS[..5] {
        dispatcher.dispatch(SENDER, answer).await;
    }

    sink.fail_next.store(true, Ordering::SeqCst);
    dispatcher.dispatch(SENDER, SCREENING_ANSWERS[5]).await;

    let admin = outbound.sent_to(ADMIN_JID);
    assert_eq!(admin.len(), 1);
    assert!(admin[0].starts_with("\u{26a0}\u{fe0f} Bot error for user: 919876543210"));
}

#[tokio::test]
async fn send_failure_is_swallowed_and_state_keeps_advancing() {
    let sink = Arc::new(RecordingSink::default());
    let outbound = Arc::new(RecordingOutbound::default());
    outbound.fail_all.store(true, Ordering::SeqCst);

    let (engine, store) = engine_with(sink).await;
    let transport: Arc<dyn Outbound> = Arc::clone(&outbound) as Arc<dyn Outbound>;
    let dispatcher = Dispatcher::new(
        ScriptedStrategy::new(Arc::new(engine)),
        None,
        settings(false),
        Arc::clone(&transport),
        AdminNotifier::new(transport),
    );

    // The prompt is lost but the session still advanced.
    dispatcher.dispatch(SENDER, "yes").await;

    let session = store
        .get(SENDER)
        .await
        .expect("query ok")
        .expect("session exists");
    assert_eq!(session.step, 1);
}

#[tokio::test]
async fn ai_mode_without_a_provider_escalates() {
    let outbound = Arc::new(RecordingOutbound::default());
    let dispatcher = dispatcher_with(
        Arc::new(RecordingSink::default()),
        Arc::clone(&outbound),
        None,
        true,
    )
    .await;

    dispatcher.dispatch(SENDER, "hello").await;

    assert!(outbound.sent_to(SENDER).is_empty());
    let admin = outbound.sent_to(ADMIN_JID);
    assert_eq!(admin.len(), 1);
    assert!(admin[0].contains("no completion provider"));
}

#[tokio::test]
async fn ai_mode_routes_to_the_llm_strategy() {
    let outbound = Arc::new(RecordingOutbound::default());
    let store = crate::common::mem_store().await;
    let llm = LlmStrategy::new(
        Arc::new(EchoProvider::default()),
        store,
        "persona".to_owned(),
    );
    let dispatcher = dispatcher_with(
        Arc::new(RecordingSink::default()),
        Arc::clone(&outbound),
        Some(llm),
        true,
    )
    .await;

    dispatcher.dispatch(SENDER, "tell me about the role").await;

    assert_eq!(
        outbound.sent_to(SENDER),
        ["echo: tell me about the role"]
    );
    assert!(outbound.sent_to(ADMIN_JID).is_empty());
}
