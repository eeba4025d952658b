//! Admin HTTP surface.
//!
//! A small localhost-facing API for the operator: liveness, bridge and
//! companion status, session diagnostics, manual notifications, settings
//! hot-reload, and campaign seeding. It is not candidate-facing and has no
//! auth of its own; bind it to a loopback address.

mod admin;
mod history;
mod status;

use std::sync::Arc;

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::campaign::Campaign;
use crate::candidates::CandidateSink;
use crate::companion::CompanionProbe;
use crate::notify::AdminNotifier;
use crate::settings::SettingsHandle;
use crate::store::SessionStore;
use crate::whatsapp::client::BridgeClient;

/// Shared state for the admin API handlers.
#[derive(Clone)]
pub struct AppState {
    /// Session and chat-log store.
    pub store: SessionStore,
    /// Completed-screening candidate store.
    pub candidates: Arc<dyn CandidateSink>,
    /// Runtime settings handle.
    pub settings: Arc<SettingsHandle>,
    /// Admin escalation sender.
    pub notifier: Arc<AdminNotifier>,
    /// Campaign initiator.
    pub campaign: Arc<Campaign>,
    /// WhatsApp bridge client, for status reporting.
    pub bridge: BridgeClient,
    /// Companion liveness probe.
    pub companion: CompanionProbe,
}

/// Build the admin API router over the given state.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/ping", get(status::ping))
        .route("/status", get(status::full_status))
        .route("/active-chats", get(status::active_chats))
        .route("/notify", post(admin::send_notification))
        .route("/settings", get(admin::get_settings))
        .route("/settings", put(admin::put_settings))
        .route("/campaign/seed", post(admin::seed_campaign))
        .route("/history/{phone}", get(history::get_history))
        .route("/candidates/qualified", get(history::qualified_candidates))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
