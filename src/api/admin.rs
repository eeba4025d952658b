use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};

use crate::campaign::CampaignReport;
use crate::settings::BotSettings;

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct NotifyRequest {
    /// Defaults to the configured admin number when absent.
    pub recipient: Option<String>,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct NotifyResponse {
    pub sent: bool,
}

#[derive(Debug, Deserialize)]
pub struct SeedRequest {
    pub numbers: Vec<String>,
}

pub async fn send_notification(
    State(state): State<AppState>,
    Json(req): Json<NotifyRequest>,
) -> Result<Json<NotifyResponse>, (StatusCode, String)> {
    let recipient = match req.recipient {
        Some(r) => r,
        None => state.settings.snapshot().await.admin_number.clone(),
    };
    if recipient.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "no recipient given and no admin number configured".to_owned(),
        ));
    }

    state
        .notifier
        .notify_raw(&recipient, &req.message)
        .await
        .map_err(|e| (StatusCode::BAD_GATEWAY, e.to_string()))?;
    Ok(Json(NotifyResponse { sent: true }))
}

pub async fn get_settings(State(state): State<AppState>) -> Json<BotSettings> {
    Json((*state.settings.snapshot().await).clone())
}

/// Whole-snapshot replacement; the next message handled uses the new values.
pub async fn put_settings(
    State(state): State<AppState>,
    Json(settings): Json<BotSettings>,
) -> Json<BotSettings> {
    state.settings.replace(settings.clone()).await;
    Json(settings)
}

pub async fn seed_campaign(
    State(state): State<AppState>,
    Json(req): Json<SeedRequest>,
) -> Result<Json<CampaignReport>, (StatusCode, String)> {
    if req.numbers.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "no numbers given".to_owned()));
    }
    let report = state.campaign.seed(&req.numbers).await;
    Ok(Json(report))
}
