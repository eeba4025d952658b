use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use serde::Serialize;

use super::AppState;

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub bridge: BridgeReport,
    pub companion: CompanionReport,
}

#[derive(Debug, Serialize)]
pub struct BridgeReport {
    pub reachable: bool,
    pub connected: bool,
    pub phone_number: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CompanionReport {
    pub alive: bool,
}

#[derive(Debug, Serialize)]
pub struct ActiveChats {
    pub count: u64,
}

pub async fn ping() -> &'static str {
    "pong"
}

pub async fn full_status(State(state): State<AppState>) -> Json<StatusReport> {
    let bridge = match state.bridge.status().await {
        Ok(s) => BridgeReport {
            reachable: true,
            connected: s.connected,
            phone_number: s.phone_number,
        },
        Err(_) => BridgeReport {
            reachable: false,
            connected: false,
            phone_number: None,
        },
    };
    let companion = CompanionReport {
        alive: state.companion.ping().await,
    };
    Json(StatusReport { bridge, companion })
}

pub async fn active_chats(
    State(state): State<AppState>,
) -> Result<Json<ActiveChats>, (StatusCode, String)> {
    let count = state
        .store
        .count_active()
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(ActiveChats { count }))
}
