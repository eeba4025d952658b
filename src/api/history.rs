use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;

use crate::candidates::Candidate;
use crate::store::ChatLogEntry;
use crate::whatsapp::normalize_jid;

use super::AppState;

pub async fn get_history(
    State(state): State<AppState>,
    Path(phone): Path<String>,
) -> Result<Json<Vec<ChatLogEntry>>, (StatusCode, String)> {
    let entries = state
        .store
        .history(&normalize_jid(&phone))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(entries))
}

pub async fn qualified_candidates(
    State(state): State<AppState>,
) -> Result<Json<Vec<Candidate>>, (StatusCode, String)> {
    let candidates = state
        .candidates
        .query_qualified()
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(candidates))
}
