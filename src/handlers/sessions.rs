use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::Result, services::sessions as session_service, state::AppState};

/// The request payload for starting a session.
#[derive(Deserialize, Debug)]
pub struct StartSessionRequest {
    pub user_id: String,
    #[serde(default)]
    pub device_os: String,
    #[serde(default)]
    pub app_version: String,
}

/// The response payload for a started session.
#[derive(Serialize)]
pub struct StartSessionResponse {
    pub session_id: Uuid,
    pub status: &'static str,
}

/// Handles `POST /start-session/`.
#[axum::debug_handler]
pub async fn start_session(
    State(state): State<AppState>,
    Json(payload): Json<StartSessionRequest>,
) -> Result<Json<StartSessionResponse>> {
    let started = session_service::start_session(
        state.users.as_ref(),
        state.sessions.as_ref(),
        &payload.user_id,
        &payload.device_os,
        &payload.app_version,
    )
    .await?;

    Ok(Json(StartSessionResponse { session_id: started.session_id, status: "started" }))
}

/// The request payload for ending a session. Absent counters default to
/// zero; non-integer counters are rejected by the extractor.
#[derive(Deserialize, Debug)]
pub struct EndSessionRequest {
    pub session_id: Uuid,
    #[serde(default)]
    pub bytes_sent: i64,
    #[serde(default)]
    pub bytes_received: i64,
}

/// The response payload for an ended session.
#[derive(Serialize)]
pub struct EndSessionResponse {
    pub status: &'static str,
}

/// Handles `POST /end-session/`.
#[axum::debug_handler]
pub async fn end_session(
    State(state): State<AppState>,
    Json(payload): Json<EndSessionRequest>,
) -> Result<Json<EndSessionResponse>> {
    session_service::end_session(
        state.sessions.as_ref(),
        payload.session_id,
        payload.bytes_sent,
        payload.bytes_received,
    )
    .await?;

    Ok(Json(EndSessionResponse { status: "ended" }))
}
