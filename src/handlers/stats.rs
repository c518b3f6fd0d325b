use axum::{Json, extract::State};
use serde::Serialize;

use crate::{error::Result, services::sessions as session_service, state::AppState};

/// The compact stats view.
#[derive(Serialize)]
pub struct StatsResponse {
    pub connected_users: i64,
    #[serde(rename = "total_data_MB")]
    pub total_data_mb: f64,
}

/// Handles `GET /stats/`.
#[axum::debug_handler]
pub async fn stats(State(state): State<AppState>) -> Result<Json<StatsResponse>> {
    let usage = session_service::usage_stats(state.sessions.as_ref()).await?;
    Ok(Json(StatsResponse {
        connected_users: usage.connected_users,
        total_data_mb: usage.total_data_mb,
    }))
}

#[derive(Serialize)]
pub struct OsVersionCount {
    pub device_os: String,
    pub count: i64,
}

#[derive(Serialize)]
pub struct AppVersionCount {
    pub app_version: String,
    pub count: i64,
}

/// The detailed stats view.
#[derive(Serialize)]
pub struct DetailedStatsResponse {
    pub total_users: i64,
    pub total_sessions: i64,
    pub active_sessions: i64,
    pub total_data_used_mb: f64,
    pub top_os_versions: Vec<OsVersionCount>,
    pub top_app_versions: Vec<AppVersionCount>,
}

/// Handles `GET /stats/detailed/`.
#[axum::debug_handler]
pub async fn detailed_stats(State(state): State<AppState>) -> Result<Json<DetailedStatsResponse>> {
    let detailed = session_service::detailed_stats(state.sessions.as_ref()).await?;
    let breakdown = detailed.breakdown;

    Ok(Json(DetailedStatsResponse {
        total_users: breakdown.total_users,
        total_sessions: breakdown.total_sessions,
        active_sessions: breakdown.active_sessions,
        total_data_used_mb: detailed.total_data_used_mb,
        top_os_versions: breakdown
            .by_device_os
            .into_iter()
            .map(|g| OsVersionCount { device_os: g.name, count: g.count })
            .collect(),
        top_app_versions: breakdown
            .by_app_version
            .into_iter()
            .map(|g| AppVersionCount { app_version: g.name, count: g.count })
            .collect(),
    }))
}
