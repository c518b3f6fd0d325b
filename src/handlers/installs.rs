use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::{error::Result, services::installs as install_service, state::AppState};

/// The request payload for reporting an install.
#[derive(Deserialize, Debug)]
pub struct ReportInstallRequest {
    pub user_id: String,
    #[serde(default)]
    pub os_version: String,
    #[serde(default)]
    pub app_version: String,
}

/// The response payload for a recorded install.
#[derive(Serialize)]
pub struct ReportInstallResponse {
    pub status: &'static str,
}

/// Handles `POST /report-install/`.
#[axum::debug_handler]
pub async fn report_install(
    State(state): State<AppState>,
    Json(payload): Json<ReportInstallRequest>,
) -> Result<Json<ReportInstallResponse>> {
    install_service::report_install(
        state.users.as_ref(),
        state.installs.as_ref(),
        &payload.user_id,
        &payload.os_version,
        &payload.app_version,
    )
    .await?;

    Ok(Json(ReportInstallResponse { status: "recorded" }))
}
