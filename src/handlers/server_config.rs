use std::net::IpAddr;

use axum::{Json, extract::State};
use serde::Serialize;

use crate::{error::Result, services::server_config as config_service, state::AppState};

/// The response payload for the server configuration.
#[derive(Serialize)]
pub struct ServerConfigResponse {
    pub server_ip: IpAddr,
    pub port: i32,
    pub protocol: String,
    pub dns: String,
    pub message: Option<String>,
}

/// Handles `GET /server-config/`.
#[axum::debug_handler]
pub async fn server_config(State(state): State<AppState>) -> Result<Json<ServerConfigResponse>> {
    let config = config_service::current_config(state.server_configs.as_ref()).await?;
    Ok(Json(ServerConfigResponse {
        server_ip: config.server_ip,
        port: config.port,
        protocol: config.protocol,
        dns: config.dns,
        message: config.message,
    }))
}
