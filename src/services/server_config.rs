use crate::error::{AppError, Result};
use crate::models::server_config::ServerConfig;
use crate::repositories::server_config::ServerConfigRepository;

/// Returns the authoritative server configuration.
///
/// Many rows may exist; only the most recently updated one counts.
pub async fn current_config(configs: &dyn ServerConfigRepository) -> Result<ServerConfig> {
    configs.latest().await?.ok_or_else(|| AppError::NotFound("No config found".to_string()))
}
