use std::net::IpAddr;

use async_trait::async_trait;
use deadpool_postgres::Pool;
use tokio_postgres::Row;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::server_config::{NewServerConfig, ServerConfig},
};

/// Storage contract for [`ServerConfig`] rows.
#[async_trait]
pub trait ServerConfigRepository: Send + Sync {
    /// Returns the most recently updated configuration row, if any.
    async fn latest(&self) -> Result<Option<ServerConfig>>;

    /// Inserts a configuration row, stamping `updated_at`. This is the
    /// out-of-band write path; the HTTP API never calls it.
    async fn save(&self, new: NewServerConfig) -> Result<ServerConfig>;
}

/// A helper function to map a `tokio_postgres::Row` to a `ServerConfig`.
fn row_to_config(row: &Row) -> Result<ServerConfig> {
    let server_ip: String = row
        .try_get("server_ip")
        .map_err(|_| AppError::MissingData("server_ip".to_string()))?;
    let server_ip: IpAddr = server_ip
        .parse()
        .map_err(|_| AppError::Internal(format!("Malformed server_ip: {}", server_ip)))?;
    Ok(ServerConfig {
        id: row.try_get("id").map_err(|_| AppError::MissingData("id".to_string()))?,
        server_ip,
        port: row.try_get("port").map_err(|_| AppError::MissingData("port".to_string()))?,
        protocol: row
            .try_get("protocol")
            .map_err(|_| AppError::MissingData("protocol".to_string()))?,
        dns: row.try_get("dns").map_err(|_| AppError::MissingData("dns".to_string()))?,
        message: row
            .try_get("message")
            .map_err(|_| AppError::MissingData("message".to_string()))?,
        updated_at: row
            .try_get("updated_at")
            .map_err(|_| AppError::MissingData("updated_at".to_string()))?,
    })
}

/// The PostgreSQL-backed [`ServerConfigRepository`].
pub struct PgServerConfigRepository {
    pool: Pool,
}

impl PgServerConfigRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ServerConfigRepository for PgServerConfigRepository {
    async fn latest(&self) -> Result<Option<ServerConfig>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                r#"
                SELECT id, server_ip, port, protocol, dns, message, updated_at
                FROM server_configs
                ORDER BY updated_at DESC
                LIMIT 1
                "#,
                &[],
            )
            .await?;
        row.map(|r| row_to_config(&r)).transpose()
    }

    async fn save(&self, new: NewServerConfig) -> Result<ServerConfig> {
        if new.port <= 0 {
            return Err(AppError::Validation("Port must be positive".to_string()));
        }
        let client = self.pool.get().await?;
        let id = Uuid::new_v4();
        let row = client
            .query_one(
                r#"
                INSERT INTO server_configs (id, server_ip, port, protocol, dns, message)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING id, server_ip, port, protocol, dns, message, updated_at
                "#,
                &[
                    &id,
                    &new.server_ip.to_string(),
                    &new.port,
                    &new.protocol,
                    &new.dns,
                    &new.message,
                ],
            )
            .await?;
        row_to_config(&row)
    }
}
