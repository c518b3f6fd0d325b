use async_trait::async_trait;
use deadpool_postgres::Pool;
use tokio_postgres::Row;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::install::AppInstall,
};

/// Storage contract for [`AppInstall`] rows.
#[async_trait]
pub trait InstallRepository: Send + Sync {
    /// Records an immutable install event for the given user.
    async fn create(
        &self,
        user_id: Uuid,
        os_version: &str,
        app_version: &str,
    ) -> Result<AppInstall>;
}

fn row_to_install(row: &Row) -> Result<AppInstall> {
    Ok(AppInstall {
        id: row.try_get("id").map_err(|_| AppError::MissingData("id".to_string()))?,
        user_id: row
            .try_get("user_id")
            .map_err(|_| AppError::MissingData("user_id".to_string()))?,
        installed_at: row
            .try_get("installed_at")
            .map_err(|_| AppError::MissingData("installed_at".to_string()))?,
        os_version: row
            .try_get("os_version")
            .map_err(|_| AppError::MissingData("os_version".to_string()))?,
        app_version: row
            .try_get("app_version")
            .map_err(|_| AppError::MissingData("app_version".to_string()))?,
    })
}

/// The PostgreSQL-backed [`InstallRepository`].
pub struct PgInstallRepository {
    pool: Pool,
}

impl PgInstallRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InstallRepository for PgInstallRepository {
    async fn create(
        &self,
        user_id: Uuid,
        os_version: &str,
        app_version: &str,
    ) -> Result<AppInstall> {
        let client = self.pool.get().await?;
        let id = Uuid::new_v4();
        let row = client
            .query_one(
                r#"
                INSERT INTO app_installs (id, user_id, os_version, app_version)
                VALUES ($1, $2, $3, $4)
                RETURNING id, user_id, installed_at, os_version, app_version
                "#,
                &[&id, &user_id, &os_version, &app_version],
            )
            .await?;
        row_to_install(&row)
    }
}
