use async_trait::async_trait;
use deadpool_postgres::Pool;
use tokio_postgres::{Row, error::SqlState};
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::user::AppUser,
};

/// Storage contract for [`AppUser`] rows.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Finds a user by the identifier the client app reports.
    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<AppUser>>;

    /// Creates a user. Fails with [`AppError::Conflict`] when the external
    /// identifier is already taken.
    async fn create(
        &self,
        external_id: &str,
        device_os: &str,
        app_version: &str,
    ) -> Result<AppUser>;
}

/// A helper function to map a `tokio_postgres::Row` to an `AppUser`.
fn row_to_user(row: &Row) -> Result<AppUser> {
    Ok(AppUser {
        id: row.try_get("id").map_err(|_| AppError::MissingData("id".to_string()))?,
        external_id: row
            .try_get("external_id")
            .map_err(|_| AppError::MissingData("external_id".to_string()))?,
        device_os: row
            .try_get("device_os")
            .map_err(|_| AppError::MissingData("device_os".to_string()))?,
        app_version: row
            .try_get("app_version")
            .map_err(|_| AppError::MissingData("app_version".to_string()))?,
        created_at: row
            .try_get("created_at")
            .map_err(|_| AppError::MissingData("created_at".to_string()))?,
    })
}

/// The PostgreSQL-backed [`UserRepository`].
pub struct PgUserRepository {
    pool: Pool,
}

impl PgUserRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<AppUser>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                r#"
                SELECT id, external_id, device_os, app_version, created_at
                FROM app_users
                WHERE external_id = $1
                "#,
                &[&external_id],
            )
            .await?;
        row.map(|r| row_to_user(&r)).transpose()
    }

    async fn create(
        &self,
        external_id: &str,
        device_os: &str,
        app_version: &str,
    ) -> Result<AppUser> {
        let client = self.pool.get().await?;
        let id = Uuid::new_v4();
        let row = client
            .query_one(
                r#"
                INSERT INTO app_users (id, external_id, device_os, app_version)
                VALUES ($1, $2, $3, $4)
                RETURNING id, external_id, device_os, app_version, created_at
                "#,
                &[&id, &external_id, &device_os, &app_version],
            )
            .await
            .map_err(|e| {
                if e.code() == Some(&SqlState::UNIQUE_VIOLATION) {
                    AppError::Conflict(format!("User {} already exists", external_id))
                } else {
                    AppError::Database(e)
                }
            })?;
        row_to_user(&row)
    }
}
