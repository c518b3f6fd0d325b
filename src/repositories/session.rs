use async_trait::async_trait;
use deadpool_postgres::Pool;
use tokio_postgres::Row;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::session::VpnSession,
};

/// Aggregate byte counters over all sessions. Empty tables sum to zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrafficTotals {
    pub bytes_sent: i64,
    pub bytes_received: i64,
}

/// The number of sessions sharing one device OS or one app version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupCount {
    pub name: String,
    pub count: i64,
}

/// The raw numbers behind the detailed stats view.
#[derive(Debug, Clone, Default)]
pub struct UsageBreakdown {
    /// Distinct users appearing in sessions.
    pub total_users: i64,
    pub total_sessions: i64,
    /// Sessions that were never ended (`ended_at` unset).
    pub active_sessions: i64,
    /// Sessions grouped by the owning user's device OS, descending by count.
    pub by_device_os: Vec<GroupCount>,
    /// Sessions grouped by the owning user's app version, descending by count.
    pub by_app_version: Vec<GroupCount>,
}

/// Storage contract for [`VpnSession`] rows and their aggregates.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Opens a new active session with zeroed counters.
    async fn create(&self, user_id: Uuid) -> Result<VpnSession>;

    /// Finds a session by its identifier.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<VpnSession>>;

    /// Ends a session: stamps `ended_at`, clears `active` and stores the
    /// counters. Returns `None` when the id is unknown. Re-ending an
    /// already-ended session overwrites the previous result.
    async fn finish(
        &self,
        id: Uuid,
        bytes_sent: i64,
        bytes_received: i64,
    ) -> Result<Option<VpnSession>>;

    /// Counts sessions with the active flag set.
    async fn count_active(&self) -> Result<i64>;

    /// Sums the byte counters across all sessions.
    async fn traffic_totals(&self) -> Result<TrafficTotals>;

    /// Computes the detailed usage aggregates in one pass.
    async fn usage_breakdown(&self) -> Result<UsageBreakdown>;
}

/// A helper function to map a `tokio_postgres::Row` to a `VpnSession`.
fn row_to_session(row: &Row) -> Result<VpnSession> {
    Ok(VpnSession {
        id: row.try_get("id").map_err(|_| AppError::MissingData("id".to_string()))?,
        user_id: row
            .try_get("user_id")
            .map_err(|_| AppError::MissingData("user_id".to_string()))?,
        started_at: row
            .try_get("started_at")
            .map_err(|_| AppError::MissingData("started_at".to_string()))?,
        ended_at: row
            .try_get("ended_at")
            .map_err(|_| AppError::MissingData("ended_at".to_string()))?,
        bytes_sent: row
            .try_get("bytes_sent")
            .map_err(|_| AppError::MissingData("bytes_sent".to_string()))?,
        bytes_received: row
            .try_get("bytes_received")
            .map_err(|_| AppError::MissingData("bytes_received".to_string()))?,
        active: row.try_get("active").map_err(|_| AppError::MissingData("active".to_string()))?,
    })
}

fn row_to_group(row: &Row) -> Result<GroupCount> {
    Ok(GroupCount {
        name: row.try_get("name").map_err(|_| AppError::MissingData("name".to_string()))?,
        count: row.try_get("count").map_err(|_| AppError::MissingData("count".to_string()))?,
    })
}

/// The PostgreSQL-backed [`SessionRepository`].
pub struct PgSessionRepository {
    pool: Pool,
}

impl PgSessionRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    async fn create(&self, user_id: Uuid) -> Result<VpnSession> {
        let client = self.pool.get().await?;
        let id = Uuid::new_v4();
        let row = client
            .query_one(
                r#"
                INSERT INTO vpn_sessions (id, user_id)
                VALUES ($1, $2)
                RETURNING id, user_id, started_at, ended_at, bytes_sent, bytes_received, active
                "#,
                &[&id, &user_id],
            )
            .await?;
        row_to_session(&row)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<VpnSession>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                r#"
                SELECT id, user_id, started_at, ended_at, bytes_sent, bytes_received, active
                FROM vpn_sessions
                WHERE id = $1
                "#,
                &[&id],
            )
            .await?;
        row.map(|r| row_to_session(&r)).transpose()
    }

    async fn finish(
        &self,
        id: Uuid,
        bytes_sent: i64,
        bytes_received: i64,
    ) -> Result<Option<VpnSession>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                r#"
                UPDATE vpn_sessions
                SET ended_at = now(), active = FALSE, bytes_sent = $2, bytes_received = $3
                WHERE id = $1
                RETURNING id, user_id, started_at, ended_at, bytes_sent, bytes_received, active
                "#,
                &[&id, &bytes_sent, &bytes_received],
            )
            .await?;
        row.map(|r| row_to_session(&r)).transpose()
    }

    async fn count_active(&self) -> Result<i64> {
        let client = self.pool.get().await?;
        let row = client
            .query_one(
                r#"
                SELECT COUNT(*) AS connected
                FROM vpn_sessions
                WHERE active
                "#,
                &[],
            )
            .await?;
        row.try_get("connected").map_err(|_| AppError::MissingData("connected".to_string()))
    }

    async fn traffic_totals(&self) -> Result<TrafficTotals> {
        let client = self.pool.get().await?;
        let row = client
            .query_one(
                r#"
                SELECT COALESCE(SUM(bytes_sent), 0)::BIGINT AS bytes_sent,
                       COALESCE(SUM(bytes_received), 0)::BIGINT AS bytes_received
                FROM vpn_sessions
                "#,
                &[],
            )
            .await?;
        Ok(TrafficTotals {
            bytes_sent: row
                .try_get("bytes_sent")
                .map_err(|_| AppError::MissingData("bytes_sent".to_string()))?,
            bytes_received: row
                .try_get("bytes_received")
                .map_err(|_| AppError::MissingData("bytes_received".to_string()))?,
        })
    }

    async fn usage_breakdown(&self) -> Result<UsageBreakdown> {
        let client = self.pool.get().await?;

        let counts = client
            .query_one(
                r#"
                SELECT COUNT(DISTINCT user_id) AS total_users,
                       COUNT(*) AS total_sessions,
                       COUNT(*) FILTER (WHERE ended_at IS NULL) AS active_sessions
                FROM vpn_sessions
                "#,
                &[],
            )
            .await?;

        let by_device_os = client
            .query(
                r#"
                SELECT u.device_os AS name, COUNT(*) AS count
                FROM vpn_sessions s
                JOIN app_users u ON u.id = s.user_id
                GROUP BY u.device_os
                ORDER BY COUNT(*) DESC, u.device_os
                "#,
                &[],
            )
            .await?
            .iter()
            .map(row_to_group)
            .collect::<Result<Vec<_>>>()?;

        let by_app_version = client
            .query(
                r#"
                SELECT u.app_version AS name, COUNT(*) AS count
                FROM vpn_sessions s
                JOIN app_users u ON u.id = s.user_id
                GROUP BY u.app_version
                ORDER BY COUNT(*) DESC, u.app_version
                "#,
                &[],
            )
            .await?
            .iter()
            .map(row_to_group)
            .collect::<Result<Vec<_>>>()?;

        Ok(UsageBreakdown {
            total_users: counts
                .try_get("total_users")
                .map_err(|_| AppError::MissingData("total_users".to_string()))?,
            total_sessions: counts
                .try_get("total_sessions")
                .map_err(|_| AppError::MissingData("total_sessions".to_string()))?,
            active_sessions: counts
                .try_get("active_sessions")
                .map_err(|_| AppError::MissingData("active_sessions".to_string()))?,
            by_device_os,
            by_app_version,
        })
    }
}
