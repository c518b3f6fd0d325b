use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{session::VpnSession, user::AppUser};
use crate::repositories::session::{SessionRepository, UsageBreakdown};
use crate::repositories::user::UserRepository;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// A freshly started session.
#[derive(Debug, Clone, Copy)]
pub struct StartedSession {
    pub session_id: Uuid,
}

/// Aggregate usage served by the compact stats view.
#[derive(Debug, Clone, Copy)]
pub struct UsageStats {
    /// Sessions with the active flag set.
    pub connected_users: i64,
    /// Sent plus received bytes across all sessions, in megabytes.
    pub total_data_mb: f64,
}

/// The detailed stats view, overlapping [`UsageStats`] but broken down
/// per device OS and app version.
#[derive(Debug, Clone)]
pub struct DetailedStats {
    pub breakdown: UsageBreakdown,
    /// Derived from the session byte counters; there is no premixed
    /// megabyte column.
    pub total_data_used_mb: f64,
}

/// Looks up or registers the user, then opens a new active session.
pub async fn start_session(
    users: &dyn UserRepository,
    sessions: &dyn SessionRepository,
    external_id: &str,
    device_os: &str,
    app_version: &str,
) -> Result<StartedSession> {
    let user = get_or_create_user(users, external_id, device_os, app_version).await?;
    let session = sessions.create(user.id).await?;
    tracing::debug!(user = %user.external_id, session = %session.id, "session started");
    Ok(StartedSession { session_id: session.id })
}

/// Get-or-create: lookup by the unique external identifier, insert a row
/// only when absent. On a hit the stored fields are never overwritten.
///
/// Two concurrent first sessions for a brand-new identifier may both
/// attempt the insert; the loser of that race re-fetches the winner's row
/// instead of failing.
pub async fn get_or_create_user(
    users: &dyn UserRepository,
    external_id: &str,
    device_os: &str,
    app_version: &str,
) -> Result<AppUser> {
    if let Some(user) = users.find_by_external_id(external_id).await? {
        return Ok(user);
    }
    match users.create(external_id, device_os, app_version).await {
        Ok(user) => Ok(user),
        Err(AppError::Conflict(_)) => {
            users.find_by_external_id(external_id).await?.ok_or_else(|| {
                AppError::Internal(format!("User {} vanished after insert conflict", external_id))
            })
        }
        Err(e) => Err(e),
    }
}

/// Ends a session, storing the final byte counters.
///
/// Unknown ids fail with not-found. Calling this twice on the same
/// session re-applies the new counters and resets the end timestamp; that
/// is the documented behavior, not an accident.
pub async fn end_session(
    sessions: &dyn SessionRepository,
    session_id: Uuid,
    bytes_sent: i64,
    bytes_received: i64,
) -> Result<VpnSession> {
    if bytes_sent < 0 || bytes_received < 0 {
        return Err(AppError::Validation("Byte counters must be non-negative".to_string()));
    }
    let ended = sessions
        .finish(session_id, bytes_sent, bytes_received)
        .await?
        .ok_or_else(|| AppError::NotFound("Invalid session ID".to_string()))?;
    tracing::debug!(session = %ended.id, bytes_sent, bytes_received, "session ended");
    Ok(ended)
}

/// Computes the compact stats view.
pub async fn usage_stats(sessions: &dyn SessionRepository) -> Result<UsageStats> {
    let connected_users = sessions.count_active().await?;
    let totals = sessions.traffic_totals().await?;
    Ok(UsageStats {
        connected_users,
        total_data_mb: to_megabytes(totals.bytes_sent + totals.bytes_received),
    })
}

/// Computes the detailed stats view.
pub async fn detailed_stats(sessions: &dyn SessionRepository) -> Result<DetailedStats> {
    let breakdown = sessions.usage_breakdown().await?;
    let totals = sessions.traffic_totals().await?;
    Ok(DetailedStats {
        breakdown,
        total_data_used_mb: to_megabytes(totals.bytes_sent + totals.bytes_received),
    })
}

/// Rounds a byte count to megabytes with two decimal places.
fn to_megabytes(bytes: i64) -> f64 {
    let mb = bytes as f64 / BYTES_PER_MB;
    (mb * 100.0).round() / 100.0
}
