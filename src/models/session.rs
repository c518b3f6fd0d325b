use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A single connected-to-disconnected usage interval for a user.
///
/// A session with no `ended_at` is still active. Ending is a single
/// mutation that sets `ended_at`, clears `active` and stores the final
/// byte counters. There is no guard against ending twice: a second end
/// overwrites the first.
#[derive(Debug, Clone)]
pub struct VpnSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub bytes_sent: i64,
    pub bytes_received: i64,
    pub active: bool,
}
