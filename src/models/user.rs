use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Represents a VPN client user.
///
/// Users are registered implicitly, through get-or-create, the first time
/// the app reports a session or an install under a new identifier. On a
/// hit the stored fields are never overwritten.
#[derive(Debug, Clone)]
pub struct AppUser {
    /// The unique identifier for the user row.
    pub id: Uuid,
    /// The opaque identifier the client app reports. Unique across users.
    pub external_id: String,
    /// The device operating system reported at first sight (may be empty).
    pub device_os: String,
    /// The app version reported at first sight (may be empty).
    pub app_version: String,
    /// The timestamp when the user was first seen.
    pub created_at: DateTime<Utc>,
}
