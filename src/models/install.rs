use chrono::{DateTime, Utc};
use uuid::Uuid;

/// An app-install event reported by the client. Immutable once recorded.
#[derive(Debug, Clone)]
pub struct AppInstall {
    pub id: Uuid,
    pub user_id: Uuid,
    pub installed_at: DateTime<Utc>,
    pub os_version: String,
    pub app_version: String,
}
