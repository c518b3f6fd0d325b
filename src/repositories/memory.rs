//! An in-memory store for the test suite.
//!
//! One struct implements every repository trait so that cross-table
//! queries (the detailed-stats join) see a consistent view of the data.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{
        install::AppInstall,
        server_config::{NewServerConfig, ServerConfig},
        session::VpnSession,
        user::AppUser,
    },
};

use super::{
    install::InstallRepository,
    server_config::ServerConfigRepository,
    session::{GroupCount, SessionRepository, TrafficTotals, UsageBreakdown},
    user::UserRepository,
};

#[derive(Default)]
struct Tables {
    users: Vec<AppUser>,
    sessions: Vec<VpnSession>,
    installs: Vec<AppInstall>,
    configs: Vec<ServerConfig>,
}

/// An in-memory implementation of all four repositories.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of user rows. Test inspection helper.
    pub fn user_count(&self) -> usize {
        self.tables.lock().unwrap().users.len()
    }

    /// The number of recorded installs. Test inspection helper.
    pub fn install_count(&self) -> usize {
        self.tables.lock().unwrap().installs.len()
    }
}

fn group_sessions<F>(tables: &Tables, key: F) -> Vec<GroupCount>
where
    F: Fn(&AppUser) -> &str,
{
    let mut counts: HashMap<String, i64> = HashMap::new();
    for session in &tables.sessions {
        if let Some(user) = tables.users.iter().find(|u| u.id == session.user_id) {
            *counts.entry(key(user).to_string()).or_insert(0) += 1;
        }
    }
    let mut groups: Vec<GroupCount> = counts
        .into_iter()
        .map(|(name, count)| GroupCount { name, count })
        .collect();
    groups.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    groups
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<AppUser>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.users.iter().find(|u| u.external_id == external_id).cloned())
    }

    async fn create(
        &self,
        external_id: &str,
        device_os: &str,
        app_version: &str,
    ) -> Result<AppUser> {
        let mut tables = self.tables.lock().unwrap();
        if tables.users.iter().any(|u| u.external_id == external_id) {
            return Err(AppError::Conflict(format!("User {} already exists", external_id)));
        }
        let user = AppUser {
            id: Uuid::new_v4(),
            external_id: external_id.to_string(),
            device_os: device_os.to_string(),
            app_version: app_version.to_string(),
            created_at: Utc::now(),
        };
        tables.users.push(user.clone());
        Ok(user)
    }
}

#[async_trait]
impl SessionRepository for MemoryStore {
    async fn create(&self, user_id: Uuid) -> Result<VpnSession> {
        let session = VpnSession {
            id: Uuid::new_v4(),
            user_id,
            started_at: Utc::now(),
            ended_at: None,
            bytes_sent: 0,
            bytes_received: 0,
            active: true,
        };
        self.tables.lock().unwrap().sessions.push(session.clone());
        Ok(session)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<VpnSession>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.sessions.iter().find(|s| s.id == id).cloned())
    }

    async fn finish(
        &self,
        id: Uuid,
        bytes_sent: i64,
        bytes_received: i64,
    ) -> Result<Option<VpnSession>> {
        let mut tables = self.tables.lock().unwrap();
        let Some(session) = tables.sessions.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };
        session.ended_at = Some(Utc::now());
        session.active = false;
        session.bytes_sent = bytes_sent;
        session.bytes_received = bytes_received;
        Ok(Some(session.clone()))
    }

    async fn count_active(&self) -> Result<i64> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.sessions.iter().filter(|s| s.active).count() as i64)
    }

    async fn traffic_totals(&self) -> Result<TrafficTotals> {
        let tables = self.tables.lock().unwrap();
        Ok(TrafficTotals {
            bytes_sent: tables.sessions.iter().map(|s| s.bytes_sent).sum(),
            bytes_received: tables.sessions.iter().map(|s| s.bytes_received).sum(),
        })
    }

    async fn usage_breakdown(&self) -> Result<UsageBreakdown> {
        let tables = self.tables.lock().unwrap();
        let distinct_users: HashSet<Uuid> = tables.sessions.iter().map(|s| s.user_id).collect();
        Ok(UsageBreakdown {
            total_users: distinct_users.len() as i64,
            total_sessions: tables.sessions.len() as i64,
            active_sessions: tables.sessions.iter().filter(|s| s.ended_at.is_none()).count()
                as i64,
            by_device_os: group_sessions(&tables, |u| u.device_os.as_str()),
            by_app_version: group_sessions(&tables, |u| u.app_version.as_str()),
        })
    }
}

#[async_trait]
impl InstallRepository for MemoryStore {
    async fn create(
        &self,
        user_id: Uuid,
        os_version: &str,
        app_version: &str,
    ) -> Result<AppInstall> {
        let install = AppInstall {
            id: Uuid::new_v4(),
            user_id,
            installed_at: Utc::now(),
            os_version: os_version.to_string(),
            app_version: app_version.to_string(),
        };
        self.tables.lock().unwrap().installs.push(install.clone());
        Ok(install)
    }
}

#[async_trait]
impl ServerConfigRepository for MemoryStore {
    async fn latest(&self) -> Result<Option<ServerConfig>> {
        let tables = self.tables.lock().unwrap();
        // `>=` so that of two rows saved within one clock tick the later
        // insert wins, matching insertion order.
        let mut latest: Option<&ServerConfig> = None;
        for config in &tables.configs {
            if latest.is_none_or(|current| config.updated_at >= current.updated_at) {
                latest = Some(config);
            }
        }
        Ok(latest.cloned())
    }

    async fn save(&self, new: NewServerConfig) -> Result<ServerConfig> {
        if new.port <= 0 {
            return Err(AppError::Validation("Port must be positive".to_string()));
        }
        let config = ServerConfig {
            id: Uuid::new_v4(),
            server_ip: new.server_ip,
            port: new.port,
            protocol: new.protocol,
            dns: new.dns,
            message: new.message,
            updated_at: Utc::now(),
        };
        self.tables.lock().unwrap().configs.push(config.clone());
        Ok(config)
    }
}
