use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::repositories::install::{InstallRepository, PgInstallRepository};
use crate::repositories::memory::MemoryStore;
use crate::repositories::server_config::{PgServerConfigRepository, ServerConfigRepository};
use crate::repositories::session::{PgSessionRepository, SessionRepository};
use crate::repositories::user::{PgUserRepository, UserRepository};

/// The application's state: one repository handle per record type.
#[derive(Clone)]
pub struct AppState {
    /// The user repository.
    pub users: Arc<dyn UserRepository>,
    /// The session repository.
    pub sessions: Arc<dyn SessionRepository>,
    /// The install repository.
    pub installs: Arc<dyn InstallRepository>,
    /// The server-configuration repository.
    pub server_configs: Arc<dyn ServerConfigRepository>,
    /// The application's configuration.
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates the PostgreSQL-backed state: builds the pool, applies the
    /// schema and wires one repository per record type.
    pub async fn new(config: &Config) -> Result<Self> {
        let pool = crate::db::create_pool(&config.database_url)?;
        crate::db::init_schema(&pool).await?;
        tracing::info!("✅ Database schema applied");

        Ok(Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            sessions: Arc::new(PgSessionRepository::new(pool.clone())),
            installs: Arc::new(PgInstallRepository::new(pool.clone())),
            server_configs: Arc::new(PgServerConfigRepository::new(pool)),
            config: Arc::new(config.clone()),
        })
    }

    /// A state backed entirely by one [`MemoryStore`], returned alongside
    /// the store so tests can inspect and seed it directly.
    pub fn in_memory() -> (Self, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let state = Self {
            users: store.clone(),
            sessions: store.clone(),
            installs: store.clone(),
            server_configs: store.clone(),
            config: Arc::new(Config {
                database_url: String::new(),
                host: "127.0.0.1".to_string(),
                port: 0,
            }),
        };
        (state, store)
    }
}
