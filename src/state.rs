use std::sync::Arc;

use tracing::info;

use crate::auth::{
    context::RequestContext,
    jwt::JwtIssuer,
    password::PasswordHasher,
    providers::{AppProvider, UserProvider, UserSaver},
    services::AuthService,
};
use crate::config::{AppConfig, StorageKind};
use crate::storage::{memory::MemoryStorage, postgres::PgStorage};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth: Arc<AuthService>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let (user_saver, user_provider, app_provider): (
            Arc<dyn UserSaver>,
            Arc<dyn UserProvider>,
            Arc<dyn AppProvider>,
        ) = match config.storage {
            StorageKind::Postgres => {
                let url = config
                    .database_url
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is required for postgres"))?;
                let storage =
                    Arc::new(PgStorage::connect(url, config.database_max_connections).await?);
                if let Err(e) = storage.migrate().await {
                    tracing::warn!(error = %e, "migration failed; continuing");
                }
                (storage.clone(), storage.clone(), storage)
            }
            StorageKind::Memory => {
                let storage = Arc::new(MemoryStorage::new());
                if let Some(seed) = &config.seed_app {
                    storage
                        .add_app(seed.id, &seed.name, seed.secret.as_bytes())
                        .await;
                    info!(app_id = seed.id, app = %seed.name, "seeded in-memory app");
                }
                (storage.clone(), storage.clone(), storage)
            }
        };

        let auth = AuthService::new(
            tracing::info_span!("auth"),
            user_saver,
            user_provider,
            app_provider,
            Arc::new(JwtIssuer),
            PasswordHasher::new(config.hash)?,
            config.token_ttl,
        );
        info!(storage = ?config.storage, ttl_secs = config.token_ttl.as_secs(), "auth service ready");

        Ok(Self {
            config,
            auth: Arc::new(auth),
        })
    }

    /// Fresh context bounded by the configured request timeout.
    pub fn request_context(&self) -> RequestContext {
        RequestContext::with_timeout(self.config.request_timeout)
    }

    /// In-memory state with app `1` / `test-secret` provisioned.
    #[cfg(test)]
    pub async fn fake() -> (Self, Arc<MemoryStorage>) {
        use crate::config::HashConfig;
        use std::time::Duration;

        let config = Arc::new(AppConfig {
            storage: StorageKind::Memory,
            database_url: None,
            database_max_connections: 1,
            token_ttl: Duration::from_secs(60 * 60),
            request_timeout: Duration::from_secs(10),
            hash: HashConfig::default(),
            host: "127.0.0.1".into(),
            port: 0,
            seed_app: None,
        });

        let storage = Arc::new(MemoryStorage::new());
        storage.add_app(1, "test", b"test-secret").await;

        let auth = AuthService::new(
            tracing::Span::none(),
            storage.clone(),
            storage.clone(),
            storage.clone(),
            Arc::new(JwtIssuer),
            PasswordHasher::new(config.hash).expect("default params are valid"),
            config.token_ttl,
        );

        (
            Self {
                config,
                auth: Arc::new(auth),
            },
            storage,
        )
    }
}
