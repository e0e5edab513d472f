use std::{str::FromStr, time::Duration};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Which credential store backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Postgres,
    Memory,
}

/// Argon2id work factor. Fixed for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashConfig {
    fn default() -> Self {
        Self {
            memory_kib: 19_456,
            iterations: 2,
            parallelism: 1,
        }
    }
}

/// Application provisioned into the in-memory registry at startup.
#[derive(Debug, Clone)]
pub struct SeedApp {
    pub id: i32,
    pub name: String,
    pub secret: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub storage: StorageKind,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub token_ttl: Duration,
    pub request_timeout: Duration,
    pub hash: HashConfig,
    pub host: String,
    pub port: u16,
    pub seed_app: Option<SeedApp>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let storage = match std::env::var("STORAGE").ok().as_deref() {
            None | Some("postgres") => StorageKind::Postgres,
            Some("memory") => StorageKind::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "STORAGE",
                    value: other.to_string(),
                })
            }
        };

        let database_url = std::env::var("DATABASE_URL").ok();
        if storage == StorageKind::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let defaults = HashConfig::default();
        let hash = HashConfig {
            memory_kib: parse_or("HASH_MEMORY_KIB", defaults.memory_kib)?,
            iterations: parse_or("HASH_ITERATIONS", defaults.iterations)?,
            parallelism: parse_or("HASH_PARALLELISM", defaults.parallelism)?,
        };

        let seed_app = match std::env::var("SEED_APP_ID").ok() {
            Some(raw) => {
                let id = raw.parse::<i32>().map_err(|_| ConfigError::Invalid {
                    name: "SEED_APP_ID",
                    value: raw.clone(),
                })?;
                let secret = std::env::var("SEED_APP_SECRET")
                    .map_err(|_| ConfigError::Missing("SEED_APP_SECRET"))?;
                Some(SeedApp {
                    id,
                    name: std::env::var("SEED_APP_NAME").unwrap_or_else(|_| format!("app-{id}")),
                    secret,
                })
            }
            None => None,
        };

        Ok(Self {
            storage,
            database_url,
            database_max_connections: parse_or("DATABASE_MAX_CONNECTIONS", 10)?,
            token_ttl: minutes("TOKEN_TTL_MINUTES", 120)?,
            request_timeout: Duration::from_millis(parse_or("REQUEST_TIMEOUT_MS", 2000)?),
            hash,
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: parse_or("APP_PORT", 8080)?,
            seed_app,
        })
    }
}

fn minutes(name: &'static str, default: u64) -> Result<Duration, ConfigError> {
    parse_or(name, default)?
        .checked_mul(60)
        .map(Duration::from_secs)
        .ok_or_else(|| ConfigError::Invalid {
            name,
            value: std::env::var(name).unwrap_or_default(),
        })
}

fn parse_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
        Err(_) => Ok(default),
    }
}
