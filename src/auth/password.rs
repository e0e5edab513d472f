use anyhow::Context;
use argon2::{
    password_hash::{
        Error as HashError, PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
    },
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use tracing::error;

use crate::config::HashConfig;

/// Argon2id hasher with a work factor fixed at construction.
///
/// Hashes are stored as the UTF-8 bytes of the PHC string, so salt and
/// parameters travel with the hash.
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl PasswordHasher {
    pub fn new(cfg: HashConfig) -> anyhow::Result<Self> {
        let params = Params::new(cfg.memory_kib, cfg.iterations, cfg.parallelism, None)
            .map_err(|e| anyhow::anyhow!("invalid argon2 params: {e}"))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    pub fn hash(&self, plain: &str) -> anyhow::Result<Vec<u8>> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| {
                error!(error = %e, "argon2 hash_password error");
                anyhow::anyhow!(e.to_string())
            })?
            .to_string();
        Ok(hash.into_bytes())
    }

    /// `Ok(false)` on mismatch, `Err` when the stored hash is unusable.
    pub fn verify(&self, plain: &str, hash: &[u8]) -> anyhow::Result<bool> {
        let encoded = std::str::from_utf8(hash).context("stored hash is not utf-8")?;
        let parsed = PasswordHash::new(encoded).map_err(|e| {
            error!(error = %e, "argon2 parse hash error");
            anyhow::anyhow!(e.to_string())
        })?;
        match self.argon2.verify_password(plain.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(HashError::Password) => Ok(false),
            Err(e) => Err(anyhow::anyhow!("argon2 verify_password error: {e}")),
        }
    }

    /// Runs [`hash`](Self::hash) on the blocking pool.
    pub async fn hash_blocking(&self, plain: &str) -> anyhow::Result<Vec<u8>> {
        let hasher = self.clone();
        let plain = plain.to_owned();
        tokio::task::spawn_blocking(move || hasher.hash(&plain))
            .await
            .context("hash task panicked")?
    }

    /// Runs [`verify`](Self::verify) on the blocking pool.
    pub async fn verify_blocking(&self, plain: &str, hash: &[u8]) -> anyhow::Result<bool> {
        let hasher = self.clone();
        let plain = plain.to_owned();
        let hash = hash.to_vec();
        tokio::task::spawn_blocking(move || hasher.verify(&plain, &hash))
            .await
            .context("verify task panicked")?
    }
}
