//! Narrow capabilities the authentication service needs from storage.
//!
//! Each trait can be backed by a different store; the bundled
//! [`PgStorage`](crate::storage::postgres::PgStorage) and
//! [`MemoryStorage`](crate::storage::memory::MemoryStorage) implement all three.

use async_trait::async_trait;

use super::repo_types::{App, User};
use crate::storage::StorageError;

#[async_trait]
pub trait UserSaver: Send + Sync {
    /// Fails with [`StorageError::UserExists`] when the email is taken.
    async fn save_user(&self, email: &str, password_hash: &[u8]) -> Result<i64, StorageError>;
}

#[async_trait]
pub trait UserProvider: Send + Sync {
    /// Fails with [`StorageError::UserNotFound`] for an unknown email.
    async fn user(&self, email: &str) -> Result<User, StorageError>;

    /// Fails with [`StorageError::AppNotFound`] when no such user exists.
    async fn is_admin(&self, user_id: i64) -> Result<bool, StorageError>;
}

#[async_trait]
pub trait AppProvider: Send + Sync {
    /// Fails with [`StorageError::AppNotFound`] for an unknown id.
    async fn app(&self, app_id: i32) -> Result<App, StorageError>;
}
