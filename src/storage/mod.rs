pub mod memory;
pub mod postgres;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("user already exists")]
    UserExists,
    #[error("user not found")]
    UserNotFound,
    #[error("app not found")]
    AppNotFound,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}
