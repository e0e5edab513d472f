use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// User record in the credential store.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,                // assigned by the store
    pub email: String,          // unique across users
    #[serde(skip_serializing)]
    pub password_hash: Vec<u8>, // Argon2 PHC string bytes, never exposed
}

/// Application that tokens are scoped to.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct App {
    pub id: i32,
    pub name: String,
    #[serde(skip_serializing)]
    pub secret: Vec<u8>, // HMAC signing secret
}
