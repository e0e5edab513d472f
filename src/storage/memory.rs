use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::StorageError;
use crate::auth::{
    providers::{AppProvider, UserProvider, UserSaver},
    repo_types::{App, User},
};

#[derive(Default)]
struct Inner {
    next_id: i64,
    users: HashMap<i64, (User, bool)>,
    by_email: HashMap<String, i64>,
    apps: HashMap<i32, App>,
}

/// Process-local store. Uniqueness of email is checked and the row inserted
/// under one write lock.
#[derive(Default)]
pub struct MemoryStorage {
    inner: RwLock<Inner>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_app(&self, id: i32, name: &str, secret: &[u8]) {
        let app = App {
            id,
            name: name.to_string(),
            secret: secret.to_vec(),
        };
        self.inner.write().await.apps.insert(id, app);
    }

    /// Sets the admin flag; returns `false` for an unknown user.
    pub async fn set_admin(&self, user_id: i64, is_admin: bool) -> bool {
        match self.inner.write().await.users.get_mut(&user_id) {
            Some((_, flag)) => {
                *flag = is_admin;
                true
            }
            None => false,
        }
    }

    pub async fn user_count(&self) -> usize {
        self.inner.read().await.users.len()
    }
}

#[async_trait]
impl UserSaver for MemoryStorage {
    async fn save_user(&self, email: &str, password_hash: &[u8]) -> Result<i64, StorageError> {
        let mut inner = self.inner.write().await;
        if inner.by_email.contains_key(email) {
            return Err(StorageError::UserExists);
        }
        inner.next_id += 1;
        let id = inner.next_id;
        let user = User {
            id,
            email: email.to_string(),
            password_hash: password_hash.to_vec(),
        };
        inner.by_email.insert(user.email.clone(), id);
        inner.users.insert(id, (user, false));
        Ok(id)
    }
}

#[async_trait]
impl UserProvider for MemoryStorage {
    async fn user(&self, email: &str) -> Result<User, StorageError> {
        let inner = self.inner.read().await;
        inner
            .by_email
            .get(email)
            .and_then(|id| inner.users.get(id))
            .map(|(user, _)| user.clone())
            .ok_or(StorageError::UserNotFound)
    }

    async fn is_admin(&self, user_id: i64) -> Result<bool, StorageError> {
        self.inner
            .read()
            .await
            .users
            .get(&user_id)
            .map(|(_, is_admin)| *is_admin)
            .ok_or(StorageError::AppNotFound)
    }
}

#[async_trait]
impl AppProvider for MemoryStorage {
    async fn app(&self, app_id: i32) -> Result<App, StorageError> {
        self.inner
            .read()
            .await
            .apps
            .get(&app_id)
            .cloned()
            .ok_or(StorageError::AppNotFound)
    }
}
