//! Orchestration of registration, login and privilege lookup.
//!
//! The service holds no mutable state. Each operation is a single linear
//! sequence of collaborator calls that either completes or stops at the first
//! failing step; nothing is retried.

use std::{sync::Arc, time::Duration};

use tracing::{error, info, info_span, warn, Instrument, Span};

use super::{
    context::RequestContext,
    errors::AuthError,
    jwt::TokenIssuer,
    password::PasswordHasher,
    providers::{AppProvider, UserProvider, UserSaver},
};
use crate::storage::StorageError;

pub struct AuthService {
    log: Span,
    user_saver: Arc<dyn UserSaver>,
    user_provider: Arc<dyn UserProvider>,
    app_provider: Arc<dyn AppProvider>,
    issuer: Arc<dyn TokenIssuer>,
    hasher: PasswordHasher,
    token_ttl: Duration,
}

impl AuthService {
    /// `log` is the parent span for every operation span the service opens.
    pub fn new(
        log: Span,
        user_saver: Arc<dyn UserSaver>,
        user_provider: Arc<dyn UserProvider>,
        app_provider: Arc<dyn AppProvider>,
        issuer: Arc<dyn TokenIssuer>,
        hasher: PasswordHasher,
        token_ttl: Duration,
    ) -> Self {
        Self {
            log,
            user_saver,
            user_provider,
            app_provider,
            issuer,
            hasher,
            token_ttl,
        }
    }

    /// Hashes the password and stores a new user, returning its id.
    pub async fn register(
        &self,
        ctx: &RequestContext,
        email: &str,
        password: &str,
    ) -> Result<i64, AuthError> {
        const OP: &str = "auth.register";
        let span = info_span!(parent: &self.log, "register", op = OP, email = %email);

        async move {
            let password_hash = ctx
                .guard(OP, self.hasher.hash_blocking(password))
                .await?
                .map_err(|e| {
                    error!(error = %e, "failed to generate password hash");
                    AuthError::internal(OP, e)
                })?;

            match ctx
                .guard(OP, self.user_saver.save_user(email, &password_hash))
                .await?
            {
                Ok(user_id) => {
                    info!(user_id, "user registered");
                    Ok(user_id)
                }
                Err(StorageError::UserExists) => {
                    warn!("user already exists");
                    Err(AuthError::UserExists { op: OP })
                }
                Err(e) => {
                    error!(error = %e, "failed to save user");
                    Err(AuthError::internal(OP, e))
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Checks credentials and issues a token scoped to `app_id`.
    pub async fn login(
        &self,
        ctx: &RequestContext,
        email: &str,
        password: &str,
        app_id: i32,
    ) -> Result<String, AuthError> {
        const OP: &str = "auth.login";
        let span = info_span!(parent: &self.log, "login", op = OP, email = %email, app_id);

        async move {
            let user = match ctx.guard(OP, self.user_provider.user(email)).await? {
                Ok(user) => user,
                Err(StorageError::UserNotFound) => {
                    warn!("user not found");
                    return Err(AuthError::InvalidCredentials { op: OP });
                }
                Err(e) => {
                    error!(error = %e, "failed to get user");
                    return Err(AuthError::internal(OP, e));
                }
            };

            let matches = ctx
                .guard(OP, self.hasher.verify_blocking(password, &user.password_hash))
                .await?
                .map_err(|e| {
                    error!(error = %e, user_id = user.id, "failed to verify password hash");
                    AuthError::internal(OP, e)
                })?;
            if !matches {
                warn!(user_id = user.id, "invalid password");
                return Err(AuthError::InvalidCredentials { op: OP });
            }

            // An unknown application is not distinguished from a lookup failure.
            let app = ctx
                .guard(OP, self.app_provider.app(app_id))
                .await?
                .map_err(|e| {
                    error!(error = %e, "failed to get app");
                    AuthError::internal(OP, e)
                })?;

            ctx.check(OP)?;
            let token = self
                .issuer
                .issue(&user, &app, self.token_ttl)
                .map_err(|e| {
                    error!(error = %e, user_id = user.id, "failed to generate token");
                    AuthError::internal(OP, e)
                })?;

            info!(user_id = user.id, "user logged in");
            Ok(token)
        }
        .instrument(span)
        .await
    }

    /// Reports whether the user carries the admin flag.
    pub async fn is_admin(&self, ctx: &RequestContext, user_id: i64) -> Result<bool, AuthError> {
        const OP: &str = "auth.is_admin";
        let span = info_span!(parent: &self.log, "is_admin", op = OP, user_id);

        async move {
            match ctx.guard(OP, self.user_provider.is_admin(user_id)).await? {
                Ok(is_admin) => {
                    info!(is_admin, "checked admin flag");
                    Ok(is_admin)
                }
                // The store reports a missing user as a missing app; kept as is.
                Err(StorageError::AppNotFound) => {
                    warn!("app not found");
                    Err(AuthError::InvalidApplication { op: OP })
                }
                Err(e) => {
                    error!(error = %e, "failed to check admin flag");
                    Err(AuthError::internal(OP, e))
                }
            }
        }
        .instrument(span)
        .await
    }
}
