use std::time::Duration;

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use super::{
    claims::Claims,
    repo_types::{App, User},
};

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("application {0} has an empty signing secret")]
    EmptySecret(i32),
    #[error("token ttl out of range")]
    TtlOutOfRange,
    #[error(transparent)]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

/// Produces signed session tokens.
pub trait TokenIssuer: Send + Sync {
    fn issue(&self, user: &User, app: &App, ttl: Duration) -> Result<String, TokenError>;
}

/// HS256 issuer keyed by each application's own secret.
#[derive(Debug, Clone, Copy, Default)]
pub struct JwtIssuer;

impl JwtIssuer {
    fn claims_at(
        now: OffsetDateTime,
        user: &User,
        app: &App,
        ttl: Duration,
    ) -> Result<Claims, TokenError> {
        let ttl = TimeDuration::try_from(ttl).map_err(|_| TokenError::TtlOutOfRange)?;
        let exp = now
            .checked_add(ttl)
            .ok_or(TokenError::TtlOutOfRange)?;
        Ok(Claims {
            uid: user.id,
            email: user.email.clone(),
            app_id: app.id,
            iat: now.unix_timestamp(),
            exp: exp.unix_timestamp(),
        })
    }
}

impl TokenIssuer for JwtIssuer {
    fn issue(&self, user: &User, app: &App, ttl: Duration) -> Result<String, TokenError> {
        if app.secret.is_empty() {
            return Err(TokenError::EmptySecret(app.id));
        }
        let claims = Self::claims_at(OffsetDateTime::now_utc(), user, app, ttl)?;
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&app.secret),
        )?;
        debug!(user_id = user.id, app_id = app.id, exp = claims.exp, "jwt signed");
        Ok(token)
    }
}

/// Decodes `token` and checks its signature and expiry against `secret`.
pub fn verify(token: &str, secret: &[u8]) -> Result<Claims, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_required_spec_claims(&["exp"]);
    let data = decode::<Claims>(token, &DecodingKey::from_secret(secret), &validation)?;
    debug!(user_id = data.claims.uid, app_id = data.claims.app_id, "jwt verified");
    Ok(data.claims)
}
