use serde::{Deserialize, Serialize};

/// JWT payload of a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub uid: i64,      // user ID
    pub email: String, // user email
    pub app_id: i32,   // application the token is scoped to
    pub iat: i64,      // issued at (unix timestamp)
    pub exp: i64,      // expires at (unix timestamp)
}
