//! Translation of service errors into remote-procedure status codes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use super::errors::{AuthError, ErrorKind};

/// Protocol-level status carried in error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Code {
    AlreadyExists,
    InvalidArgument,
    Cancelled,
    DeadlineExceeded,
    Internal,
}

impl Code {
    pub fn http_status(self) -> StatusCode {
        match self {
            Code::AlreadyExists => StatusCode::CONFLICT,
            Code::InvalidArgument => StatusCode::BAD_REQUEST,
            // Client closed request; no named constant exists.
            Code::Cancelled => StatusCode::from_u16(499).unwrap_or(StatusCode::BAD_REQUEST),
            Code::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
            Code::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error body: a status code and a short fixed message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: Code,
    pub message: String,
}

impl RpcError {
    pub fn new(code: Code, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(Code::InvalidArgument, message)
    }
}

impl From<ErrorKind> for RpcError {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::UserExists => Self::new(Code::AlreadyExists, "user already exists"),
            ErrorKind::InvalidCredentials => {
                Self::new(Code::InvalidArgument, "invalid email or password")
            }
            ErrorKind::InvalidApplication => {
                Self::new(Code::InvalidArgument, "invalid application id")
            }
            ErrorKind::Cancelled => Self::new(Code::Cancelled, "request cancelled"),
            ErrorKind::DeadlineExceeded => Self::new(Code::DeadlineExceeded, "deadline exceeded"),
            ErrorKind::Internal => Self::new(Code::Internal, "internal error"),
        }
    }
}

/// Only the kind crosses the boundary; the cause stays in the logs.
impl From<AuthError> for RpcError {
    fn from(err: AuthError) -> Self {
        err.kind().into()
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        (self.code.http_status(), Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_table() {
        let cases = [
            (ErrorKind::UserExists, Code::AlreadyExists, 409),
            (ErrorKind::InvalidCredentials, Code::InvalidArgument, 400),
            (ErrorKind::InvalidApplication, Code::InvalidArgument, 400),
            (ErrorKind::Cancelled, Code::Cancelled, 499),
            (ErrorKind::DeadlineExceeded, Code::DeadlineExceeded, 504),
            (ErrorKind::Internal, Code::Internal, 500),
        ];
        for (kind, code, http) in cases {
            let rpc = RpcError::from(kind);
            assert_eq!(rpc.code, code, "{kind:?}");
            assert_eq!(rpc.code.http_status().as_u16(), http, "{kind:?}");
        }
    }

    #[test]
    fn internal_cause_is_not_exposed() {
        let err = AuthError::internal("auth.login", anyhow::anyhow!("pq: relation users missing"));
        let rpc = RpcError::from(err);
        assert_eq!(rpc.message, "internal error");
        let body = serde_json::to_string(&rpc).unwrap();
        assert_eq!(body, r#"{"code":"internal","message":"internal error"}"#);
    }
}
