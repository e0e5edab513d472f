//! Error taxonomy of the authentication service.
//!
//! Collaborator failures are classified exactly once, inside
//! [`AuthService`](super::services::AuthService), into an [`AuthError`]. Every
//! variant carries the name of the operation that produced it. The transport
//! layer only looks at [`AuthError::kind`].

use thiserror::Error;

/// Stable, caller-visible classification of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UserExists,
    InvalidCredentials,
    InvalidApplication,
    Cancelled,
    DeadlineExceeded,
    Internal,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{op}: user already exists")]
    UserExists { op: &'static str },

    /// Unknown email and wrong password both end up here.
    #[error("{op}: invalid credentials")]
    InvalidCredentials { op: &'static str },

    #[error("{op}: invalid application id")]
    InvalidApplication { op: &'static str },

    #[error("{op}: request cancelled")]
    Cancelled { op: &'static str },

    #[error("{op}: deadline exceeded")]
    DeadlineExceeded { op: &'static str },

    /// The cause is for server-side logs only.
    #[error("{op}: {cause:#}")]
    Internal {
        op: &'static str,
        cause: anyhow::Error,
    },
}

impl AuthError {
    pub fn internal(op: &'static str, cause: impl Into<anyhow::Error>) -> Self {
        Self::Internal {
            op,
            cause: cause.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UserExists { .. } => ErrorKind::UserExists,
            Self::InvalidCredentials { .. } => ErrorKind::InvalidCredentials,
            Self::InvalidApplication { .. } => ErrorKind::InvalidApplication,
            Self::Cancelled { .. } => ErrorKind::Cancelled,
            Self::DeadlineExceeded { .. } => ErrorKind::DeadlineExceeded,
            Self::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// Name of the operation the error originated in.
    pub fn op(&self) -> &'static str {
        match self {
            Self::UserExists { op }
            | Self::InvalidCredentials { op }
            | Self::InvalidApplication { op }
            | Self::Cancelled { op }
            | Self::DeadlineExceeded { op }
            | Self::Internal { op, .. } => op,
        }
    }
}
