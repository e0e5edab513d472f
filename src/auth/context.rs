use std::{future::Future, time::Duration};

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::errors::AuthError;

/// Per-request cancellation token and deadline.
///
/// Every collaborator call made by the service goes through
/// [`RequestContext::guard`], so a cancelled or expired request stops at the
/// next suspension point instead of surfacing a domain error.
#[derive(Debug, Clone)]
pub struct RequestContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestContext {
    /// A context with no deadline that is only cancelled explicitly.
    pub fn new() -> Self {
        Self {
            cancel: CancellationToken::new(),
            deadline: None,
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            cancel: CancellationToken::new(),
            deadline: Some(Instant::now() + timeout),
        }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Fails fast if the context is already done.
    pub fn check(&self, op: &'static str) -> Result<(), AuthError> {
        if self.cancel.is_cancelled() {
            return Err(AuthError::Cancelled { op });
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                Err(AuthError::DeadlineExceeded { op })
            }
            _ => Ok(()),
        }
    }

    /// Races `fut` against cancellation and the deadline.
    pub async fn guard<F>(&self, op: &'static str, fut: F) -> Result<F::Output, AuthError>
    where
        F: Future,
    {
        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(AuthError::Cancelled { op }),
            _ = expired => Err(AuthError::DeadlineExceeded { op }),
            out = fut => Ok(out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::errors::ErrorKind;

    #[tokio::test]
    async fn guard_passes_through_output() {
        let ctx = RequestContext::with_timeout(Duration::from_secs(5));
        let out = ctx.guard("test", async { 7 }).await.unwrap();
        assert_eq!(out, 7);
    }

    #[tokio::test]
    async fn guard_reports_cancellation() {
        let ctx = RequestContext::new();
        ctx.cancel();
        let err = ctx
            .guard("test", std::future::pending::<()>())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
    }

    #[tokio::test]
    async fn guard_reports_deadline() {
        let ctx = RequestContext::with_timeout(Duration::from_millis(20));
        let err = ctx
            .guard("test", tokio::time::sleep(Duration::from_secs(10)))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DeadlineExceeded);
    }

    #[test]
    fn check_reports_expired_deadline() {
        let ctx = RequestContext::with_timeout(Duration::ZERO);
        assert_eq!(
            ctx.check("test").unwrap_err().kind(),
            ErrorKind::DeadlineExceeded
        );
    }
}
