use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::errors::PodError;

/// Ambient cancellation scope for a single invocation.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    /// A context that is never canceled unless `cancel` is called.
    #[must_use]
    pub fn background() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_token(token: CancellationToken) -> Self {
        Self { token, deadline: None }
    }

    /// Adds a deadline `timeout` from now. An earlier existing deadline is kept.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        let at = Instant::now() + timeout;
        self.deadline = Some(self.deadline.map_or(at, |d| d.min(at)));
        self
    }

    /// A context canceled together with `self` that can also be canceled on its own.
    #[must_use]
    pub fn child(&self) -> Self {
        Self { token: self.token.child_token(), deadline: self.deadline }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    #[must_use]
    pub fn is_canceled(&self) -> bool {
        self.token.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Drives `fut` until it completes, or fails with `Canceled` once the context is canceled
    /// or its deadline passes. The in-flight future is dropped in that case.
    ///
    /// # Errors
    /// Returns `PodError::Canceled` when the context ends first.
    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output, PodError> {
        if self.is_canceled() {
            return Err(PodError::Canceled);
        }
        let deadline = async {
            match self.deadline {
                Some(d) => tokio::time::sleep_until(d).await,
                None => std::future::pending().await,
            }
        };
        tokio::select! {
            biased;
            () = self.token.cancelled() => Err(PodError::Canceled),
            () = deadline => Err(PodError::Canceled),
            out = fut => Ok(out),
        }
    }
}
