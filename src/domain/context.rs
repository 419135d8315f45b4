//! Per-request context passed through the service into every repository call.
//!
//! Carries the acting user id (empty for anonymous callers), an optional
//! deadline and a cancellation flag. Clones share the cancellation flag, so
//! cancelling any copy cancels every operation started with it.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::Instant;

use crate::domain::repositories::StoreError;

#[derive(Debug, Default)]
struct Cancellation {
    fired: AtomicBool,
    notify: Notify,
}

/// Caller identity, deadline and cancellation for a single request.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    user_id: String,
    deadline: Option<Instant>,
    cancellation: Arc<Cancellation>,
}

impl RequestContext {
    /// Creates an anonymous context without a deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context acting on behalf of `user_id`.
    pub fn with_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Self::default()
        }
    }

    /// Sets the deadline to `timeout` from now.
    pub fn timeout(self, timeout: Duration) -> Self {
        self.deadline(Instant::now() + timeout)
    }

    /// Sets an absolute deadline.
    pub fn deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Cancels every operation running under this context or its clones.
    pub fn cancel(&self) {
        self.cancellation.fired.store(true, Ordering::SeqCst);
        self.cancellation.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.fired.load(Ordering::SeqCst)
    }

    /// Fails fast if the context is cancelled or its deadline has passed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Cancelled`] or [`StoreError::DeadlineExceeded`].
    pub fn check(&self) -> Result<(), StoreError> {
        if self.is_cancelled() {
            return Err(StoreError::Cancelled);
        }
        if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Err(StoreError::DeadlineExceeded);
        }
        Ok(())
    }

    /// Runs `operation` until it completes, the context is cancelled, or the
    /// deadline passes, whichever comes first.
    ///
    /// The operation future is dropped when the context fires first.
    pub async fn run<T, F>(&self, operation: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        self.check()?;

        let bounded = async {
            match self.deadline {
                Some(deadline) => tokio::time::timeout_at(deadline, operation)
                    .await
                    .map_err(|_| StoreError::DeadlineExceeded)?,
                None => operation.await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancelled() => Err(StoreError::Cancelled),
            result = bounded => result,
        }
    }

    /// Resolves once [`Self::cancel`] has been called.
    async fn cancelled(&self) {
        loop {
            let notified = self.cancellation.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}
