//! Cooperative cancellation for transport operations.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::time::Instant;

/// A cloneable cancellation token with an optional deadline.
///
/// The cancel event is sticky: once [`cancel`](Self::cancel) has been
/// called, every clone observes it. Long-running operations check the
/// token cooperatively; nothing is interrupted preemptively.
///
/// A token may additionally carry a deadline. The deadline is not a
/// second cancel event; it is merged with per-call timeouts via
/// [`earliest_deadline`] and enforced by the operation itself.
///
/// # Example
///
/// ```ignore
/// let cancel = CancelToken::new();
///
/// let token = cancel.clone();
/// tokio::spawn(async move {
///     receiver.listen(&token, handler, 0).await
/// });
///
/// // Later: stop the loop.
/// cancel.cancel();
/// ```
#[derive(Debug, Clone)]
pub struct CancelToken {
    inner: Arc<CancelState>,
    deadline: Option<Instant>,
}

#[derive(Debug)]
struct CancelState {
    cancelled: AtomicBool,
    notify: tokio::sync::Notify,
}

impl CancelToken {
    /// Create a new token with no deadline.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(CancelState {
                cancelled: AtomicBool::new(false),
                notify: tokio::sync::Notify::new(),
            }),
            deadline: None,
        }
    }

    /// Create a token carrying an absolute deadline.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            ..Self::new()
        }
    }

    /// Create a token whose deadline is `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// Check if cancellation has been requested.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Request cancellation.
    ///
    /// This sets the cancellation flag and notifies any waiters.
    pub fn cancel(&self) {
        if !self.inner.cancelled.swap(true, Ordering::Release) {
            self.inner.notify.notify_waiters();
        }
    }

    /// Wait asynchronously until cancellation is requested.
    ///
    /// Returns immediately if already cancelled.
    pub async fn cancelled(&self) {
        if self.is_cancelled() {
            return;
        }
        loop {
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
            if self.is_cancelled() {
                return;
            }
        }
    }

    /// The deadline carried by this token, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Merge a per-call timeout with a token's deadline, keeping the earlier.
///
/// A zero `timeout` means "no caller timeout". Returns `None` when neither
/// limit is set.
pub fn earliest_deadline(timeout: Duration, token: &CancelToken) -> Option<Instant> {
    let from_timeout = (!timeout.is_zero()).then(|| Instant::now() + timeout);
    match (from_timeout, token.deadline()) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}
