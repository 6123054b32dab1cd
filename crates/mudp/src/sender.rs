//! Cancellable, timeout-bound datagram sending.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::net::UdpSocket;
use tokio::time::Instant;

use crate::cancel::{CancelToken, earliest_deadline};
use crate::config::resolve_addr;
use crate::error::{Result, UdpError};

/// A UDP sender that delivers single datagrams to remote addresses.
///
/// The sender owns one bound socket for its entire lifetime. Each
/// [`send`](Self::send) resolves its destination per call, respects both
/// an explicit timeout and an external [`CancelToken`], and never blocks
/// past the effective deadline. [`close`](Self::close) is idempotent and
/// safe to call concurrently with in-flight sends.
///
/// # Example
///
/// ```ignore
/// let sender = Sender::new().await?;
/// let cancel = CancelToken::new();
///
/// let n = sender
///     .send(&cancel, "127.0.0.1:9000", b"hello", Duration::from_secs(1))
///     .await?;
///
/// sender.close();
/// ```
pub struct Sender {
    socket: Mutex<Option<Arc<UdpSocket>>>,
}

impl Sender {
    /// Create a sender bound to an OS-chosen ephemeral local address.
    pub async fn new() -> Result<Self> {
        Self::bind_to("0.0.0.0:0").await
    }

    /// Create a sender bound to an explicit local address (`"host:port"`).
    pub async fn bind(local_addr: &str) -> Result<Self> {
        Self::bind_to(local_addr).await
    }

    async fn bind_to(local_addr: &str) -> Result<Self> {
        let addr = resolve_addr(local_addr).await?;
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|e| UdpError::bind(local_addr, e))?;
        if let Ok(local) = socket.local_addr() {
            tracing::debug!(target: "mudp::sender", %local, "sender bound");
        }
        Ok(Self {
            socket: Mutex::new(Some(Arc::new(socket))),
        })
    }

    /// Get the bound local address.
    ///
    /// Returns `None` after [`close`](Self::close).
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket
            .lock()
            .as_ref()
            .and_then(|s| s.local_addr().ok())
    }

    /// Send one datagram to `remote_addr` (`"host:port"`).
    ///
    /// The effective deadline is the earlier of `now + timeout` (when
    /// `timeout` is nonzero) and the token's own deadline, if any; an
    /// elapsed deadline yields [`UdpError::Timeout`] regardless of which
    /// limit it came from. With neither set, the write is bounded only by
    /// the cancel event. Cancellation is observed at the race point, so a
    /// fired token returns [`UdpError::Cancelled`] without waiting on the
    /// socket.
    ///
    /// Returns the number of bytes written; a partial write is never
    /// reported as success.
    pub async fn send(
        &self,
        cancel: &CancelToken,
        remote_addr: &str,
        data: &[u8],
        timeout: Duration,
    ) -> Result<usize> {
        if cancel.is_cancelled() {
            return Err(UdpError::Cancelled("send"));
        }
        let target = resolve_addr(remote_addr).await?;

        // Snapshot under the guard; the Arc keeps the socket alive even if
        // a concurrent close clears the slot mid-write.
        let socket = self
            .socket
            .lock()
            .clone()
            .ok_or(UdpError::Closed("send"))?;

        let deadline = earliest_deadline(timeout, cancel);
        if let Some(d) = deadline
            && d <= Instant::now()
        {
            return Err(UdpError::Timeout("send"));
        }

        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!(target: "mudp::sender", remote = %target, "send cancelled");
                Err(UdpError::Cancelled("send"))
            }
            res = Self::write_with_deadline(&socket, data, target, deadline) => {
                if let Ok(n) = &res {
                    tracing::trace!(target: "mudp::sender", remote = %target, len = *n, "datagram sent");
                }
                res
            }
        }
    }

    /// Perform the write, bounded by the effective deadline when one is set.
    async fn write_with_deadline(
        socket: &UdpSocket,
        data: &[u8],
        target: SocketAddr,
        deadline: Option<Instant>,
    ) -> Result<usize> {
        match deadline {
            Some(deadline) => {
                match tokio::time::timeout_at(deadline, socket.send_to(data, target)).await {
                    Ok(Ok(n)) => Ok(n),
                    Ok(Err(e)) => Err(UdpError::Write(e)),
                    Err(_) => Err(UdpError::Timeout("send")),
                }
            }
            None => socket
                .send_to(data, target)
                .await
                .map_err(UdpError::Write),
        }
    }

    /// Close the sender.
    ///
    /// The first call clears the handle under the guard; the OS socket is
    /// released once any in-flight write finishes. Subsequent calls are
    /// no-ops.
    pub fn close(&self) {
        if self.socket.lock().take().is_some() {
            tracing::debug!(target: "mudp::sender", "sender closed");
        }
    }
}

impl std::fmt::Debug for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sender")
            .field("local_addr", &self.local_addr())
            .finish()
    }
}
