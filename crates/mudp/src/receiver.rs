//! Datagram receive loop with cooperative cancellation.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::net::UdpSocket;

use crate::cancel::CancelToken;
use crate::config::{Datagram, ReceiverConfig, resolve_addr};
use crate::error::{Result, UdpError};

/// Default receive buffer size when [`Receiver::listen`] is given zero.
pub const DEFAULT_BUFFER_SIZE: usize = 4096;

/// How often a blocked read gives way to a liveness check.
///
/// The cancel event itself is raced directly against the read, so it is
/// observed immediately; this interval only bounds how long a running
/// [`Receiver::listen`] can take to notice a concurrent
/// [`Receiver::close`].
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// A UDP receiver that dispatches incoming datagrams to a handler.
///
/// The receiver binds once at construction and cannot rebind. Its
/// [`listen`](Self::listen) loop runs until the [`CancelToken`] fires
/// (graceful stop) or a hard read error occurs; each datagram is handed
/// to the handler as a fire-and-forget task. [`close`](Self::close) is
/// idempotent and safe to call while `listen` is running.
///
/// # Example
///
/// ```ignore
/// let receiver = Receiver::bind(ReceiverConfig::new("127.0.0.1", 9000)).await?;
/// let cancel = CancelToken::new();
///
/// receiver
///     .listen(&cancel, |datagram| {
///         println!("{} bytes from {}", datagram.data.len(), datagram.source);
///     }, 0)
///     .await?;
/// ```
pub struct Receiver {
    socket: Mutex<Option<Arc<UdpSocket>>>,
    local_addr: SocketAddr,
}

impl Receiver {
    /// Bind a receiver to the configured local address.
    ///
    /// Fails with [`UdpError::Config`] if the port is zero, with
    /// [`UdpError::Resolve`] if the address is invalid, and with
    /// [`UdpError::Bind`] if the address is already in use.
    pub async fn bind(config: ReceiverConfig) -> Result<Self> {
        if config.port == 0 {
            return Err(UdpError::Config("receiver port must be nonzero".into()));
        }
        let bind_addr = config.bind_addr();
        let addr = resolve_addr(&bind_addr).await?;
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|e| UdpError::bind(bind_addr.as_str(), e))?;
        let local_addr = socket
            .local_addr()
            .map_err(|e| UdpError::bind(bind_addr.as_str(), e))?;
        tracing::debug!(target: "mudp::receiver", %local_addr, "receiver bound");
        Ok(Self {
            socket: Mutex::new(Some(Arc::new(socket))),
            local_addr,
        })
    }

    /// Get the bound local address.
    ///
    /// Returns `None` after [`close`](Self::close).
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.lock().as_ref().map(|_| self.local_addr)
    }

    /// Receive datagrams until cancelled, dispatching each to `handler`.
    ///
    /// A `buffer_size` of zero defaults to [`DEFAULT_BUFFER_SIZE`]. A
    /// datagram larger than the buffer is silently truncated to the buffer
    /// size. That is inherent datagram-socket behavior, not an error.
    ///
    /// Each received payload is copied into a fresh allocation before
    /// dispatch; the read buffer is reused across iterations and never
    /// handed to the handler. Handlers run as detached tasks with no
    /// concurrency limit and no ordering guarantee across datagrams.
    ///
    /// Returns `Ok(())` when the token fires, [`UdpError::Closed`] when a
    /// concurrent [`close`](Self::close) is observed (within
    /// [`POLL_INTERVAL`] plus one in-flight read), and [`UdpError::Read`]
    /// on a hard read error. Internal poll deadlines are never surfaced.
    pub async fn listen<H>(
        &self,
        cancel: &CancelToken,
        handler: H,
        buffer_size: usize,
    ) -> Result<()>
    where
        H: Fn(Datagram) + Send + Sync + 'static,
    {
        let buffer_size = if buffer_size == 0 {
            DEFAULT_BUFFER_SIZE
        } else {
            buffer_size
        };
        let handler = Arc::new(handler);
        let mut buf = vec![0u8; buffer_size];

        loop {
            // A fired token wins over a concurrent close.
            if cancel.is_cancelled() {
                return Ok(());
            }
            let socket = match self.socket.lock().clone() {
                Some(socket) => socket,
                None => return Err(UdpError::Closed("listen")),
            };

            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!(target: "mudp::receiver", local = %self.local_addr, "listen cancelled");
                    return Ok(());
                }
                res = tokio::time::timeout(POLL_INTERVAL, socket.recv_from(&mut buf)) => {
                    match res {
                        // Poll deadline elapsed; loop re-checks the token and the handle.
                        Err(_) => continue,
                        Ok(Err(e)) => return Err(UdpError::Read(e)),
                        Ok(Ok((len, source))) => {
                            tracing::trace!(target: "mudp::receiver", %source, len, "datagram received");
                            let datagram = Datagram::new(buf[..len].to_vec(), source);
                            let handler = Arc::clone(&handler);
                            tokio::spawn(async move {
                                handler(datagram);
                            });
                        }
                    }
                }
            }
        }
    }

    /// Close the receiver.
    ///
    /// The first call clears the handle under the guard; a running
    /// [`listen`](Self::listen) observes this within [`POLL_INTERVAL`].
    /// Subsequent calls are no-ops.
    pub fn close(&self) {
        if self.socket.lock().take().is_some() {
            tracing::debug!(target: "mudp::receiver", local = %self.local_addr, "receiver closed");
        }
    }
}

impl std::fmt::Debug for Receiver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Receiver")
            .field("local_addr", &self.local_addr())
            .finish()
    }
}
