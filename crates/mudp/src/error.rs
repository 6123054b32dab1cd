//! Error types for the datagram transport.

/// Result type alias for transport operations.
pub type Result<T> = std::result::Result<T, UdpError>;

/// Errors that can occur in the UDP transport.
///
/// Internal poll deadlines used for cancellation checks in
/// [`Receiver::listen`](crate::Receiver::listen) are swallowed and never
/// surfaced through this type. Nothing is retried internally; retry and
/// backoff policy belongs to the caller.
#[derive(Debug, thiserror::Error)]
pub enum UdpError {
    /// Configuration is missing a required field or holds an invalid value.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// An address string could not be resolved to a UDP endpoint.
    #[error("failed to resolve '{address}': {message}")]
    Resolve {
        address: String,
        message: String,
    },

    /// Socket creation or bind failed.
    #[error("failed to bind '{address}': {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// A write failed for a reason other than timeout or cancellation.
    #[error("write failed: {0}")]
    Write(#[source] std::io::Error),

    /// A read failed for a reason other than the internal poll deadline.
    #[error("read failed: {0}")]
    Read(#[source] std::io::Error),

    /// The cancel token fired before the operation completed.
    #[error("{0} cancelled")]
    Cancelled(&'static str),

    /// The operation was attempted on a closed socket.
    #[error("{0} on closed socket")]
    Closed(&'static str),

    /// The effective deadline elapsed before the operation completed.
    #[error("{0} timed out")]
    Timeout(&'static str),
}

impl UdpError {
    /// Create a resolve error.
    pub fn resolve(address: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Resolve {
            address: address.into(),
            message: message.into(),
        }
    }

    /// Create a bind error.
    pub fn bind(address: impl Into<String>, source: std::io::Error) -> Self {
        Self::Bind {
            address: address.into(),
            source,
        }
    }

    /// Whether this error reports a fired cancel token.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }

    /// Whether this error reports an operation on a closed socket.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed(_))
    }

    /// Whether this error reports an elapsed deadline.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}
