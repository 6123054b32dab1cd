//! Configuration types and the received-datagram record.

use std::net::SocketAddr;

use crate::error::{Result, UdpError};

/// Configuration for a [`Receiver`](crate::Receiver).
///
/// A receiver must be reachable at a known port, so `port` is required;
/// binding with a zero port fails with a configuration error.
#[derive(Clone, Debug)]
pub struct ReceiverConfig {
    /// The address to bind to.
    pub bind_address: String,
    /// The port to bind to.
    pub port: u16,
}

impl ReceiverConfig {
    /// Create a new configuration that binds to the specified address and port.
    pub fn new(bind_address: impl Into<String>, port: u16) -> Self {
        Self {
            bind_address: bind_address.into(),
            port,
        }
    }

    /// Create a configuration that binds to any address on the specified port.
    pub fn any_address(port: u16) -> Self {
        Self::new("0.0.0.0", port)
    }

    /// Get the bind address string (address:port).
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

/// A received datagram with its source address.
///
/// The payload is an owned copy of the bytes read from the socket, so a
/// handler may retain it freely.
#[derive(Clone, Debug)]
pub struct Datagram {
    /// The datagram payload.
    pub data: Vec<u8>,
    /// The source address of the datagram.
    pub source: SocketAddr,
}

impl Datagram {
    /// Create a new datagram.
    pub fn new(data: Vec<u8>, source: SocketAddr) -> Self {
        Self { data, source }
    }
}

/// Resolve a `"host:port"` string to a single UDP endpoint.
pub(crate) async fn resolve_addr(addr: &str) -> Result<SocketAddr> {
    let mut addrs = tokio::net::lookup_host(addr)
        .await
        .map_err(|e| UdpError::resolve(addr, e.to_string()))?;
    addrs
        .next()
        .ok_or_else(|| UdpError::resolve(addr, "no addresses returned"))
}
