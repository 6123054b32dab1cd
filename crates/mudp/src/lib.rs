//! Cancellable UDP datagram transport.
//!
//! This crate provides paired, independently usable primitives for
//! connectionless UDP communication:
//!
//! - **[`Sender`]**: owns one bound socket; delivers single datagrams with
//!   a cancellable, timeout-bound [`send`](Sender::send)
//! - **[`Receiver`]**: owns one bound socket; runs a cancellable
//!   [`listen`](Receiver::listen) loop that dispatches each datagram to a
//!   handler
//! - **[`CancelToken`]**: a cloneable cancel event with an optional
//!   deadline, checked cooperatively by both
//!
//! No shared state exists between the two; a process may run any number of
//! each. UDP semantics are preserved as-is: no retransmission, ordering,
//! or acknowledgment.
//!
//! # Sending
//!
//! ```ignore
//! use std::time::Duration;
//! use mudp::{CancelToken, Sender};
//!
//! let sender = Sender::new().await?;
//! let cancel = CancelToken::new();
//!
//! let n = sender
//!     .send(&cancel, "127.0.0.1:9000", b"hello", Duration::from_secs(1))
//!     .await?;
//! println!("wrote {n} bytes");
//!
//! sender.close();
//! ```
//!
//! # Receiving
//!
//! ```ignore
//! use mudp::{CancelToken, Receiver, ReceiverConfig};
//!
//! let receiver = Receiver::bind(ReceiverConfig::new("127.0.0.1", 9000)).await?;
//! let cancel = CancelToken::new();
//!
//! receiver
//!     .listen(&cancel, |datagram| {
//!         println!("{} bytes from {}", datagram.data.len(), datagram.source);
//!     }, 0)
//!     .await?;
//! ```
//!
//! Calling `cancel.cancel()` from another task stops the loop gracefully;
//! [`Receiver::close`] stops it with an error instead, bounded by
//! [`POLL_INTERVAL`].

mod cancel;
mod config;
mod error;
mod receiver;
mod sender;

pub use cancel::{CancelToken, earliest_deadline};
pub use config::{Datagram, ReceiverConfig};
pub use error::{Result, UdpError};
pub use receiver::{DEFAULT_BUFFER_SIZE, POLL_INTERVAL, Receiver};
pub use sender::Sender;
