//! Client gateway for headstails.
//!
//! The server talks to players only through the two traits here:
//! a [`Transport`] hands out connected players' sockets, and a [`Connection`]
//! moves whole JSON frames in each direction. The room and router never see
//! a socket type.
//!
//! # Feature Flags
//!
//! - `websocket` (default): browser clients over `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketTransport};

use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Process-wide label for one socket, used to correlate log lines before
/// the socket has a player behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Allocates the next id. Ids are never reused within a process.
    pub fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Source of newly connected clients.
pub trait Transport: Send + Sync + 'static {
    type Connection: Connection;
    type Error: std::error::Error + Send + Sync;

    /// Waits for the next client that is ready to exchange frames.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;
}

/// One client socket carrying whole frames.
///
/// `send` and `recv` must be callable at the same time from different
/// tasks: a player's receive loop parks in `recv` while its writer task
/// drains the outbox through `send`.
pub trait Connection: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync;

    /// Writes one frame.
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Reads the next frame, or `Ok(None)` once the client has gone away.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Starts a clean shutdown of the socket.
    async fn close(&self) -> Result<(), Self::Error>;

    fn id(&self) -> ConnectionId;

    /// The client's remote address.
    fn peer_addr(&self) -> SocketAddr;
}
