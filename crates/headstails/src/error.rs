//! Unified error type for the server.

use headstails_protocol::ProtocolError;
use headstails_room::RoomError;
use headstails_transport::TransportError;

/// Top-level error that wraps the errors of every layer.
///
/// `#[from]` lets `?` lift a sub-crate error into this one.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, payload shape).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error (unknown player, taken choice, full room).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// The connection did not open with a valid `join` message.
    #[error("handshake failed: {0}")]
    HandshakeFailed(String),
}
