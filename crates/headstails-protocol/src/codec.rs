//! Codec trait and implementations for serializing/deserializing messages.
//!
//! The server only needs "something that turns a [`Message`](crate::Message)
//! into bytes and back". Keeping that behind a trait means the router and
//! the writer task never name `serde_json` directly.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` because one codec instance lives in the shared
/// server state and is used from every connection task.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// JSON output is always valid UTF-8, so the WebSocket transport sends it
/// as text frames that a browser can hand straight to `JSON.parse`.
///
/// ## Example
///
/// ```rust
/// use headstails_protocol::{Codec, JsonCodec, Message, MessageType};
///
/// let codec = JsonCodec;
/// let bytes = codec.encode(&Message::new(MessageType::Ping)).unwrap();
/// let decoded: Message = codec.decode(&bytes).unwrap();
/// assert_eq!(decoded.kind, MessageType::Ping);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
