//! Error types for the protocol layer.

/// Errors that can occur while encoding, decoding, or interpreting messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serializing a message into bytes failed.
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// The bytes could not be parsed as a message envelope.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The envelope parsed, but its payload does not have the shape the
    /// message type requires (missing field, wrong value type).
    #[error("invalid payload: {0}")]
    Payload(serde_json::Error),

    /// A choice string other than `heads` or `tails`.
    #[error("choice must be heads or tails, got {0:?}")]
    InvalidChoice(String),
}
