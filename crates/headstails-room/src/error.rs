//! Error types for the room layer.

use headstails_protocol::{Choice, PlayerId};

/// Errors that can occur during room operations.
///
/// The `Display` text is what the offending client sees in its `error`
/// message, so it is written for players rather than operators.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The player is not (or no longer) in the room.
    #[error("player {0} is not in the room")]
    PlayerNotFound(PlayerId),

    /// The submitted choice is not exactly `heads` or `tails`.
    #[error("choice must be heads or tails")]
    InvalidChoice(String),

    /// Another player already holds this side for the current round.
    #[error("{choice} is already taken")]
    ChoiceTaken { choice: Choice, holder: PlayerId },

    /// The room has reached its configured capacity.
    #[error("room is full ({0} players)")]
    RoomFull(usize),

    /// The player's outbound queue has been dropped (connection gone).
    #[error("outbox closed")]
    OutboxClosed,
}
