//! The per-connection player record.

use headstails_protocol::{Character, PlayerId, PlayerSummary};

/// A player admitted to a room.
///
/// Holds no transport handle. The outbound channel for this player is
/// looked up by id in the room's [`Broadcaster`](crate::Broadcaster), so a
/// `Player` can outlive (or predate) any particular connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub ready: bool,
    pub characters: Vec<Character>,
}

impl Player {
    /// Creates a not-ready player with a fresh id and no characters.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: PlayerId::new(),
            name: name.into(),
            ready: false,
            characters: Vec::new(),
        }
    }

    /// Returns the public view of this player.
    pub fn summary(&self) -> PlayerSummary {
        PlayerSummary {
            id: self.id,
            name: self.name.clone(),
            ready: self.ready,
            characters: self.characters.clone(),
        }
    }
}
