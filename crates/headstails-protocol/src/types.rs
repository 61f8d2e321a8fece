//! Core value types that travel inside message payloads.
//!
//! Everything here is plain data: identities, the two coin sides, the room
//! stage, and the lobby's character placeholders. The JSON shapes are what
//! the browser client reads, so the serde attributes are part of the
//! contract and are pinned down by the tests at the bottom of this file.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// A unique identifier for a player, generated server-side on join.
///
/// Backed by a random (v4) UUID, so an id is never handed out twice, even
/// across rooms. `#[serde(transparent)]` puts it on the wire as the bare
/// UUID string.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(pub Uuid);

impl PlayerId {
    /// Generates a fresh, random player id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Choice
// ---------------------------------------------------------------------------

/// One side of the coin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Choice {
    Heads,
    Tails,
}

impl Choice {
    /// Returns the wire spelling: `"heads"` or `"tails"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Heads => "heads",
            Self::Tails => "tails",
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsing is exact: `"Heads"` or `" heads"` are rejected.
impl FromStr for Choice {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "heads" => Ok(Self::Heads),
            "tails" => Ok(Self::Tails),
            other => Err(ProtocolError::InvalidChoice(other.to_string())),
        }
    }
}

/// The pending choices of a round, keyed by player.
///
/// A `BTreeMap` so iteration (and therefore winner lookup and the JSON
/// object order) is deterministic.
pub type TakenChoices = BTreeMap<PlayerId, Choice>;

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// Coarse game progress of a room.
///
/// ```text
/// Lobby ──(every connected player ready)──→ GameStarted
/// ```
///
/// `GameStarted` is terminal; there is no way back to the lobby.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "camelCase")]
pub enum Stage {
    #[default]
    Lobby,
    GameStarted,
}

impl Stage {
    /// Returns the stage that follows this one, if any.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Lobby => Some(Self::GameStarted),
            Self::GameStarted => None,
        }
    }

    /// Returns `true` if transitioning to `target` is valid.
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lobby => write!(f, "lobby"),
            Self::GameStarted => write!(f, "gameStarted"),
        }
    }
}

// ---------------------------------------------------------------------------
// Characters
// ---------------------------------------------------------------------------

/// A board coordinate.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default,
)]
pub struct Position {
    pub x: i16,
    pub y: i16,
}

/// A placeholder game piece owned by a player.
///
/// The default is a character at the origin with no rotation, which is
/// what `add_character` creates.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default,
)]
pub struct Character {
    pub position: Position,
    pub rotation: i64,
}

// ---------------------------------------------------------------------------
// PlayerSummary
// ---------------------------------------------------------------------------

/// The public view of one player, as broadcast in lobby updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSummary {
    pub id: PlayerId,
    pub name: String,
    pub ready: bool,
    #[serde(default)]
    pub characters: Vec<Character>,
}

// =========================================================================
// Tests
// =========================================================================
