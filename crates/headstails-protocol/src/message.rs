//! The message envelope exchanged in both directions.
//!
//! Every frame on the wire is one [`Message`]:
//!
//! ```text
//! { "type": "choose", "payload": { "choice": "heads" }, "timestamp": 1718000000000 }
//! ```
//!
//! The payload stays an untyped JSON object inside the envelope; handlers
//! pull the shape they expect out of it with [`Message::payload_as`] and
//! build outbound messages from typed structs with [`Message::with_payload`].

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// MessageType
// ---------------------------------------------------------------------------

/// The type tag of a message.
///
/// Serialized as its snake_case string. Tags this server does not know
/// decode into [`MessageType::Unknown`] instead of failing the whole frame,
/// so the router can answer with an error and keep the connection open.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MessageType {
    // -- Client → Server --
    Join,
    ReadyStatus,
    Choose,
    AddCharacter,
    Ping,

    // -- Server → Client --
    Joined,
    LobbyData,
    GameStage,
    Error,
    Waiting,
    ChoiceUpdate,
    Result,
    Pong,

    /// A tag outside the known set, kept verbatim.
    Unknown(String),
}

impl MessageType {
    /// Returns the wire spelling of the tag.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Join => "join",
            Self::ReadyStatus => "ready_status",
            Self::Choose => "choose",
            Self::AddCharacter => "add_character",
            Self::Ping => "ping",
            Self::Joined => "joined",
            Self::LobbyData => "lobby_data",
            Self::GameStage => "game_stage",
            Self::Error => "error",
            Self::Waiting => "waiting",
            Self::ChoiceUpdate => "choice_update",
            Self::Result => "result",
            Self::Pong => "pong",
            Self::Unknown(tag) => tag,
        }
    }
}

impl From<String> for MessageType {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "join" => Self::Join,
            "ready_status" => Self::ReadyStatus,
            "choose" => Self::Choose,
            "add_character" => Self::AddCharacter,
            "ping" => Self::Ping,
            "joined" => Self::Joined,
            "lobby_data" => Self::LobbyData,
            "game_stage" => Self::GameStage,
            "error" => Self::Error,
            "waiting" => Self::Waiting,
            "choice_update" => Self::ChoiceUpdate,
            "result" => Self::Result,
            "pong" => Self::Pong,
            _ => Self::Unknown(tag),
        }
    }
}

impl From<MessageType> for String {
    fn from(kind: MessageType) -> Self {
        match kind {
            MessageType::Unknown(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

/// The opaque body of a message: a JSON object.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(pub Map<String, Value>);

impl Payload {
    /// Returns the value stored under `key`, if any.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// `"payload": null` and a missing payload both mean "empty".
fn nullable_payload<'de, D>(deserializer: D) -> Result<Payload, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Payload>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// The envelope around every frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "type")]
    pub kind: MessageType,

    #[serde(default, deserialize_with = "nullable_payload")]
    pub payload: Payload,

    /// Milliseconds since the Unix epoch, set by the server when the
    /// message is sent. Whatever a client puts here is ignored.
    #[serde(default)]
    pub timestamp: i64,
}

impl Message {
    /// Creates a message with an empty payload.
    pub fn new(kind: MessageType) -> Self {
        Self {
            kind,
            payload: Payload::default(),
            timestamp: 0,
        }
    }

    /// Creates a message whose payload is `body` serialized as an object.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if `body` does not serialize to a
    /// JSON object.
    pub fn with_payload<T: Serialize>(
        kind: MessageType,
        body: &T,
    ) -> Result<Self, ProtocolError> {
        match serde_json::to_value(body).map_err(ProtocolError::Encode)? {
            Value::Object(map) => Ok(Self {
                kind,
                payload: Payload(map),
                timestamp: 0,
            }),
            other => Err(ProtocolError::Encode(serde::ser::Error::custom(
                format!("payload must be an object, got {other}"),
            ))),
        }
    }

    /// Reads the payload as a typed struct.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Payload`] if a required field is missing or
    /// has the wrong type.
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T, ProtocolError> {
        serde_json::from_value(Value::Object(self.payload.0.clone()))
            .map_err(ProtocolError::Payload)
    }

    /// Overwrites the timestamp with the current wall-clock time.
    pub fn stamp(&mut self) {
        self.timestamp = now_millis();
    }
}

/// Current Unix time in milliseconds.
fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}
