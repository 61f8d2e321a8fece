//! Wire protocol for headstails.
//!
//! This crate defines what clients and the server say to each other:
//!
//! - **Envelope** ([`Message`], [`MessageType`], [`Payload`]): the
//!   `{ type, payload, timestamp }` frame used in both directions.
//! - **Payloads** ([`JoinPayload`], [`ResultPayload`], ...): the typed
//!   bodies for each message type.
//! - **Values** ([`PlayerId`], [`Choice`], [`Stage`], [`Character`], ...):
//!   the data carried inside payloads.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): bytes ↔ messages.
//!
//! It knows nothing about sockets or rooms.
//!
//! ```text
//! Transport (bytes) → Protocol (Message) → Room (players, choices, stage)
//! ```

mod codec;
mod error;
mod message;
mod payload;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use message::{Message, MessageType, Payload};
pub use payload::{
    ChoiceUpdatePayload, ChoosePayload, ErrorPayload, GameStagePayload,
    JoinPayload, JoinedPayload, LobbyPayload, ReadyStatusPayload,
    ResultPayload,
};
pub use types::{
    Character, Choice, PlayerId, PlayerSummary, Position, Stage, TakenChoices,
};
