//! Message routing: what the room does for each inbound message, and what
//! gets said back.
//!
//! Every function here runs with the room lock held by the caller, so each
//! operation and the broadcasts it triggers happen as one step. Nothing in
//! this module touches a socket; replies go into outboxes.

use headstails_protocol::{
    Character, ChoiceUpdatePayload, ChoosePayload, ErrorPayload,
    GameStagePayload, JoinedPayload, LobbyPayload, Message, MessageType,
    PlayerId, ProtocolError, ReadyStatusPayload, ResultPayload, TakenChoices,
};
use headstails_room::{Outbox, Room, RoomError};

use crate::ServerError;

/// Players needed before the lobby is shown instead of the waiting screen.
const LOBBY_SIZE: usize = 2;

pub(crate) const WAITING_FOR_PLAYER: &str = "Waiting for another player...";
pub(crate) const PLAYER_LEFT: &str =
    "A player left. Waiting for another player...";

/// Seats a player who completed the handshake.
///
/// Checks capacity, admits, attaches `outbox`, replies `joined` to the new
/// player and tells everyone about the new line-up.
///
/// # Errors
/// [`RoomError::RoomFull`] when `max_players` is reached. On any error the
/// room is left as it was.
pub(crate) fn admit(
    room: &mut Room,
    name: &str,
    outbox: Outbox,
    max_players: Option<usize>,
) -> Result<PlayerId, ServerError> {
    if let Some(max) = max_players {
        if room.player_count() >= max {
            return Err(RoomError::RoomFull(max).into());
        }
    }

    let player = room.admit(name);
    if let Err(e) = greet(room, player.id, outbox) {
        room.remove(player.id);
        return Err(e);
    }
    Ok(player.id)
}

fn greet(
    room: &mut Room,
    player_id: PlayerId,
    outbox: Outbox,
) -> Result<(), ServerError> {
    room.attach(player_id, outbox)?;

    let joined = Message::with_payload(
        MessageType::Joined,
        &JoinedPayload {
            player_id,
            players: room.summary(),
        },
    )?;
    room.send_to(player_id, joined)?;
    room.broadcast(room_status(room, None, WAITING_FOR_PLAYER)?);
    Ok(())
}

/// Removes a departed player and tells whoever is left.
///
/// Safe to call more than once for the same player.
pub(crate) fn leave(room: &mut Room, player_id: PlayerId) {
    if room.remove(player_id).is_none() {
        return;
    }
    match room_status(room, Some(PLAYER_LEFT), PLAYER_LEFT) {
        Ok(msg) => {
            room.broadcast(msg);
        }
        Err(e) => {
            tracing::error!(%player_id, error = %e, "failed to build leave notice");
        }
    }
}

/// Routes one message from an admitted player.
///
/// Rejections (bad payload, taken side, wrong message type) are answered
/// with an `error` to the sender and are not errors here. An `Err` means a
/// reply could not be built or queued.
pub(crate) fn dispatch(
    room: &mut Room,
    player_id: PlayerId,
    msg: Message,
) -> Result<(), ServerError> {
    match &msg.kind {
        MessageType::ReadyStatus => on_ready_status(room, player_id, &msg),
        MessageType::Choose => on_choose(room, player_id, &msg),
        MessageType::AddCharacter => on_add_character(room, player_id),
        MessageType::Ping => {
            let pong = Message {
                kind: MessageType::Pong,
                payload: msg.payload,
                timestamp: 0,
            };
            room.send_to(player_id, pong)?;
            Ok(())
        }
        MessageType::Join => reject(room, player_id, "already joined"),
        MessageType::Unknown(tag) => {
            reject(room, player_id, &format!("unknown message type: {tag}"))
        }
        server_only => reject(
            room,
            player_id,
            &format!("{server_only} cannot be sent by a client"),
        ),
    }
}

fn on_ready_status(
    room: &mut Room,
    player_id: PlayerId,
    msg: &Message,
) -> Result<(), ServerError> {
    let Ok(ReadyStatusPayload { status }) =
        msg.payload_as::<ReadyStatusPayload>()
    else {
        return reject(room, player_id, "status must be a boolean");
    };

    let stage_change = match room.set_ready(player_id, status) {
        Ok(change) => change,
        Err(e) => return reject(room, player_id, &e.to_string()),
    };

    room.broadcast(lobby_data(room)?);
    if let Some(stage) = stage_change {
        room.broadcast(Message::with_payload(
            MessageType::GameStage,
            &GameStagePayload { stage },
        )?);
    }
    Ok(())
}

fn on_choose(
    room: &mut Room,
    player_id: PlayerId,
    msg: &Message,
) -> Result<(), ServerError> {
    let Ok(ChoosePayload { choice }) = msg.payload_as::<ChoosePayload>()
    else {
        return reject(
            room,
            player_id,
            &RoomError::InvalidChoice(String::new()).to_string(),
        );
    };

    let outcome = match room.record_choice(player_id, &choice) {
        Ok(outcome) => outcome,
        Err(e) => return reject(room, player_id, &e.to_string()),
    };

    room.broadcast(Message::with_payload(
        MessageType::ChoiceUpdate,
        &ChoiceUpdatePayload {
            taken_choices: outcome.taken,
        },
    )?);
    if let Some(resolution) = outcome.resolution {
        room.broadcast(Message::with_payload(
            MessageType::Result,
            &ResultPayload {
                flip: resolution.flip,
                winner_player_id: resolution.winner,
                taken_choices: TakenChoices::new(),
            },
        )?);
    }
    Ok(())
}

fn on_add_character(
    room: &mut Room,
    player_id: PlayerId,
) -> Result<(), ServerError> {
    if let Err(e) = room.add_character(player_id, Character::default()) {
        return reject(room, player_id, &e.to_string());
    }
    room.broadcast(lobby_data(room)?);
    Ok(())
}

/// Sends an `error` to one player only.
fn reject(
    room: &Room,
    player_id: PlayerId,
    reason: &str,
) -> Result<(), ServerError> {
    tracing::debug!(%player_id, reason, "request rejected");
    room.send_to(player_id, error_message(reason)?)?;
    Ok(())
}

/// Builds an `error` message.
pub(crate) fn error_message(reason: &str) -> Result<Message, ProtocolError> {
    Message::with_payload(
        MessageType::Error,
        &ErrorPayload {
            message: reason.to_string(),
        },
    )
}

fn lobby_data(room: &Room) -> Result<Message, ProtocolError> {
    Message::with_payload(
        MessageType::LobbyData,
        &LobbyPayload {
            players: room.summary(),
            message: None,
        },
    )
}

/// `lobby_data` once enough players are present, `waiting` before that.
fn room_status(
    room: &Room,
    lobby_note: Option<&str>,
    waiting_note: &str,
) -> Result<Message, ProtocolError> {
    let players = room.summary();
    if players.len() >= LOBBY_SIZE {
        Message::with_payload(
            MessageType::LobbyData,
            &LobbyPayload {
                players,
                message: lobby_note.map(str::to_string),
            },
        )
    } else {
        Message::with_payload(
            MessageType::Waiting,
            &LobbyPayload {
                players,
                message: Some(waiting_note.to_string()),
            },
        )
    }
}
