//! Typed payload bodies, one per message type that carries data.
//!
//! Keys are camelCase on the wire (`playerId`, `takenChoices`) to match the
//! browser client.

use serde::{Deserialize, Serialize};

use crate::{Choice, PlayerId, PlayerSummary, Stage, TakenChoices};

// -- Client → Server --

/// `join`: the first message on every connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinPayload {
    /// Display name. Older clients send it as `playerName`.
    #[serde(alias = "playerName")]
    pub name: String,
}

/// `ready_status`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadyStatusPayload {
    pub status: bool,
}

/// `choose`: the raw string is kept so the room can reject anything that
/// isn't exactly `heads` or `tails`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoosePayload {
    pub choice: String,
}

// -- Server → Client --

/// `joined`: sent only to the player who just joined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinedPayload {
    pub player_id: PlayerId,
    pub players: Vec<PlayerSummary>,
}

/// `lobby_data` and `waiting`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobbyPayload {
    pub players: Vec<PlayerSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// `game_stage`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStagePayload {
    pub stage: Stage,
}

/// `choice_update`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceUpdatePayload {
    pub taken_choices: TakenChoices,
}

/// `result`: the outcome of a resolved round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultPayload {
    pub flip: Choice,
    /// `null` when nobody picked the side that came up.
    pub winner_player_id: Option<PlayerId>,
    /// The choices left after the round, which is always empty.
    pub taken_choices: TakenChoices,
}

/// `error`: a human-readable reason, sent only to the offending client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use uuid::Uuid;

    use super::*;
    use crate::{Message, MessageType};

    fn pid(n: u128) -> PlayerId {
        PlayerId(Uuid::from_u128(n))
    }

    #[test]
    fn test_join_accepts_name_and_legacy_player_name() {
        let msg: Message =
            serde_json::from_str(r#"{"type":"join","payload":{"name":"Ada"}}"#).unwrap();
        assert_eq!(msg.payload_as::<JoinPayload>().unwrap().name, "Ada");

        let msg: Message = serde_json::from_str(
            r#"{"type":"join","payload":{"playerName":"Grace"}}"#,
        )
        .unwrap();
        assert_eq!(msg.payload_as::<JoinPayload>().unwrap().name, "Grace");
    }

    #[test]
    fn test_join_without_name_is_rejected() {
        let msg: Message =
            serde_json::from_str(r#"{"type":"join","payload":{}}"#).unwrap();
        assert!(msg.payload_as::<JoinPayload>().is_err());
    }

    #[test]
    fn test_joined_json_format() {
        let body = JoinedPayload {
            player_id: pid(1),
            players: vec![PlayerSummary {
                id: pid(1),
                name: "Ada".into(),
                ready: false,
                characters: vec![],
            }],
        };
        let msg = Message::with_payload(MessageType::Joined, &body).unwrap();
        let json = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["type"], "joined");
        assert_eq!(json["payload"]["playerId"], pid(1).to_string());
        assert_eq!(json["payload"]["players"][0]["name"], "Ada");
        assert_eq!(json["payload"]["players"][0]["ready"], false);
    }

    #[test]
    fn test_lobby_message_is_omitted_when_absent() {
        let body = LobbyPayload {
            players: vec![],
            message: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, json!({ "players": [] }));

        let body = LobbyPayload {
            players: vec![],
            message: Some("Waiting for another player...".into()),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["message"], "Waiting for another player...");
    }

    #[test]
    fn test_game_stage_json_format() {
        let body = GameStagePayload {
            stage: Stage::GameStarted,
        };
        assert_eq!(
            serde_json::to_value(body).unwrap(),
            json!({ "stage": "gameStarted" })
        );
    }

    #[test]
    fn test_result_json_format() {
        let body = ResultPayload {
            flip: Choice::Tails,
            winner_player_id: Some(pid(2)),
            taken_choices: TakenChoices::new(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["flip"], "tails");
        assert_eq!(json["winnerPlayerId"], pid(2).to_string());
        assert_eq!(json["takenChoices"], json!({}));

        let body = ResultPayload {
            winner_player_id: None,
            ..body
        };
        assert!(serde_json::to_value(&body).unwrap()["winnerPlayerId"].is_null());
    }

    #[test]
    fn test_choice_update_json_format() {
        let mut taken = TakenChoices::new();
        taken.insert(pid(7), Choice::Heads);
        let json = serde_json::to_value(ChoiceUpdatePayload {
            taken_choices: taken,
        })
        .unwrap();
        assert_eq!(json["takenChoices"][pid(7).to_string()], "heads");
    }
}
