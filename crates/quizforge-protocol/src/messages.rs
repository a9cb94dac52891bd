//! Typed messages: one payload struct per message kind.
//!
//! Inbound datagrams become a [`ClientMessage`] through
//! [`ClientMessage::from_envelope`]; outbound replies are a
//! [`ServerMessage`], which serializes straight to the envelope shape.

use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;

use crate::{Envelope, GameCode, PlayerId, ProtocolError, QuestionId, RiddleId};

/// Wire names of every message kind.
pub mod kind {
    pub const LOGIN: &str = "LOGIN";
    pub const LOGIN_OK: &str = "LOGIN_OK";
    pub const LOGIN_ERROR: &str = "LOGIN_ERROR";
    pub const CREATE_GAME: &str = "CREATE_GAME";
    pub const JOIN_GAME: &str = "JOIN_GAME";
    pub const START_GAME: &str = "START_GAME";
    pub const GAME_START: &str = "GAME_START";
    pub const QUESTION: &str = "QUESTION";
    pub const ANSWER: &str = "ANSWER";
    pub const SCORE_UPDATE: &str = "SCORE_UPDATE";
    pub const RIDDLE: &str = "RIDDLE";
    pub const REQUEST_RIDDLE_HINT: &str = "REQUEST_RIDDLE_HINT";
    pub const RIDDLE_HINT: &str = "RIDDLE_HINT";
    pub const RIDDLE_ANSWER: &str = "RIDDLE_ANSWER";
    pub const GAME_OVER: &str = "GAME_OVER";
    pub const ERROR: &str = "ERROR";
}

// ---------------------------------------------------------------------------
// Inbound payloads
// ---------------------------------------------------------------------------

/// How a new session starts: `Solo` starts right away, `Multi` waits in
/// the lobby for more players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    Solo,
    Multi,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateGameRequest {
    pub user_id: PlayerId,
    pub mode: GameMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinGameRequest {
    pub user_id: PlayerId,
    pub game_code: GameCode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartGameRequest {
    pub game_code: GameCode,
}

/// An answer to a multiple-choice question.
///
/// `choice` is kept signed and unbounded here: any integer is a well-formed
/// answer, and values outside `0..=3` are simply wrong.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRequest {
    pub user_id: PlayerId,
    pub question_id: QuestionId,
    pub choice: i64,
}

/// A request for one of the riddle's hints. Only levels 1 and 2 exist;
/// the engine rejects anything else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HintRequest {
    pub user_id: PlayerId,
    pub hint_type: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiddleAnswerRequest {
    pub user_id: PlayerId,
    pub answer: String,
}

/// Every message a client may send, validated by kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    Login(LoginRequest),
    CreateGame(CreateGameRequest),
    JoinGame(JoinGameRequest),
    StartGame(StartGameRequest),
    Answer(AnswerRequest),
    RequestRiddleHint(HintRequest),
    RiddleAnswer(RiddleAnswerRequest),
}

fn payload<T: DeserializeOwned>(
    kind: &'static str,
    value: serde_json::Value,
) -> Result<T, ProtocolError> {
    serde_json::from_value(value)
        .map_err(|source| ProtocolError::InvalidPayload { kind, source })
}

impl ClientMessage {
    /// Parses the envelope's payload into the shape its tag requires.
    ///
    /// # Errors
    /// - `ProtocolError::UnknownType` if the tag is not an inbound kind
    /// - `ProtocolError::InvalidPayload` if the payload doesn't match
    pub fn from_envelope(envelope: Envelope) -> Result<Self, ProtocolError> {
        let Envelope { kind: tag, payload: body } = envelope;
        let msg = match tag.as_str() {
            kind::LOGIN => Self::Login(payload(kind::LOGIN, body)?),
            kind::CREATE_GAME => {
                Self::CreateGame(payload(kind::CREATE_GAME, body)?)
            }
            kind::JOIN_GAME => Self::JoinGame(payload(kind::JOIN_GAME, body)?),
            kind::START_GAME => {
                Self::StartGame(payload(kind::START_GAME, body)?)
            }
            kind::ANSWER => Self::Answer(payload(kind::ANSWER, body)?),
            kind::REQUEST_RIDDLE_HINT => Self::RequestRiddleHint(payload(
                kind::REQUEST_RIDDLE_HINT,
                body,
            )?),
            kind::RIDDLE_ANSWER => {
                Self::RiddleAnswer(payload(kind::RIDDLE_ANSWER, body)?)
            }
            _ => return Err(ProtocolError::UnknownType(tag)),
        };
        Ok(msg)
    }

    /// Wraps the message back into an envelope, as a client would send it.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the payload fails to serialize.
    pub fn to_envelope(&self) -> Result<Envelope, ProtocolError> {
        let payload = match self {
            Self::Login(p) => serde_json::to_value(p),
            Self::CreateGame(p) => serde_json::to_value(p),
            Self::JoinGame(p) => serde_json::to_value(p),
            Self::StartGame(p) => serde_json::to_value(p),
            Self::Answer(p) => serde_json::to_value(p),
            Self::RequestRiddleHint(p) => serde_json::to_value(p),
            Self::RiddleAnswer(p) => serde_json::to_value(p),
        }
        .map_err(ProtocolError::Encode)?;

        Ok(Envelope {
            kind: self.kind().to_string(),
            payload,
        })
    }

    /// The wire tag of this message.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Login(_) => kind::LOGIN,
            Self::CreateGame(_) => kind::CREATE_GAME,
            Self::JoinGame(_) => kind::JOIN_GAME,
            Self::StartGame(_) => kind::START_GAME,
            Self::Answer(_) => kind::ANSWER,
            Self::RequestRiddleHint(_) => kind::REQUEST_RIDDLE_HINT,
            Self::RiddleAnswer(_) => kind::RIDDLE_ANSWER,
        }
    }

    /// The player the message speaks for, if it carries one.
    ///
    /// LOGIN identifies by email and START_GAME by code only, so both
    /// return `None`.
    pub fn player_id(&self) -> Option<PlayerId> {
        match self {
            Self::Login(_) | Self::StartGame(_) => None,
            Self::CreateGame(p) => Some(p.user_id),
            Self::JoinGame(p) => Some(p.user_id),
            Self::Answer(p) => Some(p.user_id),
            Self::RequestRiddleHint(p) => Some(p.user_id),
            Self::RiddleAnswer(p) => Some(p.user_id),
        }
    }
}

// ---------------------------------------------------------------------------
// Outbound payloads
// ---------------------------------------------------------------------------

/// A question as players see it: no correct marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionView {
    pub id: QuestionId,
    pub text: String,
    pub options: [String; 4],
    pub level: u32,
}

/// One row of the final scoreboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerResult {
    pub user_id: PlayerId,
    pub email: String,
    pub score: i64,
}

/// Every message the server sends.
///
/// Adjacent tagging produces the envelope shape directly:
/// `{"type": "RIDDLE", "payload": {"riddle_id": 1, "text": "..."}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ServerMessage {
    #[serde(rename = "LOGIN_OK")]
    LoginOk { user_id: PlayerId, email: String },

    #[serde(rename = "LOGIN_ERROR")]
    LoginError,

    #[serde(rename = "CREATE_GAME")]
    GameCreated { game_code: GameCode, mode: GameMode },

    #[serde(rename = "JOIN_GAME")]
    GameJoined {
        game_code: GameCode,
        players: Vec<PlayerId>,
    },

    #[serde(rename = "GAME_START")]
    GameStart {
        game_code: GameCode,
        players: Vec<PlayerId>,
    },

    #[serde(rename = "QUESTION")]
    Question { question: QuestionView, manche: u32 },

    #[serde(rename = "RIDDLE")]
    Riddle { riddle_id: RiddleId, text: String },

    #[serde(rename = "RIDDLE_HINT")]
    RiddleHint {
        riddle_id: RiddleId,
        text: String,
        cost: i64,
    },

    #[serde(rename = "SCORE_UPDATE")]
    ScoreUpdate { user_id: PlayerId, score: i64 },

    #[serde(rename = "GAME_OVER")]
    GameOver { results: Vec<PlayerResult> },

    /// A request could not be served. `code` follows HTTP conventions.
    #[serde(rename = "ERROR")]
    Error { code: u16, message: String },
}

impl ServerMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::LoginOk { .. } => kind::LOGIN_OK,
            Self::LoginError => kind::LOGIN_ERROR,
            Self::GameCreated { .. } => kind::CREATE_GAME,
            Self::GameJoined { .. } => kind::JOIN_GAME,
            Self::GameStart { .. } => kind::GAME_START,
            Self::Question { .. } => kind::QUESTION,
            Self::Riddle { .. } => kind::RIDDLE,
            Self::RiddleHint { .. } => kind::RIDDLE_HINT,
            Self::ScoreUpdate { .. } => kind::SCORE_UPDATE,
            Self::GameOver { .. } => kind::GAME_OVER,
            Self::Error { .. } => kind::ERROR,
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(kind: &str, payload: serde_json::Value) -> Envelope {
        Envelope {
            kind: kind.to_string(),
            payload,
        }
    }

    #[test]
    fn test_from_envelope_create_game_multi() {
        let env = envelope(kind::CREATE_GAME, json!({ "user_id": 3, "mode": "multi" }));
        let msg = ClientMessage::from_envelope(env).unwrap();
        assert_eq!(
            msg,
            ClientMessage::CreateGame(CreateGameRequest {
                user_id: PlayerId(3),
                mode: GameMode::Multi,
            })
        );
    }

    #[test]
    fn test_from_envelope_unknown_mode_is_invalid_payload() {
        let env = envelope(kind::CREATE_GAME, json!({ "user_id": 3, "mode": "duo" }));
        let result = ClientMessage::from_envelope(env);
        assert!(matches!(
            result,
            Err(ProtocolError::InvalidPayload { kind: "CREATE_GAME", .. })
        ));
    }

    #[test]
    fn test_from_envelope_missing_field_is_invalid_payload() {
        let env = envelope(kind::ANSWER, json!({ "user_id": 1, "choice": 2 }));
        let result = ClientMessage::from_envelope(env);
        assert!(matches!(
            result,
            Err(ProtocolError::InvalidPayload { kind: "ANSWER", .. })
        ));
    }

    #[test]
    fn test_from_envelope_wrong_field_type_is_invalid_payload() {
        let env = envelope(kind::JOIN_GAME, json!({ "user_id": "seven", "game_code": "1234" }));
        let result = ClientMessage::from_envelope(env);
        assert!(matches!(result, Err(ProtocolError::InvalidPayload { .. })));
    }

    #[test]
    fn test_from_envelope_null_payload_is_invalid_payload() {
        let env = envelope(kind::LOGIN, serde_json::Value::Null);
        let result = ClientMessage::from_envelope(env);
        assert!(matches!(result, Err(ProtocolError::InvalidPayload { .. })));
    }

    #[test]
    fn test_from_envelope_out_of_range_choice_still_parses() {
        let env = envelope(
            kind::ANSWER,
            json!({ "user_id": 1, "question_id": 9, "choice": 7 }),
        );
        let msg = ClientMessage::from_envelope(env).unwrap();
        assert!(matches!(msg, ClientMessage::Answer(AnswerRequest { choice: 7, .. })));
    }

    #[test]
    fn test_from_envelope_hint_level_any_integer() {
        let env = envelope(kind::REQUEST_RIDDLE_HINT, json!({ "user_id": 1, "hint_type": 3 }));
        let msg = ClientMessage::from_envelope(env).unwrap();
        assert!(matches!(
            msg,
            ClientMessage::RequestRiddleHint(HintRequest { hint_type: 3, .. })
        ));
    }

    #[test]
    fn test_to_envelope_matches_wire_shape() {
        let msg = ClientMessage::RiddleAnswer(RiddleAnswerRequest {
            user_id: PlayerId(4),
            answer: "cat".into(),
        });
        let env = msg.to_envelope().unwrap();
        assert_eq!(env.kind, "RIDDLE_ANSWER");
        assert_eq!(env.payload, json!({ "user_id": 4, "answer": "cat" }));
        assert_eq!(ClientMessage::from_envelope(env).unwrap(), msg);
    }

    #[test]
    fn test_player_id_absent_for_login_and_start() {
        let login = ClientMessage::Login(LoginRequest {
            email: "a@b.c".into(),
            password: "x".into(),
        });
        let start = ClientMessage::StartGame(StartGameRequest {
            game_code: GameCode::new("0001"),
        });
        assert_eq!(login.player_id(), None);
        assert_eq!(start.player_id(), None);
    }

    #[test]
    fn test_server_question_json_format() {
        let msg = ServerMessage::Question {
            question: QuestionView {
                id: QuestionId(12),
                text: "Capital of France?".into(),
                options: [
                    "Berlin".into(),
                    "Paris".into(),
                    "Rome".into(),
                    "Madrid".into(),
                ],
                level: 1,
            },
            manche: 1,
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            json,
            json!({
                "type": "QUESTION",
                "payload": {
                    "question": {
                        "id": 12,
                        "text": "Capital of France?",
                        "options": ["Berlin", "Paris", "Rome", "Madrid"],
                        "level": 1
                    },
                    "manche": 1
                }
            })
        );
    }

    #[test]
    fn test_server_create_game_json_format() {
        let msg = ServerMessage::GameCreated {
            game_code: GameCode::new("0420"),
            mode: GameMode::Solo,
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            json,
            json!({ "type": "CREATE_GAME", "payload": { "game_code": "0420", "mode": "solo" } })
        );
    }

    #[test]
    fn test_server_login_error_has_no_payload() {
        let json = serde_json::to_value(ServerMessage::LoginError).unwrap();
        assert_eq!(json["type"], "LOGIN_ERROR");
        assert!(json.get("payload").is_none());
    }

    #[test]
    fn test_server_game_over_keeps_result_order() {
        let msg = ServerMessage::GameOver {
            results: vec![
                PlayerResult { user_id: PlayerId(2), email: "b@x".into(), score: 220 },
                PlayerResult { user_id: PlayerId(1), email: "a@x".into(), score: 120 },
            ],
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "GAME_OVER");
        assert_eq!(json["payload"]["results"][0]["score"], 220);
        assert_eq!(json["payload"]["results"][1]["user_id"], 1);
    }

    #[test]
    fn test_server_kind_matches_serialized_tag() {
        let messages = [
            ServerMessage::LoginError,
            ServerMessage::ScoreUpdate { user_id: PlayerId(1), score: -25 },
            ServerMessage::Error { code: 404, message: "no such game".into() },
            ServerMessage::RiddleHint {
                riddle_id: RiddleId(1),
                text: "meows".into(),
                cost: 25,
            },
        ];
        for msg in messages {
            let json = serde_json::to_value(&msg).unwrap();
            assert_eq!(json["type"], msg.kind());
        }
    }
}
