//! Core protocol types: identity newtypes and the datagram envelope.
//!
//! These are the structures that get serialized to bytes, sent in a
//! datagram, and deserialized on the other side.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a player (the user's numeric id).
///
/// This is a "newtype wrapper": a `u64` that can't be confused with a
/// [`QuestionId`] or [`RiddleId`], even though all three are numbers
/// underneath. `#[serde(transparent)]` keeps it a plain number on the wire,
/// so `PlayerId(42)` is just `42` in JSON.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

/// Display lets us use `{}` in format strings and logging.
/// `tracing::info!(%player_id, "joined")` prints `player_id=P-42`.
impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// The short public code players use to join a game session.
///
/// Codes are zero-padded digit strings (`"0042"`), so they are kept as
/// strings rather than numbers: `"0042"` and `"42"` are different codes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameCode(String);

impl GameCode {
    /// Wraps a code string as-is.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Formats `value` as a zero-padded code of `digits` width.
    ///
    /// ```rust
    /// use quizforge_protocol::GameCode;
    /// assert_eq!(GameCode::from_number(42, 4).as_str(), "0042");
    /// ```
    pub fn from_number(value: u32, digits: usize) -> Self {
        Self(format!("{value:0digits$}"))
    }

    /// The code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GameCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a multiple-choice question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(pub u64);

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q-{}", self.0)
    }
}

/// Identifier of a riddle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RiddleId(pub u64);

impl fmt::Display for RiddleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RD-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Envelope: the top-level wire format
// ---------------------------------------------------------------------------

/// The outer shape of every datagram: a type tag plus an opaque payload.
///
/// ```text
/// { "type": "ANSWER", "payload": { "user_id": 7, "question_id": 3, "choice": 1 } }
/// ```
///
/// The payload stays an untyped JSON value at this level. Turning it into a
/// typed message is the job of
/// [`ClientMessage::from_envelope`](crate::ClientMessage::from_envelope),
/// which knows which shape each tag requires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// The message kind, e.g. `"LOGIN"` or `"ANSWER"`.
    #[serde(rename = "type")]
    pub kind: String,

    /// The message body. A missing payload decodes as `null`.
    #[serde(default)]
    pub payload: serde_json::Value,
}

// =========================================================================
// Tests
// =========================================================================
