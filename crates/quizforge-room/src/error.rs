//! Error types for the room layer.

use quizforge_protocol::{GameCode, PlayerId};
use quizforge_store::StoreError;

/// Errors that can occur during session operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// No live session has this code.
    #[error("session {0} not found")]
    SessionNotFound(GameCode),

    /// The player is not in any live session.
    #[error("player {0} is not in any session")]
    NotInSession(PlayerId),

    /// The player is still playing in another session.
    #[error("player {player} is already playing in session {code}")]
    AlreadyInSession { player: PlayerId, code: GameCode },

    /// A session with this code already exists.
    #[error("session code {0} is already in use")]
    CodeInUse(GameCode),

    /// Every code of the configured width is taken.
    #[error("no free session code left")]
    RegistryFull,

    /// The session is in a state that doesn't allow this operation.
    /// For example, guessing the riddle during the multiple-choice round.
    #[error("invalid session state for this operation: {0}")]
    InvalidState(String),

    /// The round sequence was already started once.
    #[error("session {0} already started")]
    AlreadyStarted(GameCode),

    /// Only hint levels 1 and 2 exist.
    #[error("invalid hint level {0}")]
    InvalidHintLevel(i64),

    /// The session has no riddle loaded.
    #[error("no riddle in this session")]
    NoRiddle,

    /// The repository failed or had no matching data.
    #[error(transparent)]
    Store(#[from] StoreError),
}
