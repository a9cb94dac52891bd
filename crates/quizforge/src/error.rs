//! Unified error type for the quizforge server.

use quizforge_protocol::ProtocolError;
use quizforge_room::RoomError;
use quizforge_store::StoreError;
use quizforge_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `quizforge` meta-crate, you deal with this single
/// error type instead of importing errors from each sub-crate.
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum QuizError {
    /// A transport-level error (bind, send, receive).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, unknown message type).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A repository error (missing data, storage unavailable, bad seed).
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A session-level error (not found, invalid state, already started).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// The server config file is not valid JSON for [`ServerConfig`](crate::ServerConfig).
    #[error("invalid server config: {0}")]
    Config(#[from] serde_json::Error),

    /// The server config file could not be read.
    #[error("failed to read server config: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use quizforge_protocol::{GameCode, PlayerId};

    #[test]
    fn test_from_transport_error() {
        let io = std::io::Error::new(std::io::ErrorKind::AddrInUse, "taken");
        let err: QuizError = TransportError::BindFailed(io).into();
        assert!(matches!(err, QuizError::Transport(_)));
        assert!(err.to_string().contains("taken"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err: QuizError = ProtocolError::UnknownType("PING".into()).into();
        assert!(matches!(err, QuizError::Protocol(_)));
        assert!(err.to_string().contains("PING"));
    }

    #[test]
    fn test_from_store_error() {
        let err: QuizError = StoreError::UnknownUser(PlayerId(7)).into();
        assert!(matches!(err, QuizError::Store(_)));
    }

    #[test]
    fn test_from_room_error() {
        let err: QuizError = RoomError::SessionNotFound(GameCode::new("1234")).into();
        assert!(matches!(err, QuizError::Room(_)));
        assert!(err.to_string().contains("1234"));
    }

    #[test]
    fn test_from_config_error() {
        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: QuizError = parse.into();
        assert!(matches!(err, QuizError::Config(_)));
    }
}
