//! Codec trait and implementations for serializing/deserializing messages.
//!
//! A "codec" (coder/decoder) converts between Rust types and raw bytes.
//! The server doesn't care HOW messages are serialized. It just needs
//! something that implements the [`Codec`] trait.
//!
//! Quiz clients speak JSON, so [`JsonCodec`] is the only implementation.

use serde::{de::DeserializeOwned, Serialize};

use crate::{ClientMessage, Envelope, ProtocolError};

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// ## Trait bounds explained
///
/// - `Send + Sync` → safe to share between the per-datagram handler tasks.
/// - `'static` → the codec owns everything it needs, so it can live inside
///   the long-lived server state.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;

    /// Decodes one inbound datagram all the way to a typed
    /// [`ClientMessage`].
    ///
    /// # Errors
    /// - `ProtocolError::Decode`: not an envelope
    /// - `ProtocolError::UnknownType`: unknown `type` tag
    /// - `ProtocolError::InvalidPayload`: payload doesn't fit the tag
    fn decode_client(
        &self,
        data: &[u8],
    ) -> Result<ClientMessage, ProtocolError> {
        let envelope: Envelope = self.decode(data)?;
        ClientMessage::from_envelope(envelope)
    }
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// ## Example
///
/// ```rust
/// use quizforge_protocol::{Codec, JsonCodec, ServerMessage};
///
/// let codec = JsonCodec;
/// let msg = ServerMessage::LoginError;
///
/// let bytes = codec.encode(&msg).unwrap();
/// let decoded: ServerMessage = codec.decode(&bytes).unwrap();
/// assert_eq!(msg, decoded);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{kind, PlayerId};

    #[test]
    fn test_decode_client_valid_login() {
        let data = br#"{"type":"LOGIN","payload":{"email":"a@b.c","password":"pw"}}"#;
        let msg = JsonCodec.decode_client(data).expect("should decode");
        assert_eq!(msg.kind(), kind::LOGIN);
    }

    #[test]
    fn test_decode_client_garbage_is_decode_error() {
        let result = JsonCodec.decode_client(b"not json at all");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_decode_client_truncated_is_decode_error() {
        let data = br#"{"type":"ANSWER","payload":{"user_id":1,"quest"#;
        let result = JsonCodec.decode_client(data);
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_decode_client_unknown_type() {
        let data = br#"{"type":"FLY_TO_MOON","payload":{}}"#;
        let result = JsonCodec.decode_client(data);
        assert!(
            matches!(result, Err(ProtocolError::UnknownType(ref t)) if t == "FLY_TO_MOON")
        );
    }

    #[test]
    fn test_decode_client_answer_carries_player() {
        let data = br#"{"type":"ANSWER","payload":{"user_id":7,"question_id":3,"choice":1}}"#;
        let msg = JsonCodec.decode_client(data).unwrap();
        assert_eq!(msg.player_id(), Some(PlayerId(7)));
    }
}
