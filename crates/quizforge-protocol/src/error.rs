//! Error types for the protocol layer.
//!
//! Each crate in quizforge defines its own error enum. When you see a
//! `ProtocolError`, the problem is in the bytes a client sent (or in
//! serializing a reply), not in session state or storage.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// The bytes are not a valid envelope: malformed or truncated JSON,
    /// or a missing `type` tag.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The envelope parsed but its `type` tag names no inbound message.
    #[error("unknown message type: {0}")]
    UnknownType(String),

    /// The envelope's tag is known but the payload has the wrong shape
    /// (missing field, wrong field type, out-of-range value).
    #[error("invalid {kind} payload: {source}")]
    InvalidPayload {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
}
