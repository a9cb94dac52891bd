//! Wire protocol for quizforge.
//!
//! This crate defines the "language" that quiz clients and the server speak:
//!
//! - **Types** ([`Envelope`], [`PlayerId`], [`GameCode`], etc.): identity
//!   newtypes and the outer datagram shape.
//! - **Messages** ([`ClientMessage`], [`ServerMessage`]): one typed payload
//!   per message kind, validated when the envelope is decoded.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how messages are converted
//!   to/from bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong during
//!   encoding/decoding.
//!
//! # Architecture
//!
//! ```text
//! Transport (datagram) → Protocol (Envelope → ClientMessage) → Room engine
//! ```
//!
//! Decoding happens in two steps. The envelope is parsed first, which only
//! requires a `type` tag. The tag then selects the payload type, and the
//! payload is parsed into it. An unknown tag and a malformed payload are
//! therefore distinct errors, and neither ever reaches the engine.

mod codec;
mod error;
mod messages;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use messages::{
    kind, AnswerRequest, ClientMessage, CreateGameRequest, GameMode,
    HintRequest, JoinGameRequest, LoginRequest, PlayerResult, QuestionView,
    RiddleAnswerRequest, ServerMessage, StartGameRequest,
};
pub use types::{Envelope, GameCode, PlayerId, QuestionId, RiddleId};
