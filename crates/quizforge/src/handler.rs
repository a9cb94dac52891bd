//! Per-datagram handler: decode, then route to the engine.
//!
//! Each inbound datagram gets its own Tokio task running
//! [`handle_datagram`]. The flow is:
//!   1. Decode the envelope into a typed `ClientMessage` → drop on failure
//!   2. Refresh the sender's reply address in their session
//!   3. Dispatch by message kind to the matching engine operation
//!   4. Report a failed operation back to the sender as ERROR
//!
//! Replies that belong to the game itself (CREATE_GAME, QUESTION, ...)
//! are queued by the engine. The handler only sends LOGIN replies and
//! errors.

use std::net::SocketAddr;

use quizforge_protocol::{ClientMessage, Codec, ServerMessage};
use quizforge_room::{Outbound, RoomError};
use quizforge_store::{Repository, StoreError};
use quizforge_transport::Datagram;

use crate::server::ServerState;

/// Handles one inbound datagram from decode to reply.
pub(crate) async fn handle_datagram<R, C>(
    state: &ServerState<R, C>,
    datagram: Datagram,
) where
    R: Repository,
    C: Codec,
{
    let Datagram { data, peer } = datagram;

    let message = match state.codec.decode_client(&data) {
        Ok(message) => message,
        Err(e) => {
            tracing::warn!(%peer, error = %e, "dropping undecodable datagram");
            return;
        }
    };
    let kind = message.kind();
    tracing::debug!(%peer, kind, "message received");

    if let Some(user_id) = message.player_id() {
        state.engine.touch_player(user_id, peer).await;
    }

    if let Err(e) = dispatch(state, message, peer).await {
        let code = status_code(&e);
        tracing::debug!(%peer, kind, code, error = %e, "request failed");
        reply(
            state,
            peer,
            ServerMessage::Error {
                code,
                message: e.to_string(),
            },
        );
    }
}

/// The dispatch table: one arm per inbound message kind.
async fn dispatch<R, C>(
    state: &ServerState<R, C>,
    message: ClientMessage,
    peer: SocketAddr,
) -> Result<(), RoomError>
where
    R: Repository,
    C: Codec,
{
    let engine = &state.engine;

    match message {
        ClientMessage::Login(req) => {
            let response = match engine.login(&req.email).await {
                Ok(user) => {
                    tracing::info!(user_id = %user.id, %peer, "player logged in");
                    ServerMessage::LoginOk {
                        user_id: user.id,
                        email: user.email,
                    }
                }
                Err(e) => {
                    tracing::debug!(email = %req.email, error = %e, "login rejected");
                    ServerMessage::LoginError
                }
            };
            reply(state, peer, response);
        }

        ClientMessage::CreateGame(req) => {
            engine.create_session(req.user_id, req.mode, peer).await?;
        }

        ClientMessage::JoinGame(req) => {
            engine
                .join_session(&req.game_code, req.user_id, peer)
                .await?;
        }

        ClientMessage::StartGame(req) => {
            engine.start_session(&req.game_code).await?;
        }

        ClientMessage::Answer(req) => {
            engine
                .submit_answer(req.user_id, req.question_id, req.choice)
                .await?;
        }

        ClientMessage::RequestRiddleHint(req) => {
            engine.request_hint(req.user_id, req.hint_type).await?;
        }

        ClientMessage::RiddleAnswer(req) => {
            engine.guess_riddle(req.user_id, &req.answer).await?;
        }
    }

    Ok(())
}

/// Maps an engine failure to an HTTP-like status code.
pub(crate) fn status_code(error: &RoomError) -> u16 {
    match error {
        RoomError::SessionNotFound(_)
        | RoomError::NotInSession(_)
        | RoomError::Store(StoreError::UnknownUser(_))
        | RoomError::Store(StoreError::UnknownEmail(_)) => 404,

        RoomError::AlreadyInSession { .. }
        | RoomError::CodeInUse(_)
        | RoomError::InvalidState(_)
        | RoomError::AlreadyStarted(_)
        | RoomError::InvalidHintLevel(_)
        | RoomError::NoRiddle => 400,

        RoomError::RegistryFull | RoomError::Store(_) => 500,
    }
}

fn reply<R, C>(state: &ServerState<R, C>, addr: SocketAddr, message: ServerMessage)
where
    R: Repository,
    C: Codec,
{
    if state.outbound.send(Outbound { addr, message }).is_err() {
        tracing::debug!(%addr, "outbound queue closed, reply dropped");
    }
}
