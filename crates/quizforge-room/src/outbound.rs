//! Outbound queue: how the engine hands replies to the network layer.
//!
//! The engine never touches a socket. Every reply or broadcast becomes an
//! [`Outbound`] on an unbounded channel, and whoever owns the socket drains
//! the channel, encodes, and sends. Tests hold the receiving end instead.

use std::net::SocketAddr;

use quizforge_protocol::{PlayerId, ServerMessage};
use tokio::sync::mpsc;

/// One message addressed to one peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub addr: SocketAddr,
    pub message: ServerMessage,
}

pub type OutboundSender = mpsc::UnboundedSender<Outbound>;
pub type OutboundReceiver = mpsc::UnboundedReceiver<Outbound>;

/// Creates the outbound queue.
pub fn outbound_channel() -> (OutboundSender, OutboundReceiver) {
    mpsc::unbounded_channel()
}

/// A broadcast target: a player and their last known reply address.
pub(crate) type Recipient = (PlayerId, Option<SocketAddr>);

pub(crate) fn send(tx: &OutboundSender, addr: SocketAddr, message: ServerMessage) {
    if tx.send(Outbound { addr, message }).is_err() {
        tracing::debug!(%addr, "outbound queue closed, message dropped");
    }
}

/// Sends `message` to every recipient with a known address. Players without
/// one are skipped.
pub(crate) fn broadcast(
    tx: &OutboundSender,
    recipients: &[Recipient],
    message: &ServerMessage,
) {
    for (player_id, addr) in recipients {
        match addr {
            Some(addr) => send(tx, *addr, message.clone()),
            None => tracing::warn!(
                %player_id,
                kind = message.kind(),
                "no reply address, broadcast skipped"
            ),
        }
    }
}
