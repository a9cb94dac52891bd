//! Transport abstraction layer for quizforge.
//!
//! Provides the [`Transport`] trait over a connectionless datagram socket.
//! There are no connections to accept: every inbound [`Datagram`] carries the
//! peer address it came from, and replies are addressed explicitly.
//!
//! # Feature Flags
//!
//! - `udp` (default): UDP transport via `tokio::net::UdpSocket`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "udp")]
mod udp;

pub use error::TransportError;
#[cfg(feature = "udp")]
pub use udp::UdpTransport;

use std::net::SocketAddr;

/// Size of the receive buffer. Larger datagrams are truncated to this
/// length and will fail to parse further up the stack.
pub const MAX_DATAGRAM_SIZE: usize = 4096;

/// One inbound datagram and the address it was sent from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datagram {
    /// Raw payload bytes, at most [`MAX_DATAGRAM_SIZE`] long.
    pub data: Vec<u8>,
    /// Where the datagram came from. Replies go back here.
    pub peer: SocketAddr,
}

/// A bound datagram socket that can receive from and send to any peer.
pub trait Transport: Send + Sync + 'static {
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;

    /// Waits for the next inbound datagram.
    async fn recv(&self) -> Result<Datagram, Self::Error>;

    /// Sends one datagram to `peer`.
    async fn send_to(
        &self,
        data: &[u8],
        peer: SocketAddr,
    ) -> Result<(), Self::Error>;

    /// The local address the socket is bound to.
    fn local_addr(&self) -> std::io::Result<SocketAddr>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_datagram_equality_includes_peer() {
        let a = Datagram {
            data: b"hi".to_vec(),
            peer: "127.0.0.1:9000".parse().unwrap(),
        };
        let mut b = a.clone();
        assert_eq!(a, b);

        b.peer = "127.0.0.1:9001".parse().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_max_datagram_size_matches_receive_buffer() {
        assert_eq!(MAX_DATAGRAM_SIZE, 4096);
    }
}
