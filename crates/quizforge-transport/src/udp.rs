//! UDP transport implementation using `tokio::net::UdpSocket`.

use std::net::SocketAddr;

use tokio::net::UdpSocket;

use crate::{Datagram, Transport, TransportError, MAX_DATAGRAM_SIZE};

/// A UDP-based [`Transport`].
///
/// All methods take `&self`, so one instance can be shared behind an `Arc`
/// between the receive loop and the outbound sender.
pub struct UdpTransport {
    socket: UdpSocket,
}

impl UdpTransport {
    /// Binds a new UDP transport to the given address.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(TransportError::BindFailed)?;
        tracing::info!(addr, "UDP transport listening");
        Ok(Self { socket })
    }
}

impl Transport for UdpTransport {
    type Error = TransportError;

    async fn recv(&self) -> Result<Datagram, Self::Error> {
        let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
        let (len, peer) = self
            .socket
            .recv_from(&mut buf)
            .await
            .map_err(TransportError::ReceiveFailed)?;
        buf.truncate(len);
        tracing::trace!(%peer, len, "datagram received");
        Ok(Datagram { data: buf, peer })
    }

    async fn send_to(
        &self,
        data: &[u8],
        peer: SocketAddr,
    ) -> Result<(), Self::Error> {
        self.socket
            .send_to(data, peer)
            .await
            .map(|_| ())
            .map_err(|source| TransportError::SendFailed { peer, source })
    }

    fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}
