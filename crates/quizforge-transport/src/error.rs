/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Binding the socket failed.
    #[error("bind failed: {0}")]
    BindFailed(#[source] std::io::Error),

    /// Sending a datagram failed.
    #[error("send to {peer} failed: {source}")]
    SendFailed {
        peer: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Receiving a datagram failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),
}
