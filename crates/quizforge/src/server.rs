//! `QuizServer` builder and server loop.
//!
//! This is the entry point for running a quiz server. It ties together all
//! the layers: transport → protocol → room engine → store.
//!
//! ```text
//!                ┌──────────── intake (bounded) ────────────┐
//! UdpTransport ──┤ recv loop  → dispatcher → task per datagram ├─→ Engine
//!       ▲        └──────────────────────────────────────────┘      │
//!       └──────────── outbound drain ←─── outbound queue ←─────────┘
//! ```

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use quizforge_protocol::{Codec, JsonCodec};
use quizforge_room::{
    outbound_channel, Engine, GameConfig, Outbound, OutboundReceiver,
    OutboundSender,
};
use quizforge_store::Repository;
use quizforge_transport::{Datagram, Transport, UdpTransport};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::handler::handle_datagram;
use crate::QuizError;

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

/// Everything needed to start a server.
///
/// Like [`GameConfig`], missing fields fall back to their defaults when
/// loaded from JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the UDP socket binds to.
    pub bind_addr: String,

    /// How many received datagrams may wait for dispatch. Datagrams
    /// arriving while the queue is full are dropped.
    pub intake_capacity: usize,

    /// Round engine settings.
    pub game: GameConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:9000".to_string(),
            intake_capacity: 1024,
            game: GameConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Reads a config from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, QuizError> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

// ---------------------------------------------------------------------------
// ServerState
// ---------------------------------------------------------------------------

/// Shared server state passed to each datagram handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. The engine
/// does its own locking, so nothing here needs a `Mutex`.
pub(crate) struct ServerState<R: Repository, C: Codec> {
    pub(crate) engine: Engine<R>,
    pub(crate) outbound: OutboundSender,
    pub(crate) codec: C,
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for configuring and starting a quiz server.
///
/// # Example
///
/// ```rust,no_run
/// use quizforge::prelude::*;
///
/// # async fn demo() -> Result<(), QuizError> {
/// let repository = MemoryRepository::load("data/seed.json")?;
/// let server = QuizServer::<MemoryRepository>::builder()
///     .bind("0.0.0.0:9000")
///     .build(repository)
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct QuizServerBuilder {
    config: ServerConfig,
}

impl QuizServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::from_config(ServerConfig::default())
    }

    /// Starts from an existing config, e.g. one loaded from a file.
    pub fn from_config(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Sets the round engine configuration.
    pub fn game_config(mut self, config: GameConfig) -> Self {
        self.config.game = config;
        self
    }

    /// Sets the intake queue capacity (at least 1).
    pub fn intake_capacity(mut self, capacity: usize) -> Self {
        self.config.intake_capacity = capacity;
        self
    }

    /// Binds the socket and builds the server around `repository`.
    ///
    /// Uses `JsonCodec` and `UdpTransport`.
    pub async fn build<R: Repository>(
        self,
        repository: R,
    ) -> Result<QuizServer<R>, QuizError> {
        let transport = UdpTransport::bind(&self.config.bind_addr).await?;
        let (outbound, outbound_rx) = outbound_channel();

        let engine =
            Engine::new(Arc::new(repository), self.config.game, outbound.clone());
        let state = Arc::new(ServerState {
            engine,
            outbound,
            codec: JsonCodec,
        });

        Ok(QuizServer {
            transport: Arc::new(transport),
            state,
            outbound_rx,
            intake_capacity: self.config.intake_capacity.max(1),
        })
    }
}

impl Default for QuizServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// QuizServer
// ---------------------------------------------------------------------------

/// A bound quiz server.
///
/// Call [`run()`](Self::run) to start serving.
pub struct QuizServer<R: Repository> {
    transport: Arc<UdpTransport>,
    state: Arc<ServerState<R, JsonCodec>>,
    outbound_rx: OutboundReceiver,
    intake_capacity: usize,
}

impl<R: Repository> QuizServer<R> {
    /// Creates a new builder.
    pub fn builder() -> QuizServerBuilder {
        QuizServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// The engine behind this server, for administrative calls such as
    /// [`Engine::close_session`].
    pub fn engine(&self) -> &Engine<R> {
        &self.state.engine
    }

    /// Runs the server receive loop.
    ///
    /// Starts the outbound drain and the dispatcher, then receives
    /// datagrams until the process is terminated. Receive errors are
    /// logged and the loop keeps going.
    pub async fn run(self) -> Result<(), QuizError> {
        let Self {
            transport,
            state,
            outbound_rx,
            intake_capacity,
        } = self;

        tracing::info!(addr = ?transport.local_addr().ok(), "quiz server running");

        tokio::spawn(drain_outbound(
            Arc::clone(&transport),
            state.codec,
            outbound_rx,
        ));

        let (intake, intake_rx) = mpsc::channel(intake_capacity);
        tokio::spawn(dispatch_intake(intake_rx, state));

        loop {
            let datagram = match transport.recv().await {
                Ok(datagram) => datagram,
                Err(e) => {
                    tracing::error!(error = %e, "receive failed");
                    continue;
                }
            };

            match intake.try_send(datagram) {
                Ok(()) => {}
                Err(TrySendError::Full(dropped)) => {
                    tracing::warn!(peer = %dropped.peer, "intake queue full, datagram dropped");
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::error!("dispatcher stopped, shutting down receive loop");
                    return Ok(());
                }
            }
        }
    }
}

/// Drains the intake queue, spawning one handler task per datagram.
async fn dispatch_intake<R, C>(
    mut intake: mpsc::Receiver<Datagram>,
    state: Arc<ServerState<R, C>>,
) where
    R: Repository,
    C: Codec,
{
    while let Some(datagram) = intake.recv().await {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            handle_datagram(&state, datagram).await;
        });
    }
}

/// Encodes and sends everything the engine and handlers queue.
///
/// A failed send only means that peer misses the message.
async fn drain_outbound<C: Codec>(
    transport: Arc<UdpTransport>,
    codec: C,
    mut outbound: OutboundReceiver,
) {
    while let Some(Outbound { addr, message }) = outbound.recv().await {
        let bytes = match codec.encode(&message) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(%addr, kind = message.kind(), error = %e, "failed to encode reply");
                continue;
            }
        };
        if let Err(e) = transport.send_to(&bytes, addr).await {
            tracing::warn!(%addr, kind = message.kind(), error = %e, "send failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr, "0.0.0.0:9000");
        assert_eq!(config.intake_capacity, 1024);
        assert_eq!(config.game.min_players, 2);
    }

    #[test]
    fn test_server_config_partial_json_keeps_defaults() {
        let config: ServerConfig = serde_json::from_str(
            r#"{ "bind_addr": "127.0.0.1:7000", "game": { "min_players": 4 } }"#,
        )
        .unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:7000");
        assert_eq!(config.intake_capacity, 1024);
        assert_eq!(config.game.min_players, 4);
        assert_eq!(config.game.question_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_builder_overrides_config() {
        let builder = QuizServerBuilder::new()
            .bind("127.0.0.1:0")
            .intake_capacity(8)
            .game_config(GameConfig {
                min_players: 3,
                ..GameConfig::default()
            });
        assert_eq!(builder.config.bind_addr, "127.0.0.1:0");
        assert_eq!(builder.config.intake_capacity, 8);
        assert_eq!(builder.config.game.min_players, 3);
    }

    #[test]
    fn test_server_config_load_missing_file() {
        let result = ServerConfig::load("/nonexistent/quizforge.json");
        assert!(matches!(result, Err(QuizError::Io(_))));
    }
}
