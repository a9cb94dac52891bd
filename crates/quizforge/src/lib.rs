//! # quizforge
//!
//! Real-time multiplayer quiz server over UDP.
//!
//! Players log in, create or join a game by its 4-digit code, answer a
//! timed multiple-choice round, then race to solve a riddle (buying hints
//! if they must). The server owns all game state; clients only send
//! requests and render what comes back.
//!
//! The sub-crates split the work:
//!
//! - `quizforge-transport`: the UDP socket
//! - `quizforge-protocol`: message types and the JSON codec
//! - `quizforge-store`: the repository of users, questions and riddles
//! - `quizforge-room`: sessions, rounds and scoring
//!
//! This crate wires them into a runnable [`QuizServer`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use quizforge::prelude::*;
//!
//! # async fn demo() -> Result<(), QuizError> {
//! let server = QuizServer::<MemoryRepository>::builder()
//!     .bind("0.0.0.0:9000")
//!     .build(MemoryRepository::load("data/seed.json")?)
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod server;

pub use error::QuizError;
pub use server::{QuizServer, QuizServerBuilder, ServerConfig};

pub use quizforge_protocol as protocol;
pub use quizforge_room as room;
pub use quizforge_store as store;
pub use quizforge_transport as transport;

/// Everything needed to stand up a server, in one import.
pub mod prelude {
    pub use crate::{QuizError, QuizServer, QuizServerBuilder, ServerConfig};
    pub use quizforge_protocol::{GameCode, GameMode, PlayerId};
    pub use quizforge_room::{Engine, GameConfig, QuestionBatch};
    pub use quizforge_store::{MemoryRepository, Repository, SeedData};
}
