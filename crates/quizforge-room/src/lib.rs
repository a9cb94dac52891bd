//! Session and round engine for quizforge.
//!
//! Each game session is shared state behind its own lock, driven by a few
//! background Tokio tasks: a round runner, a lobby monitor while waiting
//! for players, and a reaper once the game is over.
//!
//! # Key types
//!
//! - [`Engine`]: every game operation: create, join, start, answer,
//!   hints, riddle guesses, close
//! - [`SessionRegistry`]: code → session map, with player lookup
//! - [`GameSession`]: roster, scores and round progress of one game
//! - [`SessionState`]: lifecycle state machine
//! - [`GameConfig`]: timings, scoring and question plan
//! - [`Outbound`]: a reply queued for the network layer

mod config;
mod engine;
mod error;
mod lobby;
mod outbound;
mod reaper;
mod registry;
mod runner;
mod session;

pub use config::{GameConfig, QuestionBatch, SessionState};
pub use engine::Engine;
pub use error::RoomError;
pub use outbound::{outbound_channel, Outbound, OutboundReceiver, OutboundSender};
pub use registry::SessionRegistry;
pub use session::{AnswerOutcome, GameSession, GuessOutcome, HintGrant, Player};
