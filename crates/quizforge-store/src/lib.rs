//! Storage collaborator for quizforge.
//!
//! The game engine never talks to a database directly. It sees storage
//! through the small, synchronous [`Repository`] trait:
//!
//! 1. **Users**: look a player up by email (login) or by id (results)
//! 2. **Content**: fetch questions for a round, pick a random riddle
//! 3. **Results**: persist a score delta at the end of a game
//!
//! # How it fits in the stack
//!
//! ```text
//! Room Layer (above)  ← loads questions/riddles, flushes final scores
//!     ↕
//! Store Layer (this crate)  ← Repository trait + MemoryRepository
//!     ↕
//! Protocol Layer (below)  ← provides PlayerId, QuestionId, QuestionView
//! ```
//!
//! [`MemoryRepository`] is the bundled implementation. It is seeded from a
//! JSON file and is what the demo server and the test suites run against.

mod error;
mod memory;
mod models;
mod repository;

pub use error::StoreError;
pub use memory::{MemoryRepository, SeedData};
pub use models::{Question, Riddle, User};
pub use repository::Repository;
