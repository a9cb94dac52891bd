//! Error types for the store layer.

use quizforge_protocol::PlayerId;

/// Errors a [`Repository`](crate::Repository) can report.
///
/// "Not found" variants are ordinary outcomes (a wrong email at login, an
/// empty question pool); `Unavailable` means the storage itself failed.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No user is registered under this email.
    #[error("no user with email {0}")]
    UnknownEmail(String),

    /// No user has this id.
    #[error("user {0} not found")]
    UnknownUser(PlayerId),

    /// The question pool has nothing for this level and round.
    #[error("no questions for level {level}, manche {manche}")]
    NoQuestions { level: u32, manche: u32 },

    /// The riddle pool is empty.
    #[error("no riddle available")]
    NoRiddle,

    /// The backing storage could not serve the request.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// Seed data is not valid JSON or doesn't match [`SeedData`](crate::SeedData).
    #[error("invalid seed data: {0}")]
    Seed(#[from] serde_json::Error),

    /// The seed file could not be read.
    #[error("failed to read seed file: {0}")]
    Io(#[from] std::io::Error),
}
