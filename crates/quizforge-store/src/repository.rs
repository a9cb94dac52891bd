//! The repository trait: how the engine reaches users and quiz content.

use quizforge_protocol::PlayerId;

use crate::{Question, Riddle, StoreError, User};

/// Synchronous access to users, questions and riddles.
///
/// # Trait bounds
///
/// - `Send + Sync` → one repository is shared by every session task.
/// - `'static` → it lives as long as the server.
///
/// Calls may block (a real implementation would hit a database). The
/// engine runs them on tokio's blocking pool, so a slow call only delays
/// the session that made it.
///
/// # Example
///
/// ```rust
/// use quizforge_protocol::PlayerId;
/// use quizforge_store::{Question, Repository, Riddle, StoreError, User};
///
/// /// A store with no content at all.
/// struct EmptyStore;
///
/// impl Repository for EmptyStore {
///     fn user_by_email(&self, email: &str) -> Result<User, StoreError> {
///         Err(StoreError::UnknownEmail(email.to_string()))
///     }
///     fn user_by_id(&self, id: PlayerId) -> Result<User, StoreError> {
///         Err(StoreError::UnknownUser(id))
///     }
///     fn questions(&self, level: u32, manche: u32, _limit: usize)
///         -> Result<Vec<Question>, StoreError> {
///         Err(StoreError::NoQuestions { level, manche })
///     }
///     fn random_riddle(&self) -> Result<Riddle, StoreError> {
///         Err(StoreError::NoRiddle)
///     }
///     fn record_result(&self, id: PlayerId, _delta: i64) -> Result<(), StoreError> {
///         Err(StoreError::UnknownUser(id))
///     }
/// }
/// ```
pub trait Repository: Send + Sync + 'static {
    /// Looks a user up by email. Used by LOGIN.
    fn user_by_email(&self, email: &str) -> Result<User, StoreError>;

    /// Looks a user up by id. Used to fill in emails on the scoreboard.
    fn user_by_id(&self, id: PlayerId) -> Result<User, StoreError>;

    /// Returns up to `limit` randomly ordered questions at the given
    /// difficulty `level` for round `manche`.
    ///
    /// # Errors
    /// `StoreError::NoQuestions` if nothing matches.
    fn questions(
        &self,
        level: u32,
        manche: u32,
        limit: usize,
    ) -> Result<Vec<Question>, StoreError>;

    /// Picks one riddle at random.
    ///
    /// # Errors
    /// `StoreError::NoRiddle` if the pool is empty.
    fn random_riddle(&self) -> Result<Riddle, StoreError>;

    /// Adds `score_delta` to the user's lifetime total and counts one more
    /// game played.
    fn record_result(
        &self,
        user_id: PlayerId,
        score_delta: i64,
    ) -> Result<(), StoreError>;
}
