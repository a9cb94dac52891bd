//! An in-memory [`Repository`], seeded from JSON.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use quizforge_protocol::PlayerId;
use rand::seq::{IndexedRandom, SliceRandom};
use serde::{Deserialize, Serialize};

use crate::{Question, Repository, Riddle, StoreError, User};

/// The contents of a seed file.
///
/// ```json
/// {
///   "users":     [{ "id": 1, "email": "ana@quiz.io", "username": "ana", "password_hash": "..." }],
///   "questions": [{ "id": 1, "question_text": "...", "choice_a": "...", ..., "correct_answer": "B",
///                   "difficulty_level": 1, "manche": 1, "category": "geo" }],
///   "riddles":   [{ "id": 1, "riddle_text": "...", "correct_word": "cat",
///                   "hint_level1": "...", "hint_level2": "..." }]
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub riddles: Vec<Riddle>,
}

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<PlayerId, User>,
    questions: Vec<Question>,
    riddles: Vec<Riddle>,
}

/// Thread-safe in-memory storage.
///
/// Reads take a shared lock, `record_result` and the `insert_*` helpers take
/// an exclusive one. A poisoned lock surfaces as
/// [`StoreError::Unavailable`] rather than a panic.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    tables: RwLock<Tables>,
}

impl MemoryRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository holding everything in `seed`.
    pub fn from_seed(seed: SeedData) -> Self {
        let users = seed.users.into_iter().map(|u| (u.id, u)).collect();
        Self {
            tables: RwLock::new(Tables {
                users,
                questions: seed.questions,
                riddles: seed.riddles,
            }),
        }
    }

    /// Parses seed JSON.
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        let seed: SeedData = serde_json::from_str(json)?;
        Ok(Self::from_seed(seed))
    }

    /// Reads and parses a seed file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let repo = Self::from_json(&json)?;
        tracing::info!(path = %path.display(), "seed data loaded");
        Ok(repo)
    }

    /// Adds a user, replacing any existing user with the same id.
    pub fn insert_user(&self, user: User) -> Result<(), StoreError> {
        self.write()?.users.insert(user.id, user);
        Ok(())
    }

    /// Adds a question to the pool.
    pub fn insert_question(&self, question: Question) -> Result<(), StoreError> {
        self.write()?.questions.push(question);
        Ok(())
    }

    pub fn insert_riddle(&self, riddle: Riddle) -> Result<(), StoreError> {
        self.write()?.riddles.push(riddle);
        Ok(())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.tables
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".into()))
    }
}

impl Repository for MemoryRepository {
    fn user_by_email(&self, email: &str) -> Result<User, StoreError> {
        self.read()?
            .users
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or_else(|| StoreError::UnknownEmail(email.to_string()))
    }

    fn user_by_id(&self, id: PlayerId) -> Result<User, StoreError> {
        self.read()?
            .users
            .get(&id)
            .cloned()
            .ok_or(StoreError::UnknownUser(id))
    }

    fn questions(
        &self,
        level: u32,
        manche: u32,
        limit: usize,
    ) -> Result<Vec<Question>, StoreError> {
        let mut matching: Vec<Question> = self
            .read()?
            .questions
            .iter()
            .filter(|q| q.difficulty_level == level && q.manche == manche)
            .cloned()
            .collect();

        if matching.is_empty() {
            return Err(StoreError::NoQuestions { level, manche });
        }

        matching.shuffle(&mut rand::rng());
        matching.truncate(limit);
        Ok(matching)
    }

    fn random_riddle(&self) -> Result<Riddle, StoreError> {
        self.read()?
            .riddles
            .choose(&mut rand::rng())
            .cloned()
            .ok_or(StoreError::NoRiddle)
    }

    fn record_result(
        &self,
        user_id: PlayerId,
        score_delta: i64,
    ) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        let user = tables
            .users
            .get_mut(&user_id)
            .ok_or(StoreError::UnknownUser(user_id))?;
        user.total_score += score_delta;
        user.games_played += 1;
        tracing::debug!(%user_id, score_delta, total = user.total_score, "result recorded");
        Ok(())
    }
}
