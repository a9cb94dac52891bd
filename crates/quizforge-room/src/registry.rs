//! Session registry: the process-wide map from game code to session.
//!
//! # Locking
//!
//! Two levels, always taken in the same order:
//!
//! 1. the registry `RwLock`, only while adding, removing or looking up an
//!    entry;
//! 2. a session's own mutex, for everything inside one game.
//!
//! Registry methods may lock a session while holding the registry lock.
//! Nothing ever takes the registry lock while holding a session lock, so
//! the two can't deadlock, and unrelated games never contend on the
//! registry while they play.

use std::collections::HashMap;
use std::sync::Arc;

use quizforge_protocol::{GameCode, GameMode, PlayerId};
use rand::Rng;
use tokio::sync::RwLock;

use crate::{GameSession, Player, RoomError, SessionState};

#[derive(Default)]
struct RegistryInner {
    sessions: HashMap<GameCode, Arc<GameSession>>,
    /// Which session each player currently belongs to.
    players: HashMap<PlayerId, GameCode>,
}

/// Owns every live [`GameSession`], keyed by its code.
///
/// Invariants:
/// - a code maps to at most one session, and each session is reachable by
///   exactly one code;
/// - a player id is indexed to at most one session, so
///   [`find_session_of`](Self::find_session_of) never has to choose.
pub struct SessionRegistry {
    code_digits: u32,
    inner: RwLock<RegistryInner>,
}

impl SessionRegistry {
    /// Creates an empty registry that hands out `code_digits`-wide codes.
    pub fn new(code_digits: u32) -> Self {
        Self {
            code_digits,
            inner: RwLock::new(RegistryInner::default()),
        }
    }

    /// Number of distinct codes of the configured width.
    fn code_space(&self) -> u32 {
        10u32.saturating_pow(self.code_digits)
    }

    fn random_code(&self) -> GameCode {
        let value = rand::rng().random_range(0..self.code_space());
        GameCode::from_number(value, self.code_digits as usize)
    }

    /// Creates a session under a fresh random code with `host` as its first
    /// player.
    ///
    /// The code check and the insert happen under one write lock, so two
    /// concurrent creates can never end up with the same code.
    ///
    /// # Errors
    /// - `RoomError::AlreadyInSession` if the host is mid-game elsewhere
    /// - `RoomError::RegistryFull` if every code is taken
    pub async fn create_session(
        &self,
        host: Player,
        mode: GameMode,
    ) -> Result<Arc<GameSession>, RoomError> {
        let mut inner = self.inner.write().await;

        if inner.sessions.len() >= self.code_space() as usize {
            return Err(RoomError::RegistryFull);
        }
        let code = loop {
            let candidate = self.random_code();
            if !inner.sessions.contains_key(&candidate) {
                break candidate;
            }
        };

        self.insert(&mut inner, code, host, mode).await
    }

    /// Creates a session under a caller-chosen code.
    ///
    /// # Errors
    /// `RoomError::CodeInUse` if a live session already has `code`.
    pub async fn create_session_with_code(
        &self,
        code: GameCode,
        host: Player,
        mode: GameMode,
    ) -> Result<Arc<GameSession>, RoomError> {
        let mut inner = self.inner.write().await;
        if inner.sessions.contains_key(&code) {
            return Err(RoomError::CodeInUse(code));
        }
        self.insert(&mut inner, code, host, mode).await
    }

    async fn insert(
        &self,
        inner: &mut RegistryInner,
        code: GameCode,
        host: Player,
        mode: GameMode,
    ) -> Result<Arc<GameSession>, RoomError> {
        let host_id = host.id;
        Self::release_previous(inner, host_id).await?;

        let session = Arc::new(GameSession::new(code.clone(), mode, host));
        inner.players.insert(host_id, code.clone());
        inner.sessions.insert(code.clone(), Arc::clone(&session));

        tracing::info!(game_code = %code, host = %host_id, ?mode, "session created");
        Ok(session)
    }

    /// Detaches a player from the session they are indexed to, if any.
    ///
    /// A finished session keeps them on its scoreboard. A lobby drops them,
    /// and is closed if that leaves it empty. A game in progress refuses.
    async fn release_previous(
        inner: &mut RegistryInner,
        player: PlayerId,
    ) -> Result<(), RoomError> {
        let Some(code) = inner.players.get(&player).cloned() else {
            return Ok(());
        };
        let Some(previous) = inner.sessions.get(&code).cloned() else {
            inner.players.remove(&player);
            return Ok(());
        };

        match previous.leave_lobby(player).await {
            Some(0) => {
                inner.sessions.remove(&code);
                previous.cancel();
                tracing::info!(game_code = %code, "empty lobby closed");
            }
            Some(_) => {
                tracing::debug!(game_code = %code, %player, "player left lobby");
            }
            None if previous.state().await.is_finished() => {}
            None => return Err(RoomError::AlreadyInSession { player, code }),
        }

        inner.players.remove(&player);
        Ok(())
    }

    /// Fails if `player` is indexed to a game that is still being played.
    /// Lobbies and finished games can be left.
    async fn ensure_releasable(
        inner: &RegistryInner,
        player: PlayerId,
    ) -> Result<(), RoomError> {
        let Some(code) = inner.players.get(&player) else {
            return Ok(());
        };
        let Some(previous) = inner.sessions.get(code) else {
            return Ok(());
        };
        let state = previous.state().await;
        if state == SessionState::Lobby || state.is_finished() {
            Ok(())
        } else {
            Err(RoomError::AlreadyInSession {
                player,
                code: code.clone(),
            })
        }
    }

    /// Adds `player` to the session with `code`, with score 0.
    ///
    /// Joining a session the player is already in changes nothing and is
    /// not an error (only their reply address is refreshed).
    ///
    /// # Errors
    /// - `RoomError::SessionNotFound` if no live session has `code`
    /// - `RoomError::InvalidState` if the session already left the lobby
    /// - `RoomError::AlreadyInSession` if the player is mid-game elsewhere
    pub async fn join_session(
        &self,
        code: &GameCode,
        player: Player,
    ) -> Result<Arc<GameSession>, RoomError> {
        let mut inner = self.inner.write().await;
        let session = inner
            .sessions
            .get(code)
            .cloned()
            .ok_or_else(|| RoomError::SessionNotFound(code.clone()))?;

        let player_id = player.id;
        if session.contains(player_id).await {
            session.add_player(player).await?;
            return Ok(session);
        }

        Self::ensure_releasable(&inner, player_id).await?;

        // The target's state is checked under its own lock, so a start
        // racing this join either sees the player or refuses them before
        // the old seat is touched.
        session.add_player(player).await?;

        if inner.players.get(&player_id) != Some(code) {
            if let Err(e) = Self::release_previous(&mut inner, player_id).await {
                if session.leave_lobby(player_id).await.is_none() {
                    tracing::warn!(game_code = %code, %player_id, "join rollback found the session started");
                }
                return Err(e);
            }
        }
        inner.players.insert(player_id, code.clone());

        tracing::info!(game_code = %code, %player_id, "player joined");
        Ok(session)
    }

    /// The live session `player` belongs to, if any.
    pub async fn find_session_of(
        &self,
        player: PlayerId,
    ) -> Option<Arc<GameSession>> {
        let inner = self.inner.read().await;
        let code = inner.players.get(&player)?;
        let session = inner.sessions.get(code).cloned();
        if session.is_none() {
            tracing::warn!(%player, game_code = %code, "player indexed to a missing session");
        }
        session
    }

    /// The live session with `code`, if any.
    pub async fn get(&self, code: &GameCode) -> Option<Arc<GameSession>> {
        self.inner.read().await.sessions.get(code).cloned()
    }

    /// Drops the session with `code` and cancels its background tasks.
    /// A no-op if there is none.
    pub async fn remove_session(
        &self,
        code: &GameCode,
    ) -> Option<Arc<GameSession>> {
        let mut inner = self.inner.write().await;
        let session = inner.sessions.remove(code)?;
        inner.players.retain(|_, c| c != code);
        session.cancel();
        tracing::info!(game_code = %code, "session removed");
        Some(session)
    }

    /// Removes `session` only if its code still maps to this very instance.
    /// Codes are reused, so a newer session under the same code is left
    /// alone.
    pub(crate) async fn remove_if_current(&self, session: &Arc<GameSession>) -> bool {
        let mut inner = self.inner.write().await;
        let code = session.code();
        match inner.sessions.get(code) {
            Some(current) if Arc::ptr_eq(current, session) => {
                inner.sessions.remove(code);
                inner.players.retain(|_, c| c != code);
                session.cancel();
                true
            }
            _ => false,
        }
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.inner.read().await.sessions.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Codes of every live session.
    pub async fn codes(&self) -> Vec<GameCode> {
        self.inner.read().await.sessions.keys().cloned().collect()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(4)
    }
}
