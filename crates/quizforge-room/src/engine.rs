//! The engine: every game operation a client request can trigger.
//!
//! [`Engine`] ties the pieces together. It owns the registry, the
//! repository handle, the config and the outbound queue, and it is cheap to
//! clone, so each background task gets its own copy.
//!
//! Replies that belong to a game (CREATE_GAME, JOIN_GAME, hints, score
//! updates, broadcasts) are queued by the engine itself. Failures are
//! returned to the caller, who decides how to report them.

use std::net::SocketAddr;
use std::sync::Arc;

use quizforge_protocol::{GameCode, GameMode, PlayerId, QuestionId, ServerMessage};
use quizforge_store::{Question, Repository, StoreError, User};

use crate::outbound::{self, OutboundSender};
use crate::{
    AnswerOutcome, GameConfig, GameSession, GuessOutcome, HintGrant, Player,
    RoomError, SessionRegistry,
};

/// Drives every session of one server.
///
/// ## Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use quizforge_protocol::{GameMode, PlayerId};
/// use quizforge_room::{outbound_channel, Engine, GameConfig};
/// use quizforge_store::MemoryRepository;
///
/// # async fn demo() -> Result<(), quizforge_room::RoomError> {
/// let (tx, mut rx) = outbound_channel();
/// let repo = Arc::new(MemoryRepository::load("data/seed.json")?);
/// let engine = Engine::new(repo, GameConfig::default(), tx);
///
/// let addr = "127.0.0.1:5000".parse().unwrap();
/// let session = engine.create_session(PlayerId(1), GameMode::Multi, addr).await?;
/// println!("share code {}", session.code());
///
/// while let Some(out) = rx.recv().await {
///     println!("{} <- {}", out.addr, out.message.kind());
/// }
/// # Ok(())
/// # }
/// ```
pub struct Engine<R: Repository> {
    registry: Arc<SessionRegistry>,
    repository: Arc<R>,
    config: Arc<GameConfig>,
    outbound: OutboundSender,
}

impl<R: Repository> Clone for Engine<R> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            repository: Arc::clone(&self.repository),
            config: Arc::clone(&self.config),
            outbound: self.outbound.clone(),
        }
    }
}

impl<R: Repository> Engine<R> {
    /// Creates an engine with its own empty registry.
    pub fn new(
        repository: Arc<R>,
        config: GameConfig,
        outbound: OutboundSender,
    ) -> Self {
        Self {
            registry: Arc::new(SessionRegistry::new(config.code_digits)),
            repository,
            config: Arc::new(config),
            outbound,
        }
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub(crate) fn outbound(&self) -> &OutboundSender {
        &self.outbound
    }

    /// Runs a repository call on the blocking pool.
    pub(crate) async fn blocking<T, F>(&self, call: F) -> Result<T, RoomError>
    where
        F: FnOnce(&R) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let repository = Arc::clone(&self.repository);
        tokio::task::spawn_blocking(move || call(&repository))
            .await
            .map_err(|e| StoreError::Unavailable(format!("repository task failed: {e}")))?
            .map_err(RoomError::from)
    }

    // -- accounts -------------------------------------------------------------

    /// Looks a user up by email. No password check happens here.
    pub async fn login(&self, email: &str) -> Result<User, RoomError> {
        let email = email.to_string();
        self.blocking(move |repo| repo.user_by_email(&email)).await
    }

    async fn player_for(
        &self,
        user_id: PlayerId,
        addr: SocketAddr,
    ) -> Result<Player, RoomError> {
        let user = self.blocking(move |repo| repo.user_by_id(user_id)).await?;
        Ok(Player::new(user.id, user.email).with_addr(addr))
    }

    // -- lifecycle ------------------------------------------------------------

    /// Creates a session hosted by `user_id` and replies CREATE_GAME.
    ///
    /// A `Solo` session starts right away; a `Multi` one waits in the lobby
    /// under a lobby monitor.
    pub async fn create_session(
        &self,
        user_id: PlayerId,
        mode: GameMode,
        addr: SocketAddr,
    ) -> Result<Arc<GameSession>, RoomError> {
        let host = self.player_for(user_id, addr).await?;
        let session = self.registry.create_session(host, mode).await?;

        outbound::send(
            &self.outbound,
            addr,
            ServerMessage::GameCreated {
                game_code: session.code().clone(),
                mode,
            },
        );

        match mode {
            GameMode::Solo => {
                if let Err(e) = self.start_session(session.code()).await {
                    tracing::warn!(game_code = %session.code(), error = %e, "solo start failed");
                }
            }
            GameMode::Multi => self.ensure_lobby_monitor(&session).await,
        }
        Ok(session)
    }

    /// Adds `user_id` to the session with `code` and replies JOIN_GAME.
    pub async fn join_session(
        &self,
        code: &GameCode,
        user_id: PlayerId,
        addr: SocketAddr,
    ) -> Result<Arc<GameSession>, RoomError> {
        let player = self.player_for(user_id, addr).await?;
        let session = self.registry.join_session(code, player).await?;

        outbound::send(
            &self.outbound,
            addr,
            ServerMessage::GameJoined {
                game_code: code.clone(),
                players: session.players().await,
            },
        );

        if session.mode() == GameMode::Multi
            && session.state().await.is_joinable()
        {
            self.ensure_lobby_monitor(&session).await;
        }
        Ok(session)
    }

    /// Starts the round sequence of the session with `code`.
    ///
    /// Loads the question set and a riddle, enters `RoundQcm`, broadcasts
    /// GAME_START and spawns the round runner. Only the first call on a
    /// session can succeed.
    ///
    /// # Errors
    /// - `RoomError::SessionNotFound`: no such session
    /// - `RoomError::AlreadyStarted`: the start was already claimed
    /// - `RoomError::Store`: the question set could not be loaded. The
    ///   session goes back to waiting and every player is sent ERROR.
    pub async fn start_session(&self, code: &GameCode) -> Result<(), RoomError> {
        let session = self
            .registry
            .get(code)
            .await
            .ok_or_else(|| RoomError::SessionNotFound(code.clone()))?;
        session.claim_start().await?;

        let questions = match self.load_questions().await {
            Ok(questions) => questions,
            Err(e) => {
                session.release_start().await;
                tracing::error!(game_code = %code, error = %e, "failed to load questions, start aborted");
                outbound::broadcast(
                    &self.outbound,
                    &session.recipients().await,
                    &ServerMessage::Error {
                        code: 500,
                        message: "the game could not start: questions unavailable".into(),
                    },
                );
                return Err(e);
            }
        };

        let riddle = match self.blocking(|repo| repo.random_riddle()).await {
            Ok(riddle) => Some(riddle),
            Err(e) => {
                tracing::warn!(game_code = %code, error = %e, "no riddle, riddle round skipped");
                None
            }
        };

        let recipients = match session.enter_qcm(questions, riddle).await {
            Ok(recipients) => recipients,
            Err(e) => {
                session.release_start().await;
                return Err(e);
            }
        };

        outbound::broadcast(
            &self.outbound,
            &recipients,
            &ServerMessage::GameStart {
                game_code: code.clone(),
                players: recipients.iter().map(|(id, _)| *id).collect(),
            },
        );
        tracing::info!(game_code = %code, players = recipients.len(), "game started");

        tokio::spawn(self.clone().run_rounds(session));
        Ok(())
    }

    async fn load_questions(&self) -> Result<Vec<Question>, RoomError> {
        let plan = self.config.qcm_plan.clone();
        self.blocking(move |repo| {
            let mut questions = Vec::new();
            for batch in &plan {
                questions.extend(repo.questions(
                    batch.level,
                    batch.manche,
                    batch.count,
                )?);
            }
            Ok(questions)
        })
        .await
    }

    /// Force-closes a session: removes it and stops its background tasks
    /// without finalizing. Returns `false` if there was no such session.
    pub async fn close_session(&self, code: &GameCode) -> bool {
        self.registry.remove_session(code).await.is_some()
    }

    // -- in-game --------------------------------------------------------------

    /// Records `addr` as the reply address of `user_id` in their session.
    /// Returns `false` if they aren't in one.
    pub async fn touch_player(&self, user_id: PlayerId, addr: SocketAddr) -> bool {
        match self.registry.find_session_of(user_id).await {
            Some(session) => session.touch(user_id, addr).await,
            None => false,
        }
    }

    async fn session_of(
        &self,
        user_id: PlayerId,
    ) -> Result<Arc<GameSession>, RoomError> {
        self.registry
            .find_session_of(user_id)
            .await
            .ok_or(RoomError::NotInSession(user_id))
    }

    async fn send_score(&self, session: &GameSession, user_id: PlayerId, score: i64) {
        match session.addr_of(user_id).await {
            Some(addr) => outbound::send(
                &self.outbound,
                addr,
                ServerMessage::ScoreUpdate { user_id, score },
            ),
            None => tracing::warn!(%user_id, "no reply address, score update skipped"),
        }
    }

    /// Scores a multiple-choice answer. Non-qualifying answers are not an
    /// error; they come back as [`AnswerOutcome::Ignored`].
    pub async fn submit_answer(
        &self,
        user_id: PlayerId,
        question_id: QuestionId,
        choice: i64,
    ) -> Result<AnswerOutcome, RoomError> {
        let session = self.session_of(user_id).await?;
        let outcome = session
            .submit_answer(user_id, question_id, choice, self.config.qcm_bonus)
            .await;

        tracing::debug!(
            game_code = %session.code(),
            %user_id,
            %question_id,
            choice,
            ?outcome,
            "answer received"
        );
        if let AnswerOutcome::Correct { score } = outcome {
            self.send_score(&session, user_id, score).await;
        }
        Ok(outcome)
    }

    /// Sells a riddle hint and replies RIDDLE_HINT. Levels other than 1 and
    /// 2 fail with `RoomError::InvalidHintLevel` and cost nothing.
    pub async fn request_hint(
        &self,
        user_id: PlayerId,
        level: i64,
    ) -> Result<HintGrant, RoomError> {
        let session = self.session_of(user_id).await?;
        let grant = session
            .request_hint(user_id, level, self.config.hint_cost(level))
            .await?;

        tracing::info!(game_code = %session.code(), %user_id, level, cost = grant.cost, "hint purchased");
        if let Some(addr) = session.addr_of(user_id).await {
            outbound::send(
                &self.outbound,
                addr,
                ServerMessage::RiddleHint {
                    riddle_id: grant.riddle_id,
                    text: grant.text.clone(),
                    cost: grant.cost,
                },
            );
        }
        self.send_score(&session, user_id, grant.score).await;
        Ok(grant)
    }

    /// Checks a riddle guess (exact, case-sensitive).
    pub async fn guess_riddle(
        &self,
        user_id: PlayerId,
        answer: &str,
    ) -> Result<GuessOutcome, RoomError> {
        let session = self.session_of(user_id).await?;
        let outcome = session
            .guess_riddle(user_id, answer, self.config.riddle_bonus)
            .await?;

        match outcome {
            GuessOutcome::Correct { score } => {
                tracing::info!(game_code = %session.code(), %user_id, "riddle solved");
                self.send_score(&session, user_id, score).await;
            }
            GuessOutcome::Incorrect | GuessOutcome::AlreadySolved => {
                tracing::debug!(game_code = %session.code(), %user_id, ?outcome, "riddle guess");
            }
        }
        Ok(outcome)
    }
}
