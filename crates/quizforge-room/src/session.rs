//! Game session: the per-game state shared by every task touching one game.
//!
//! A session is mutated from many places at once: handler tasks (joins,
//! answers, hints, guesses), the round runner, and the lobby monitor. All
//! of its mutable fields sit behind one `tokio::sync::Mutex`, and every
//! method here takes the lock for the duration of a single mutation and
//! releases it before returning. Nothing awaits while holding it.
//!
//! Two `watch` channels let background tasks wait on the session without
//! polling:
//!
//! - `answered` carries the id of the current question once someone has
//!   answered it. The round runner waits on it to advance.
//! - `player_count` carries the roster size. The lobby monitor waits on it.

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;

use quizforge_protocol::{
    GameCode, GameMode, PlayerId, PlayerResult, QuestionId, QuestionView,
    RiddleId,
};
use quizforge_store::{Question, Riddle};
use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;

use crate::outbound::Recipient;
use crate::{RoomError, SessionState};

/// A participant in one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: PlayerId,
    pub email: String,
    /// Where replies go. Refreshed on every inbound datagram, since the
    /// transport has no connections to remember peers by.
    pub addr: Option<SocketAddr>,
}

impl Player {
    pub fn new(id: PlayerId, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            addr: None,
        }
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = Some(addr);
        self
    }
}

/// Result of submitting a multiple-choice answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// Right answer; `score` is the player's new session score.
    Correct { score: i64 },
    /// Wrong answer, or a choice outside `0..=3`. Score unchanged.
    Incorrect,
    /// The answer did not qualify: wrong round, unknown or not yet asked
    /// question, or the player already answered it.
    Ignored,
}

/// Result of a riddle guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuessOutcome {
    Correct { score: i64 },
    Incorrect,
    /// The player already solved the riddle; nothing is scored again.
    AlreadySolved,
}

/// A purchased hint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HintGrant {
    pub riddle_id: RiddleId,
    pub text: String,
    pub cost: i64,
    /// The player's session score after paying.
    pub score: i64,
}

/// What the runner needs to broadcast one question.
pub(crate) struct QuestionSlot {
    pub id: QuestionId,
    pub view: QuestionView,
    pub manche: u32,
    pub recipients: Vec<Recipient>,
}

// ---------------------------------------------------------------------------
// SessionInner
// ---------------------------------------------------------------------------

/// The lock-protected part of a session.
struct SessionInner {
    state: SessionState,
    started: bool,
    monitor_started: bool,
    /// Join order. Ties on the final scoreboard keep this order.
    roster: Vec<Player>,
    /// Always has exactly the ids in `roster`.
    scores: HashMap<PlayerId, i64>,
    questions: Vec<Question>,
    /// Index into `questions` of the question on screen.
    current: Option<usize>,
    answers: HashSet<(PlayerId, QuestionId)>,
    riddle: Option<Riddle>,
    riddle_solvers: HashSet<PlayerId>,
}

impl SessionInner {
    fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.roster.iter_mut().find(|p| p.id == id)
    }

    fn recipients(&self) -> Vec<Recipient> {
        self.roster.iter().map(|p| (p.id, p.addr)).collect()
    }

    fn transition(&mut self, code: &GameCode, target: SessionState) -> bool {
        if !self.state.can_transition_to(target) {
            tracing::warn!(
                game_code = %code,
                from = %self.state,
                to = %target,
                "invalid state transition"
            );
            return false;
        }
        self.state = target;
        true
    }

    fn adjust_score(&mut self, id: PlayerId, delta: i64) -> Option<i64> {
        let score = self.scores.get_mut(&id)?;
        *score += delta;
        Some(*score)
    }
}

// ---------------------------------------------------------------------------
// GameSession
// ---------------------------------------------------------------------------

/// One game: its roster, scores, loaded content and progress.
///
/// Shared as `Arc<GameSession>` between the registry and the tasks that
/// drive the game.
pub struct GameSession {
    code: GameCode,
    mode: GameMode,
    inner: Mutex<SessionInner>,
    answered: watch::Sender<Option<QuestionId>>,
    player_count: watch::Sender<usize>,
    cancel: CancellationToken,
}

impl std::fmt::Debug for GameSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameSession")
            .field("code", &self.code)
            .field("mode", &self.mode)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl GameSession {
    /// Creates a session in `Lobby` with `host` as its only player.
    pub(crate) fn new(code: GameCode, mode: GameMode, host: Player) -> Self {
        let scores = HashMap::from([(host.id, 0)]);
        Self {
            code,
            mode,
            inner: Mutex::new(SessionInner {
                state: SessionState::Lobby,
                started: false,
                monitor_started: false,
                roster: vec![host],
                scores,
                questions: Vec::new(),
                current: None,
                answers: HashSet::new(),
                riddle: None,
                riddle_solvers: HashSet::new(),
            }),
            answered: watch::Sender::new(None),
            player_count: watch::Sender::new(1),
            cancel: CancellationToken::new(),
        }
    }

    pub fn code(&self) -> &GameCode {
        &self.code
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub async fn state(&self) -> SessionState {
        self.inner.lock().await.state
    }

    /// Player ids in join order.
    pub async fn players(&self) -> Vec<PlayerId> {
        self.inner.lock().await.roster.iter().map(|p| p.id).collect()
    }

    pub async fn player(&self, id: PlayerId) -> Option<Player> {
        let inner = self.inner.lock().await;
        inner.roster.iter().find(|p| p.id == id).cloned()
    }

    pub async fn contains(&self, id: PlayerId) -> bool {
        self.inner.lock().await.scores.contains_key(&id)
    }

    pub async fn score(&self, id: PlayerId) -> Option<i64> {
        self.inner.lock().await.scores.get(&id).copied()
    }

    /// Every player's session score, in join order.
    pub async fn scores(&self) -> Vec<(PlayerId, i64)> {
        let inner = self.inner.lock().await;
        inner
            .roster
            .iter()
            .map(|p| (p.id, inner.scores.get(&p.id).copied().unwrap_or(0)))
            .collect()
    }

    /// Returns `true` once the session was force-closed or removed.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub(crate) fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub(crate) fn cancel(&self) {
        self.cancel.cancel();
    }

    pub(crate) fn subscribe_answers(&self) -> watch::Receiver<Option<QuestionId>> {
        self.answered.subscribe()
    }

    pub(crate) fn subscribe_player_count(&self) -> watch::Receiver<usize> {
        self.player_count.subscribe()
    }

    // -- roster -------------------------------------------------------------

    /// Adds a player with score 0. Returns `Ok(false)` if they were already
    /// in the roster (their address is refreshed, nothing else changes).
    pub(crate) async fn add_player(
        &self,
        player: Player,
    ) -> Result<bool, RoomError> {
        let mut inner = self.inner.lock().await;

        if let Some(existing) = inner.player_mut(player.id) {
            if player.addr.is_some() {
                existing.addr = player.addr;
            }
            return Ok(false);
        }

        if !inner.state.is_joinable() {
            return Err(RoomError::InvalidState(format!(
                "session {} is {}, not accepting players",
                self.code, inner.state
            )));
        }

        inner.scores.insert(player.id, 0);
        inner.roster.push(player);
        self.player_count.send_replace(inner.roster.len());
        Ok(true)
    }

    /// Takes a player out of a session that is still in the lobby.
    /// Returns how many players remain, or `None` (and changes nothing)
    /// once the session has left the lobby.
    pub(crate) async fn leave_lobby(&self, id: PlayerId) -> Option<usize> {
        let mut inner = self.inner.lock().await;
        if inner.state != SessionState::Lobby {
            return None;
        }
        inner.roster.retain(|p| p.id != id);
        inner.scores.remove(&id);
        let remaining = inner.roster.len();
        self.player_count.send_replace(remaining);
        Some(remaining)
    }

    /// Records `addr` as the player's reply address. Returns `false` if the
    /// player isn't in this session.
    pub(crate) async fn touch(&self, id: PlayerId, addr: SocketAddr) -> bool {
        let mut inner = self.inner.lock().await;
        match inner.player_mut(id) {
            Some(player) => {
                player.addr = Some(addr);
                true
            }
            None => false,
        }
    }

    pub(crate) async fn addr_of(&self, id: PlayerId) -> Option<SocketAddr> {
        let inner = self.inner.lock().await;
        inner.roster.iter().find(|p| p.id == id).and_then(|p| p.addr)
    }

    pub(crate) async fn recipients(&self) -> Vec<Recipient> {
        self.inner.lock().await.recipients()
    }

    // -- start guard ----------------------------------------------------------

    /// Claims the one-time start. Fails if already claimed or if the
    /// session has left the lobby.
    pub(crate) async fn claim_start(&self) -> Result<(), RoomError> {
        let mut inner = self.inner.lock().await;
        if inner.started {
            return Err(RoomError::AlreadyStarted(self.code.clone()));
        }
        if inner.state != SessionState::Lobby {
            return Err(RoomError::InvalidState(format!(
                "session {} is {}, cannot start",
                self.code, inner.state
            )));
        }
        inner.started = true;
        Ok(())
    }

    /// Gives the start back after a failed start, so the lobby can try again.
    pub(crate) async fn release_start(&self) {
        self.inner.lock().await.started = false;
    }

    /// Claims the lobby monitor slot. Returns `false` if a monitor is
    /// already running.
    pub(crate) async fn claim_monitor(&self) -> bool {
        let mut inner = self.inner.lock().await;
        !std::mem::replace(&mut inner.monitor_started, true)
    }

    pub(crate) async fn release_monitor(&self) {
        self.inner.lock().await.monitor_started = false;
    }

    // -- rounds -------------------------------------------------------------

    /// Installs the loaded content and enters `RoundQcm`. Returns the
    /// roster at that moment.
    pub(crate) async fn enter_qcm(
        &self,
        questions: Vec<Question>,
        riddle: Option<Riddle>,
    ) -> Result<Vec<Recipient>, RoomError> {
        let mut inner = self.inner.lock().await;
        if !inner.transition(&self.code, SessionState::RoundQcm) {
            return Err(RoomError::InvalidState(format!(
                "session {} is {}, cannot start",
                self.code, inner.state
            )));
        }
        inner.questions = questions;
        inner.riddle = riddle;
        inner.current = None;
        Ok(inner.recipients())
    }

    pub(crate) async fn question_count(&self) -> usize {
        self.inner.lock().await.questions.len()
    }

    /// Makes question `index` the current one and clears the advance
    /// signal. Returns `None` past the end of the list.
    pub(crate) async fn begin_question(&self, index: usize) -> Option<QuestionSlot> {
        let mut inner = self.inner.lock().await;
        let question = inner.questions.get(index)?;
        let slot = QuestionSlot {
            id: question.id,
            view: question.view(),
            manche: question.manche,
            recipients: inner.recipients(),
        };
        inner.current = Some(index);
        self.answered.send_replace(None);
        Some(slot)
    }

    /// Scores one multiple-choice answer.
    ///
    /// Only answers during `RoundQcm` to an already-asked question count,
    /// and only a player's first answer to each question. An answer to the
    /// current question also signals the runner to advance.
    pub(crate) async fn submit_answer(
        &self,
        player: PlayerId,
        question_id: QuestionId,
        choice: i64,
        bonus: i64,
    ) -> AnswerOutcome {
        let mut inner = self.inner.lock().await;

        if inner.state != SessionState::RoundQcm {
            return AnswerOutcome::Ignored;
        }
        let Some(current) = inner.current else {
            return AnswerOutcome::Ignored;
        };
        let Some(position) =
            inner.questions.iter().position(|q| q.id == question_id)
        else {
            return AnswerOutcome::Ignored;
        };
        if position > current
            || !inner.scores.contains_key(&player)
            || !inner.answers.insert((player, question_id))
        {
            return AnswerOutcome::Ignored;
        }

        let outcome = if inner.questions[position].is_correct_choice(choice) {
            match inner.adjust_score(player, bonus) {
                Some(score) => AnswerOutcome::Correct { score },
                None => AnswerOutcome::Ignored,
            }
        } else {
            AnswerOutcome::Incorrect
        };

        if position == current {
            self.answered.send_replace(Some(question_id));
        }
        outcome
    }

    /// Enters `RoundRiddle` if a riddle was loaded. Returns what to
    /// broadcast, or `None` when the round is skipped.
    pub(crate) async fn begin_riddle(
        &self,
    ) -> Option<(RiddleId, String, Vec<Recipient>)> {
        let mut inner = self.inner.lock().await;
        inner.current = None;
        let (id, text) = {
            let riddle = inner.riddle.as_ref()?;
            (riddle.id, riddle.riddle_text.clone())
        };
        if !inner.transition(&self.code, SessionState::RoundRiddle) {
            return None;
        }
        Some((id, text, inner.recipients()))
    }

    fn riddle_round<'a>(
        &self,
        inner: &'a SessionInner,
    ) -> Result<&'a Riddle, RoomError> {
        if inner.state != SessionState::RoundRiddle {
            return Err(RoomError::InvalidState(format!(
                "session {} is {}, the riddle is not open",
                self.code, inner.state
            )));
        }
        inner.riddle.as_ref().ok_or(RoomError::NoRiddle)
    }

    /// Sells hint `level` to `player` for `cost` points.
    pub(crate) async fn request_hint(
        &self,
        player: PlayerId,
        level: i64,
        cost: Option<i64>,
    ) -> Result<HintGrant, RoomError> {
        let mut inner = self.inner.lock().await;
        let riddle = self.riddle_round(&inner)?;
        let (Some(text), Some(cost)) = (riddle.hint(level), cost) else {
            return Err(RoomError::InvalidHintLevel(level));
        };
        let (riddle_id, text) = (riddle.id, text.to_string());

        let score = inner
            .adjust_score(player, -cost)
            .ok_or(RoomError::NotInSession(player))?;

        Ok(HintGrant {
            riddle_id,
            text,
            cost,
            score,
        })
    }

    /// Checks a riddle guess. Each player can score the riddle once.
    pub(crate) async fn guess_riddle(
        &self,
        player: PlayerId,
        guess: &str,
        bonus: i64,
    ) -> Result<GuessOutcome, RoomError> {
        let mut inner = self.inner.lock().await;
        let solved = self.riddle_round(&inner)?.is_solved_by(guess);

        if !inner.scores.contains_key(&player) {
            return Err(RoomError::NotInSession(player));
        }
        if inner.riddle_solvers.contains(&player) {
            return Ok(GuessOutcome::AlreadySolved);
        }
        if !solved {
            return Ok(GuessOutcome::Incorrect);
        }

        inner.riddle_solvers.insert(player);
        let score = inner
            .adjust_score(player, bonus)
            .ok_or(RoomError::NotInSession(player))?;
        Ok(GuessOutcome::Correct { score })
    }

    /// Enters `Finalizing` and returns the ranked scoreboard plus who to
    /// send it to. Ties keep join order.
    pub(crate) async fn begin_finalizing(
        &self,
    ) -> (Vec<PlayerResult>, Vec<Recipient>) {
        let mut inner = self.inner.lock().await;
        inner.transition(&self.code, SessionState::Finalizing);

        let mut results: Vec<PlayerResult> = inner
            .roster
            .iter()
            .map(|p| PlayerResult {
                user_id: p.id,
                email: p.email.clone(),
                score: inner.scores.get(&p.id).copied().unwrap_or(0),
            })
            .collect();
        results.sort_by(|a, b| b.score.cmp(&a.score));

        (results, inner.recipients())
    }

    pub(crate) async fn close(&self) {
        let mut inner = self.inner.lock().await;
        inner.transition(&self.code, SessionState::Closed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: u64, correct: &str) -> Question {
        Question {
            id: QuestionId(id),
            question_text: format!("question {id}"),
            choice_a: "a".into(),
            choice_b: "b".into(),
            choice_c: "c".into(),
            choice_d: "d".into(),
            correct_answer: correct.into(),
            difficulty_level: 1,
            manche: 1,
            category: String::new(),
        }
    }

    fn riddle() -> Riddle {
        Riddle {
            id: RiddleId(1),
            riddle_text: "I purr.".into(),
            correct_word: "cat".into(),
            hint_level1: "pet".into(),
            hint_level2: "meows".into(),
            difficulty_level: 1,
        }
    }

    fn session() -> GameSession {
        GameSession::new(
            GameCode::new("1234"),
            GameMode::Multi,
            Player::new(PlayerId(1), "one@quiz.io"),
        )
    }

    #[tokio::test]
    async fn test_add_player_twice_is_idempotent() {
        let s = session();
        assert!(s.add_player(Player::new(PlayerId(2), "two")).await.unwrap());
        assert!(!s.add_player(Player::new(PlayerId(2), "two")).await.unwrap());
        assert_eq!(s.players().await, vec![PlayerId(1), PlayerId(2)]);
        assert_eq!(s.scores().await, vec![(PlayerId(1), 0), (PlayerId(2), 0)]);
        assert_eq!(*s.subscribe_player_count().borrow(), 2);
    }

    #[tokio::test]
    async fn test_add_player_after_start_rejected() {
        let s = session();
        s.claim_start().await.unwrap();
        s.enter_qcm(vec![question(1, "A")], None).await.unwrap();
        let result = s.add_player(Player::new(PlayerId(2), "two")).await;
        assert!(matches!(result, Err(RoomError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_leave_lobby_keeps_roster_and_scores_in_sync() {
        let s = session();
        s.add_player(Player::new(PlayerId(2), "two")).await.unwrap();
        assert_eq!(s.leave_lobby(PlayerId(1)).await, Some(1));
        assert!(!s.contains(PlayerId(1)).await);
        assert_eq!(s.players().await, vec![PlayerId(2)]);
        assert_eq!(s.scores().await, vec![(PlayerId(2), 0)]);
    }

    #[tokio::test]
    async fn test_leave_lobby_after_start_is_refused() {
        let s = session();
        s.enter_qcm(vec![question(1, "A")], None).await.unwrap();
        assert_eq!(s.leave_lobby(PlayerId(1)).await, None);
        assert!(s.contains(PlayerId(1)).await);
    }

    #[tokio::test]
    async fn test_claim_start_only_once() {
        let s = session();
        s.claim_start().await.unwrap();
        assert!(matches!(
            s.claim_start().await,
            Err(RoomError::AlreadyStarted(_))
        ));
        s.release_start().await;
        assert!(s.claim_start().await.is_ok());
    }

    #[tokio::test]
    async fn test_claim_monitor_only_once() {
        let s = session();
        assert!(s.claim_monitor().await);
        assert!(!s.claim_monitor().await);
        s.release_monitor().await;
        assert!(s.claim_monitor().await);
    }

    #[tokio::test]
    async fn test_submit_answer_before_question_is_ignored() {
        let s = session();
        s.enter_qcm(vec![question(1, "A"), question(2, "B")], None)
            .await
            .unwrap();
        s.begin_question(0).await.unwrap();

        // Question 2 hasn't been asked yet.
        let outcome = s.submit_answer(PlayerId(1), QuestionId(2), 1, 15).await;
        assert_eq!(outcome, AnswerOutcome::Ignored);
    }

    #[tokio::test]
    async fn test_submit_answer_scores_first_answer_only() {
        let s = session();
        s.enter_qcm(vec![question(1, "A")], None).await.unwrap();
        s.begin_question(0).await.unwrap();

        let first = s.submit_answer(PlayerId(1), QuestionId(1), 0, 15).await;
        let second = s.submit_answer(PlayerId(1), QuestionId(1), 0, 15).await;
        assert_eq!(first, AnswerOutcome::Correct { score: 15 });
        assert_eq!(second, AnswerOutcome::Ignored);
        assert_eq!(s.score(PlayerId(1)).await, Some(15));
    }

    #[tokio::test]
    async fn test_submit_answer_signals_current_question() {
        let s = session();
        s.enter_qcm(vec![question(1, "A"), question(2, "B")], None)
            .await
            .unwrap();
        let rx = s.subscribe_answers();

        s.begin_question(0).await.unwrap();
        assert_eq!(*rx.borrow(), None);
        s.submit_answer(PlayerId(1), QuestionId(1), 3, 15).await;
        assert_eq!(*rx.borrow(), Some(QuestionId(1)));

        s.begin_question(1).await.unwrap();
        assert_eq!(*rx.borrow(), None);
    }

    #[tokio::test]
    async fn test_late_answer_to_previous_question_does_not_signal() {
        let s = session();
        s.add_player(Player::new(PlayerId(2), "two")).await.unwrap();
        s.enter_qcm(vec![question(1, "A"), question(2, "B")], None)
            .await
            .unwrap();
        let rx = s.subscribe_answers();

        s.begin_question(0).await.unwrap();
        s.begin_question(1).await.unwrap();
        let outcome = s.submit_answer(PlayerId(2), QuestionId(1), 0, 15).await;

        assert_eq!(outcome, AnswerOutcome::Correct { score: 15 });
        assert_eq!(*rx.borrow(), None);
    }

    #[tokio::test]
    async fn test_begin_riddle_without_riddle_skips_round() {
        let s = session();
        s.enter_qcm(vec![question(1, "A")], None).await.unwrap();
        assert!(s.begin_riddle().await.is_none());
        assert_eq!(s.state().await, SessionState::RoundQcm);

        s.begin_finalizing().await;
        assert_eq!(s.state().await, SessionState::Finalizing);
    }

    #[tokio::test]
    async fn test_guess_riddle_scores_once_per_player() {
        let s = session();
        s.enter_qcm(vec![question(1, "A")], Some(riddle())).await.unwrap();
        s.begin_riddle().await.unwrap();

        let first = s.guess_riddle(PlayerId(1), "cat", 100).await.unwrap();
        let again = s.guess_riddle(PlayerId(1), "cat", 100).await.unwrap();
        assert_eq!(first, GuessOutcome::Correct { score: 100 });
        assert_eq!(again, GuessOutcome::AlreadySolved);
        assert_eq!(s.score(PlayerId(1)).await, Some(100));
    }

    #[tokio::test]
    async fn test_request_hint_outside_riddle_round() {
        let s = session();
        let result = s.request_hint(PlayerId(1), 1, Some(25)).await;
        assert!(matches!(result, Err(RoomError::InvalidState(_))));
        assert_eq!(s.score(PlayerId(1)).await, Some(0));
    }

    #[tokio::test]
    async fn test_begin_finalizing_ranks_with_stable_ties() {
        let s = session();
        s.add_player(Player::new(PlayerId(2), "two")).await.unwrap();
        s.add_player(Player::new(PlayerId(3), "three")).await.unwrap();
        s.enter_qcm(vec![question(1, "A")], None).await.unwrap();
        s.begin_question(0).await.unwrap();
        s.submit_answer(PlayerId(3), QuestionId(1), 0, 15).await;

        let (results, recipients) = s.begin_finalizing().await;
        let order: Vec<_> = results.iter().map(|r| r.user_id).collect();
        assert_eq!(order, vec![PlayerId(3), PlayerId(1), PlayerId(2)]);
        assert_eq!(recipients.len(), 3);
    }
}
