//! Game configuration and the session state machine.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// GameConfig
// ---------------------------------------------------------------------------

/// One slice of the multiple-choice round: `count` questions of a given
/// difficulty `level` from round `manche`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionBatch {
    pub level: u32,
    pub manche: u32,
    pub count: usize,
}

/// Every tunable of the round engine.
///
/// Missing fields in a config file fall back to the defaults, so a file
/// can override just what it cares about:
///
/// ```rust
/// use quizforge_room::GameConfig;
///
/// let config: GameConfig = serde_json::from_str(r#"{ "min_players": 3 }"#).unwrap();
/// assert_eq!(config.min_players, 3);
/// assert_eq!(config.qcm_bonus, 15);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Players needed before the lobby monitor starts its grace timer.
    pub min_players: usize,

    /// Extra time the lobby stays open once `min_players` is reached.
    pub lobby_grace: Duration,

    /// How long each question waits for a first answer.
    pub question_timeout: Duration,

    /// How long the riddle round lasts, regardless of guesses.
    pub riddle_window: Duration,

    /// How long a finished session stays in the registry.
    pub retention: Duration,

    /// Width of generated session codes.
    pub code_digits: u32,

    /// Which questions make up the multiple-choice round, in order.
    pub qcm_plan: Vec<QuestionBatch>,

    /// Points for a correct multiple-choice answer.
    pub qcm_bonus: i64,

    /// Points for solving the riddle.
    pub riddle_bonus: i64,

    /// Cost of hint level 1 and hint level 2.
    pub hint_costs: [i64; 2],
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            min_players: 2,
            lobby_grace: Duration::from_secs(30),
            question_timeout: Duration::from_secs(10),
            riddle_window: Duration::from_secs(60),
            retention: Duration::from_secs(5 * 60),
            code_digits: 4,
            qcm_plan: vec![
                QuestionBatch { level: 1, manche: 1, count: 4 },
                QuestionBatch { level: 2, manche: 1, count: 4 },
            ],
            qcm_bonus: 15,
            riddle_bonus: 100,
            hint_costs: [25, 50],
        }
    }
}

impl GameConfig {
    /// Cost of hint `level`, or `None` if no such hint exists.
    pub fn hint_cost(&self, level: i64) -> Option<i64> {
        match level {
            1 => Some(self.hint_costs[0]),
            2 => Some(self.hint_costs[1]),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// The lifecycle state of a game session.
///
/// ```text
/// Lobby → RoundQcm → RoundRiddle → Finalizing → Closed
///              └──────────────────────↑
/// ```
///
/// - **Lobby**: accepting joins, waiting for a start.
/// - **RoundQcm**: multiple-choice questions are being played.
/// - **RoundRiddle**: the riddle is open for guesses and hints. Skipped
///   when no riddle could be loaded.
/// - **Finalizing**: scores are being persisted and the scoreboard sent.
/// - **Closed**: finished; waiting for the reaper to evict the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Lobby,
    RoundQcm,
    RoundRiddle,
    Finalizing,
    Closed,
}

impl SessionState {
    /// Returns `true` if the session is accepting new players.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Lobby)
    }

    /// Returns `true` once the round sequence is over.
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finalizing | Self::Closed)
    }

    /// The next state in the full sequence, or `None` from `Closed`.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Lobby => Some(Self::RoundQcm),
            Self::RoundQcm => Some(Self::RoundRiddle),
            Self::RoundRiddle => Some(Self::Finalizing),
            Self::Finalizing => Some(Self::Closed),
            Self::Closed => None,
        }
    }

    /// Returns `true` if moving to `target` is valid: the next state, or
    /// straight from `RoundQcm` to `Finalizing` when there is no riddle.
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target)
            || (self == Self::RoundQcm && target == Self::Finalizing)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lobby => write!(f, "Lobby"),
            Self::RoundQcm => write!(f, "RoundQcm"),
            Self::RoundRiddle => write!(f, "RoundRiddle"),
            Self::Finalizing => write!(f, "Finalizing"),
            Self::Closed => write!(f, "Closed"),
        }
    }
}
