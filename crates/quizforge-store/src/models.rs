//! Stored records: users, questions, riddles.
//!
//! Field names match the seed-file JSON, so these types deserialize
//! straight out of [`SeedData`](crate::SeedData).

use quizforge_protocol::{PlayerId, QuestionId, QuestionView, RiddleId};
use serde::{Deserialize, Serialize};

/// A registered player account.
///
/// `total_score` and `games_played` are lifetime counters. The score a
/// player builds up inside one game lives in the session, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: PlayerId,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    #[serde(default)]
    pub total_score: i64,
    #[serde(default)]
    pub games_played: u32,
}

/// Letters of the four choices, in option order.
const CHOICE_MARKERS: [&str; 4] = ["A", "B", "C", "D"];

/// A multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub question_text: String,
    pub choice_a: String,
    pub choice_b: String,
    pub choice_c: String,
    pub choice_d: String,
    /// `"A"`, `"B"`, `"C"` or `"D"`.
    pub correct_answer: String,
    pub difficulty_level: u32,
    pub manche: u32,
    #[serde(default)]
    pub category: String,
}

impl Question {
    /// Whether choice index `choice` (0 = A … 3 = D) is the right one.
    /// Any index outside `0..=3` is wrong.
    pub fn is_correct_choice(&self, choice: i64) -> bool {
        usize::try_from(choice)
            .ok()
            .and_then(|i| CHOICE_MARKERS.get(i))
            .is_some_and(|marker| *marker == self.correct_answer)
    }

    /// The player-facing form of the question, without the answer.
    pub fn view(&self) -> QuestionView {
        QuestionView {
            id: self.id,
            text: self.question_text.clone(),
            options: [
                self.choice_a.clone(),
                self.choice_b.clone(),
                self.choice_c.clone(),
                self.choice_d.clone(),
            ],
            level: self.difficulty_level,
        }
    }
}

/// A word-guessing puzzle with two purchasable hints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Riddle {
    pub id: RiddleId,
    pub riddle_text: String,
    pub correct_word: String,
    pub hint_level1: String,
    pub hint_level2: String,
    #[serde(default)]
    pub difficulty_level: u32,
}

impl Riddle {
    /// Exact, case-sensitive comparison against the correct word.
    pub fn is_solved_by(&self, guess: &str) -> bool {
        guess == self.correct_word
    }

    /// Hint text for `level` 1 or 2; `None` for anything else.
    pub fn hint(&self, level: i64) -> Option<&str> {
        match level {
            1 => Some(&self.hint_level1),
            2 => Some(&self.hint_level2),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(correct: &str) -> Question {
        Question {
            id: QuestionId(1),
            question_text: "2 + 2?".into(),
            choice_a: "3".into(),
            choice_b: "4".into(),
            choice_c: "5".into(),
            choice_d: "22".into(),
            correct_answer: correct.into(),
            difficulty_level: 1,
            manche: 1,
            category: "math".into(),
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

    #[test]
    fn test_is_correct_choice_maps_index_to_letter() {
        let q = question("B");
        assert!(q.is_correct_choice(1));
        assert!(!q.is_correct_choice(0));
        assert!(!q.is_correct_choice(2));
        assert!(!q.is_correct_choice(3));
    }

    #[test]
    fn test_is_correct_choice_out_of_range_is_wrong() {
        let q = question("A");
        assert!(!q.is_correct_choice(-1));
        assert!(!q.is_correct_choice(4));
        assert!(!q.is_correct_choice(i64::MAX));
    }

    #[test]
    fn test_is_correct_choice_unknown_marker_never_matches() {
        let q = question("E");
        assert!((0..4).all(|c| !q.is_correct_choice(c)));
    }

    #[test]
    fn test_view_hides_answer() {
        let view = question("D").view();
        assert_eq!(view.options[3], "22");
        assert_eq!(view.level, 1);
        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("correct_answer").is_none());
    }

    #[test]
    fn test_riddle_guess_is_case_sensitive() {
        let r = riddle();
        assert!(r.is_solved_by("cat"));
        assert!(!r.is_solved_by("CAT"));
        assert!(!r.is_solved_by("cat "));
    }

    #[test]
    fn test_riddle_hint_levels() {
        let r = riddle();
        assert_eq!(r.hint(1), Some("pet"));
        assert_eq!(r.hint(2), Some("meows"));
        assert_eq!(r.hint(0), None);
        assert_eq!(r.hint(3), None);
    }
}
