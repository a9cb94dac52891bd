//! Integration tests for the in-memory repository.

use std::collections::HashSet;

use quizforge_protocol::{PlayerId, QuestionId, RiddleId};
use quizforge_store::{MemoryRepository, Question, Repository, Riddle, StoreError, User};

const SEED: &str = r#"{
  "users": [
    { "id": 1, "email": "ana@quiz.io", "username": "ana", "password_hash": "x" },
    { "id": 2, "email": "ben@quiz.io", "username": "ben", "password_hash": "y",
      "total_score": 40, "games_played": 3 }
  ],
  "questions": [
    { "id": 1, "question_text": "q1", "choice_a": "a", "choice_b": "b", "choice_c": "c",
      "choice_d": "d", "correct_answer": "A", "difficulty_level": 1, "manche": 1 },
    { "id": 2, "question_text": "q2", "choice_a": "a", "choice_b": "b", "choice_c": "c",
      "choice_d": "d", "correct_answer": "B", "difficulty_level": 1, "manche": 1 },
    { "id": 3, "question_text": "q3", "choice_a": "a", "choice_b": "b", "choice_c": "c",
      "choice_d": "d", "correct_answer": "C", "difficulty_level": 1, "manche": 1 },
    { "id": 4, "question_text": "q4", "choice_a": "a", "choice_b": "b", "choice_c": "c",
      "choice_d": "d", "correct_answer": "D", "difficulty_level": 2, "manche": 1 },
    { "id": 5, "question_text": "q5", "choice_a": "a", "choice_b": "b", "choice_c": "c",
      "choice_d": "d", "correct_answer": "A", "difficulty_level": 3, "manche": 2 }
  ],
  "riddles": [
    { "id": 9, "riddle_text": "I purr.", "correct_word": "cat",
      "hint_level1": "pet", "hint_level2": "meows" }
  ]
}"#;

fn repo() -> MemoryRepository {
    MemoryRepository::from_json(SEED).expect("seed should parse")
}

#[test]
fn test_user_by_email_found() {
    let user = repo().user_by_email("ben@quiz.io").unwrap();
    assert_eq!(user.id, PlayerId(2));
    assert_eq!(user.total_score, 40);
}

#[test]
fn test_user_by_email_unknown() {
    let result = repo().user_by_email("nobody@quiz.io");
    assert!(matches!(result, Err(StoreError::UnknownEmail(ref e)) if e == "nobody@quiz.io"));
}

#[test]
fn test_user_by_id_defaults_counters() {
    let user = repo().user_by_id(PlayerId(1)).unwrap();
    assert_eq!(user.total_score, 0);
    assert_eq!(user.games_played, 0);
}

#[test]
fn test_questions_filters_by_level_and_manche() {
    let questions = repo().questions(1, 1, 10).unwrap();
    let ids: HashSet<_> = questions.iter().map(|q| q.id).collect();
    assert_eq!(
        ids,
        HashSet::from([QuestionId(1), QuestionId(2), QuestionId(3)])
    );
}

#[test]
fn test_questions_respects_limit() {
    let questions = repo().questions(1, 1, 2).unwrap();
    assert_eq!(questions.len(), 2);
    assert!(questions.iter().all(|q| q.difficulty_level == 1));
}

#[test]
fn test_questions_none_matching_is_error() {
    let result = repo().questions(2, 2, 4);
    assert!(matches!(
        result,
        Err(StoreError::NoQuestions { level: 2, manche: 2 })
    ));
}

#[test]
fn test_random_riddle_picks_from_pool() {
    let riddle = repo().random_riddle().unwrap();
    assert_eq!(riddle.id, RiddleId(9));
    assert_eq!(riddle.hint(2), Some("meows"));
}

#[test]
fn test_random_riddle_empty_pool() {
    let result = MemoryRepository::new().random_riddle();
    assert!(matches!(result, Err(StoreError::NoRiddle)));
}

#[test]
fn test_record_result_accumulates() {
    let repo = repo();
    repo.record_result(PlayerId(2), 120).unwrap();
    repo.record_result(PlayerId(2), -25).unwrap();

    let user = repo.user_by_id(PlayerId(2)).unwrap();
    assert_eq!(user.total_score, 135);
    assert_eq!(user.games_played, 5);
}

#[test]
fn test_record_result_unknown_user() {
    let result = repo().record_result(PlayerId(99), 10);
    assert!(matches!(result, Err(StoreError::UnknownUser(PlayerId(99)))));
}

#[test]
fn test_from_json_invalid_seed() {
    let result = MemoryRepository::from_json(r#"{"users": 5}"#);
    assert!(matches!(result, Err(StoreError::Seed(_))));
}

#[test]
fn test_load_missing_file() {
    let result = MemoryRepository::load("/definitely/not/here.json");
    assert!(matches!(result, Err(StoreError::Io(_))));
}

#[test]
fn test_insert_into_empty_repository() {
    let repo = MemoryRepository::new();
    repo.insert_user(User {
        id: PlayerId(7),
        email: "cy@quiz.io".into(),
        username: "cy".into(),
        password_hash: "z".into(),
        total_score: 0,
        games_played: 0,
    })
    .unwrap();
    repo.insert_question(Question {
        id: QuestionId(30),
        question_text: "q30".into(),
        choice_a: "a".into(),
        choice_b: "b".into(),
        choice_c: "c".into(),
        choice_d: "d".into(),
        correct_answer: "D".into(),
        difficulty_level: 2,
        manche: 2,
        category: "misc".into(),
    })
    .unwrap();
    repo.insert_riddle(Riddle {
        id: RiddleId(4),
        riddle_text: "I bark.".into(),
        correct_word: "dog".into(),
        hint_level1: "pet".into(),
        hint_level2: "woof".into(),
        difficulty_level: 1,
    })
    .unwrap();

    assert_eq!(repo.user_by_email("cy@quiz.io").unwrap().id, PlayerId(7));
    let questions = repo.questions(2, 2, 5).unwrap();
    assert_eq!(questions.len(), 1);
    assert_eq!(questions[0].id, QuestionId(30));
    assert_eq!(repo.random_riddle().unwrap().correct_word, "dog");
}

#[test]
fn test_insert_user_replaces_same_id() {
    let repo = repo();
    let mut ben = repo.user_by_id(PlayerId(2)).unwrap();
    ben.email = "benjamin@quiz.io".into();
    repo.insert_user(ben).unwrap();

    assert_eq!(repo.user_by_id(PlayerId(2)).unwrap().email, "benjamin@quiz.io");
    assert!(matches!(
        repo.user_by_email("ben@quiz.io"),
        Err(StoreError::UnknownEmail(_))
    ));
}
