//! Round runner: the background task that plays one session start to end.
//!
//! ```text
//! for each question:
//!     broadcast QUESTION
//!     wait for: first answer to it | question_timeout | cancellation
//! if a riddle was loaded:
//!     broadcast RIDDLE
//!     wait for: riddle_window | cancellation
//! persist scores, broadcast GAME_OVER, schedule removal
//! ```
//!
//! Each wait is a single `select!`, so advancing on the first answer is an
//! explicit transition. Cancellation ends the task at its next wait point
//! without finalizing.

use std::sync::Arc;

use quizforge_protocol::ServerMessage;
use quizforge_store::Repository;
use tokio_util::sync::CancellationToken;

use crate::outbound;
use crate::{Engine, GameSession};

impl<R: Repository> Engine<R> {
    pub(crate) async fn run_rounds(self, session: Arc<GameSession>) {
        let cancel = session.cancel_token();

        if !self.play_qcm(&session, &cancel).await
            || !self.play_riddle(&session, &cancel).await
        {
            tracing::info!(game_code = %session.code(), "session cancelled, round runner stopped");
            return;
        }
        self.finalize(&session).await;
    }

    /// Returns `false` if the session was cancelled.
    async fn play_qcm(
        &self,
        session: &GameSession,
        cancel: &CancellationToken,
    ) -> bool {
        let code = session.code();
        let total = session.question_count().await;
        let timeout = self.config().question_timeout;
        let mut answered = session.subscribe_answers();

        tracing::info!(game_code = %code, questions = total, "qcm round started");

        for index in 0..total {
            let Some(slot) = session.begin_question(index).await else {
                break;
            };
            let question_id = slot.id;

            outbound::broadcast(
                self.outbound(),
                &slot.recipients,
                &ServerMessage::Question {
                    question: slot.view,
                    manche: slot.manche,
                },
            );
            tracing::info!(game_code = %code, %question_id, number = index + 1, "question advanced");

            let first_answer = async {
                answered
                    .wait_for(|current| *current == Some(question_id))
                    .await
                    .is_ok()
            };

            tokio::select! {
                _ = cancel.cancelled() => return false,
                _ = tokio::time::sleep(timeout) => {
                    tracing::debug!(game_code = %code, %question_id, "question timed out");
                }
                signalled = first_answer => {
                    tracing::debug!(game_code = %code, %question_id, signalled, "first answer received");
                }
            }
        }
        true
    }

    /// Returns `false` if the session was cancelled.
    async fn play_riddle(
        &self,
        session: &GameSession,
        cancel: &CancellationToken,
    ) -> bool {
        let code = session.code();
        let Some((riddle_id, text, recipients)) = session.begin_riddle().await
        else {
            tracing::info!(game_code = %code, "no riddle loaded, riddle round skipped");
            return !cancel.is_cancelled();
        };

        outbound::broadcast(
            self.outbound(),
            &recipients,
            &ServerMessage::Riddle { riddle_id, text },
        );
        tracing::info!(game_code = %code, %riddle_id, "riddle round started");

        tokio::select! {
            _ = cancel.cancelled() => false,
            _ = tokio::time::sleep(self.config().riddle_window) => true,
        }
    }

    /// Persists every score, broadcasts GAME_OVER, closes the session and
    /// schedules its removal.
    async fn finalize(&self, session: &Arc<GameSession>) {
        let code = session.code();
        let (results, recipients) = session.begin_finalizing().await;

        for result in &results {
            let (user_id, score) = (result.user_id, result.score);
            if let Err(e) = self
                .blocking(move |repo| repo.record_result(user_id, score))
                .await
            {
                tracing::error!(game_code = %code, %user_id, error = %e, "failed to persist score");
            }
        }

        let ranking: Vec<i64> = results.iter().map(|r| r.score).collect();
        outbound::broadcast(
            self.outbound(),
            &recipients,
            &ServerMessage::GameOver { results },
        );
        session.close().await;
        tracing::info!(game_code = %code, ?ranking, "game over");

        self.registry()
            .schedule_removal(Arc::clone(session), self.config().retention);
    }
}
