//! Lobby monitor: starts a multiplayer session once enough players joined.

use std::sync::Arc;

use quizforge_store::Repository;

use crate::{Engine, GameSession, RoomError};

impl<R: Repository> Engine<R> {
    /// Spawns the lobby monitor for `session` unless one is already
    /// running.
    pub(crate) async fn ensure_lobby_monitor(&self, session: &Arc<GameSession>) {
        if !session.claim_monitor().await {
            return;
        }
        tracing::debug!(game_code = %session.code(), "lobby monitor started");
        tokio::spawn(self.clone().watch_lobby(Arc::clone(session)));
    }

    /// Waits for `min_players`, then for the lobby grace period, then
    /// starts the session.
    async fn watch_lobby(self, session: Arc<GameSession>) {
        let code = session.code().clone();
        let cancel = session.cancel_token();
        let min_players = self.config().min_players;
        let mut player_count = session.subscribe_player_count();

        let enough_players = async {
            player_count
                .wait_for(|count| *count >= min_players)
                .await
                .is_ok()
        };

        tokio::select! {
            _ = cancel.cancelled() => return,
            reached = enough_players => {
                if !reached {
                    return;
                }
            }
        }

        let grace = self.config().lobby_grace;
        tracing::info!(game_code = %code, ?grace, "minimum players reached, starting after grace period");

        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(grace) => {}
        }

        match self.start_session(&code).await {
            Ok(()) => {}
            Err(RoomError::AlreadyStarted(_)) => {
                tracing::debug!(game_code = %code, "session already started");
            }
            Err(e) => {
                tracing::warn!(game_code = %code, error = %e, "lobby start failed");
                session.release_monitor().await;
            }
        }
    }
}
