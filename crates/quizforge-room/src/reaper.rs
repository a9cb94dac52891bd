//! Session reaper: evicts finished sessions after the retention window.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::{GameSession, SessionRegistry};

impl SessionRegistry {
    /// Removes `session` from the registry once `retention` has elapsed.
    ///
    /// Until then the session stays fully readable. If it is removed some
    /// other way first, the reaper just exits. A newer session that reused
    /// the code is never touched.
    pub fn schedule_removal(
        self: &Arc<Self>,
        session: Arc<GameSession>,
        retention: Duration,
    ) -> JoinHandle<()> {
        let registry = Arc::clone(self);
        tokio::spawn(async move {
            let cancel = session.cancel_token();
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(retention) => {}
            }
            if registry.remove_if_current(&session).await {
                tracing::info!(game_code = %session.code(), "session reaped");
            }
        })
    }
}
