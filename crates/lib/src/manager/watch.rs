//! Watch-history sync for the logged-in user.

use std::sync::Arc;

use tracing::{debug, info};

use super::{AuthError, AuthManager};
use crate::{
    Result,
    history::{self, ProgressUpload},
    remote::AuthApi,
};

/// Callback run after server watch history is merged into the store, with
/// the number of merged items. Typically reloads the "continue watching" row.
pub type HistoryObserver = Arc<dyn Fn(usize) + Send + Sync>;

impl AuthManager {
    /// Register the observer notified after each history merge, replacing
    /// any previous one.
    pub fn on_history_synced(&self, observer: impl Fn(usize) + Send + Sync + 'static) {
        *self
            .history_observer
            .write()
            .unwrap_or_else(|e| e.into_inner()) = Some(Arc::new(observer));
    }

    pub fn clear_history_observer(&self) {
        *self
            .history_observer
            .write()
            .unwrap_or_else(|e| e.into_inner()) = None;
    }

    /// Send one progress record to the backend.
    pub async fn save_watch_progress(&self, progress: &ProgressUpload) -> Result<()> {
        let (api, token) = self.backend_session()?;
        api.save_watch_progress(&token, progress).await?;
        debug!(content_id = %progress.content_id, "Saved watch progress");
        Ok(())
    }

    /// Pull the user's watch history and merge it into the store.
    ///
    /// Returns the number of merged items.
    pub async fn sync_watch_history(&self) -> Result<usize> {
        let (api, token) = self.backend_session()?;
        let items = api.fetch_watch_history(&token).await?;
        let merged = history::merge_server_history(self.store.as_ref(), &items)?;
        info!(merged, "Watch history synced");

        let observer = self
            .history_observer
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        if let Some(observer) = observer {
            observer(merged);
        }
        Ok(merged)
    }

    /// The API and token to use for authenticated calls.
    ///
    /// Locally issued tokens are never sent to the backend.
    fn backend_session(&self) -> Result<(Arc<dyn AuthApi>, String)> {
        let api = self.api.clone().ok_or(AuthError::NetworkUnavailable)?;
        match self.current_session() {
            Some(session) if !session.is_offline() => Ok((api, session.token)),
            _ => Err(AuthError::NotLoggedIn.into()),
        }
    }
}
