//! Connectivity checks and replay of pending accounts.

use tracing::{debug, info, trace, warn};

use super::AuthManager;
use crate::{crypto::SealKey, presenter::Alert};

/// Outcome of one sync cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Emails accepted by the backend, or already known to it.
    pub synced: Vec<String>,
    /// Emails that stay pending until the next cycle.
    pub failed: Vec<String>,
    /// The cycle did not run because another one was in progress.
    pub skipped: bool,
}

impl SyncReport {
    fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }

    /// Some pending accounts are still unsynced after the cycle.
    pub fn is_partial(&self) -> bool {
        !self.failed.is_empty()
    }

    /// Number of accounts processed in the cycle.
    pub fn attempted(&self) -> usize {
        self.synced.len() + self.failed.len()
    }
}

impl AuthManager {
    /// Probe the backend and update the connectivity state.
    ///
    /// Returns whether the backend is reachable. When it has just come back
    /// online, pending accounts are synced before returning. Without a
    /// configured API the backend is never reachable and nothing is probed.
    pub async fn check_connectivity(&self) -> bool {
        let Some(api) = &self.api else {
            self.connectivity.record(false);
            return false;
        };

        let online = match api.health().await {
            Ok(()) => true,
            Err(e) => {
                // Expected while the backend is down; keep it quiet.
                trace!(error = %e, "Health probe failed");
                false
            }
        };

        let transition = self.connectivity.record(online);
        debug!(?transition, "Connectivity checked");
        if transition.triggers_sync() {
            info!("Backend back online");
            self.sync_pending().await;
        }
        online
    }

    /// Replay every pending account against the remote signup endpoint.
    ///
    /// Each account is tried once. Accounts the backend accepts, or reports
    /// as already existing, are removed from the pending list; all others
    /// stay for the next cycle. Failures are logged, never returned.
    ///
    /// If the pending list cannot be rewritten, every account of the cycle is
    /// reported as failed, matching what stays stored.
    pub async fn sync_pending(&self) -> SyncReport {
        let Some(api) = &self.api else {
            return SyncReport::default();
        };
        let Ok(_cycle) = self.sync_lock.try_lock() else {
            debug!("Sync already in progress, skipping");
            return SyncReport::skipped();
        };

        let accounts = match self.pending.load() {
            Ok(accounts) => accounts,
            Err(e) => {
                warn!(error = %e, "Failed to read pending accounts");
                return SyncReport::default();
            }
        };
        if accounts.is_empty() {
            return SyncReport::default();
        }

        info!(count = accounts.len(), "Syncing pending accounts");
        let key = match SealKey::load_or_create(self.store.as_ref()) {
            Ok(key) => key,
            Err(e) => {
                warn!(error = %e, "Failed to load seal key");
                return SyncReport {
                    failed: accounts.into_iter().map(|a| a.email).collect(),
                    ..SyncReport::default()
                };
            }
        };

        let mut report = SyncReport::default();
        for account in accounts {
            let password = match account.unseal_password(&key) {
                Ok(password) => password,
                Err(e) => {
                    warn!(email = %account.email, error = %e, "Cannot recover pending password");
                    report.failed.push(account.email);
                    continue;
                }
            };

            match api.signup(&account.name, &account.email, &password).await {
                Ok(_) => {
                    info!(email = %account.email, "Synced");
                    report.synced.push(account.email);
                }
                Err(e) if e.is_already_exists() => {
                    info!(email = %account.email, "Already exists remotely");
                    report.synced.push(account.email);
                }
                // The backend accepted the signup; only its body was unreadable.
                Err(e) if e.is_decode() => {
                    warn!(email = %account.email, error = %e, "Synced with an unreadable response");
                    report.synced.push(account.email);
                }
                Err(e) => {
                    debug!(email = %account.email, error = %e, "Sync attempt failed");
                    report.failed.push(account.email);
                }
            }
        }

        if !report.synced.is_empty() {
            if let Err(e) = self.pending.remove_emails(&report.synced) {
                // Still stored, so still pending. The next cycle sees them as
                // already existing.
                warn!(error = %e, "Failed to update pending accounts");
                report.failed.append(&mut report.synced);
                return report;
            }
            self.notify(
                Alert::success(format!(
                    "Successfully synced {} account(s) to the database!",
                    report.synced.len()
                ))
                .with_title("Sync Complete"),
            );
        }
        if report.is_partial() {
            warn!(remaining = report.failed.len(), "Some pending accounts are still unsynced");
        }
        report
    }
}
