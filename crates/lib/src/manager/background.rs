//! Periodic connectivity check.
//!
//! A single tokio task probes the backend once per interval. Registering a
//! new timer aborts the previous one, so at most one check loop runs per
//! manager. The task only holds a weak reference and exits once the manager
//! is dropped.

use std::{
    sync::{Arc, Weak},
    time::Duration,
};

use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{Instrument, debug, info, info_span};

use super::AuthManager;

impl AuthManager {
    /// Start the periodic check with the configured interval.
    pub fn start_sync_check(self: &Arc<Self>) {
        self.start_sync_check_every(self.config.sync_interval);
    }

    /// Start the periodic check, probing every `period`.
    ///
    /// The first probe happens one full period after the call.
    pub fn start_sync_check_every(self: &Arc<Self>, period: Duration) {
        let handle = tokio::spawn(
            run_sync_check(Arc::downgrade(self), period)
                .instrument(info_span!("sync_check", period_ms = period.as_millis() as u64)),
        );

        let previous = self
            .timer
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .replace(handle);
        if let Some(previous) = previous {
            debug!("Replacing existing sync check");
            previous.abort();
        }
        info!(?period, "Sync check started");
    }

    /// Stop the periodic check. Returns whether one was running.
    pub fn stop_sync_check(&self) -> bool {
        let handle = self
            .timer
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        match handle {
            Some(handle) => {
                handle.abort();
                info!("Sync check stopped");
                true
            }
            None => false,
        }
    }

    pub fn is_sync_check_running(&self) -> bool {
        self.timer
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

async fn run_sync_check(manager: Weak<AuthManager>, period: Duration) {
    let mut ticker = interval_at(Instant::now() + period, period);
    // A slow probe delays the next one instead of causing a burst.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let Some(manager) = manager.upgrade() else {
            debug!("Manager dropped, ending sync check");
            break;
        };
        manager.check_connectivity().await;
    }
}
