//! Online/offline state of the remote backend.

use std::sync::atomic::{AtomicBool, Ordering};

/// How the connectivity state changed with a new observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    CameOnline,
    WentOffline,
    StayedOnline,
    StayedOffline,
}

impl Transition {
    fn between(was_online: bool, is_online: bool) -> Self {
        match (was_online, is_online) {
            (false, true) => Transition::CameOnline,
            (true, false) => Transition::WentOffline,
            (true, true) => Transition::StayedOnline,
            (false, false) => Transition::StayedOffline,
        }
    }

    /// Only an offline to online transition starts a reconciliation.
    pub fn triggers_sync(self) -> bool {
        self == Transition::CameOnline
    }

    pub fn is_online(self) -> bool {
        matches!(self, Transition::CameOnline | Transition::StayedOnline)
    }
}

/// Last known reachability of the backend.
///
/// Starts online: the first failed call or probe flips it.
#[derive(Debug)]
pub struct Connectivity {
    online: AtomicBool,
}

impl Default for Connectivity {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Connectivity {
    pub fn new(online: bool) -> Self {
        Self {
            online: AtomicBool::new(online),
        }
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// Record an observation and report the transition it caused.
    pub fn record(&self, online: bool) -> Transition {
        let was_online = self.online.swap(online, Ordering::SeqCst);
        Transition::between(was_online, online)
    }

    pub fn mark_offline(&self) -> Transition {
        self.record(false)
    }
}
