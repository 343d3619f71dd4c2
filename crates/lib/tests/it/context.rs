//! Test context for managing test setup and lifecycle.
//!
//! Provides a composable `TestContext` that explicitly shows what each test needs:
//! which store backs the manager, whether a backend is configured, and whether
//! it is reachable.

use std::{sync::Arc, time::Duration};

use movy::{AuthManager, Config, InMemoryStore, KvStore, remote::AuthApi};
use url::Url;

use crate::helpers::{MockApi, PinnedClock, RecordingPresenter};

/// Test context holding the manager and the doubles wired into it.
///
/// Use the builder methods to set up what the test needs:
/// - `TestContext::new()` - backend configured and reachable
/// - `TestContext::without_api()` - no backend configured
/// - `.offline()` - backend configured but unreachable
/// - `.with_store(..)` - use a specific store
pub struct TestContext {
    store: Arc<dyn KvStore>,
    api: Option<Arc<MockApi>>,
    presenter: Arc<RecordingPresenter>,
    sync_interval: Duration,
}

impl TestContext {
    /// Create a new test context with a reachable backend.
    pub fn new() -> Self {
        Self {
            store: Arc::new(InMemoryStore::new()),
            api: Some(MockApi::online()),
            presenter: Arc::new(RecordingPresenter::default()),
            sync_interval: Duration::from_secs(120),
        }
    }

    /// Create a context with no backend configured.
    pub fn without_api() -> Self {
        Self {
            api: None,
            ..Self::new()
        }
    }

    /// Start with the backend unreachable.
    pub fn offline(self) -> Self {
        if let Some(api) = &self.api {
            api.set_reachable(false);
        }
        self
    }

    pub fn with_store(mut self, store: Arc<dyn KvStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_sync_interval(mut self, interval: Duration) -> Self {
        self.sync_interval = interval;
        self
    }

    /// Build the manager. Can be called repeatedly to simulate restarts over
    /// the same store and backend.
    pub fn manager(&self) -> Arc<AuthManager> {
        let mut config = match &self.api {
            Some(_) => Config::with_api_url(Url::parse("http://mock/api/").expect("valid url")),
            None => Config::default(),
        };
        config.sync_interval = self.sync_interval;

        let api = self.api.clone().map(|api| api as Arc<dyn AuthApi>);
        Arc::new(
            AuthManager::new(config, self.store.clone(), api)
                .with_clock(Arc::new(PinnedClock))
                .with_presenter(self.presenter.clone()),
        )
    }

    /// Get the backend double (panics if no backend is configured).
    pub fn api(&self) -> &MockApi {
        self.api
            .as_deref()
            .expect("api not set - use TestContext::new()")
    }

    pub fn store(&self) -> &Arc<dyn KvStore> {
        &self.store
    }

    pub fn presenter(&self) -> &RecordingPresenter {
        &self.presenter
    }
}
