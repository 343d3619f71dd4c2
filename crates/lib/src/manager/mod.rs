//! The reconciliation manager.
//!
//! [`AuthManager`] owns the session and decides, per operation, whether to
//! go through the remote API or fall back to locally held accounts:
//!
//! * No API configured: every account is an *offline* account.
//! * API configured but unreachable: signups are queued as *pending*
//!   accounts and a local session is established right away.
//! * When a health probe sees the backend come back, the pending list is
//!   replayed against the remote signup endpoint.
//!
//! Network failures never surface as errors from signup or login; they
//! select the offline path. The user is always told the outcome through the
//! [`Presenter`].

use std::sync::{Arc, Mutex, RwLock};

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{
    Clock, Config, Result, SystemClock,
    accounts::{AccountList, LocalAccount},
    connectivity::Connectivity,
    crypto::SealKey,
    presenter::{Alert, NullPresenter, Presenter},
    remote::{AuthApi, HttpAuthApi, RemoteError},
    session::{Session, SessionStore},
    storage::KvStore,
};

mod background;
mod errors;
mod reconcile;
mod watch;

pub use errors::AuthError;
pub use reconcile::SyncReport;
pub use watch::HistoryObserver;

/// Session manager with injected storage, network, clock, and presentation.
///
/// Share it as `Arc<AuthManager>`; the periodic sync check needs an `Arc`.
pub struct AuthManager {
    config: Config,
    store: Arc<dyn KvStore>,
    api: Option<Arc<dyn AuthApi>>,
    clock: Arc<dyn Clock>,
    presenter: Arc<dyn Presenter>,
    sessions: SessionStore,
    pending: AccountList,
    offline: AccountList,
    session: RwLock<Option<Session>>,
    connectivity: Connectivity,
    /// Held for the duration of a sync cycle.
    sync_lock: tokio::sync::Mutex<()>,
    history_observer: RwLock<Option<HistoryObserver>>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for AuthManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthManager")
            .field("config", &self.config)
            .field("has_api", &self.api.is_some())
            .field("online", &self.connectivity.is_online())
            .field("logged_in", &self.is_logged_in())
            .finish()
    }
}

impl AuthManager {
    /// Create a manager. `api` is `None` when no backend is configured.
    pub fn new(config: Config, store: Arc<dyn KvStore>, api: Option<Arc<dyn AuthApi>>) -> Self {
        Self {
            config,
            sessions: SessionStore::new(store.clone()),
            pending: AccountList::pending(store.clone()),
            offline: AccountList::offline(store.clone()),
            store,
            api,
            clock: Arc::new(SystemClock),
            presenter: Arc::new(NullPresenter),
            session: RwLock::new(None),
            connectivity: Connectivity::default(),
            sync_lock: tokio::sync::Mutex::new(()),
            history_observer: RwLock::new(None),
            timer: Mutex::new(None),
        }
    }

    /// Create a manager talking HTTP to `config.api_url`, if set.
    pub fn from_config(config: Config, store: Arc<dyn KvStore>) -> Result<Self> {
        let api = HttpAuthApi::from_config(&config)?.map(|api| Arc::new(api) as Arc<dyn AuthApi>);
        Ok(Self::new(config, store, api))
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_presenter(mut self, presenter: Arc<dyn Presenter>) -> Self {
        self.presenter = presenter;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn KvStore> {
        &self.store
    }

    /// Whether a remote API is configured.
    pub fn has_api(&self) -> bool {
        self.api.is_some()
    }

    /// Last known reachability of the backend.
    pub fn is_online(&self) -> bool {
        self.connectivity.is_online()
    }

    /// Accounts waiting to be synced to the backend.
    pub fn pending_accounts(&self) -> Result<Vec<LocalAccount>> {
        self.pending.load()
    }

    /// Accounts created while no backend was configured.
    pub fn offline_accounts(&self) -> Result<Vec<LocalAccount>> {
        self.offline.load()
    }

    pub fn current_session(&self) -> Option<Session> {
        self.session
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.current_session().is_some()
    }

    pub fn auth_token(&self) -> Option<String> {
        self.current_session().map(|s| s.token)
    }

    /// Load the persisted session, if any, and render it.
    pub fn restore_session(&self) -> Result<Option<Session>> {
        let restored = self.sessions.load()?;
        if let Some(session) = &restored {
            debug!(email = %session.email, offline = session.is_offline(), "Restored session");
            self.set_session(Some(session.clone()));
            self.presenter.session_changed(Some(session));
        }
        Ok(restored)
    }

    /// Create an account.
    ///
    /// The remote API is used when configured. If it cannot be reached the
    /// account is queued as pending and a local session is established.
    pub async fn sign_up(&self, name: &str, email: &str, password: &str) -> Result<Session> {
        if self.pending.contains_email(email)? {
            self.notify(
                Alert::warning("This email is already registered and pending sync to database.")
                    .with_title("Email Already Used"),
            );
            return Err(AuthError::DuplicateEmail {
                email: email.to_string(),
            }
            .into());
        }

        let Some(api) = &self.api else {
            return self.create_offline_account(name, email, password);
        };

        match api.signup(name, email, password).await {
            Ok(response) => {
                let session = response.into_session();
                self.establish(&session)?;
                info!(email = %session.email, "Signed up");
                self.notify(
                    Alert::success("Your account has been created successfully!")
                        .with_title("Welcome to MOVY"),
                );
                Ok(session)
            }
            Err(e) if e.is_unreachable() => {
                warn!(error = %e, "Signup failed, saving account locally");
                self.connectivity.mark_offline();
                self.save_pending_account(name, email, password)
            }
            Err(e) => Err(self.reject(e, "Unable to create account", "Signup Failed")),
        }
    }

    /// Log in with email and password.
    ///
    /// If the backend cannot be reached, pending accounts are checked instead.
    pub async fn log_in(&self, email: &str, password: &str) -> Result<Session> {
        let Some(api) = &self.api else {
            return self.log_in_offline_account(email, password);
        };

        match api.login(email, password).await {
            Ok(response) => {
                let session = response.into_session();
                self.establish(&session)?;
                info!(email = %session.email, "Logged in");
                self.notify(
                    Alert::success(format!("Welcome back, {}!", session.name))
                        .with_title("Login Successful"),
                );
                if let Err(e) = self.sync_watch_history().await {
                    warn!(error = %e, "Failed to sync watch history after login");
                }
                Ok(session)
            }
            Err(e) if e.is_unreachable() => {
                warn!(error = %e, "Login failed, trying pending accounts");
                self.connectivity.mark_offline();
                match self.pending.find_by_credentials(email, password)? {
                    Some(account) => {
                        let session = Session::local(&account);
                        self.establish(&session)?;
                        self.notify(
                            Alert::warning(
                                "Logged in offline. Account will sync when database is online.",
                            )
                            .with_title("Offline Mode"),
                        );
                        Ok(session)
                    }
                    None => {
                        self.notify(
                            Alert::error(
                                "Unable to connect to server. Please check your connection.",
                            )
                            .with_title("Connection Error"),
                        );
                        Err(AuthError::InvalidCredentials.into())
                    }
                }
            }
            Err(e) => Err(self.reject(e, "Invalid email or password", "Login Failed")),
        }
    }

    /// End the session and remove it from the store.
    pub fn log_out(&self) -> Result<()> {
        self.set_session(None);
        self.sessions.clear()?;
        info!("Logged out");
        self.presenter.session_changed(None);
        self.notify(Alert::info("You have been logged out successfully.").with_title("Goodbye!"));
        Ok(())
    }

    fn create_offline_account(&self, name: &str, email: &str, password: &str) -> Result<Session> {
        let duplicate = || {
            self.notify(
                Alert::error("This email is already registered!").with_title("Email Already Used"),
            );
            AuthError::DuplicateEmail {
                email: email.to_string(),
            }
        };

        if self.offline.contains_email(email)? {
            return Err(duplicate().into());
        }
        let account = LocalAccount::new(name, email, password, self.clock.as_ref(), None)?;
        if let Err(e) = self.offline.insert(account.clone()) {
            if e.as_auth().is_some_and(AuthError::is_duplicate_email) {
                return Err(duplicate().into());
            }
            return Err(e);
        }

        let session = Session::local(&account);
        self.establish(&session)?;
        info!(email = %session.email, "Created offline account");
        self.notify(
            Alert::success("Account created successfully! (Offline mode)")
                .with_title("Welcome to MOVY"),
        );
        Ok(session)
    }

    fn log_in_offline_account(&self, email: &str, password: &str) -> Result<Session> {
        match self.offline.find_by_credentials(email, password)? {
            Some(account) => {
                let session = Session::local(&account);
                self.establish(&session)?;
                self.notify(
                    Alert::success("Logged in successfully! (Offline mode)")
                        .with_title("Welcome Back"),
                );
                Ok(session)
            }
            None => {
                self.notify(Alert::error("Invalid email or password").with_title("Login Failed"));
                Err(AuthError::InvalidCredentials.into())
            }
        }
    }

    fn save_pending_account(&self, name: &str, email: &str, password: &str) -> Result<Session> {
        let queued = SealKey::load_or_create(self.store.as_ref()).and_then(|key| {
            let account = LocalAccount::new(name, email, password, self.clock.as_ref(), Some(&key))?;
            self.pending.insert(account.clone())?;
            Ok(account)
        });

        let account = match queued {
            Ok(account) => account,
            Err(e) => {
                if e.as_auth().is_some_and(AuthError::is_duplicate_email) {
                    self.notify(
                        Alert::warning(
                            "This email is already registered and pending sync to database.",
                        )
                        .with_title("Email Already Used"),
                    );
                } else {
                    warn!(error = %e, "Failed to save pending account");
                    self.notify(
                        Alert::error("Unable to create account. Please try again.")
                            .with_title("Signup Failed"),
                    );
                }
                return Err(e);
            }
        };

        let session = Session::local(&account);
        self.establish(&session)?;
        info!(email = %session.email, "Queued pending account");
        self.notify(
            Alert::warning(
                "Database is offline. Your account has been saved locally and will sync \
                 automatically when the database is back online!",
            )
            .with_title("Offline Account Created"),
        );
        Ok(session)
    }

    /// Persist, remember, and render a new session.
    fn establish(&self, session: &Session) -> Result<()> {
        self.sessions.save(session)?;
        self.set_session(Some(session.clone()));
        self.presenter.session_changed(Some(session));
        Ok(())
    }

    fn set_session(&self, session: Option<Session>) {
        *self.session.write().unwrap_or_else(|e| e.into_inner()) = session;
    }

    fn reject(&self, err: RemoteError, fallback: &str, title: &str) -> crate::Error {
        let message = err
            .rejection_message()
            .filter(|m| !m.is_empty())
            .unwrap_or(fallback)
            .to_string();
        debug!(error = %err, "Request rejected");
        self.notify(Alert::error(message.clone()).with_title(title));
        AuthError::Rejected { message }.into()
    }

    fn notify(&self, alert: Alert) {
        self.presenter.alert(&alert);
    }
}

impl Drop for AuthManager {
    fn drop(&mut self) {
        if let Some(handle) = self.timer.get_mut().unwrap_or_else(|e| e.into_inner()).take() {
            handle.abort();
        }
    }
}
