//!
//! MOVY: offline-first authentication for the MOVY streaming front end.
//! This library owns the session, the offline account fallback, and the
//! reconciliation of offline-created accounts with the remote API.
//!
//! ## Core Concepts
//!
//! * **Sessions (`session::Session`)**: The logged-in identity, persisted as a token and a profile in the store.
//! * **Stores (`storage::KvStore`)**: A pluggable string key-value store, the equivalent of browser local storage.
//! * **Local accounts (`accounts::LocalAccount`)**: Accounts created without the backend. They are either
//!   *pending* (waiting to be replayed against the remote API) or *offline* (no API configured at all).
//! * **Remote API (`remote::AuthApi`)**: The contract of the authentication backend, with an HTTP implementation.
//! * **AuthManager (`manager::AuthManager`)**: The reconciliation manager. It decides between online and offline
//!   paths, tracks connectivity, and periodically syncs pending accounts.
//! * **Presenter (`presenter::Presenter`)**: Hooks the manager calls to render session state and alerts.

pub mod accounts;
pub mod clock;
pub mod config;
pub mod connectivity;
pub mod constants;
pub mod crypto;
pub mod history;
pub mod manager;
pub mod presenter;
pub mod remote;
pub mod session;
pub mod storage;

pub use clock::{Clock, SystemClock};
#[cfg(any(test, feature = "testing"))]
pub use clock::FixedClock;
pub use config::Config;
pub use manager::{AuthError, AuthManager, SyncReport};
pub use presenter::{Alert, Presenter, Severity};
pub use session::Session;
pub use storage::{FileStore, InMemoryStore, KvStore};

/// Result type used throughout the MOVY library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the MOVY library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Structured authentication errors from the manager module
    #[error(transparent)]
    Auth(manager::AuthError),

    /// Structured remote API errors from the remote module
    #[error(transparent)]
    Remote(remote::RemoteError),

    /// Structured storage errors from the storage module
    #[error(transparent)]
    Storage(storage::StoreError),

    /// Structured cryptography errors from the crypto module
    #[error(transparent)]
    Crypto(crypto::CryptoError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Auth(_) => "manager",
            Error::Remote(_) => "remote",
            Error::Storage(_) => "storage",
            Error::Crypto(_) => "crypto",
            Error::Io(_) => "io",
            Error::Serialize(_) => "serialize",
        }
    }

    /// Check if this error means the backend could not be reached.
    pub fn is_network_error(&self) -> bool {
        match self {
            Error::Remote(remote_err) => remote_err.is_unreachable(),
            Error::Auth(auth_err) => auth_err.is_network_unavailable(),
            _ => false,
        }
    }

    /// Check if this error indicates the email is already registered.
    pub fn is_conflict(&self) -> bool {
        match self {
            Error::Auth(auth_err) => auth_err.is_duplicate_email(),
            Error::Remote(remote_err) => remote_err.is_already_exists(),
            _ => false,
        }
    }

    /// Check if this error is authentication-related.
    pub fn is_authentication_error(&self) -> bool {
        match self {
            Error::Auth(_) => true,
            Error::Crypto(crypto_err) => crypto_err.is_verification_failure(),
            _ => false,
        }
    }

    /// Check if this error is I/O related.
    pub fn is_io_error(&self) -> bool {
        match self {
            Error::Io(_) => true,
            Error::Storage(storage_err) => storage_err.is_io_error(),
            _ => false,
        }
    }

    /// Return the [`AuthError`] carried by this error, if any.
    pub fn as_auth(&self) -> Option<&AuthError> {
        match self {
            Error::Auth(auth_err) => Some(auth_err),
            _ => None,
        }
    }
}
