//! Constants used throughout the MOVY library.
//!
//! Central definitions for the store keys the library reads and writes.
//! A single naming scheme is used for the session keys.

/// Store key holding the raw session token.
pub const TOKEN_KEY: &str = "movy_token";

/// Store key holding the JSON session profile.
pub const USER_KEY: &str = "movy_user";

/// Store key holding the list of accounts waiting to be synced to the backend.
pub const PENDING_ACCOUNTS_KEY: &str = "pending_accounts";

/// Store key holding accounts created while no backend is configured.
pub const OFFLINE_USERS_KEY: &str = "movy_offline_users";

/// Store key holding the hex-encoded key used to seal pending passwords.
pub const SEAL_KEY: &str = "movy_seal_key";

/// Prefix for per-content watch progress keys.
pub const PROGRESS_KEY_PREFIX: &str = "vidking_progress_";

/// Prefix of tokens issued to locally established sessions.
pub const OFFLINE_TOKEN_PREFIX: &str = "offline_";

/// Substring (case-insensitive) in a signup rejection that means the account
/// already exists remotely.
pub const ALREADY_EXISTS_MARKER: &str = "already";
