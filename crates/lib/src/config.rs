//! Runtime configuration for the auth manager.
//!
//! A missing API URL means the front end is served without a backend (for
//! example from a static host); every account is then an offline account.

use std::time::Duration;

use tracing::warn;
use url::Url;

/// Environment variable holding the base URL of the remote API.
pub const ENV_API_URL: &str = "MOVY_API_URL";
/// Environment variable overriding the health probe timeout in milliseconds.
pub const ENV_HEALTH_TIMEOUT_MS: &str = "MOVY_HEALTH_TIMEOUT_MS";
/// Environment variable overriding the request timeout in milliseconds.
pub const ENV_REQUEST_TIMEOUT_MS: &str = "MOVY_REQUEST_TIMEOUT_MS";
/// Environment variable overriding the sync check interval in seconds.
pub const ENV_SYNC_INTERVAL_SECS: &str = "MOVY_SYNC_INTERVAL_SECS";

/// Default bound on a single health probe.
pub const DEFAULT_HEALTH_TIMEOUT: Duration = Duration::from_secs(2);
/// Default bound on login, signup, and watch-history calls.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Default period between connectivity checks.
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the remote API, e.g. `http://localhost:3000/api`.
    pub api_url: Option<Url>,
    pub health_timeout: Duration,
    pub request_timeout: Duration,
    pub sync_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: None,
            health_timeout: DEFAULT_HEALTH_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            sync_interval: DEFAULT_SYNC_INTERVAL,
        }
    }
}

impl Config {
    /// Configuration for a backend at `api_url`, with default timings.
    pub fn with_api_url(api_url: Url) -> Self {
        Self {
            api_url: Some(api_url),
            ..Self::default()
        }
    }

    /// Load configuration from `MOVY_*` environment variables.
    ///
    /// Unparsable values are logged and replaced by their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let api_url = lookup(ENV_API_URL)
            .filter(|raw| !raw.trim().is_empty())
            .and_then(|raw| match Url::parse(raw.trim()) {
                Ok(url) => Some(url),
                Err(e) => {
                    warn!(value = %raw, error = %e, "Ignoring invalid {ENV_API_URL}");
                    None
                }
            });

        Self {
            api_url,
            health_timeout: parse_number(&lookup, ENV_HEALTH_TIMEOUT_MS)
                .map(Duration::from_millis)
                .unwrap_or(defaults.health_timeout),
            request_timeout: parse_number(&lookup, ENV_REQUEST_TIMEOUT_MS)
                .map(Duration::from_millis)
                .unwrap_or(defaults.request_timeout),
            sync_interval: parse_number(&lookup, ENV_SYNC_INTERVAL_SECS)
                .map(Duration::from_secs)
                .unwrap_or(defaults.sync_interval),
        }
    }

    /// Whether a remote API is configured at all.
    pub fn has_api(&self) -> bool {
        self.api_url.is_some()
    }
}

fn parse_number(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<u64> {
    let raw = lookup(key)?;
    match raw.trim().parse::<u64>() {
        Ok(0) => {
            warn!(key, "Ignoring zero duration");
            None
        }
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, value = %raw, error = %e, "Ignoring unparsable duration");
            None
        }
    }
}
