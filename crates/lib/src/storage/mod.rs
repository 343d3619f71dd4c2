//! Key-value storage for sessions, local accounts, and watch progress.
//!
//! The [`KvStore`] trait mirrors browser local storage: string keys map to
//! string values, and structured values are stored as JSON. Two
//! implementations are provided:
//!
//! * [`InMemoryStore`]: volatile, for tests and ephemeral front ends.
//! * [`FileStore`]: the same map persisted to a JSON file on every write.

use std::fmt::Debug;

use serde::{Serialize, de::DeserializeOwned};
use tracing::warn;

use crate::Result;

mod errors;
mod file;
mod memory;

pub use errors::StoreError;
pub use file::FileStore;
pub use memory::InMemoryStore;

/// A durable string key-value map.
///
/// Implementations must be safe to share between the manager and its
/// background timer task.
pub trait KvStore: Send + Sync + Debug {
    /// Get the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;

    /// All keys currently present, in no particular order.
    fn keys(&self) -> Result<Vec<String>>;

    /// Check whether `key` is present.
    fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }
}

/// Read and decode a JSON value stored under `key`.
///
/// Malformed content is logged and treated as absent, so a corrupted entry
/// never blocks the caller.
pub fn read_json<T: DeserializeOwned>(store: &dyn KvStore, key: &str) -> Result<Option<T>> {
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            warn!(key, error = %e, "Ignoring malformed stored value");
            Ok(None)
        }
    }
}

/// Encode `value` as JSON and store it under `key`.
pub fn write_json<T: Serialize + ?Sized>(store: &dyn KvStore, key: &str, value: &T) -> Result<()> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)
}
