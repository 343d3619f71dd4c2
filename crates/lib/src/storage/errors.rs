//! Error types for the key-value store layer.

use thiserror::Error;

/// Errors raised by [`KvStore`](super::KvStore) implementations.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("Store I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The store contents could not be encoded or decoded.
    #[error("Store serialization error: {reason}")]
    Serialize { reason: String },

    /// The backing file was written by an incompatible version.
    #[error("Unsupported store file version {found}; only version {supported} is supported")]
    UnsupportedVersion { found: u8, supported: u8 },

    /// An internal lock was poisoned by a panicking writer.
    #[error("Store lock poisoned")]
    Poisoned,
}

impl StoreError {
    /// Check if this error came from the filesystem.
    pub fn is_io_error(&self) -> bool {
        matches!(self, StoreError::Io { .. })
    }
}

impl From<StoreError> for crate::Error {
    fn from(err: StoreError) -> Self {
        crate::Error::Storage(err)
    }
}
