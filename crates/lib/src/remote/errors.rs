//! Error types for calls to the remote API.

use thiserror::Error;

use crate::constants::ALREADY_EXISTS_MARKER;

/// Errors returned by [`AuthApi`](super::AuthApi) implementations.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The backend did not answer. Covers transport failures and gateways
    /// or proxies answering in its place.
    #[error("Backend unreachable at {url}: {reason}")]
    Unreachable { url: String, reason: String },

    /// The backend answered with a non-success status.
    #[error("Backend rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The backend answered with success but the body could not be decoded.
    #[error("Failed to decode response from {url}: {reason}")]
    Decode { url: String, reason: String },

    /// The HTTP client could not be built.
    #[error("Failed to build HTTP client: {reason}")]
    Client { reason: String },
}

impl RemoteError {
    /// Check if the backend could not be reached at all.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, RemoteError::Unreachable { .. })
    }

    /// Check if a success response carried a body that could not be decoded.
    pub fn is_decode(&self) -> bool {
        matches!(self, RemoteError::Decode { .. })
    }

    /// Check if this is a rejection saying the account already exists.
    pub fn is_already_exists(&self) -> bool {
        match self {
            RemoteError::Rejected { message, .. } => message
                .to_lowercase()
                .contains(ALREADY_EXISTS_MARKER),
            _ => false,
        }
    }

    /// The server-provided message of a rejection.
    pub fn rejection_message(&self) -> Option<&str> {
        match self {
            RemoteError::Rejected { message, .. } => Some(message),
            _ => None,
        }
    }
}

impl From<RemoteError> for crate::Error {
    fn from(err: RemoteError) -> Self {
        crate::Error::Remote(err)
    }
}
