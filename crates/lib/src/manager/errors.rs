//! Error types for authentication operations.

use thiserror::Error;

/// Outcomes of signup and login that the user has to be told about.
///
/// Network failures are not in this list as such: the manager falls back to
/// the offline path instead of surfacing them.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum AuthError {
    /// The email is already used by a pending or offline account.
    #[error("Email already registered: {email}")]
    DuplicateEmail { email: String },

    /// No account matches the email and password.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// The backend could not be reached and no offline path applies.
    #[error("Backend unavailable")]
    NetworkUnavailable,

    /// The backend refused the request with a message.
    #[error("{message}")]
    Rejected { message: String },

    /// The operation requires a backend session.
    #[error("Not logged in")]
    NotLoggedIn,
}

impl AuthError {
    pub fn is_duplicate_email(&self) -> bool {
        matches!(self, AuthError::DuplicateEmail { .. })
    }

    pub fn is_invalid_credentials(&self) -> bool {
        matches!(self, AuthError::InvalidCredentials)
    }

    pub fn is_network_unavailable(&self) -> bool {
        matches!(self, AuthError::NetworkUnavailable)
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, AuthError::Rejected { .. })
    }
}

impl From<AuthError> for crate::Error {
    fn from(err: AuthError) -> Self {
        crate::Error::Auth(err)
    }
}
