//! The remote authentication API.
//!
//! [`AuthApi`] is the contract of the backend the front end talks to. The
//! manager only depends on this trait; [`HttpAuthApi`] is the production
//! implementation and tests substitute their own.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

use crate::{
    history::{ProgressUpload, ServerHistoryItem},
    session::{Profile, Session},
};

mod errors;
mod http;

pub use errors::RemoteError;
pub use http::HttpAuthApi;

/// Result of a remote call.
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// Body of `POST /auth/login`.
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Body of `POST /auth/signup`.
#[derive(Debug, Serialize)]
pub struct SignupRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

/// Successful login or signup response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: RemoteUser,
}

impl AuthResponse {
    pub fn into_session(self) -> Session {
        Session::new(
            Profile {
                id: self.user.id,
                name: self.user.name,
                email: self.user.email,
            },
            self.token,
        )
    }
}

/// The user object returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteUser {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    pub email: String,
}

/// Error body returned alongside a non-success status.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

/// Accept identifiers encoded either as JSON strings or numbers.
pub fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(text) => text,
        RawId::Number(number) => number.to_string(),
    })
}

/// Contract of the remote authentication backend.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// `POST /auth/login`.
    async fn login(&self, email: &str, password: &str) -> RemoteResult<AuthResponse>;

    /// `POST /auth/signup`.
    async fn signup(&self, name: &str, email: &str, password: &str) -> RemoteResult<AuthResponse>;

    /// `GET /health`, bounded by a short timeout.
    ///
    /// `Ok` means the backend answered with a success status.
    async fn health(&self) -> RemoteResult<()>;

    /// `GET /watch-history` with bearer authentication.
    async fn fetch_watch_history(&self, token: &str) -> RemoteResult<Vec<ServerHistoryItem>>;

    /// `POST /watch-history` with bearer authentication.
    async fn save_watch_progress(&self, token: &str, progress: &ProgressUpload) -> RemoteResult<()>;
}
