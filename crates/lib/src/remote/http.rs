//! HTTP implementation of the remote API using reqwest.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, header};
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use super::{
    AuthApi, AuthResponse, ErrorBody, LoginRequest, RemoteError, RemoteResult, SignupRequest,
};
use crate::{
    Config, Result,
    history::{ProgressUpload, ServerHistoryItem},
};

/// [`AuthApi`] over HTTP with JSON bodies.
#[derive(Debug, Clone)]
pub struct HttpAuthApi {
    base: String,
    client: Client,
    /// Separate client so the health probe gets its own short timeout.
    probe: Client,
}

impl HttpAuthApi {
    /// Create a client for the API rooted at `base`, e.g. `http://localhost:3000/api`.
    pub fn new(base: &Url, request_timeout: Duration, health_timeout: Duration) -> Result<Self> {
        let build = |timeout: Duration| {
            Client::builder()
                .timeout(timeout)
                .build()
                .map_err(|e| RemoteError::Client {
                    reason: e.to_string(),
                })
        };

        Ok(Self {
            base: base.as_str().trim_end_matches('/').to_string(),
            client: build(request_timeout)?,
            probe: build(health_timeout)?,
        })
    }

    /// Build the client described by `config`, or `None` if no API URL is set.
    pub fn from_config(config: &Config) -> Result<Option<Self>> {
        config
            .api_url
            .as_ref()
            .map(|url| Self::new(url, config.request_timeout, config.health_timeout))
            .transpose()
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }

    async fn send(&self, url: &str, request: RequestBuilder) -> RemoteResult<Response> {
        trace!(url, "Sending request");
        let response = request.send().await.map_err(|e| RemoteError::Unreachable {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        // A gateway answering for the backend means the backend is down.
        if matches!(
            status,
            StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT
        ) {
            debug!(url, status = status.as_u16(), "Gateway answered for the backend");
            return Err(RemoteError::Unreachable {
                url: url.to_string(),
                reason: status.to_string(),
            });
        }

        // The backend always answers in JSON, possibly without an `error`
        // field. Any other body comes from something in front of it.
        let raw = response.bytes().await.map_err(|e| RemoteError::Unreachable {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        let Ok(body) = serde_json::from_slice::<ErrorBody>(&raw) else {
            debug!(url, status = status.as_u16(), "Non-JSON error response");
            return Err(RemoteError::Unreachable {
                url: url.to_string(),
                reason: format!("{status} without a JSON body"),
            });
        };

        let message = body
            .error
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("Request failed").to_string());
        debug!(url, status = status.as_u16(), %message, "Backend rejected request");
        Err(RemoteError::Rejected {
            status: status.as_u16(),
            message,
        })
    }

    async fn decode<T: DeserializeOwned>(url: &str, response: Response) -> RemoteResult<T> {
        response.json().await.map_err(|e| RemoteError::Decode {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    async fn login(&self, email: &str, password: &str) -> RemoteResult<AuthResponse> {
        let url = self.endpoint("auth/login");
        let request = self
            .client
            .post(&url)
            .json(&LoginRequest { email, password });
        let response = self.send(&url, request).await?;
        Self::decode(&url, response).await
    }

    async fn signup(&self, name: &str, email: &str, password: &str) -> RemoteResult<AuthResponse> {
        let url = self.endpoint("auth/signup");
        let request = self.client.post(&url).json(&SignupRequest {
            name,
            email,
            password,
        });
        let response = self.send(&url, request).await?;
        Self::decode(&url, response).await
    }

    async fn health(&self) -> RemoteResult<()> {
        let url = self.endpoint("health");
        let request = self
            .probe
            .get(&url)
            .header(header::CACHE_CONTROL, "no-store");
        self.send(&url, request).await.map(|_| ())
    }

    async fn fetch_watch_history(&self, token: &str) -> RemoteResult<Vec<ServerHistoryItem>> {
        let url = self.endpoint("watch-history");
        let request = self.client.get(&url).bearer_auth(token);
        let response = self.send(&url, request).await?;
        Self::decode(&url, response).await
    }

    async fn save_watch_progress(&self, token: &str, progress: &ProgressUpload) -> RemoteResult<()> {
        let url = self.endpoint("watch-history");
        let request = self.client.post(&url).bearer_auth(token).json(progress);
        self.send(&url, request).await.map(|_| ())
    }
}
