//! ShareVault API client
//!
//! A thin typed layer over the backend REST API. One operation per endpoint,
//! no domain-specific error translation; the only recovery behavior lives
//! here in `execute()`: a 401 on a protected call triggers exactly one
//! token-refresh-and-retry cycle before the failure becomes final. No retry
//! for any other status class or transport error.

pub mod auth;
pub mod files;
pub mod types;

#[cfg(test)]
pub(crate) mod stub;

use reqwest::header::AUTHORIZATION;
use reqwest::{RequestBuilder, Response, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::session::{Session, SessionEvent};

use types::RefreshResponse;

/// Request timeout for ordinary API calls; transfers get a longer one.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Configured API client with an injected session handle
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    session: Arc<Session>,
}

impl ApiClient {
    /// Build a client against the configured backend. The session is
    /// injected rather than read from a global; tokens are read from it
    /// at call time.
    pub fn new(config: &ClientConfig, session: Arc<Session>) -> Result<Self, ApiError> {
        let base_url = Url::parse(config.api_url.trim_end_matches('/'))
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {e}", config.api_url)))?;
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        Ok(Self { http, base_url, session })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Join an endpoint path onto the base URL
    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::InvalidUrl(format!("{path}: {e}")))
    }

    /// Attach the bearer token when the session holds one
    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.session.access_token() {
            Some(token) => builder.header(
                AUTHORIZATION,
                format!("Bearer {}", token.expose_secret()),
            ),
            None => builder,
        }
    }

    /// Send a protected request. On a 401 that has not already been
    /// retried: refresh once, re-issue once. The builder closure is called
    /// per attempt so the retry carries the refreshed token.
    pub(crate) async fn execute<F>(&self, make: F) -> Result<Response, ApiError>
    where
        F: Fn(&reqwest::Client) -> RequestBuilder,
    {
        let response = self.authorize(make(&self.http)).send().await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Self::ensure_success(response).await;
        }

        debug!("401 received, attempting single token refresh");
        self.refresh_access_token()
            .await
            .map_err(|e| ApiError::RefreshFailed(e.to_string()))?;

        let retried = self.authorize(make(&self.http)).send().await?;
        // A second 401 propagates as a final failure
        Self::ensure_success(retried).await
    }

    /// Send an unauthenticated request (register, login, token-addressed
    /// share routes). No bearer header, no refresh cycle.
    pub(crate) async fn execute_public<F>(&self, make: F) -> Result<Response, ApiError>
    where
        F: Fn(&reqwest::Client) -> RequestBuilder,
    {
        let response = make(&self.http).send().await?;
        Self::ensure_success(response).await
    }

    /// Exchange the stored refresh token for a new access token and record
    /// it on the session. Used by `execute()` and by the explicit refresh
    /// operation.
    pub(crate) async fn refresh_access_token(&self) -> Result<(), ApiError> {
        let refresh = self
            .session
            .refresh_token()
            .ok_or(ApiError::NotAuthenticated)?;
        let url = self.endpoint("/api/auth/token/refresh/")?;

        let response = self
            .http
            .post(url)
            .json(&serde_json::json!({ "refresh": refresh.expose_secret() }))
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;
        let body: RefreshResponse = Self::decode_json(response).await?;

        self.session.apply(SessionEvent::TokensRefreshed {
            access: body.access,
            refresh: body.refresh,
        })?;
        debug!("Access token refreshed");
        Ok(())
    }

    /// Map non-2xx responses to `ApiError::Status`, pulling the backend's
    /// `detail`/`error` message out of the body when present.
    pub(crate) async fn ensure_success(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = match response.text().await {
            Ok(body) => extract_error_message(&body, status.as_u16()),
            Err(_) => status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string(),
        };
        Err(ApiError::Status { status: status.as_u16(), message })
    }

    pub(crate) async fn decode_json<T: DeserializeOwned>(
        response: Response,
    ) -> Result<T, ApiError> {
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// Short human-readable message from an error body. The backend returns
/// either `{"detail": "..."}` (DRF) or `{"status": "error", "error": "..."}`.
fn extract_error_message(body: &str, status: u16) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["detail", "error", "message"] {
            if let Some(message) = value.get(key).and_then(|v| v.as_str()) {
                return message.to_string();
            }
        }
    }
    if body.trim().is_empty() {
        format!("request failed with status {status}")
    } else {
        let trimmed = body.trim();
        if trimmed.chars().count() > 200 {
            let short: String = trimmed.chars().take(200).collect();
            format!("{short}…")
        } else {
            trimmed.to_string()
        }
    }
}
