//! Authentication operations
//!
//! register, login, explicit token refresh, MFA setup/verify, logout.
//! Login and MFA verification record their outcome on the injected session;
//! logout is a purely local transition that clears the durable store.

use tracing::info;

use crate::error::ApiError;
use crate::session::{SessionEvent, SessionState};

use super::types::{LoginResponse, MfaSetup, RegisterRequest};
use super::ApiClient;

impl ApiClient {
    /// Create a new account. The payload is passed through unvalidated;
    /// the backend enforces password rules and uniqueness.
    pub async fn register(&self, request: &RegisterRequest) -> Result<(), ApiError> {
        let url = self.endpoint("/api/auth/register/")?;
        self.execute_public(|http| http.post(url.clone()).json(request))
            .await?;
        info!("Registered user {}", request.username);
        Ok(())
    }

    /// Exchange credentials for a token pair. Moves the session to
    /// Authenticated, or MfaPending when the backend flags a pending
    /// second factor. A rejection records its message on the session's
    /// error slot; the next successful login clears it.
    pub async fn login(&self, username: &str, password: &str) -> Result<SessionState, ApiError> {
        let url = self.endpoint("/api/auth/token/")?;
        let payload = serde_json::json!({ "username": username, "password": password });
        let response = match self
            .execute_public(|http| http.post(url.clone()).json(&payload))
            .await
        {
            Ok(response) => response,
            Err(e) => {
                self.session()
                    .apply(SessionEvent::ErrorSet(Some(e.to_string())))?;
                return Err(e);
            }
        };
        let body: LoginResponse = Self::decode_json(response).await?;

        self.session().apply(SessionEvent::LoggedIn {
            user: body.user,
            access: body.access,
            refresh: body.refresh,
            mfa_required: body.mfa_required,
        })?;

        let state = self.session().state();
        info!("Login succeeded for {username} ({state:?})");
        Ok(state)
    }

    /// Explicitly refresh the access token using the stored refresh token.
    /// `execute()` performs this automatically once per 401.
    pub async fn refresh(&self) -> Result<(), ApiError> {
        self.refresh_access_token().await
    }

    /// Fetch MFA enrollment material (TOTP secret + QR payload).
    pub async fn mfa_setup(&self) -> Result<MfaSetup, ApiError> {
        let url = self.endpoint("/api/auth/mfa/setup/")?;
        let response = self.execute(|http| http.get(url.clone())).await?;
        Self::decode_json(response).await
    }

    /// Verify a TOTP code. Success clears the pending-MFA flag.
    pub async fn mfa_verify(&self, code: &str) -> Result<(), ApiError> {
        let url = self.endpoint("/api/auth/mfa/verify/")?;
        let payload = serde_json::json!({ "token": code });
        self.execute(|http| http.post(url.clone()).json(&payload))
            .await?;
        self.session().apply(SessionEvent::MfaVerified)?;
        info!("MFA verification complete");
        Ok(())
    }

    /// Drop the session locally and clear the durable store. The backend
    /// keeps no server-side session to invalidate.
    pub fn logout(&self) -> Result<(), ApiError> {
        self.session().apply(SessionEvent::LoggedOut)?;
        info!("Logged out, session storage cleared");
        Ok(())
    }
}
