//! Authenticated session state
//!
//! The session is the client's record of who is logged in and which tokens
//! protected calls should carry. It is an explicit handle injected into the
//! API layer (no global singleton): rehydrated from disk at startup,
//! persisted on every mutation, cleared on logout.
//!
//! State machine: Anonymous -> Authenticated (optionally MfaPending first).
//! Login success moves to Authenticated, or MfaPending when the backend
//! flags a pending second factor; MFA verification completes the login;
//! a token refresh keeps the state and replaces the tokens; logout returns
//! to Anonymous and removes the persisted file.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;
use tracing::{debug, warn};

use crate::api::types::UserProfile;
use crate::error::ApiError;

/// Persisted file name inside the session directory
const AUTH_FILE: &str = "auth.json";

// ---------------------------------------------------------------------------
// Persisted record
// ---------------------------------------------------------------------------

/// Token pair issued by the backend
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TokenPair {
    pub access: Option<String>,
    pub refresh: Option<String>,
}

/// The serialized session record, written verbatim to `auth.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionData {
    pub user: Option<UserProfile>,
    #[serde(default)]
    pub tokens: TokenPair,
    #[serde(default)]
    pub is_authenticated: bool,
    #[serde(default)]
    pub mfa_required: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// Coarse session state derived from the record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated,
    /// Logged in but a second factor is still pending
    MfaPending,
}

impl SessionData {
    pub fn state(&self) -> SessionState {
        if !self.is_authenticated {
            SessionState::Anonymous
        } else if self.mfa_required {
            SessionState::MfaPending
        } else {
            SessionState::Authenticated
        }
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Session transitions. Applied atomically; every application persists.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    LoggedIn {
        user: Option<UserProfile>,
        access: String,
        refresh: String,
        mfa_required: bool,
    },
    /// Access token replaced; refresh token only when the backend rotated it
    TokensRefreshed {
        access: String,
        refresh: Option<String>,
    },
    MfaVerified,
    ErrorSet(Option<String>),
    LoggedOut,
}

// ---------------------------------------------------------------------------
// Durable store
// ---------------------------------------------------------------------------

/// File-backed persistence for the session record
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Store rooted at the given directory (`{dir}/auth.json`)
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self { path: dir.into().join(AUTH_FILE) }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Load the persisted record. Absent or unparsable data falls back to
    /// the anonymous default rather than erroring.
    pub fn load(&self) -> SessionData {
        match fs::read_to_string(&self.path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(data) => data,
                Err(e) => {
                    warn!("Stored session is unparsable, starting anonymous: {e}");
                    SessionData::default()
                }
            },
            Err(_) => SessionData::default(),
        }
    }

    /// Write the record, creating the parent directory if needed.
    pub fn save(&self, data: &SessionData) -> Result<(), ApiError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ApiError::Storage(format!("Cannot create session dir: {e}")))?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                let _ = fs::set_permissions(parent, fs::Permissions::from_mode(0o700));
            }
        }
        let json = serde_json::to_string_pretty(data)
            .map_err(|e| ApiError::Storage(format!("Cannot serialize session: {e}")))?;
        fs::write(&self.path, json)
            .map_err(|e| ApiError::Storage(format!("Cannot write session: {e}")))?;
        // Tokens at rest are sensitive
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600));
        }
        Ok(())
    }

    /// Remove the persisted record. Missing file is not an error.
    pub fn clear(&self) -> Result<(), ApiError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ApiError::Storage(format!("Cannot clear session: {e}"))),
        }
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}

// ---------------------------------------------------------------------------
// Session handle
// ---------------------------------------------------------------------------

/// Shared session handle. Cheap to clone via `Arc` at the call sites that
/// need it; the API client holds one and reads tokens at request time.
pub struct Session {
    store: SessionStore,
    data: RwLock<SessionData>,
}

impl Session {
    /// Rehydrate from the durable store, falling back to anonymous.
    pub fn rehydrate(store: SessionStore) -> Self {
        let data = store.load();
        debug!("Session rehydrated: {:?}", data.state());
        Self { store, data: RwLock::new(data) }
    }

    /// Immutable snapshot of the current record
    pub fn snapshot(&self) -> SessionData {
        self.data.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn state(&self) -> SessionState {
        self.snapshot().state()
    }

    /// Access token for the Authorization header, read at call time
    pub fn access_token(&self) -> Option<SecretString> {
        self.data
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .tokens
            .access
            .clone()
            .map(SecretString::from)
    }

    pub fn refresh_token(&self) -> Option<SecretString> {
        self.data
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .tokens
            .refresh
            .clone()
            .map(SecretString::from)
    }

    /// Apply a transition and persist the result. Logout clears the store
    /// instead of writing an anonymous record.
    pub fn apply(&self, event: SessionEvent) -> Result<(), ApiError> {
        let mut data = self.data.write().unwrap_or_else(|e| e.into_inner());
        match event {
            SessionEvent::LoggedIn { user, access, refresh, mfa_required } => {
                data.user = user;
                data.tokens = TokenPair { access: Some(access), refresh: Some(refresh) };
                data.is_authenticated = true;
                data.mfa_required = mfa_required;
                data.error = None;
            }
            SessionEvent::TokensRefreshed { access, refresh } => {
                data.tokens.access = Some(access);
                if let Some(refresh) = refresh {
                    data.tokens.refresh = Some(refresh);
                }
            }
            SessionEvent::MfaVerified => {
                data.mfa_required = false;
            }
            SessionEvent::ErrorSet(message) => {
                data.error = message;
            }
            SessionEvent::LoggedOut => {
                *data = SessionData::default();
                return self.store.clear();
            }
        }
        self.store.save(&data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn session_in(dir: &std::path::Path) -> Session {
        Session::rehydrate(SessionStore::in_dir(dir))
    }

    #[test]
    fn rehydrate_missing_file_is_anonymous() {
        let dir = tempdir().unwrap();
        let session = session_in(dir.path());
        assert_eq!(session.state(), SessionState::Anonymous);
        assert!(session.access_token().is_none());
    }

    #[test]
    fn rehydrate_garbage_falls_back_to_anonymous() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("auth.json"), "not json {{{").unwrap();
        let session = session_in(dir.path());
        assert_eq!(session.state(), SessionState::Anonymous);
    }

    #[test]
    fn login_persists_and_survives_rehydrate() {
        let dir = tempdir().unwrap();
        let session = session_in(dir.path());
        session
            .apply(SessionEvent::LoggedIn {
                user: None,
                access: "acc-1".into(),
                refresh: "ref-1".into(),
                mfa_required: false,
            })
            .unwrap();
        assert_eq!(session.state(), SessionState::Authenticated);

        let again = session_in(dir.path());
        assert_eq!(again.state(), SessionState::Authenticated);
        let snap = again.snapshot();
        assert_eq!(snap.tokens.access.as_deref(), Some("acc-1"));
        assert_eq!(snap.tokens.refresh.as_deref(), Some("ref-1"));
    }

    #[test]
    fn mfa_flag_gates_until_verified() {
        let dir = tempdir().unwrap();
        let session = session_in(dir.path());
        session
            .apply(SessionEvent::LoggedIn {
                user: None,
                access: "a".into(),
                refresh: "r".into(),
                mfa_required: true,
            })
            .unwrap();
        assert_eq!(session.state(), SessionState::MfaPending);

        session.apply(SessionEvent::MfaVerified).unwrap();
        assert_eq!(session.state(), SessionState::Authenticated);
    }

    #[test]
    fn refresh_keeps_state_and_replaces_access() {
        let dir = tempdir().unwrap();
        let session = session_in(dir.path());
        session
            .apply(SessionEvent::LoggedIn {
                user: None,
                access: "old".into(),
                refresh: "keep".into(),
                mfa_required: false,
            })
            .unwrap();
        session
            .apply(SessionEvent::TokensRefreshed { access: "new".into(), refresh: None })
            .unwrap();

        let snap = session.snapshot();
        assert_eq!(snap.state(), SessionState::Authenticated);
        assert_eq!(snap.tokens.access.as_deref(), Some("new"));
        assert_eq!(snap.tokens.refresh.as_deref(), Some("keep"));
    }

    #[test]
    fn logout_clears_storage() {
        let dir = tempdir().unwrap();
        let store = SessionStore::in_dir(dir.path());
        let session = Session::rehydrate(store.clone());
        session
            .apply(SessionEvent::LoggedIn {
                user: None,
                access: "a".into(),
                refresh: "r".into(),
                mfa_required: false,
            })
            .unwrap();
        assert!(store.exists());

        session.apply(SessionEvent::LoggedOut).unwrap();
        assert!(!store.exists());

        // Fresh load with no other state is anonymous (renders the login screen)
        let fresh = session_in(dir.path());
        assert_eq!(fresh.state(), SessionState::Anonymous);
    }
}
