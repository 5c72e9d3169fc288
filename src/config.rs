// ShareVault client configuration
// Persistent settings storage under the per-user config directory

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::error::ApiError;

/// Default backend when neither the env var nor a config file is present
const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Env var that overrides the configured backend URL
pub const API_URL_ENV: &str = "SHAREVAULT_API_URL";

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Backend base URL (e.g., https://vault.example.com)
    pub api_url: String,
    /// Directory holding the persisted session (`auth.json`).
    /// Defaults to the per-user config dir when None.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            data_dir: None,
        }
    }
}

impl ClientConfig {
    /// Config file location: `{config_dir}/sharevault/config.json`
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("sharevault").join("config.json"))
    }

    /// Load configuration. Precedence: env override > config file > default.
    /// A missing or unparsable file falls back to the default silently;
    /// the config file is optional.
    pub fn load() -> Self {
        let mut config: Self = Self::config_path()
            .and_then(|p| fs::read_to_string(p).ok())
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default();

        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                config.api_url = url.trim().trim_end_matches('/').to_string();
            }
        }

        config
    }

    /// Persist the configuration, creating the parent directory if needed.
    pub fn save(&self) -> Result<(), ApiError> {
        let path = Self::config_path()
            .ok_or_else(|| ApiError::Storage("Cannot resolve config directory".to_string()))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ApiError::Storage(format!("Cannot create config dir: {e}")))?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ApiError::Storage(format!("Cannot serialize config: {e}")))?;
        fs::write(&path, json)
            .map_err(|e| ApiError::Storage(format!("Cannot write config: {e}")))?;
        Ok(())
    }

    /// Directory used for session persistence.
    pub fn session_dir(&self) -> Option<PathBuf> {
        self.data_dir
            .clone()
            .or_else(|| dirs::config_dir().map(|d| d.join("sharevault")))
    }
}
