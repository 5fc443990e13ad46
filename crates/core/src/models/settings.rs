use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::CoreError;

/// Ledger configuration: where the remote store lives and how the local
/// mirror is laid out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Remote store connection. `None` runs the ledger permanently offline.
    #[serde(default)]
    pub remote: Option<RemoteSettings>,

    /// Prefix of every local mirror key.
    #[serde(default = "default_namespace")]
    pub mirror_namespace: String,

    /// Directory for the file-backed mirror. `None` keeps the mirror in memory.
    #[serde(default)]
    pub mirror_dir: Option<PathBuf>,

    /// Undo a transaction's balance adjustment when it is deleted.
    /// Off by default: balances reflect all-time activity.
    #[serde(default)]
    pub reverse_balance_on_delete: bool,
}

/// Connection details for the hosted relational store.
#[derive(Clone, Serialize, Deserialize)]
pub struct RemoteSettings {
    /// Project base URL, e.g. `https://abc.example.co`
    pub url: String,

    /// Public API key sent with every request
    pub api_key: String,

    /// User session token; falls back to the API key when absent
    #[serde(default)]
    pub access_token: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

// Keys stay out of debug output.
impl std::fmt::Debug for RemoteSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteSettings")
            .field("url", &self.url)
            .field("api_key", &"<redacted>")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn default_namespace() -> String {
    "ledger".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

const MAX_TIMEOUT_SECS: u64 = 300;

impl Default for Settings {
    fn default() -> Self {
        Self {
            remote: None,
            mirror_namespace: default_namespace(),
            mirror_dir: None,
            reverse_balance_on_delete: false,
        }
    }
}

impl Settings {
    /// Parse and validate settings from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, CoreError> {
        let settings: Settings = serde_json::from_str(json)
            .map_err(|e| CoreError::Config(format!("Failed to parse settings: {e}")))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load and validate settings from a JSON file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            CoreError::Config(format!("Failed to read settings file {}: {e}", path.display()))
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        let namespace = self.mirror_namespace.trim();
        if namespace.is_empty() {
            return Err(CoreError::Config("mirror_namespace must not be empty".into()));
        }
        if namespace.contains(':') {
            return Err(CoreError::Config(
                "mirror_namespace must not contain ':'".into(),
            ));
        }

        if let Some(remote) = &self.remote {
            if !(remote.url.starts_with("https://") || remote.url.starts_with("http://")) {
                return Err(CoreError::Config(format!(
                    "Remote url '{}' must start with http:// or https://",
                    remote.url
                )));
            }
            if remote.api_key.trim().is_empty() {
                return Err(CoreError::Config("Remote api_key must not be empty".into()));
            }
            if !(1..=MAX_TIMEOUT_SECS).contains(&remote.timeout_secs) {
                return Err(CoreError::Config(format!(
                    "Remote timeout_secs {} out of range (expected 1..{MAX_TIMEOUT_SECS})",
                    remote.timeout_secs
                )));
            }
        }

        Ok(())
    }

    #[must_use]
    pub fn is_offline_only(&self) -> bool {
        self.remote.is_none()
    }
}
