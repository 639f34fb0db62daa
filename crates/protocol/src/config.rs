//! Persisted startup configuration.
//!
//! The relay reads this record once at process start; it is written by
//! the setup flow outside this workspace. Exactly one of the two
//! credential fields must be populated.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::types::AuthMode;

/// Errors reading or interpreting the startup config.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no credentials configured")]
    NoCredentials,

    #[error("both cookie and API key configured; exactly one is allowed")]
    AmbiguousCredentials,
}

/// On-disk config record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayConfig {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub x_api_key: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub roblosecurity: String,
    /// Port last used by the transport layer. Read-through only; the
    /// core never binds it.
    #[serde(default, skip_serializing_if = "is_zero_u16")]
    pub port: u16,
}

fn is_zero_u16(v: &u16) -> bool {
    *v == 0
}

impl RelayConfig {
    /// Reads and parses a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Converts the record into a credential mode, enforcing the
    /// exactly-one-secret invariant.
    pub fn auth_mode(&self) -> Result<AuthMode, ConfigError> {
        match (self.roblosecurity.is_empty(), self.x_api_key.is_empty()) {
            (false, true) => Ok(AuthMode::Cookie(self.roblosecurity.clone())),
            (true, false) => Ok(AuthMode::ApiKey(self.x_api_key.clone())),
            (true, true) => Err(ConfigError::NoCredentials),
            (false, false) => Err(ConfigError::AmbiguousCredentials),
        }
    }
}
