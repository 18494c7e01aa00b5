//! Configuration types for the Carelink API.
//!
//! Configuration is read from a TOML file (`carelink.toml` by default, or the
//! path in `CARELINK_CONFIG`). Secrets never live in the file itself; the file
//! only names where to find them.
//!
//! ```toml
//! [server]
//! bind = "0.0.0.0:8080"
//!
//! [security]
//! encryption_key_env = "ENCRYPTION_KEY"
//! iv_length = 16
//! jwt_secret_env = "JWT_SECRET"
//! token_ttl = "1h"
//! ```

pub mod security;
pub mod server;

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub use security::{SecurityConfig, SecuritySecrets};
pub use server::ServerConfig;

/// Environment variable overriding the configuration file location.
pub const CONFIG_PATH_ENV: &str = "CARELINK_CONFIG";

/// Default configuration file name, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "carelink.toml";

/// Complete Carelink configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CarelinkConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Token and envelope settings.
    #[serde(default)]
    pub security: SecurityConfig,
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("missing secret `{name}`: set {source_hint}")]
    MissingSecret { name: String, source_hint: String },

    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: String, reason: String },
}

impl CarelinkConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML content.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::from)
    }

    /// Load the configuration file if it exists, otherwise fall back to defaults.
    ///
    /// An explicitly configured path (`CARELINK_CONFIG`) must exist.
    pub fn load() -> Result<Self, ConfigError> {
        match env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(path),
            Err(_) => {
                let path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::from_file(path)
                } else {
                    tracing::debug!(file = DEFAULT_CONFIG_FILE, "no config file, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }
}
