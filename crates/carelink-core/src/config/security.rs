//! Token signing and payload encryption configuration.

use super::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Where the security layer finds its secrets and how it uses them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Environment variable containing the envelope key (32 bytes of UTF-8).
    #[serde(default = "default_encryption_key_env")]
    pub encryption_key_env: Option<String>,

    /// File containing the envelope key, used when the variable is unset.
    #[serde(default)]
    pub encryption_key_file: Option<PathBuf>,

    /// Length in bytes of the random iv drawn for each envelope.
    #[serde(default = "default_iv_length")]
    pub iv_length: usize,

    /// Environment variable overriding `iv_length`.
    #[serde(default = "default_iv_length_env")]
    pub iv_length_env: Option<String>,

    /// Environment variable containing the token signing secret.
    #[serde(default = "default_jwt_secret_env")]
    pub jwt_secret_env: Option<String>,

    /// File containing the token signing secret.
    #[serde(default)]
    pub jwt_secret_file: Option<PathBuf>,

    /// Lifetime of newly issued tokens (e.g., "1h", "7d").
    #[serde(default = "default_token_ttl")]
    pub token_ttl: String,

    /// Environment variable overriding `token_ttl`.
    #[serde(default = "default_token_ttl_env")]
    pub token_ttl_env: Option<String>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            encryption_key_env: default_encryption_key_env(),
            encryption_key_file: None,
            iv_length: default_iv_length(),
            iv_length_env: default_iv_length_env(),
            jwt_secret_env: default_jwt_secret_env(),
            jwt_secret_file: None,
            token_ttl: default_token_ttl(),
            token_ttl_env: default_token_ttl_env(),
        }
    }
}

fn default_encryption_key_env() -> Option<String> {
    Some("ENCRYPTION_KEY".to_string())
}

fn default_iv_length() -> usize {
    16
}

fn default_iv_length_env() -> Option<String> {
    Some("IV_LENGTH".to_string())
}

fn default_jwt_secret_env() -> Option<String> {
    Some("JWT_SECRET".to_string())
}

fn default_token_ttl() -> String {
    "1h".to_string()
}

fn default_token_ttl_env() -> Option<String> {
    Some("JWT_EXPIRES_IN".to_string())
}

/// Secrets and parameters resolved from a [`SecurityConfig`].
///
/// Key material is wiped when the value is dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecuritySecrets {
    pub encryption_key: Vec<u8>,
    pub jwt_secret: Vec<u8>,
    #[zeroize(skip)]
    pub iv_length: usize,
    #[zeroize(skip)]
    pub token_ttl: Duration,
}

impl fmt::Debug for SecuritySecrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecuritySecrets")
            .field("encryption_key", &"<redacted>")
            .field("jwt_secret", &"<redacted>")
            .field("iv_length", &self.iv_length)
            .field("token_ttl", &self.token_ttl)
            .finish()
    }
}

impl SecurityConfig {
    /// Resolve every secret and parameter.
    ///
    /// Length invariants on the key and iv are enforced by the envelope cipher
    /// built from the result, not here.
    pub fn resolve(&self) -> Result<SecuritySecrets, ConfigError> {
        let encryption_key = resolve_secret(
            "encryption_key",
            self.encryption_key_env.as_deref(),
            self.encryption_key_file.as_ref(),
        )?;
        let jwt_secret = resolve_secret(
            "jwt_secret",
            self.jwt_secret_env.as_deref(),
            self.jwt_secret_file.as_ref(),
        )?;

        let iv_length = match env_override(self.iv_length_env.as_deref()) {
            Some(raw) => raw.trim().parse::<usize>().map_err(|e| ConfigError::Invalid {
                field: "iv_length".to_string(),
                reason: format!("{raw:?}: {e}"),
            })?,
            None => self.iv_length,
        };

        let ttl_raw =
            env_override(self.token_ttl_env.as_deref()).unwrap_or_else(|| self.token_ttl.clone());
        let token_ttl = parse_ttl(&ttl_raw)?;

        Ok(SecuritySecrets {
            encryption_key: encryption_key.into_bytes(),
            jwt_secret: jwt_secret.into_bytes(),
            iv_length,
            token_ttl,
        })
    }
}

/// Parse a token lifetime like "1h", "90m" or "7d".
///
/// A bare number is taken as seconds.
pub fn parse_ttl(raw: &str) -> Result<Duration, ConfigError> {
    let raw = raw.trim();
    let ttl = match raw.parse::<u64>() {
        Ok(secs) => Duration::from_secs(secs),
        Err(_) => humantime::parse_duration(raw).map_err(|e| ConfigError::Invalid {
            field: "token_ttl".to_string(),
            reason: format!("{raw:?}: {e}"),
        })?,
    };
    if ttl.is_zero() {
        return Err(ConfigError::Invalid {
            field: "token_ttl".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(ttl)
}

fn env_override(var: Option<&str>) -> Option<String> {
    var.and_then(|name| std::env::var(name).ok())
        .filter(|value| !value.trim().is_empty())
}

fn resolve_secret(
    name: &str,
    env_var: Option<&str>,
    file: Option<&PathBuf>,
) -> Result<String, ConfigError> {
    // Environment variable first
    if let Some(value) = env_override(env_var) {
        return Ok(value);
    }

    if let Some(path) = file
        && path.exists()
    {
        let value = std::fs::read_to_string(path)?;
        return Ok(value.trim_end_matches(['\r', '\n']).to_string());
    }

    let source_hint = match (env_var, file) {
        (Some(var), Some(path)) => format!("env var {var} or file {}", path.display()),
        (Some(var), None) => format!("env var {var}"),
        (None, Some(path)) => format!("file {}", path.display()),
        (None, None) => "an env var or file in the [security] section".to_string(),
    };
    Err(ConfigError::MissingSecret {
        name: name.to_string(),
        source_hint,
    })
}
