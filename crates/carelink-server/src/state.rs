use crate::error::StartupError;
use carelink_core::{CarelinkConfig, SecuritySecrets};
use carelink_envelope::EnvelopeCipher;
use carelink_token::{SigningSecret, TokenIssuer, TokenVerifier};
use std::sync::Arc;

/// Shared application state.
///
/// Everything in here is built once at startup and never mutated, so request
/// handling needs no locks.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cipher: EnvelopeCipher,
    verifier: TokenVerifier,
    issuer: TokenIssuer,
    max_body_bytes: usize,
}

impl AppState {
    /// Resolve secrets from the configuration and build the state.
    pub fn from_config(cfg: &CarelinkConfig) -> Result<Self, StartupError> {
        let secrets = cfg.security.resolve()?;
        Self::from_secrets(&secrets, cfg.server.max_body_bytes)
    }

    /// Build the state from already resolved secrets.
    ///
    /// Fails when the envelope key is not 32 bytes, the iv length is out of
    /// bounds or the signing secret is empty.
    pub fn from_secrets(
        secrets: &SecuritySecrets,
        max_body_bytes: usize,
    ) -> Result<Self, StartupError> {
        let cipher = EnvelopeCipher::new(&secrets.encryption_key, secrets.iv_length)?;
        let signing = SigningSecret::from_bytes(&secrets.jwt_secret)?;
        let issuer = TokenIssuer::new(&signing, secrets.token_ttl)?;
        let verifier = TokenVerifier::new(&signing);

        tracing::debug!(
            iv_len = cipher.iv_len(),
            token_ttl_secs = secrets.token_ttl.as_secs(),
            "security state initialised"
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                cipher,
                verifier,
                issuer,
                max_body_bytes,
            }),
        })
    }

    /// Envelope cipher shared by the decryption and encryption gates.
    pub fn cipher(&self) -> &EnvelopeCipher {
        &self.inner.cipher
    }

    /// Token verifier used by the authentication gate.
    pub fn verifier(&self) -> &TokenVerifier {
        &self.inner.verifier
    }

    /// Token issuer for the configured lifetime.
    pub fn issuer(&self) -> &TokenIssuer {
        &self.inner.issuer
    }

    /// Largest request body the decryption gate buffers.
    pub fn max_body_bytes(&self) -> usize {
        self.inner.max_body_bytes
    }
}
