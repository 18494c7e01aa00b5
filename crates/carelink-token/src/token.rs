//! Token creation and verification.

use crate::claims::Claims;
use crate::error::TokenError;
use crate::secret::SigningSecret;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};

/// Issues signed tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    key: EncodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    /// Create an issuer whose tokens live for `ttl`.
    pub fn new(secret: &SigningSecret, ttl: std::time::Duration) -> Result<Self, TokenError> {
        let ttl = Duration::from_std(ttl)
            .map_err(|e| TokenError::CreationFailed(format!("token lifetime out of range: {e}")))?;
        Ok(Self {
            key: secret.encoding_key(),
            ttl,
        })
    }

    /// Issue a token for an identity, expiring after the configured lifetime.
    pub fn issue(&self, id: i64, role: &str, is_approved: bool) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims::new(id, role, now + self.ttl)
            .approved(is_approved)
            .issued_at(now);
        self.sign(&claims)
    }

    /// Sign the given claims as they are.
    pub fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.key)
            .map_err(|e| TokenError::CreationFailed(e.to_string()))
    }
}

/// Verifier for signed tokens.
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    /// Create a verifier for tokens signed with `secret`.
    pub fn new(secret: &SigningSecret) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // No leeway on `exp` or `nbf`.
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            key: secret.decoding_key(),
            validation,
        }
    }

    /// Verify a token's signature, `nbf` and expiry and extract its claims.
    ///
    /// A token is expired from the second named by its `exp` onwards.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = jsonwebtoken::decode::<Claims>(token, &self.key, &self.validation)
            .map_err(TokenError::from)
            .and_then(|data| {
                // jsonwebtoken still accepts `exp == now`
                if data.claims.is_expired() {
                    Err(TokenError::Expired)
                } else {
                    Ok(data.claims)
                }
            })
            .inspect_err(|e| tracing::debug!(error = %e, "token rejected"))?;
        Ok(claims)
    }
}
