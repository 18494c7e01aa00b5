//! Error types for the token crate.

use thiserror::Error;

/// Errors that can occur during token operations.
#[derive(Debug, Error)]
pub enum TokenError {
    /// The signing secret is unusable.
    #[error("invalid signing secret: {0}")]
    InvalidSecret(String),

    /// Failed to create token.
    #[error("failed to create token: {0}")]
    CreationFailed(String),

    /// Token is malformed or its signature does not match.
    #[error("token verification failed: {0}")]
    VerificationFailed(String),

    /// Token has expired.
    #[error("token has expired")]
    Expired,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::VerificationFailed(err.to_string()),
        }
    }
}
