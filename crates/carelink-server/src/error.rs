//! Error types for the server crate.
//!
//! Client-facing errors keep two historical shapes: authentication and
//! authorization failures carry a `message` field, payload-encryption failures
//! an `error` field. Clients depend on both, so they are not unified.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use carelink_core::ConfigError;
use carelink_envelope::EnvelopeError;
use carelink_token::TokenError;
use serde_json::json;
use thiserror::Error;

/// Terminal errors produced by the request pipeline.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ApiError {
    /// No `Authorization: Bearer` header.
    #[error("No token provided")]
    MissingToken,

    /// Bad signature, malformed or expired token.
    #[error("Invalid token")]
    InvalidToken,

    /// Authenticated, but the route requires another role.
    #[error("Forbidden")]
    Forbidden,

    /// Approval gate: caller is not a doctor.
    #[error("Access denied: Not a doctor")]
    NotDoctor,

    /// Approval gate: doctor account not vetted yet.
    #[error("Access denied: Doctor not approved yet")]
    DoctorNotApproved,

    /// Request envelope could not be turned into plaintext.
    #[error("Invalid encrypted payload")]
    InvalidEncryptedPayload,

    /// Response could not be sealed.
    #[error("Failed to encrypt response")]
    EncryptionFailed,
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingToken | ApiError::InvalidToken => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden | ApiError::NotDoctor | ApiError::DoctorNotApproved => {
                StatusCode::FORBIDDEN
            }
            ApiError::InvalidEncryptedPayload => StatusCode::BAD_REQUEST,
            ApiError::EncryptionFailed => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn is_crypto(&self) -> bool {
        matches!(
            self,
            ApiError::InvalidEncryptedPayload | ApiError::EncryptionFailed
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = if self.is_crypto() {
            json!({ "success": false, "error": self.to_string() })
        } else {
            json!({ "success": false, "message": self.to_string() })
        };

        (self.status(), Json(body)).into_response()
    }
}

/// Errors that abort startup. None of these is recoverable per request.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid envelope settings: {0}")]
    Envelope(#[from] EnvelopeError),

    #[error("invalid token settings: {0}")]
    Token(#[from] TokenError),
}
