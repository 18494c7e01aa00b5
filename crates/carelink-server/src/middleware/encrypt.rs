use super::decrypt::is_json;
use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use carelink_envelope::{EnvelopeCipher, EnvelopeError, PAYLOAD_FIELD};
use serde_json::json;

/// Response hook sealing every JSON response into `{ "payload": "<iv>:<cipher>" }`.
///
/// The status code and headers are kept. Non-JSON responses pass through.
/// If sealing fails the client gets the one plaintext response this layer
/// ever emits: 500 `{ "success": false, "error": "Failed to encrypt response" }`.
pub async fn encrypt_response(State(state): State<AppState>, response: Response) -> Response {
    if !is_json(response.headers()) {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let plaintext = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(error = %e, "failed to buffer response body for encryption");
            return ApiError::EncryptionFailed.into_response();
        }
    };

    match seal_body(state.cipher(), &plaintext) {
        Ok(sealed) => {
            parts.headers.remove(header::CONTENT_LENGTH);
            Response::from_parts(parts, Body::from(sealed))
        }
        Err(e) => {
            tracing::error!(error = %e, status = %parts.status, "failed to encrypt response");
            ApiError::EncryptionFailed.into_response()
        }
    }
}

fn seal_body(cipher: &EnvelopeCipher, plaintext: &[u8]) -> Result<Vec<u8>, EnvelopeError> {
    let envelope = cipher.seal_bytes(plaintext)?;
    Ok(serde_json::to_vec(&json!({ PAYLOAD_FIELD: envelope.to_string() }))?)
}
