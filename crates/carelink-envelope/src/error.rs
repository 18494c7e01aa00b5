//! Error types for the envelope crate.

use thiserror::Error;

/// Errors that can occur while building a cipher or sealing/opening envelopes.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// Key is not exactly [`crate::KEY_LEN`] bytes.
    #[error("encryption key must be {expected} bytes, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    /// Configured iv length is outside the accepted bounds.
    #[error("iv length must be between {min} and {max} bytes, got {actual}")]
    InvalidIvLength { min: usize, max: usize, actual: usize },

    /// Envelope string does not have the `iv:cipher` shape.
    #[error("malformed envelope: {0}")]
    Format(String),

    /// A segment is not valid hex.
    #[error("invalid hex in envelope: {0}")]
    Hex(#[from] hex::FromHexError),

    /// Encryption failed.
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    /// Decryption failed (wrong key, corrupted ciphertext, bad padding).
    #[error("decryption failed: {0}")]
    DecryptionFailed(String),

    /// Decrypted bytes are not UTF-8.
    #[error("decrypted payload is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// Plaintext could not be (de)serialized as JSON.
    #[error("payload JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
