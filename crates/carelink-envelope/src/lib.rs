//! # carelink-envelope
//!
//! Symmetric payload envelopes for the Carelink API.
//!
//! An envelope is the wire string `"<ivHex>:<cipherHex>"`: a random iv drawn
//! per message followed by the AES-256-CBC (PKCS#7) encryption of a JSON
//! document under a single shared 32-byte key.
//!
//! ## Security Properties
//!
//! - Confidentiality only. There is no MAC, so a modified envelope is
//!   detected only when padding or JSON parsing happens to fail.
//! - No replay protection, no forward secrecy, no key rotation.

pub mod cipher;
pub mod envelope;
pub mod error;

pub use cipher::EnvelopeCipher;
pub use envelope::Envelope;
pub use error::EnvelopeError;

/// Required key length in bytes (AES-256).
pub const KEY_LEN: usize = 32;

/// Smallest accepted iv length.
pub const MIN_IV_LEN: usize = 12;

/// Largest accepted iv length.
pub const MAX_IV_LEN: usize = 32;

/// Default iv length, equal to the AES block size.
pub const DEFAULT_IV_LEN: usize = 16;

/// JSON field carrying an envelope in requests and responses.
pub const PAYLOAD_FIELD: &str = "payload";
