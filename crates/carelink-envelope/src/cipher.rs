//! AES-256-CBC sealing and opening of JSON payloads.

use crate::envelope::Envelope;
use crate::error::EnvelopeError;
use crate::{KEY_LEN, MAX_IV_LEN, MIN_IV_LEN};
use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::RngCore;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use zeroize::Zeroizing;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// AES block size; CBC only accepts an iv of exactly this length.
const BLOCK_LEN: usize = 16;

/// Seals and opens envelopes under one shared key.
///
/// Constructing the cipher validates the key and iv-length invariants, so a
/// process that holds an `EnvelopeCipher` never re-checks them per message.
#[derive(Clone)]
pub struct EnvelopeCipher {
    key: Zeroizing<[u8; KEY_LEN]>,
    iv_len: usize,
}

impl EnvelopeCipher {
    /// Build a cipher from raw key bytes and the iv length to draw per message.
    pub fn new(key: &[u8], iv_len: usize) -> Result<Self, EnvelopeError> {
        let key: [u8; KEY_LEN] = key.try_into().map_err(|_| EnvelopeError::InvalidKeyLength {
            expected: KEY_LEN,
            actual: key.len(),
        })?;
        if !(MIN_IV_LEN..=MAX_IV_LEN).contains(&iv_len) {
            return Err(EnvelopeError::InvalidIvLength {
                min: MIN_IV_LEN,
                max: MAX_IV_LEN,
                actual: iv_len,
            });
        }
        if iv_len != BLOCK_LEN {
            tracing::warn!(
                iv_len,
                block_len = BLOCK_LEN,
                "iv length differs from the AES block size; every envelope operation will fail"
            );
        }

        Ok(Self {
            key: Zeroizing::new(key),
            iv_len,
        })
    }

    /// Length of the iv drawn for each sealed message.
    pub fn iv_len(&self) -> usize {
        self.iv_len
    }

    /// Encrypt raw bytes under a fresh random iv.
    pub fn seal_bytes(&self, plaintext: &[u8]) -> Result<Envelope, EnvelopeError> {
        let mut iv = vec![0u8; self.iv_len];
        rand::rng().fill_bytes(&mut iv);

        let encryptor = Aes256CbcEnc::new_from_slices(self.key.as_slice(), &iv)
            .map_err(|e| EnvelopeError::EncryptionFailed(format!("{e} (iv is {} bytes)", iv.len())))?;
        let ciphertext = encryptor.encrypt_padded_vec_mut::<Pkcs7>(plaintext);

        Ok(Envelope { iv, ciphertext })
    }

    /// Decrypt an envelope back to raw bytes.
    pub fn open_bytes(&self, envelope: &Envelope) -> Result<Vec<u8>, EnvelopeError> {
        let decryptor = Aes256CbcDec::new_from_slices(self.key.as_slice(), &envelope.iv)
            .map_err(|e| {
                EnvelopeError::DecryptionFailed(format!("{e} (iv is {} bytes)", envelope.iv.len()))
            })?;
        decryptor
            .decrypt_padded_vec_mut::<Pkcs7>(&envelope.ciphertext)
            .map_err(|e| EnvelopeError::DecryptionFailed(e.to_string()))
    }

    /// Serialize `value` to JSON and seal it into a wire string.
    pub fn seal_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, EnvelopeError> {
        let plaintext = serde_json::to_vec(value)?;
        Ok(self.seal_bytes(&plaintext)?.to_string())
    }

    /// Parse a wire string, decrypt it and parse the plaintext as JSON.
    pub fn open_json(&self, raw: &str) -> Result<Value, EnvelopeError> {
        let envelope = Envelope::parse(raw)?;
        let plaintext = String::from_utf8(self.open_bytes(&envelope)?)?;
        Ok(serde_json::from_str(&plaintext)?)
    }
}

impl fmt::Debug for EnvelopeCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvelopeCipher")
            .field("key", &"<redacted>")
            .field("iv_len", &self.iv_len)
            .finish()
    }
}
