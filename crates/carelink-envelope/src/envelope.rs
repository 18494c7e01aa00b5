//! The `iv:cipher` wire format.

use crate::error::EnvelopeError;
use std::fmt;
use std::str::FromStr;

/// A parsed envelope: iv and ciphertext bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub iv: Vec<u8>,
    pub ciphertext: Vec<u8>,
}

impl Envelope {
    /// Parse `"<ivHex>:<cipherHex>"`.
    ///
    /// The string must split on `:` into exactly two segments.
    pub fn parse(raw: &str) -> Result<Self, EnvelopeError> {
        let segments: Vec<&str> = raw.split(':').collect();
        let [iv_hex, cipher_hex] = segments.as_slice() else {
            return Err(EnvelopeError::Format(format!(
                "expected 2 segments separated by ':', found {}",
                segments.len()
            )));
        };

        Ok(Self {
            iv: hex::decode(iv_hex)?,
            ciphertext: hex::decode(cipher_hex)?,
        })
    }
}

impl FromStr for Envelope {
    type Err = EnvelopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", hex::encode(&self.iv), hex::encode(&self.ciphertext))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let env = Envelope::parse("00ff10:abcd").unwrap();
        assert_eq!(env.iv, vec![0x00, 0xff, 0x10]);
        assert_eq!(env.ciphertext, vec![0xab, 0xcd]);
        assert_eq!(env.to_string(), "00ff10:abcd");
    }

    #[test]
    fn test_uppercase_hex_accepted() {
        let env: Envelope = "ABCD:EF01".parse().unwrap();
        assert_eq!(env.to_string(), "abcd:ef01");
    }

    #[test]
    fn test_separator_count() {
        for raw in ["", "abcd", "ab:cd:ef", "::", "abcdef0123"] {
            assert!(
                matches!(Envelope::parse(raw), Err(EnvelopeError::Format(_))),
                "{raw:?} should be a format error"
            );
        }
    }

    #[test]
    fn test_invalid_hex() {
        assert!(matches!(Envelope::parse("zz:00"), Err(EnvelopeError::Hex(_))));
        assert!(matches!(Envelope::parse("00:abc"), Err(EnvelopeError::Hex(_))));
    }
}
