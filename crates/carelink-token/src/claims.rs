//! Identity claims carried by a token.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Role name the approval gate admits.
pub const DOCTOR_ROLE: &str = "doctor";

/// Claims decoded from a verified token.
///
/// Values are kept exactly as signed: `id`, `role` and `is_approved` hold
/// whatever JSON the issuer put there, and every other claim lands in
/// `extra`. Serializing a decoded value reproduces the signed payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub id: Value,

    /// Role name (e.g., "user", "doctor", "admin").
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub role: Option<Value>,

    /// Approval flag of a doctor account, as signed.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub is_approved: Option<Value>,

    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,

    /// Any other claims present in the token.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Claims {
    /// Create claims for an identity expiring at `expires_at`.
    pub fn new(id: impl Into<Value>, role: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            role: Some(Value::String(role.into())),
            is_approved: Some(Value::Bool(false)),
            exp: expires_at.timestamp(),
            extra: Map::new(),
        }
    }

    /// Set the approval flag.
    pub fn approved(mut self, is_approved: bool) -> Self {
        self.is_approved = Some(Value::Bool(is_approved));
        self
    }

    /// Set the `iat` claim.
    pub fn issued_at(mut self, at: DateTime<Utc>) -> Self {
        self.extra.insert("iat".to_string(), Value::from(at.timestamp()));
        self
    }

    /// The `iat` claim, if present and numeric.
    pub fn iat(&self) -> Option<i64> {
        self.extra.get("iat").and_then(Value::as_i64)
    }

    /// The role, if the token carries it as a string.
    pub fn role(&self) -> Option<&str> {
        self.role.as_ref().and_then(Value::as_str)
    }

    /// Check whether the claims carry the given role.
    pub fn has_role(&self, role: &str) -> bool {
        self.role() == Some(role)
    }

    /// Check if the token has expired. A token is expired from the second
    /// named by `exp` onwards.
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Keep a field that is present in the payload, even when it is `null`.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}
