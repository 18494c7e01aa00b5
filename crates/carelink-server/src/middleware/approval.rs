use crate::error::ApiError;
use axum::{extract::Request, middleware::Next, response::Response};
use carelink_token::{Claims, DOCTOR_ROLE};
use serde_json::Value;

/// Axum middleware admitting only approved doctors.
///
/// Must run after [`super::auth::authenticate`]. Requests that somehow reach
/// it without claims are treated as "not a doctor".
pub async fn require_approved_doctor(req: Request, next: Next) -> Result<Response, ApiError> {
    check_doctor_approval(req.extensions().get::<Claims>()).inspect_err(|e| {
        tracing::warn!(reason = %e, path = %req.uri().path(), "approval gate denied request");
    })?;
    Ok(next.run(req).await)
}

/// Decide whether the claims belong to an approved doctor.
pub fn check_doctor_approval(claims: Option<&Claims>) -> Result<(), ApiError> {
    match claims {
        Some(claims) if claims.has_role(DOCTOR_ROLE) => {
            if claims.is_approved.as_ref().is_some_and(is_truthy) {
                Ok(())
            } else {
                Err(ApiError::DoctorNotApproved)
            }
        }
        _ => Err(ApiError::NotDoctor),
    }
}

/// Truthiness of a signed flag, the way a JavaScript issuer would read it:
/// `false`, `0`, `""` and `null` are false, everything else is true.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0 && !v.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Null => false,
        Value::Array(_) | Value::Object(_) => true,
    }
}
