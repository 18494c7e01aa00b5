use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// State for the authentication gate: the shared app state plus the role the
/// guarded routes require, if any.
#[derive(Clone)]
pub struct AuthGuard {
    state: AppState,
    required_role: Option<Arc<str>>,
}

impl AuthGuard {
    /// Accept any authenticated caller.
    pub fn any(state: AppState) -> Self {
        Self {
            state,
            required_role: None,
        }
    }

    /// Accept only callers whose token carries `role`.
    pub fn with_role(state: AppState, role: &str) -> Self {
        Self {
            state,
            required_role: Some(Arc::from(role)),
        }
    }

    /// The role the guarded routes require, if any.
    pub fn required_role(&self) -> Option<&str> {
        self.required_role.as_deref()
    }
}

/// Axum middleware verifying the bearer token:
/// - missing header or other scheme -> 401 "No token provided"
/// - bad signature or expired -> 401 "Invalid token"
/// - role mismatch -> 403 "Forbidden"
///
/// On success the decoded `Claims` are inserted into the request extensions.
pub async fn authenticate(
    State(guard): State<AuthGuard>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(req.headers()).ok_or(ApiError::MissingToken)?;

    let claims = guard
        .state
        .verifier()
        .verify(token)
        .map_err(|_| ApiError::InvalidToken)?;

    if let Some(role) = guard.required_role()
        && !claims.has_role(role)
    {
        tracing::warn!(
            user_id = %claims.id,
            role = ?claims.role(),
            required_role = role,
            path = %req.uri().path(),
            "role check failed"
        );
        return Err(ApiError::Forbidden);
    }

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Extract the token from `Authorization: Bearer <token>`.
fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}
