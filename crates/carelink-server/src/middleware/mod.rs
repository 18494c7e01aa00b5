//! Request pipeline for protected routes.
//!
//! Order: Request → Decrypt → Authenticate → Authorize → Handler → Encrypt.
//!
//! Each stage either forwards a (possibly transformed) request or ends the
//! request with a terminal response. The encryption hook sits outermost, so
//! terminal responses from the inner stages leave the process sealed too.

pub mod approval;
pub mod auth;
pub mod decrypt;
pub mod encrypt;

pub use approval::{check_doctor_approval, require_approved_doctor};
pub use auth::{AuthGuard, authenticate};
pub use decrypt::decrypt_request;
pub use encrypt::encrypt_response;

use crate::state::AppState;
use axum::{Router, middleware};

/// Require a valid bearer token on every route of `router`, optionally with a
/// specific role.
pub fn authenticated<S>(router: Router<S>, state: &AppState, role: Option<&str>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let guard = match role {
        Some(role) => AuthGuard::with_role(state.clone(), role),
        None => AuthGuard::any(state.clone()),
    };
    router.route_layer(middleware::from_fn_with_state(guard, authenticate))
}

/// Admit only approved doctors. Apply before [`authenticated`] so that the
/// token is verified first.
pub fn approved_doctors<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.route_layer(middleware::from_fn(require_approved_doctor))
}

/// Decrypt incoming payloads and encrypt outgoing JSON on every route of
/// `router`. Apply last so both gates wrap the auth stages.
pub fn sealed<S>(router: Router<S>, state: &AppState) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .route_layer(middleware::from_fn_with_state(state.clone(), decrypt_request))
        .route_layer(middleware::map_response_with_state(
            state.clone(),
            encrypt_response,
        ))
}
