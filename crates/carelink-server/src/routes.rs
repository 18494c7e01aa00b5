//! Route definitions.

use crate::handlers;
use crate::middleware::{approved_doctors, authenticated, sealed};
use crate::state::AppState;
use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

/// Role required by the admin routes.
pub const ADMIN_ROLE: &str = "admin";

/// Create the API router.
///
/// `/healthz` is public and plaintext; everything under `/api` runs the full
/// pipeline.
pub fn create_router(state: AppState) -> Router {
    let user = authenticated(
        Router::new()
            .route("/api/me", get(handlers::whoami))
            .route(
                "/api/echo",
                get(handlers::echo_query)
                    .post(handlers::echo_body)
                    .delete(handlers::echo_query),
            ),
        &state,
        None,
    );

    let admin = authenticated(
        Router::new().route("/api/admin/overview", get(handlers::admin_overview)),
        &state,
        Some(ADMIN_ROLE),
    );

    let doctor = authenticated(
        approved_doctors(
            Router::new().route("/api/doctor/dashboard", get(handlers::doctor_dashboard)),
        ),
        &state,
        None,
    );

    let api = sealed(user.merge(admin).merge(doctor), &state);

    Router::new()
        .route("/healthz", get(handlers::healthz))
        .merge(api)
        .layer(TraceLayer::new_for_http())
}
