//! Demonstration handlers.
//!
//! Real business handlers live outside this crate; these only show what a
//! handler sees once the pipeline has run: plaintext bodies and queries and
//! the caller's claims.

use crate::extract::{Authenticated, PlainQuery};
use axum::Json;
use serde_json::{Value, json};

pub async fn healthz() -> Json<Value> {
    Json(json!({ "ok": true, "service": "carelink-server" }))
}

pub async fn whoami(Authenticated(claims): Authenticated) -> Json<Value> {
    Json(json!({ "success": true, "user": claims }))
}

pub async fn echo_body(Authenticated(claims): Authenticated, Json(body): Json<Value>) -> Json<Value> {
    Json(json!({ "success": true, "user_id": claims.id, "body": body }))
}

pub async fn echo_query(
    Authenticated(claims): Authenticated,
    PlainQuery(query): PlainQuery,
) -> Json<Value> {
    Json(json!({ "success": true, "user_id": claims.id, "query": query }))
}

pub async fn admin_overview(Authenticated(claims): Authenticated) -> Json<Value> {
    Json(json!({ "success": true, "id": claims.id, "role": claims.role }))
}

pub async fn doctor_dashboard(Authenticated(claims): Authenticated) -> Json<Value> {
    Json(json!({
        "success": true,
        "doctor_id": claims.id,
        "is_approved": claims.is_approved,
    }))
}
