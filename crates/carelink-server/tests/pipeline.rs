//! End-to-end tests for the request pipeline.
//!
//! Each test drives the full router in-process with `tower::ServiceExt::oneshot`
//! and decrypts the sealed responses with the same key a client would hold.

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use carelink_core::SecuritySecrets;
use carelink_envelope::EnvelopeCipher;
use carelink_server::{AppState, create_router};
use carelink_token::Claims;
use chrono::{Duration, Utc};
use serde_json::{Value, json};
use std::time::Duration as StdDuration;
use tower::ServiceExt;
use url::form_urlencoded;

const KEY: &[u8; 32] = b"0123456789abcdef0123456789abcdef";
const JWT_SECRET: &[u8] = b"pipeline-test-secret";

fn state_with_iv(iv_length: usize) -> AppState {
    let secrets = SecuritySecrets {
        encryption_key: KEY.to_vec(),
        jwt_secret: JWT_SECRET.to_vec(),
        iv_length,
        token_ttl: StdDuration::from_secs(3600),
    };
    AppState::from_secrets(&secrets, 64 * 1024).unwrap()
}

fn state() -> AppState {
    state_with_iv(16)
}

fn client_cipher() -> EnvelopeCipher {
    EnvelopeCipher::new(KEY, 16).unwrap()
}

fn token(state: &AppState, id: i64, role: &str, approved: bool) -> String {
    state.issuer().issue(id, role, approved).unwrap()
}

/// Sign an arbitrary payload with the server's secret, the way a foreign
/// issuer would.
fn sign_raw(payload: &Value) -> String {
    jsonwebtoken::encode(
        &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::HS256),
        payload,
        &jsonwebtoken::EncodingKey::from_secret(JWT_SECRET),
    )
    .unwrap()
}

fn sealed_query(plaintext: &Value) -> String {
    let envelope = client_cipher().seal_json(plaintext).unwrap();
    form_urlencoded::Serializer::new(String::new())
        .append_pair("payload", &envelope)
        .finish()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    request(Method::GET, uri, token)
}

fn request(method: Method, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn post_json(uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

/// Send a request and open the sealed response body.
async fn send_sealed(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let (status, body) = send(app, req).await;
    let object = body.as_object().expect("response body is an object");
    assert_eq!(object.len(), 1, "sealed response must only carry payload: {body}");
    let envelope = object["payload"].as_str().expect("payload is a string");
    assert_eq!(envelope.matches(':').count(), 1);
    (status, client_cipher().open_json(envelope).unwrap())
}

// =============================================================================
// Token verifier
// =============================================================================

#[tokio::test]
async fn test_user_on_unrestricted_route() {
    let state = state();
    let token = token(&state, 1, "user", false);

    let (status, body) = send_sealed(create_router(state), get("/api/me", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["id"], 1);
    assert_eq!(body["user"]["role"], "user");
}

#[tokio::test]
async fn test_attached_claims_equal_signed_claims() {
    let state = state();
    let mut claims = Claims::new(12, "doctor", Utc::now() + Duration::minutes(10))
        .approved(true)
        .issued_at(Utc::now());
    claims.extra.insert("email".to_string(), json!("dr@example.com"));
    let token = state.issuer().sign(&claims).unwrap();

    let (status, body) = send_sealed(create_router(state), get("/api/me", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"], serde_json::to_value(&claims).unwrap());
}

#[tokio::test]
async fn test_foreign_payload_attached_unchanged() {
    let exp = Utc::now().timestamp() + 600;
    let payloads = [
        json!({ "id": "u-1", "role": "user", "exp": exp }),
        json!({ "id": 1, "exp": exp }),
        json!({ "id": 1, "role": "doctor", "is_approved": 1, "exp": exp }),
    ];

    for payload in payloads {
        let token = sign_raw(&payload);
        let (status, body) =
            send_sealed(create_router(state()), get("/api/me", Some(&token))).await;
        assert_eq!(status, StatusCode::OK, "payload {payload}");
        assert_eq!(body["user"], payload);
    }
}

#[tokio::test]
async fn test_role_less_token_fails_only_role_checks() {
    let token = sign_raw(&json!({ "id": 1, "exp": Utc::now().timestamp() + 600 }));

    let (status, body) =
        send_sealed(create_router(state()), get("/api/admin/overview", Some(&token))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Forbidden");

    let (status, body) =
        send_sealed(create_router(state()), get("/api/doctor/dashboard", Some(&token))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Access denied: Not a doctor");
}

#[tokio::test]
async fn test_token_not_yet_valid() {
    let now = Utc::now().timestamp();
    let token = sign_raw(&json!({ "id": 1, "role": "user", "nbf": now + 600, "exp": now + 3600 }));

    let (status, body) = send_sealed(create_router(state()), get("/api/me", Some(&token))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid token");
}

#[tokio::test]
async fn test_missing_token() {
    let (status, body) = send_sealed(create_router(state()), get("/api/me", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "success": false, "message": "No token provided" }));
}

#[tokio::test]
async fn test_wrong_scheme() {
    let req = Request::builder()
        .uri("/api/me")
        .header(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send_sealed(create_router(state()), req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "No token provided");
}

#[tokio::test]
async fn test_tampered_token() {
    let state = state();
    let token = token(&state, 1, "user", false);
    // replace the first signature character
    let (signed, signature) = token.rsplit_once('.').unwrap();
    let first = if signature.starts_with('A') { 'B' } else { 'A' };
    let token = format!("{signed}.{first}{}", &signature[1..]);

    let (status, body) = send_sealed(create_router(state), get("/api/me", Some(&token))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "success": false, "message": "Invalid token" }));
}

#[tokio::test]
async fn test_expired_token() {
    let state = state();
    let claims = Claims::new(1, "user", Utc::now() - Duration::minutes(1));
    let token = state.issuer().sign(&claims).unwrap();

    let (status, body) = send_sealed(create_router(state), get("/api/me", Some(&token))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid token");
}

#[tokio::test]
async fn test_role_restricted_route() {
    let state = state();

    let admin = token(&state, 3, "admin", false);
    let (status, body) =
        send_sealed(create_router(state.clone()), get("/api/admin/overview", Some(&admin))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "admin");
    assert_eq!(body["id"], 3);

    let user = token(&state, 3, "user", false);
    let (status, body) =
        send_sealed(create_router(state), get("/api/admin/overview", Some(&user))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({ "success": false, "message": "Forbidden" }));
}

// =============================================================================
// Approval gate
// =============================================================================

#[tokio::test]
async fn test_unapproved_doctor() {
    let state = state();
    let token = token(&state, 8, "doctor", false);

    let (status, body) =
        send_sealed(create_router(state), get("/api/doctor/dashboard", Some(&token))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body,
        json!({ "success": false, "message": "Access denied: Doctor not approved yet" })
    );
}

#[tokio::test]
async fn test_non_doctor() {
    let state = state();
    let token = token(&state, 8, "user", true);

    let (status, body) =
        send_sealed(create_router(state), get("/api/doctor/dashboard", Some(&token))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Access denied: Not a doctor");
}

#[tokio::test]
async fn test_approved_doctor() {
    let state = state();
    let token = token(&state, 8, "doctor", true);

    let (status, body) =
        send_sealed(create_router(state), get("/api/doctor/dashboard", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["doctor_id"], 8);
    assert_eq!(body["is_approved"], true);
}

#[tokio::test]
async fn test_numeric_approval_flag() {
    let exp = Utc::now().timestamp() + 600;
    let approved = sign_raw(&json!({ "id": 8, "role": "doctor", "is_approved": 1, "exp": exp }));
    let (status, body) =
        send_sealed(create_router(state()), get("/api/doctor/dashboard", Some(&approved))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_approved"], 1);

    let pending = sign_raw(&json!({ "id": 8, "role": "doctor", "is_approved": 0, "exp": exp }));
    let (status, body) =
        send_sealed(create_router(state()), get("/api/doctor/dashboard", Some(&pending))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Access denied: Doctor not approved yet");
}

#[tokio::test]
async fn test_approval_gate_runs_after_authentication() {
    let (status, body) =
        send_sealed(create_router(state()), get("/api/doctor/dashboard", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "No token provided");
}

// =============================================================================
// Decryption gate
// =============================================================================

#[tokio::test]
async fn test_encrypted_body_reaches_handler_as_plaintext() {
    let state = state();
    let token = token(&state, 4, "user", false);
    let plaintext = json!({ "mood": "anxious", "score": 3, "tags": ["work"] });
    let envelope = client_cipher().seal_json(&plaintext).unwrap();

    let req = post_json("/api/echo", Some(&token), &json!({ "payload": envelope }));
    let (status, body) = send_sealed(create_router(state), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], 4);
    assert_eq!(body["body"], plaintext);
}

#[tokio::test]
async fn test_plain_body_passes_through() {
    let state = state();
    let token = token(&state, 4, "user", false);
    let plaintext = json!({ "note": "no envelope here" });

    let (status, body) =
        send_sealed(create_router(state), post_json("/api/echo", Some(&token), &plaintext)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["body"], plaintext);
}

#[tokio::test]
async fn test_malformed_envelopes_are_rejected_uniformly() {
    let state = state();
    let token = token(&state, 4, "user", false);
    let valid = client_cipher().seal_json(&json!({ "a": 1 })).unwrap();
    let (iv, cipher) = valid.split_once(':').unwrap();

    let wrong_key = EnvelopeCipher::new(b"fedcba9876543210fedcba9876543210", 16)
        .unwrap()
        .seal_bytes(b"\"not for you\"")
        .unwrap()
        .to_string();

    let cases = [
        "no-separator".to_string(),
        format!("{iv}:{cipher}:extra"),
        format!("{iv}{cipher}"),
        format!("zz:{cipher}"),
        format!("{iv}:{}", &cipher[..cipher.len() - 2]),
        format!("{iv}:"),
        wrong_key,
        String::new(),
    ];

    for envelope in cases {
        let req = post_json("/api/echo", Some(&token), &json!({ "payload": envelope }));
        let (status, body) = send_sealed(create_router(state.clone()), req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "envelope {envelope:?}");
        assert_eq!(
            body,
            json!({ "success": false, "error": "Invalid encrypted payload" }),
            "envelope {envelope:?}"
        );
    }
}

#[tokio::test]
async fn test_encrypted_non_object_body_replaces_body() {
    let state = state();
    let token = token(&state, 4, "user", false);
    let plaintext = json!([1, "two", { "three": 3 }]);
    let envelope = client_cipher().seal_json(&plaintext).unwrap();

    let req = post_json("/api/echo", Some(&token), &json!({ "payload": envelope }));
    let (status, body) = send_sealed(create_router(state), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["body"], plaintext);
}

#[tokio::test]
async fn test_decryption_runs_before_authentication() {
    let req = post_json("/api/echo", None, &json!({ "payload": "garbage" }));
    let (status, body) = send_sealed(create_router(state()), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid encrypted payload");
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let state = state();
    let token = token(&state, 4, "user", false);
    let filler = "x".repeat(70 * 1024);

    let req = post_json("/api/echo", Some(&token), &json!({ "note": filler }));
    let (status, body) = send_sealed(create_router(state), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid encrypted payload");
}

#[tokio::test]
async fn test_encrypted_query() {
    let state = state();
    let token = token(&state, 6, "user", false);
    let plaintext = json!({ "from": "2024-05-01", "limit": 20, "all": false });
    let envelope = client_cipher().seal_json(&plaintext).unwrap();
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("payload", &envelope)
        .finish();

    let (status, body) = send_sealed(
        create_router(state),
        get(&format!("/api/echo?{query}"), Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], 6);
    assert_eq!(body["query"], plaintext);
}

#[tokio::test]
async fn test_invalid_encrypted_query() {
    let state = state();
    let token = token(&state, 6, "user", false);

    let (status, body) = send_sealed(
        create_router(state),
        get("/api/echo?payload=abc", Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid encrypted payload");
}

#[tokio::test]
async fn test_encrypted_query_must_be_an_object() {
    let state = state();
    let token = token(&state, 6, "user", false);

    for plaintext in [json!([1, 2]), json!("limit=5"), json!(7)] {
        let uri = format!("/api/echo?{}", sealed_query(&plaintext));
        let (status, body) =
            send_sealed(create_router(state.clone()), get(&uri, Some(&token))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "plaintext {plaintext}");
        assert_eq!(body["error"], "Invalid encrypted payload");
    }
}

#[tokio::test]
async fn test_encrypted_query_on_delete() {
    let state = state();
    let token = token(&state, 6, "user", false);
    let plaintext = json!({ "entry_id": 42, "hard": true });
    let uri = format!("/api/echo?{}", sealed_query(&plaintext));

    let (status, body) =
        send_sealed(create_router(state), request(Method::DELETE, &uri, Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["query"], plaintext);
}

#[tokio::test]
async fn test_encrypted_query_on_head() {
    let state = state();
    let token = token(&state, 6, "user", false);

    let valid = format!("/api/echo?{}", sealed_query(&json!({ "limit": 5 })));
    let response = create_router(state.clone())
        .oneshot(request(Method::HEAD, &valid, Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let not_object = format!("/api/echo?{}", sealed_query(&json!([5])));
    let response = create_router(state.clone())
        .oneshot(request(Method::HEAD, &not_object, Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = create_router(state)
        .oneshot(request(Method::HEAD, "/api/echo?payload=abc", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_plain_query_passes_through() {
    let state = state();
    let token = token(&state, 6, "user", false);

    let (status, body) = send_sealed(
        create_router(state),
        get("/api/echo?limit=5", Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["query"], json!({ "limit": "5" }));
}

// =============================================================================
// Encryption gate
// =============================================================================

#[tokio::test]
async fn test_responses_differ_per_request() {
    let state = state();
    let token = token(&state, 1, "user", false);

    let (_, first) = send(create_router(state.clone()), get("/api/me", Some(&token))).await;
    let (_, second) = send(create_router(state), get("/api/me", Some(&token))).await;
    assert_ne!(first["payload"], second["payload"]);
}

#[tokio::test]
async fn test_encryption_failure_falls_back_to_plaintext_error() {
    // 12 bytes passes startup validation but is not a usable CBC iv.
    let state = state_with_iv(12);
    let token = token(&state, 1, "user", false);

    let (status, body) = send(create_router(state), get("/api/me", Some(&token))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({ "success": false, "error": "Failed to encrypt response" })
    );
}

#[tokio::test]
async fn test_healthz_is_plaintext() {
    let (status, body) = send(create_router(state()), get("/healthz", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
}
