use crate::error::ApiError;
use crate::extract::PlainQuery;
use crate::state::AppState;
use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, Method, Uri, header, uri::PathAndQuery},
    middleware::Next,
    response::Response,
};
use carelink_envelope::{EnvelopeCipher, PAYLOAD_FIELD};
use serde_json::{Map, Value};
use url::form_urlencoded;

/// Axum middleware turning encrypted request payloads into plaintext.
///
/// - JSON body `{ "payload": "<iv>:<cipher>" }` (any method): the body is
///   replaced by the decrypted JSON document.
/// - `?payload=<iv>:<cipher>` on query-only methods: the query string is
///   replaced by the decrypted object, which is also attached as [`PlainQuery`].
///
/// Requests without a `payload` pass through untouched. Every failure is
/// reported as 400 "Invalid encrypted payload"; the cause is only logged.
pub async fn decrypt_request(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let req = decrypt_body(&state, req).await?;
    let req = if is_query_only(req.method()) {
        decrypt_query(state.cipher(), req)?
    } else {
        req
    };
    Ok(next.run(req).await)
}

async fn decrypt_body(state: &AppState, req: Request) -> Result<Request, ApiError> {
    if !is_json(req.headers()) {
        return Ok(req);
    }

    let (mut parts, body) = req.into_parts();
    let bytes = axum::body::to_bytes(body, state.max_body_bytes())
        .await
        .map_err(|e| reject("body", &e))?;

    let Some(envelope) = envelope_field(&bytes) else {
        return Ok(Request::from_parts(parts, Body::from(bytes)));
    };

    let plaintext = state
        .cipher()
        .open_json(&envelope)
        .map_err(|e| reject("body", &e))?;
    let plain_bytes = serde_json::to_vec(&plaintext).map_err(|e| reject("body", &e))?;

    parts
        .headers
        .insert(header::CONTENT_LENGTH, HeaderValue::from(plain_bytes.len()));
    Ok(Request::from_parts(parts, Body::from(plain_bytes)))
}

fn decrypt_query(cipher: &EnvelopeCipher, req: Request) -> Result<Request, ApiError> {
    let Some(envelope) = req.uri().query().and_then(query_payload) else {
        return Ok(req);
    };

    let plain = match cipher.open_json(&envelope) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            tracing::warn!(kind = json_kind(&other), "decrypted query payload is not an object");
            return Err(ApiError::InvalidEncryptedPayload);
        }
        Err(e) => return Err(reject("query", &e)),
    };

    let (mut parts, body) = req.into_parts();
    parts.uri = with_query(&parts.uri, &encode_query(&plain)).map_err(|e| reject("query", &e))?;
    parts.extensions.insert(PlainQuery(plain));
    Ok(Request::from_parts(parts, body))
}

fn reject(source: &'static str, err: &dyn std::fmt::Display) -> ApiError {
    tracing::warn!(source, error = %err, "failed to decrypt request payload");
    ApiError::InvalidEncryptedPayload
}

/// Methods whose requests conventionally carry no body.
fn is_query_only(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::DELETE)
}

pub(crate) fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|mime| {
            let mime = mime.trim().to_ascii_lowercase();
            mime == "application/json" || mime.ends_with("+json")
        })
        .unwrap_or(false)
}

/// The string `payload` field of a JSON object body, if there is one.
fn envelope_field(bytes: &Bytes) -> Option<String> {
    match serde_json::from_slice::<Value>(bytes).ok()? {
        Value::Object(mut map) => match map.remove(PAYLOAD_FIELD)? {
            Value::String(envelope) => Some(envelope),
            _ => None,
        },
        _ => None,
    }
}

fn query_payload(query: &str) -> Option<String> {
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == PAYLOAD_FIELD)
        .map(|(_, value)| value.into_owned())
}

/// Encode a JSON object as a query string. Strings are written as is,
/// null as an empty value, everything else as compact JSON.
fn encode_query(map: &Map<String, Value>) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in map {
        match value {
            Value::String(s) => serializer.append_pair(key, s),
            Value::Null => serializer.append_pair(key, ""),
            other => serializer.append_pair(key, &other.to_string()),
        };
    }
    serializer.finish()
}

fn with_query(uri: &Uri, query: &str) -> Result<Uri, axum::http::Error> {
    let path_and_query = if query.is_empty() {
        uri.path().to_string()
    } else {
        format!("{}?{}", uri.path(), query)
    };

    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(PathAndQuery::try_from(path_and_query)?);
    Ok(Uri::from_parts(parts)?)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
