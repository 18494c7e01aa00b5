//! Extractors for the request-scoped values the pipeline attaches.

use crate::error::ApiError;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use carelink_token::Claims;
use serde_json::{Map, Value};
use std::convert::Infallible;
use url::form_urlencoded;

/// Claims of the authenticated caller.
///
/// Only available behind [`crate::middleware::authenticate`]; elsewhere the
/// extractor rejects with 401 "No token provided".
#[derive(Debug, Clone)]
pub struct Authenticated(pub Claims);

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(Authenticated)
            .ok_or(ApiError::MissingToken)
    }
}

/// The effective query object of a request.
///
/// When the query carried an encrypted `payload`, this is the decrypted
/// object with its original JSON types. Otherwise it is the plain query
/// string with every value as a JSON string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlainQuery(pub Map<String, Value>);

impl<S> FromRequestParts<S> for PlainQuery
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(decrypted) = parts.extensions.get::<PlainQuery>() {
            return Ok(decrypted.clone());
        }

        let map = parts
            .uri
            .query()
            .map(|query| {
                form_urlencoded::parse(query.as_bytes())
                    .into_owned()
                    .map(|(key, value)| (key, Value::String(value)))
                    .collect()
            })
            .unwrap_or_default();
        Ok(PlainQuery(map))
    }
}
