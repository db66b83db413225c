//! Pre-shared key authentication for scanner devices and the dashboard.
//!
//! Keys are accepted from the `x-api-key` header, a bearer token, or an
//! `api_key` query parameter (browser `EventSource` cannot set headers).
//! Comparison is constant-time.

use axum::{
    extract::{Query, Request},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use subtle::ConstantTimeEq;

use crate::errors::{AppError, ErrorResponse};

/// Header name for the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Query string of a streaming client; the key arrives percent-encoded.
#[derive(Debug, Deserialize)]
struct KeyQuery {
    api_key: Option<String>,
}

/// Reject requests that do not present the configured key.
///
/// With no key configured every request passes (development mode).
pub async fn psk_auth_layer(
    expected_psk: Option<String>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = expected_psk else {
        return next.run(request).await;
    };

    match presented_key(&request) {
        Some(key) if keys_match(&key, &expected) => next.run(request).await,
        Some(_) => {
            tracing::warn!(path = %request.uri().path(), "Rejected request with invalid API key");
            unauthorized_response("Invalid API key")
        }
        None => unauthorized_response("Missing or invalid API key"),
    }
}

fn presented_key(request: &Request) -> Option<String> {
    let headers = request.headers();

    if let Some(key) = headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok()) {
        return Some(key.to_string());
    }

    if let Some(token) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
    {
        return Some(token.to_string());
    }

    Query::<KeyQuery>::try_from_uri(request.uri())
        .ok()
        .and_then(|Query(query)| query.api_key)
}

fn keys_match(provided: &str, expected: &str) -> bool {
    provided.as_bytes().ct_eq(expected.as_bytes()).into()
}

fn unauthorized_response(message: &str) -> Response {
    let error = AppError::Unauthorized(message.to_string());
    (StatusCode::UNAUTHORIZED, Json(ErrorResponse::new(&error, 0))).into_response()
}
