use axum::{
    body::Body,
    extract::{Query, Request, State},
    middleware::Next,
    response::Response,
};
use serde::Deserialize;
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::{error::ApiError, state::AppState};

pub const API_KEY_HEADER: &str = "x-api-key";

/// Largest body buffered while looking for an `apiKey` field
const BODY_LIMIT: usize = 2 * 1024 * 1024;

#[derive(Debug, Deserialize)]
struct KeyParam {
    #[serde(rename = "apiKey")]
    api_key: Option<String>,
}

/// Admin guard: the shared secret may arrive in the `x-api-key` header,
/// the `apiKey` query parameter or an `apiKey` field of a JSON body.
///
/// Without a configured `BACKEND_KEY` every admin request is rejected.
pub async fn require_admin_key(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(expected) = state.config.backend_key.as_deref() else {
        tracing::warn!(path = %req.uri().path(), "BACKEND_KEY is not set, rejecting admin request");
        return Err(ApiError::Unauthorized);
    };

    if key_matches(header_key(&req), expected) || key_matches(query_key(&req).as_deref(), expected) {
        return Ok(next.run(req).await);
    }

    // Last resort: the body. It has to be buffered and handed on intact.
    let (parts, body) = req.into_parts();
    let bytes = axum::body::to_bytes(body, BODY_LIMIT)
        .await
        .map_err(|_| ApiError::BadRequest("Request body too large".to_string()))?;

    if !key_matches(body_key(&bytes).as_deref(), expected) {
        tracing::debug!(path = %parts.uri.path(), "Rejected admin request with missing or wrong key");
        return Err(ApiError::Unauthorized);
    }

    let req = Request::from_parts(parts, Body::from(bytes));
    Ok(next.run(req).await)
}

fn key_matches(candidate: Option<&str>, expected: &str) -> bool {
    candidate.is_some_and(|key| bool::from(key.as_bytes().ct_eq(expected.as_bytes())))
}

fn header_key(req: &Request) -> Option<&str> {
    req.headers().get(API_KEY_HEADER)?.to_str().ok()
}

fn query_key(req: &Request) -> Option<String> {
    let Query(param) = Query::<KeyParam>::try_from_uri(req.uri()).ok()?;
    param.api_key
}

fn body_key(bytes: &[u8]) -> Option<String> {
    if bytes.is_empty() {
        return None;
    }
    let value: serde_json::Value = serde_json::from_slice(bytes).ok()?;
    value.get("apiKey")?.as_str().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_matches() {
        assert!(key_matches(Some("s3cret"), "s3cret"));
        assert!(!key_matches(Some("s3creT"), "s3cret"));
        assert!(!key_matches(Some("s3cret-longer"), "s3cret"));
        assert!(!key_matches(Some(""), "s3cret"));
        assert!(!key_matches(None, "s3cret"));
    }

    #[test]
    fn test_body_key() {
        assert_eq!(body_key(br#"{"apiKey":"s3cret","ids":[]}"#).as_deref(), Some("s3cret"));
        assert_eq!(body_key(br#"{"apiKey":42}"#), None);
        assert_eq!(body_key(b"not json"), None);
        assert_eq!(body_key(b""), None);
    }

    #[test]
    fn test_query_key() {
        let req = Request::builder()
            .uri("/api/blogs/admin/posts?page=2&apiKey=s3cret")
            .body(Body::empty())
            .unwrap();
        assert_eq!(query_key(&req).as_deref(), Some("s3cret"));

        let req = Request::builder().uri("/api/blogs/admin/posts").body(Body::empty()).unwrap();
        assert_eq!(query_key(&req), None);
    }
}
