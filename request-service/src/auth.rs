//! `x-api-key` check for the mutating routes.

use std::sync::Arc;

use axum::extract::Request;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use subtle::ConstantTimeEq;

use crate::api::error::ApiError;

pub const API_KEY_HEADER: &str = "x-api-key";

/// The configured key, shared with the middleware.
#[derive(Clone)]
pub struct ApiKey(Arc<str>);

impl ApiKey {
    pub fn new(key: impl Into<Arc<str>>) -> Self {
        Self(key.into())
    }

    pub fn check(&self, headers: &HeaderMap) -> Result<(), ApiError> {
        let provided = match headers.get(API_KEY_HEADER).map(HeaderValue::to_str) {
            None => return Err(ApiError::MissingApiKey),
            // Not visible ASCII, so it cannot match.
            Some(Err(_)) => return Err(ApiError::InvalidApiKey),
            Some(Ok(value)) => value,
        };
        if provided.is_empty() {
            return Err(ApiError::MissingApiKey);
        }
        if constant_time_eq(provided, &self.0) {
            Ok(())
        } else {
            Err(ApiError::InvalidApiKey)
        }
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(..)")
    }
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

pub async fn require_api_key(
    State(key): State<ApiKey>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Err(e) = key.check(request.headers()) {
        tracing::debug!(method = %request.method(), path = %request.uri().path(), "rejected: {e}");
        return Err(e);
    }
    Ok(next.run(request).await)
}
