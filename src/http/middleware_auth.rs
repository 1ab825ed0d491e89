//! Request context extraction for tenant-scoped endpoints.
//!
//! Resolves the tenant addressed by the request and reads the bearer token
//! presented by registered clients.

use std::sync::Arc;

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::http::context::AppState;
use crate::tenant::Tenant;

/// Tenant addressed by the request's `Host` header
///
/// Rejects the request with 404 `unknown_instance` when no hosted tenant
/// matches.
#[derive(Clone, Debug)]
pub struct CurrentTenant(pub Arc<Tenant>);

impl<S> FromRequestParts<S> for CurrentTenant
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let host = parts
            .headers
            .get(header::HOST)
            .and_then(|h| h.to_str().ok())
            .or_else(|| parts.uri.host())
            .unwrap_or_default();

        app_state
            .tenants
            .resolve_host(host)
            .map(CurrentTenant)
            .ok_or_else(|| {
                tracing::debug!(host = %host, "Request for an unknown instance");
                oauth_error_response(StatusCode::NOT_FOUND, "unknown_instance")
            })
    }
}

/// Token of an `Authorization: Bearer <token>` header, if present
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if scheme.eq_ignore_ascii_case("bearer") {
        Some(token.trim())
    } else {
        None
    }
}

/// Error body with a tag and no description
pub(crate) fn oauth_error_response(status: StatusCode, error: &str) -> Response {
    (status, axum::Json(json!({ "error": error }))).into_response()
}
