//! HTTP handlers exposing a cookie-backed storage per request
//!
//! Every request gets its own [`HttpCookieJar`] bound to the request's
//! `Cookie` headers. Whatever the storage writes comes back to the client as
//! `Set-Cookie` headers on the response, so the client's cookie store is the
//! only place entries and the index live.

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::debug;

use super::{error::ApiError, state::AppState};
use crate::jar::HttpCookieJar;

fn bind_jar(headers: &HeaderMap) -> Result<Arc<HttpCookieJar>, ApiError> {
    Ok(Arc::new(HttpCookieJar::from_headers(headers)?))
}

/// Copy the jar's pending cookies onto the response
async fn with_cookies(jar: &HttpCookieJar, response: impl IntoResponse) -> Result<Response, ApiError> {
    let mut response = response.into_response();
    jar.write_to(response.headers_mut()).await?;
    Ok(response)
}

/// GET /items/{key}
pub async fn get_item(
    State(state): State<AppState>,
    Path(key): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let jar = bind_jar(&headers)?;
    let storage = state.storage_for(jar);

    match storage.get_item(&key).await? {
        Some(value) => Ok((StatusCode::OK, value).into_response()),
        None => Err(ApiError::NotFound(key)),
    }
}

/// PUT /items/{key}, body is the raw value
pub async fn put_item(
    State(state): State<AppState>,
    Path(key): Path<String>,
    headers: HeaderMap,
    value: String,
) -> Result<Response, ApiError> {
    let jar = bind_jar(&headers)?;
    let storage = state.storage_for(jar.clone());

    storage.set_item(&key, &value).await?;
    debug!(key, size = value.len(), "Stored item via HTTP");

    with_cookies(&jar, StatusCode::NO_CONTENT).await
}

/// DELETE /items/{key}
pub async fn delete_item(
    State(state): State<AppState>,
    Path(key): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let jar = bind_jar(&headers)?;
    let storage = state.storage_for(jar.clone());

    storage.remove_item(&key).await?;
    debug!(key, "Removed item via HTTP");

    with_cookies(&jar, StatusCode::NO_CONTENT).await
}

/// GET /keys
pub async fn list_keys(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<String>>, ApiError> {
    let jar = bind_jar(&headers)?;
    let storage = state.storage_for(jar);

    Ok(Json(storage.get_all_keys().await?))
}

/// GET /metrics
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.metrics.snapshot())
}

/// GET /health
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
