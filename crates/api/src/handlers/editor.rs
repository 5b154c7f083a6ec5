//! Handlers for the editor write endpoints.
//!
//! Mounted with `any(..)` so the gate, not the router, decides how
//! non-`POST` methods are answered. Body read failures (over the size
//! limit) are answered with the same envelope as every other error.

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, Method};
use axum::response::Response;
use catalog_core::gate::{Admission, GateRequest, SECRET_HEADER};

use crate::error::AppResult;
use crate::response;
use crate::service;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// POST /api/commit
// ---------------------------------------------------------------------------

/// Persist a catalog update and its images.
pub async fn commit(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> AppResult<Response> {
    let body = body?;
    match service::commit(&state, gate_request(&method, &headers, &body)).await? {
        Admission::Preflight => Ok(response::preflight()),
        Admission::Proceed(report) => {
            tracing::info!(paths = ?report.written_paths(), "Commit request completed");
            Ok(response::ok())
        }
    }
}

// ---------------------------------------------------------------------------
// POST /api/upload-image
// ---------------------------------------------------------------------------

/// Persist a single image under `media/`.
pub async fn upload_image(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> AppResult<Response> {
    let body = body?;
    match service::upload_image(&state, gate_request(&method, &headers, &body)).await? {
        Admission::Preflight => Ok(response::preflight()),
        Admission::Proceed(_) => Ok(response::ok()),
    }
}

/// Non-UTF-8 header values are treated as absent.
fn gate_request<'a>(method: &'a Method, headers: &'a HeaderMap, body: &'a [u8]) -> GateRequest<'a> {
    GateRequest {
        method: method.as_str(),
        secret_header: headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok()),
        content_type: headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()),
        body,
    }
}
