//! Success responses for the editor endpoints.
//!
//! Errors render through [`crate::error::AppError`]; these helpers cover
//! the two non-error outcomes so handlers never hand-roll a
//! `json!({ "ok": true })`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use catalog_core::envelope::Envelope;

/// `200 { "ok": true }`.
pub fn ok() -> Response {
    (StatusCode::OK, Json(Envelope::success())).into_response()
}

/// `200` with an empty body, for `OPTIONS` requests the CORS layer did not
/// answer itself.
pub fn preflight() -> Response {
    StatusCode::OK.into_response()
}
