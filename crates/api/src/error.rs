use axum::extract::rejection::BytesRejection;
use axum::http::header::ALLOW;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use catalog_core::envelope::Envelope;
use catalog_core::error::{CoreError, ErrorKind};
use catalog_sync::SyncError;

use crate::config::ConfigError;

/// Application-level error type for editor requests.
///
/// Every variant renders as the `{ ok: false, error, kind }` envelope.
/// Implements [`IntoResponse`] for the axum routes; the function adapter
/// uses [`AppError::status`] and [`AppError::envelope`] directly.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Gate and validation errors from `catalog_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A synchronization run failed.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// The request body could not be read, usually because it exceeds
    /// `MAX_BODY_BYTES`.
    #[error(transparent)]
    Body(#[from] BytesRejection),

    /// The process is not configured to talk to a store.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Core(err) => err.kind(),
            AppError::Sync(err) => err.kind(),
            AppError::Body(_) => ErrorKind::Validation,
            AppError::Config(_) => ErrorKind::Configuration,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Body(rejection) => rejection.status(),
            other => StatusCode::from_u16(other.kind().status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }

    /// Envelope for this error.
    ///
    /// Store failures carry the provider's text verbatim so the editor can
    /// see why a write was refused. Serialization failures are internal
    /// and sanitized.
    pub fn envelope(&self) -> Envelope {
        let message = match self {
            AppError::Sync(SyncError::Serialize(_)) => "An internal error occurred".to_string(),
            AppError::Body(rejection) => rejection.body_text(),
            other => other.to_string(),
        };
        Envelope::failure(self.kind(), message)
    }

    /// Log and split into status and envelope, for adapters that build
    /// their own response type.
    pub fn into_parts(self) -> (StatusCode, Envelope) {
        self.log();
        (self.status(), self.envelope())
    }

    fn log(&self) {
        match self.kind() {
            ErrorKind::Store | ErrorKind::Configuration => {
                tracing::error!(error = %self, kind = ?self.kind(), "Editor request failed");
            }
            ErrorKind::Authorization => {
                tracing::warn!("Rejected editor request with invalid secret");
            }
            ErrorKind::Validation | ErrorKind::Method => {
                tracing::debug!(error = %self, "Rejected editor request");
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();
        let mut response = (self.status(), axum::Json(self.envelope())).into_response();
        if self.kind() == ErrorKind::Method {
            response
                .headers_mut()
                .insert(ALLOW, HeaderValue::from_static("POST, OPTIONS"));
        }
        response
    }
}
