pub mod health;

use axum::extract::DefaultBodyLimit;
use axum::routing::any;
use axum::Router;

use crate::handlers::editor;
use crate::state::AppState;

/// Build the `/api` route tree.
///
/// ```text
/// POST   /commit          -> editor::commit        (catalog + images)
/// POST   /upload-image    -> editor::upload_image  (single image)
/// ```
///
/// Both accept any method; the gate answers `OPTIONS` with 200 and other
/// methods with 405.
pub fn api_routes(max_body_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/commit", any(editor::commit))
        .route("/upload-image", any(editor::upload_image))
        .layer(DefaultBodyLimit::max(max_body_bytes))
}
