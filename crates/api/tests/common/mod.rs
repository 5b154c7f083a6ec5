#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use catalog_api::config::{AppConfig, StoreSettings};
use catalog_api::router::build_app_router;
use catalog_api::state::AppState;
use catalog_store::{MemoryStore, RevisionStore};

pub const SECRET: &str = "s3cret";

/// Build a test `AppConfig` with safe defaults and the memory backend.
pub fn test_config(editor_secret: Option<&str>) -> AppConfig {
    AppConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        max_body_bytes: 64 * 1024 * 1024,
        max_asset_base64_len: catalog_core::asset::MAX_ASSET_BASE64_LEN,
        editor_secret: editor_secret.map(str::to_string),
        store: StoreSettings::Memory,
    }
}

/// State over a fresh `MemoryStore`, returned alongside for assertions.
pub fn test_state(config: AppConfig) -> (AppState, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let dyn_store: Arc<dyn RevisionStore> = store.clone();
    (AppState::with_store(config, dyn_store), store)
}

/// Full application router with all middleware layers, exactly as the
/// binary builds it.
pub fn build_test_app(editor_secret: Option<&str>) -> (Router, Arc<MemoryStore>) {
    build_app_with_config(test_config(editor_secret))
}

pub fn build_app_with_config(config: AppConfig) -> (Router, Arc<MemoryStore>) {
    let (state, store) = test_state(config);
    (build_app_router(state), store)
}

pub async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

/// POST a JSON body, optionally with the editor secret header.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    secret: Option<&str>,
) -> Response {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(secret) = secret {
        builder = builder.header("x-editor-secret", secret);
    }
    send(app, builder.body(Body::from(body.to_string())).unwrap()).await
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
