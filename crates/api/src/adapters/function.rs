//! Serverless function adapter.
//!
//! Translates a function-platform event (`{ httpMethod, headers, body }`)
//! into the shared editor pipeline and back into
//! `{ statusCode, headers, body }`. Every response carries CORS headers,
//! since the editor page is usually served from another origin.
//!
//! A function runtime has no startup phase that can refuse to boot, so a
//! configuration error is kept and answered as a 500 with
//! `kind: "configuration"` on every `POST` until it is fixed. Preflights
//! and wrong methods are answered without looking at the configuration.

use std::collections::{BTreeMap, HashMap};

use axum::http::StatusCode;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use catalog_core::envelope::Envelope;
use catalog_core::error::CoreError;
use catalog_core::gate::{Admission, GateRequest, SECRET_HEADER};
use serde::{Deserialize, Serialize};

use crate::config::{AppConfig, ConfigError};
use crate::error::AppError;
use crate::service;
use crate::state::AppState;

/// Which editor operation a function deployment serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum FunctionRoute {
    Commit,
    UploadImage,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionEvent {
    pub http_method: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub is_base64_encoded: bool,
}

impl FunctionEvent {
    /// Header lookup ignoring case; platforms differ in how they normalize.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl FunctionResponse {
    fn empty(status_code: u16) -> Self {
        Self {
            status_code,
            headers: cors_headers(),
            body: String::new(),
        }
    }

    fn method_not_allowed(envelope: &Envelope) -> Self {
        let mut response = Self::json(405, envelope);
        response
            .headers
            .insert("Allow".into(), "POST, OPTIONS".into());
        response
    }

    fn json(status_code: u16, envelope: &Envelope) -> Self {
        let mut headers = cors_headers();
        headers.insert("Content-Type".into(), "application/json".into());
        Self {
            status_code,
            headers,
            body: serde_json::to_string(envelope)
                .unwrap_or_else(|_| r#"{"ok":false}"#.to_string()),
        }
    }
}

fn cors_headers() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("Access-Control-Allow-Origin".to_string(), "*".to_string()),
        (
            "Access-Control-Allow-Headers".to_string(),
            format!("Content-Type, {SECRET_HEADER}"),
        ),
        (
            "Access-Control-Allow-Methods".to_string(),
            "POST, OPTIONS".to_string(),
        ),
    ])
}

pub struct FunctionRuntime {
    state: Result<AppState, ConfigError>,
}

impl FunctionRuntime {
    /// Load configuration from the environment, keeping any error for
    /// per-invocation reporting.
    pub fn from_env() -> Self {
        let state = AppConfig::from_env().and_then(|config| {
            AppState::new(config).map_err(|e| ConfigError::StoreClient(e.to_string()))
        });
        if let Err(err) = &state {
            tracing::error!(error = %err, "Function started without a usable configuration");
        }
        Self { state }
    }

    pub fn new(state: AppState) -> Self {
        Self { state: Ok(state) }
    }

    pub fn misconfigured(err: ConfigError) -> Self {
        Self { state: Err(err) }
    }

    pub async fn invoke(&self, route: FunctionRoute, event: &FunctionEvent) -> FunctionResponse {
        match self.handle(route, event).await {
            Ok(Admission::Preflight) => FunctionResponse::empty(200),
            Ok(Admission::Proceed(())) => FunctionResponse::json(200, &Envelope::success()),
            Err(err) => {
                let (status, envelope) = err.into_parts();
                if status == StatusCode::METHOD_NOT_ALLOWED {
                    FunctionResponse::method_not_allowed(&envelope)
                } else {
                    FunctionResponse::json(status.as_u16(), &envelope)
                }
            }
        }
    }

    async fn handle(
        &self,
        route: FunctionRoute,
        event: &FunctionEvent,
    ) -> Result<Admission<()>, AppError> {
        // Method checks run before the configuration check.
        if event.http_method.eq_ignore_ascii_case("OPTIONS") {
            return Ok(Admission::Preflight);
        }
        if !event.http_method.eq_ignore_ascii_case("POST") {
            return Err(CoreError::MethodNotAllowed.into());
        }

        let state = self.state.as_ref().map_err(|err| AppError::Config(err.clone()))?;

        let body = decode_body(event)?;
        let request = GateRequest {
            method: &event.http_method,
            secret_header: event.header(SECRET_HEADER),
            content_type: event.header("content-type"),
            body: &body,
        };

        let admission = match route {
            FunctionRoute::Commit => match service::commit(state, request).await? {
                Admission::Preflight => Admission::Preflight,
                Admission::Proceed(_) => Admission::Proceed(()),
            },
            FunctionRoute::UploadImage => match service::upload_image(state, request).await? {
                Admission::Preflight => Admission::Preflight,
                Admission::Proceed(_) => Admission::Proceed(()),
            },
        };
        Ok(admission)
    }
}

fn decode_body(event: &FunctionEvent) -> Result<Vec<u8>, CoreError> {
    let raw = event.body.as_deref().unwrap_or_default();
    if event.is_base64_encoded {
        STANDARD
            .decode(raw)
            .map_err(|e| CoreError::Validation(format!("Invalid base64 request body: {e}")))
    } else {
        Ok(raw.as_bytes().to_vec())
    }
}
