//! Response envelope shared by every adapter.
//!
//! Always `{ "ok": bool, "error"?: string, "kind"?: ErrorKind }`. Success
//! carries only `{ "ok": true }`.

use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
}

impl Envelope {
    pub fn success() -> Self {
        Self {
            ok: true,
            error: None,
            kind: None,
        }
    }

    pub fn failure(kind: ErrorKind, error: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(error.into()),
            kind: Some(kind),
        }
    }
}
