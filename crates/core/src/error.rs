use serde::{Deserialize, Serialize};

/// Coarse error classes surfaced to callers in the response envelope.
///
/// Lets an editor client tell "retry with the right secret" apart from
/// "fix your input" and "contact the operator".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Required credentials are missing. Every request fails until fixed.
    Configuration,
    /// Shared secret missing or wrong.
    Authorization,
    /// Malformed payload or oversized asset.
    Validation,
    /// The content store rejected or failed a read/write.
    Store,
    /// The request used a method other than `POST`.
    Method,
}

impl ErrorKind {
    /// HTTP status code used for this class of error.
    pub fn status_code(self) -> u16 {
        match self {
            ErrorKind::Configuration | ErrorKind::Store => 500,
            ErrorKind::Authorization => 401,
            ErrorKind::Validation => 400,
            ErrorKind::Method => 405,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Validation(String),

    #[error("Method not allowed")]
    MethodNotAllowed,
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::Unauthorized(_) => ErrorKind::Authorization,
            CoreError::Validation(_) => ErrorKind::Validation,
            CoreError::MethodNotAllowed => ErrorKind::Method,
        }
    }
}
