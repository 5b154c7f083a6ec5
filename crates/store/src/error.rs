/// Errors from the revision store layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The store answered with an unexpected status code.
    #[error("Content store error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body, surfaced to the caller verbatim.
        body: String,
    },

    /// A request URL could not be built from the configured base and path.
    #[error("Invalid store URL: {0}")]
    InvalidUrl(String),

    /// A success response did not have the expected shape.
    #[error("Unexpected store response for {path}: {reason}")]
    Decode { path: String, reason: String },
}

impl StoreError {
    /// True when the store rejected a write because the supplied revision
    /// marker was stale or missing.
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Api { status, .. } if *status == 409 || *status == 422)
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            StoreError::Api { status, .. } => Some(*status),
            StoreError::Request(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
