use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque token naming the last observed state of a stored file (the
/// provider's blob hash).
///
/// Passed back on writes so the store can refuse updates based on stale
/// state. Never cached across synchronization runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RevisionMarker(String);

impl RevisionMarker {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RevisionMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of a successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReceipt {
    pub path: String,
    /// `true` when the write created the path (no marker was supplied).
    pub created: bool,
    /// Marker of the new content, when the store reports one.
    pub marker: Option<RevisionMarker>,
}
