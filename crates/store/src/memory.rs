//! In-process revision store.
//!
//! Applies the same marker rules the hosting provider enforces, so the
//! synchronizer behaves identically against it:
//!
//! - update of an existing path without a marker: 422
//! - update with a marker that is not the current one: 409
//! - marker supplied for a path that does not exist: 409
//!
//! The most recent [`CALL_LOG_CAPACITY`] calls are recorded, and failures
//! can be injected per path. Used by tests and by the server's `memory`
//! backend for dry runs.

use std::collections::{BTreeMap, HashMap, VecDeque};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::marker::{RevisionMarker, WriteReceipt};
use crate::RevisionStore;

/// Calls kept by a [`MemoryStore`]; older calls are dropped first.
pub const CALL_LOG_CAPACITY: usize = 1024;

/// A call observed by a [`MemoryStore`], in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    ReadMarker {
        path: String,
    },
    Write {
        path: String,
        message: String,
        marker: Option<RevisionMarker>,
    },
}

impl StoreCall {
    pub fn path(&self) -> &str {
        match self {
            StoreCall::ReadMarker { path } | StoreCall::Write { path, .. } => path,
        }
    }
}

/// Which operation an injected failure applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailOn {
    Read,
    Write,
}

/// A file held by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub content_base64: String,
    pub marker: RevisionMarker,
    /// Message of the write that produced this revision.
    pub message: String,
}

#[derive(Default)]
struct Inner {
    files: BTreeMap<String, StoredFile>,
    calls: VecDeque<StoreCall>,
    failures: HashMap<(FailOn, String), (u16, String)>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a file in place without recording a call. Returns its marker.
    pub async fn seed(&self, path: &str, content_base64: &str) -> RevisionMarker {
        let marker = marker_for(content_base64);
        let file = StoredFile {
            content_base64: content_base64.to_string(),
            marker: marker.clone(),
            message: "seed".to_string(),
        };
        self.inner.lock().await.files.insert(path.to_string(), file);
        marker
    }

    /// Put a file in place under a caller-chosen marker.
    pub async fn seed_with_marker(&self, path: &str, content_base64: &str, marker: &str) {
        let file = StoredFile {
            content_base64: content_base64.to_string(),
            marker: RevisionMarker::new(marker),
            message: "seed".to_string(),
        };
        self.inner.lock().await.files.insert(path.to_string(), file);
    }

    /// Make every `op` on `path` fail with the given status and body.
    pub async fn inject_failure(&self, op: FailOn, path: &str, status: u16, body: &str) {
        self.inner
            .lock()
            .await
            .failures
            .insert((op, path.to_string()), (status, body.to_string()));
    }

    pub async fn file(&self, path: &str) -> Option<StoredFile> {
        self.inner.lock().await.files.get(path).cloned()
    }

    pub async fn paths(&self) -> Vec<String> {
        self.inner.lock().await.files.keys().cloned().collect()
    }

    /// Recorded calls, oldest first.
    pub async fn calls(&self) -> Vec<StoreCall> {
        self.inner.lock().await.calls.iter().cloned().collect()
    }
}

impl Inner {
    fn record(&mut self, call: StoreCall) {
        if self.calls.len() == CALL_LOG_CAPACITY {
            self.calls.pop_front();
        }
        self.calls.push_back(call);
    }
}

/// Content-addressed marker, so identical content yields an identical marker.
fn marker_for(content_base64: &str) -> RevisionMarker {
    let mut hasher = Sha256::new();
    hasher.update(format!("blob {}\0", content_base64.len()).as_bytes());
    hasher.update(content_base64.as_bytes());
    RevisionMarker::new(format!("{:x}", hasher.finalize()))
}

fn injected(inner: &Inner, op: FailOn, path: &str) -> Option<StoreError> {
    inner
        .failures
        .get(&(op, path.to_string()))
        .map(|(status, body)| StoreError::Api {
            status: *status,
            body: body.clone(),
        })
}

#[async_trait]
impl RevisionStore for MemoryStore {
    async fn read_marker(&self, path: &str) -> Result<Option<RevisionMarker>, StoreError> {
        let mut inner = self.inner.lock().await;
        inner.record(StoreCall::ReadMarker {
            path: path.to_string(),
        });

        if let Some(err) = injected(&inner, FailOn::Read, path) {
            return Err(err);
        }
        Ok(inner.files.get(path).map(|f| f.marker.clone()))
    }

    async fn write(
        &self,
        path: &str,
        content_base64: &str,
        message: &str,
        marker: Option<&RevisionMarker>,
    ) -> Result<WriteReceipt, StoreError> {
        let mut inner = self.inner.lock().await;
        inner.record(StoreCall::Write {
            path: path.to_string(),
            message: message.to_string(),
            marker: marker.cloned(),
        });

        if let Some(err) = injected(&inner, FailOn::Write, path) {
            return Err(err);
        }

        let current = inner.files.get(path).map(|f| &f.marker);
        match (current, marker) {
            (Some(_), None) => {
                return Err(StoreError::Api {
                    status: 422,
                    body: format!(r#"{{"message":"Invalid request. \"sha\" wasn't supplied for {path}."}}"#),
                });
            }
            (Some(current), Some(given)) if current != given => {
                return Err(StoreError::Api {
                    status: 409,
                    body: format!(r#"{{"message":"{path} does not match {given}"}}"#),
                });
            }
            (None, Some(given)) => {
                return Err(StoreError::Api {
                    status: 409,
                    body: format!(r#"{{"message":"{path} does not exist at {given}"}}"#),
                });
            }
            _ => {}
        }

        let new_marker = marker_for(content_base64);
        inner.files.insert(
            path.to_string(),
            StoredFile {
                content_base64: content_base64.to_string(),
                marker: new_marker.clone(),
                message: message.to_string(),
            },
        );

        Ok(WriteReceipt {
            path: path.to_string(),
            created: marker.is_none(),
            marker: Some(new_marker),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn absent_path_reads_none_and_create_succeeds() {
        let store = MemoryStore::new();
        assert_eq!(store.read_marker("media/a.png").await.unwrap(), None);

        let receipt = store
            .write("media/a.png", "Zm9v", "Add/Update image a.png", None)
            .await
            .unwrap();
        assert!(receipt.created);
        assert_eq!(
            store.file("media/a.png").await.unwrap().content_base64,
            "Zm9v"
        );
    }

    #[tokio::test]
    async fn update_with_current_marker_succeeds() {
        let store = MemoryStore::new();
        let marker = store.seed("manhwas.json", "e30=").await;

        let receipt = store
            .write("manhwas.json", "W10=", "Update manhwas.json", Some(&marker))
            .await
            .unwrap();
        assert!(!receipt.created);
        assert_ne!(receipt.marker, Some(marker));
    }

    #[tokio::test]
    async fn stale_marker_is_a_conflict() {
        let store = MemoryStore::new();
        store.seed("manhwas.json", "e30=").await;

        let err = store
            .write(
                "manhwas.json",
                "W10=",
                "Update manhwas.json",
                Some(&RevisionMarker::new("stale")),
            )
            .await
            .unwrap_err();
        assert_matches!(err, StoreError::Api { status: 409, .. });
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn create_over_existing_path_is_rejected() {
        let store = MemoryStore::new();
        store.seed("media/a.png", "Zm9v").await;

        let err = store
            .write("media/a.png", "YmFy", "Add/Update image a.png", None)
            .await
            .unwrap_err();
        assert_matches!(err, StoreError::Api { status: 422, .. });
        assert_eq!(store.file("media/a.png").await.unwrap().content_base64, "Zm9v");
    }

    #[tokio::test]
    async fn marker_for_missing_path_is_rejected() {
        let store = MemoryStore::new();
        let err = store
            .write("a", "Zm9v", "m", Some(&RevisionMarker::new("abc")))
            .await
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn identical_content_yields_identical_marker() {
        let store = MemoryStore::new();
        let a = store.seed("a", "Zm9v").await;
        let b = store.seed("b", "Zm9v").await;
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn injected_failures_are_recorded_calls() {
        let store = MemoryStore::new();
        store
            .inject_failure(FailOn::Read, "x", 401, "Bad credentials")
            .await;

        let err = store.read_marker("x").await.unwrap_err();
        assert_matches!(err, StoreError::Api { status: 401, ref body } if body == "Bad credentials");
        assert_eq!(
            store.calls().await,
            vec![StoreCall::ReadMarker { path: "x".into() }]
        );
    }

    #[tokio::test]
    async fn call_log_keeps_only_the_most_recent_calls() {
        let store = MemoryStore::new();
        for i in 0..CALL_LOG_CAPACITY + 6 {
            store.read_marker(&format!("media/{i}.png")).await.unwrap();
        }

        let calls = store.calls().await;
        assert_eq!(calls.len(), CALL_LOG_CAPACITY);
        assert_eq!(calls[0].path(), "media/6.png");
        assert_eq!(
            calls.last().map(StoreCall::path),
            Some(format!("media/{}.png", CALL_LOG_CAPACITY + 5).as_str())
        );
    }
}
