//! Revision store client.
//!
//! Translates path-level read/write intents into calls against a
//! git-backed content store. [`RevisionStore`] is the seam the batch
//! synchronizer works against; [`GitHubContentsClient`] talks to the
//! hosting provider's REST contents API and [`MemoryStore`] keeps files
//! in process with the same optimistic-concurrency rules.

pub mod error;
pub mod github;
pub mod marker;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;

pub use error::StoreError;
pub use github::{GitHubConfig, GitHubContentsClient};
pub use marker::{RevisionMarker, WriteReceipt};
pub use memory::{FailOn, MemoryStore, StoreCall, CALL_LOG_CAPACITY};

/// Read and write single paths in a versioned content store.
///
/// Each call makes exactly one round trip. Nothing is cached and nothing
/// is retried.
#[async_trait]
pub trait RevisionStore: Send + Sync {
    /// Current marker for `path`, or `None` if the path does not exist.
    async fn read_marker(&self, path: &str) -> Result<Option<RevisionMarker>, StoreError>;

    /// Create or update `path`.
    ///
    /// `marker: None` asks the store to create the path. `Some(marker)`
    /// asks it to update, but only if the path is still at that revision.
    async fn write(
        &self,
        path: &str,
        content_base64: &str,
        message: &str,
        marker: Option<&RevisionMarker>,
    ) -> Result<WriteReceipt, StoreError>;
}

#[async_trait]
impl<T: RevisionStore + ?Sized> RevisionStore for Arc<T> {
    async fn read_marker(&self, path: &str) -> Result<Option<RevisionMarker>, StoreError> {
        (**self).read_marker(path).await
    }

    async fn write(
        &self,
        path: &str,
        content_base64: &str,
        message: &str,
        marker: Option<&RevisionMarker>,
    ) -> Result<WriteReceipt, StoreError> {
        (**self).write(path, content_base64, message, marker).await
    }
}
