//! Ordered read-then-write of one submission.
//!
//! Assets are written first, in submission order, then the catalog. Each
//! path gets a fresh marker read immediately before its write, and the
//! next path is only touched once that write returned. The first failure
//! ends the run.

use catalog_core::asset::{Asset, MAX_ASSET_BASE64_LEN};
use catalog_core::catalog::{CatalogDocument, CATALOG_COMMIT_MESSAGE, CATALOG_PATH};
use catalog_core::submission::Submission;
use catalog_store::{RevisionStore, StoreError, WriteReceipt};

use crate::error::SyncError;
use crate::report::SyncReport;

/// Size limits applied before any store call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncLimits {
    /// Largest accepted asset payload, in base64 characters.
    pub max_asset_base64_len: usize,
}

impl Default for SyncLimits {
    fn default() -> Self {
        Self {
            max_asset_base64_len: MAX_ASSET_BASE64_LEN,
        }
    }
}

pub struct BatchSynchronizer<S> {
    store: S,
    limits: SyncLimits,
}

impl<S: RevisionStore> BatchSynchronizer<S> {
    pub fn new(store: S) -> Self {
        Self::with_limits(store, SyncLimits::default())
    }

    pub fn with_limits(store: S, limits: SyncLimits) -> Self {
        Self { store, limits }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn limits(&self) -> SyncLimits {
        self.limits
    }

    /// Validate every asset. Runs in full before the first store call so an
    /// invalid asset anywhere in the batch means nothing is written.
    pub fn validate(&self, submission: &Submission) -> Result<(), SyncError> {
        for (index, asset) in submission.assets.iter().enumerate() {
            asset
                .validate(self.limits.max_asset_base64_len)
                .map_err(|source| SyncError::InvalidAsset { index, source })?;
        }
        Ok(())
    }

    /// Synchronize one submission.
    ///
    /// No rollback: assets written before a failure stay written, and the
    /// store's history is the recovery log.
    pub async fn run(&self, submission: &Submission) -> Result<SyncReport, SyncError> {
        self.validate(submission)?;

        let mut report = SyncReport::default();

        for (index, asset) in submission.assets.iter().enumerate() {
            let path = asset.destination_path();
            let receipt = self
                .sync_path(&path, &asset.content_base64, &asset.batch_commit_message())
                .await
                .map_err(|source| {
                    tracing::warn!(
                        index,
                        path = %path,
                        error = %source,
                        written = report.write_count(),
                        "Asset write failed, aborting batch",
                    );
                    SyncError::AssetWrite {
                        index,
                        filename: asset.filename.clone(),
                        path: path.clone(),
                        source,
                    }
                })?;
            report.assets.push(receipt);
        }

        if let Some(catalog) = &submission.catalog {
            let receipt = self.write_catalog(catalog).await.inspect_err(|err| {
                tracing::warn!(
                    error = %err,
                    written = report.write_count(),
                    "Catalog write failed",
                );
            })?;
            report.catalog = Some(receipt);
        }

        tracing::info!(
            writes = report.write_count(),
            created = report.created_count(),
            "Submission synchronized",
        );
        Ok(report)
    }

    /// Validate and write a single asset, as the standalone image upload
    /// endpoint does.
    pub async fn upload_single(&self, asset: &Asset) -> Result<WriteReceipt, SyncError> {
        asset
            .validate(self.limits.max_asset_base64_len)
            .map_err(SyncError::InvalidUpload)?;

        let path = asset.destination_path();
        self.sync_path(&path, &asset.content_base64, &asset.upload_commit_message())
            .await
            .map_err(|source| SyncError::UploadWrite {
                filename: asset.filename.clone(),
                path,
                source,
            })
    }

    async fn write_catalog(&self, catalog: &CatalogDocument) -> Result<WriteReceipt, SyncError> {
        let duplicates = catalog.duplicate_ids();
        if !duplicates.is_empty() {
            tracing::warn!(
                ids = ?duplicates,
                "Catalog contains duplicate entry ids; detail views may resolve the wrong entry",
            );
        }

        let content = catalog.to_content_base64()?;
        self.sync_path(CATALOG_PATH, &content, CATALOG_COMMIT_MESSAGE)
            .await
            .map_err(|source| SyncError::CatalogWrite {
                path: CATALOG_PATH.to_string(),
                source,
            })
    }

    /// Read the current marker for `path`, then write with it.
    async fn sync_path(
        &self,
        path: &str,
        content_base64: &str,
        message: &str,
    ) -> Result<WriteReceipt, StoreError> {
        let marker = self.store.read_marker(path).await?;
        let receipt = self
            .store
            .write(path, content_base64, message, marker.as_ref())
            .await?;
        tracing::info!(path, created = receipt.created, "Wrote path");
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use catalog_core::error::CoreError;
    use catalog_store::{MemoryStore, StoreCall};

    fn asset(name: &str, content: &str) -> Asset {
        Asset {
            filename: name.into(),
            content_base64: content.into(),
        }
    }

    #[tokio::test]
    async fn empty_submission_makes_no_calls() {
        let sync = BatchSynchronizer::new(MemoryStore::new());
        let report = sync.run(&Submission::default()).await.unwrap();
        assert_eq!(report.write_count(), 0);
        assert!(sync.store().calls().await.is_empty());
    }

    #[tokio::test]
    async fn every_write_is_preceded_by_a_read_of_the_same_path() {
        let sync = BatchSynchronizer::new(MemoryStore::new());
        let submission = Submission {
            catalog: Some(CatalogDocument::default()),
            assets: vec![asset("a.png", "YQ=="), asset("b.png", "Yg==")],
        };
        sync.run(&submission).await.unwrap();

        let calls = sync.store().calls().await;
        assert_eq!(calls.len(), 6);
        for pair in calls.chunks(2) {
            assert_matches!(&pair[0], StoreCall::ReadMarker { .. });
            assert_matches!(&pair[1], StoreCall::Write { .. });
            assert_eq!(pair[0].path(), pair[1].path());
        }
        let order: Vec<_> = calls.iter().step_by(2).map(StoreCall::path).collect();
        assert_eq!(order, ["media/a.png", "media/b.png", "manhwas.json"]);
    }

    #[tokio::test]
    async fn custom_limit_applies() {
        let sync = BatchSynchronizer::with_limits(
            MemoryStore::new(),
            SyncLimits {
                max_asset_base64_len: 4,
            },
        );
        let submission = Submission {
            catalog: None,
            assets: vec![asset("ok.png", "Zm9v"), asset("big.png", "Zm9vYg==")],
        };
        let err = sync.run(&submission).await.unwrap_err();
        assert_matches!(err, SyncError::InvalidAsset { index: 1, source: CoreError::Validation(_) });
        assert!(sync.store().calls().await.is_empty());
    }

    #[tokio::test]
    async fn upload_single_uses_upload_message() {
        let sync = BatchSynchronizer::new(MemoryStore::new());
        let receipt = sync.upload_single(&asset("x.png", "eA==")).await.unwrap();
        assert_eq!(receipt.path, "media/x.png");
        assert_eq!(
            sync.store().file("media/x.png").await.unwrap().message,
            "Upload x.png"
        );
    }

    #[tokio::test]
    async fn upload_single_rejects_traversal_without_calls() {
        let sync = BatchSynchronizer::new(MemoryStore::new());
        let err = sync
            .upload_single(&asset("../index.html", "eA=="))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), catalog_core::error::ErrorKind::Validation);
        assert!(!err.to_string().contains("images["), "{err}");
        assert!(sync.store().calls().await.is_empty());
    }

    #[tokio::test]
    async fn upload_single_store_failure_names_file_without_index() {
        let store = MemoryStore::new();
        store
            .inject_failure(catalog_store::FailOn::Write, "media/x.png", 403, "forbidden")
            .await;
        let sync = BatchSynchronizer::new(store);

        let err = sync.upload_single(&asset("x.png", "eA==")).await.unwrap_err();

        assert_matches!(err, SyncError::UploadWrite { ref path, .. } if path == "media/x.png");
        assert_eq!(
            err.to_string(),
            "Image x.png failed at media/x.png: Content store error (403): forbidden"
        );
    }
}
