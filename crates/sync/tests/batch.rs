//! Batch synchronization scenarios against the in-memory store.

use std::sync::atomic::{AtomicBool, Ordering};

use assert_matches::assert_matches;
use async_trait::async_trait;
use serde_json::json;

use catalog_core::asset::{Asset, MAX_ASSET_BASE64_LEN};
use catalog_core::catalog::CatalogDocument;
use catalog_core::error::ErrorKind;
use catalog_core::submission::Submission;
use catalog_store::{
    FailOn, MemoryStore, RevisionMarker, RevisionStore, StoreCall, StoreError, WriteReceipt,
};
use catalog_sync::{BatchSynchronizer, SyncError};

fn asset(name: &str, content: &str) -> Asset {
    Asset {
        filename: name.into(),
        content_base64: content.into(),
    }
}

fn catalog() -> CatalogDocument {
    serde_json::from_value(json!({
        "entries": [
            { "id": "tower-of-god", "title": "Tower of God", "genres": ["Fantasy"], "chapters": 600 }
        ]
    }))
    .unwrap()
}

#[tokio::test]
async fn new_image_on_empty_store_is_created_without_marker() {
    let sync = BatchSynchronizer::new(MemoryStore::new());
    let submission = Submission {
        catalog: None,
        assets: vec![asset("cover.png", "Zm9v")],
    };

    let report = sync.run(&submission).await.unwrap();

    assert_eq!(report.written_paths(), ["media/cover.png"]);
    assert_eq!(
        sync.store().calls().await,
        vec![
            StoreCall::ReadMarker {
                path: "media/cover.png".into()
            },
            StoreCall::Write {
                path: "media/cover.png".into(),
                message: "Add/Update image cover.png".into(),
                marker: None,
            },
        ]
    );
}

#[tokio::test]
async fn existing_catalog_is_updated_with_its_marker() {
    let store = MemoryStore::new();
    store.seed_with_marker("manhwas.json", "e30=", "abc123").await;
    let sync = BatchSynchronizer::new(store);

    let report = sync
        .run(&Submission {
            catalog: Some(catalog()),
            assets: vec![],
        })
        .await
        .unwrap();

    let receipt = report.catalog.unwrap();
    assert!(!receipt.created);
    assert_eq!(
        sync.store().calls().await[1],
        StoreCall::Write {
            path: "manhwas.json".into(),
            message: "Update manhwas.json".into(),
            marker: Some(RevisionMarker::new("abc123")),
        }
    );
    let stored = sync.store().file("manhwas.json").await.unwrap();
    assert_eq!(stored.content_base64, catalog().to_content_base64().unwrap());
}

#[tokio::test]
async fn resubmitting_the_same_catalog_is_idempotent() {
    let sync = BatchSynchronizer::new(MemoryStore::new());
    let submission = Submission {
        catalog: Some(catalog()),
        assets: vec![],
    };

    let mut contents = Vec::new();
    for _ in 0..3 {
        sync.run(&submission).await.unwrap();
        contents.push(sync.store().file("manhwas.json").await.unwrap().content_base64);
    }

    assert!(contents.windows(2).all(|w| w[0] == w[1]));
    let writes = sync
        .store()
        .calls()
        .await
        .into_iter()
        .filter(|c| matches!(c, StoreCall::Write { .. }))
        .count();
    assert_eq!(writes, 3);
}

#[tokio::test]
async fn asset_exactly_at_ceiling_is_accepted() {
    let sync = BatchSynchronizer::new(MemoryStore::new());
    let submission = Submission {
        catalog: None,
        assets: vec![asset("big.png", &"A".repeat(MAX_ASSET_BASE64_LEN))],
    };

    assert!(sync.run(&submission).await.is_ok());
}

#[tokio::test]
async fn asset_one_over_ceiling_is_rejected_before_any_call() {
    let sync = BatchSynchronizer::new(MemoryStore::new());
    let submission = Submission {
        catalog: Some(catalog()),
        assets: vec![
            asset("small.png", "Zm9v"),
            asset("big.png", &"A".repeat(MAX_ASSET_BASE64_LEN + 1)),
        ],
    };

    let err = sync.run(&submission).await.unwrap_err();

    assert_matches!(err, SyncError::InvalidAsset { index: 1, .. });
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(err.to_string().contains("too large"));
    assert!(sync.store().calls().await.is_empty());
}

#[tokio::test]
async fn failed_second_write_stops_the_batch() {
    let store = MemoryStore::new();
    store
        .inject_failure(FailOn::Write, "media/2.png", 500, "upstream exploded")
        .await;
    let sync = BatchSynchronizer::new(store);
    let submission = Submission {
        catalog: Some(catalog()),
        assets: vec![asset("1.png", "MQ=="), asset("2.png", "Mg=="), asset("3.png", "Mw==")],
    };

    let err = sync.run(&submission).await.unwrap_err();

    assert_matches!(err, SyncError::AssetWrite { index: 1, ref path, .. } if path == "media/2.png");
    assert_eq!(err.kind(), ErrorKind::Store);
    assert!(err.to_string().contains("upstream exploded"));

    let touched: Vec<String> = sync
        .store()
        .calls()
        .await
        .iter()
        .map(|c| c.path().to_string())
        .collect();
    assert!(!touched.iter().any(|p| p == "media/3.png" || p == "manhwas.json"));
    // No rollback of the first asset.
    assert!(sync.store().file("media/1.png").await.is_some());
    assert!(sync.store().file("media/2.png").await.is_none());
}

#[tokio::test]
async fn failed_marker_read_aborts_without_writing() {
    let store = MemoryStore::new();
    store
        .inject_failure(FailOn::Read, "manhwas.json", 401, "Bad credentials")
        .await;
    let sync = BatchSynchronizer::new(store);

    let err = sync
        .run(&Submission {
            catalog: Some(catalog()),
            assets: vec![],
        })
        .await
        .unwrap_err();

    assert_matches!(err, SyncError::CatalogWrite { .. });
    assert_matches!(err.store_error(), Some(StoreError::Api { status: 401, .. }));
    assert_eq!(sync.store().calls().await.len(), 1);
}

/// Store wrapper that lets an "external" writer update a path between the
/// synchronizer's marker read and its write.
struct RacingStore {
    inner: MemoryStore,
    raced: AtomicBool,
}

#[async_trait]
impl RevisionStore for RacingStore {
    async fn read_marker(&self, path: &str) -> Result<Option<RevisionMarker>, StoreError> {
        let marker = self.inner.read_marker(path).await?;
        if !self.raced.swap(true, Ordering::SeqCst) {
            self.inner
                .seed(path, "ZXh0ZXJuYWwgZWRpdA==")
                .await;
        }
        Ok(marker)
    }

    async fn write(
        &self,
        path: &str,
        content_base64: &str,
        message: &str,
        marker: Option<&RevisionMarker>,
    ) -> Result<WriteReceipt, StoreError> {
        self.inner.write(path, content_base64, message, marker).await
    }
}

#[tokio::test]
async fn concurrent_external_write_is_rejected_not_clobbered() {
    let inner = MemoryStore::new();
    inner.seed("manhwas.json", "e30=").await;
    let sync = BatchSynchronizer::new(RacingStore {
        inner,
        raced: AtomicBool::new(false),
    });

    let err = sync
        .run(&Submission {
            catalog: Some(catalog()),
            assets: vec![],
        })
        .await
        .unwrap_err();

    assert!(err.store_error().is_some_and(StoreError::is_conflict));
    let stored = sync.store().inner.file("manhwas.json").await.unwrap();
    assert_eq!(stored.content_base64, "ZXh0ZXJuYWwgZWRpdA==");
    // No retry: one read, one rejected write.
    assert_eq!(sync.store().inner.calls().await.len(), 2);
}
