use catalog_core::error::{CoreError, ErrorKind};
use catalog_store::StoreError;

/// Why a synchronization run stopped.
///
/// Every variant aborts the batch. Writes that completed before the
/// failure stay in the store.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// An asset failed validation. Raised before any store call.
    #[error("images[{index}]: {source}")]
    InvalidAsset {
        index: usize,
        #[source]
        source: CoreError,
    },

    /// Reading the marker for, or writing, the asset at `index` failed.
    #[error("Image {filename} (images[{index}]) failed at {path}: {source}")]
    AssetWrite {
        index: usize,
        filename: String,
        path: String,
        #[source]
        source: StoreError,
    },

    /// A standalone upload failed validation.
    #[error(transparent)]
    InvalidUpload(CoreError),

    /// Reading the marker for, or writing, a standalone upload failed.
    #[error("Image {filename} failed at {path}: {source}")]
    UploadWrite {
        filename: String,
        path: String,
        #[source]
        source: StoreError,
    },

    /// Reading the marker for, or writing, the catalog failed.
    #[error("Catalog update failed at {path}: {source}")]
    CatalogWrite {
        path: String,
        #[source]
        source: StoreError,
    },

    /// The catalog could not be serialized.
    #[error("Catalog serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl SyncError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SyncError::InvalidAsset { .. } | SyncError::InvalidUpload(_) => ErrorKind::Validation,
            SyncError::AssetWrite { .. }
            | SyncError::UploadWrite { .. }
            | SyncError::CatalogWrite { .. }
            | SyncError::Serialize(_) => ErrorKind::Store,
        }
    }

    /// The underlying store error, if the failure came from the store.
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            SyncError::AssetWrite { source, .. }
            | SyncError::UploadWrite { source, .. }
            | SyncError::CatalogWrite { source, .. } => Some(source),
            _ => None,
        }
    }
}
