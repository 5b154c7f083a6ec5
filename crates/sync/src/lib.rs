//! Batch synchronizer: turns one editor submission into an ordered series
//! of marker-checked writes against a [`catalog_store::RevisionStore`].

pub mod error;
pub mod report;
pub mod synchronizer;

pub use error::SyncError;
pub use report::SyncReport;
pub use synchronizer::{BatchSynchronizer, SyncLimits};
