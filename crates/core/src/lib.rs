//! Domain types and request gate for the catalog sync service.
//!
//! Everything here is transport- and store-agnostic: catalog and asset
//! models, the error taxonomy, the response envelope, and the gate that
//! admits or rejects editor requests.

pub mod asset;
pub mod catalog;
pub mod envelope;
pub mod error;
pub mod gate;
pub mod submission;
