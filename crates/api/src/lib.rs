//! Catalog editor API library.
//!
//! Exposes the building blocks (config, state, error handling, routes,
//! adapters) so the server binary, the function binary and integration
//! tests all use the same code.

pub mod adapters;
pub mod config;
pub mod error;
pub mod handlers;
pub mod response;
pub mod router;
pub mod routes;
pub mod service;
pub mod state;
