//! Adapters for hosting environments other than the axum server.

pub mod function;
