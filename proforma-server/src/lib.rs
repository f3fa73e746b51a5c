//! Proforma Server - HTTP surfaces for the consolidator
//!
//! - **backend**: the consolidation API (health, consolidate, export)
//! - **proxy**: same-origin routes that forward to the backend
//! - **error**: `{"detail": ...}` error responses

pub mod backend;
pub mod error;
pub mod proxy;

pub use error::ApiError;
pub use proxy::ProxyState;
