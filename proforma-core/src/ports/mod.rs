//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external collaborators. Services depend
//! only on these traits, not on concrete implementations.

mod api;
mod extraction;
mod mapper;

pub use api::{ApiResponse, ConsolidatorApi};
pub use extraction::{OcrEngine, TextExtractor};
pub use mapper::StatementMapper;
