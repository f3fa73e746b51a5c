//! Core domain entities
//!
//! Plain data structures with validation and edit logic - no I/O beyond
//! reading an upload from disk.

pub mod coa;
pub mod result;
mod row;
mod statement;
mod upload;

pub use coa::{ChartOfAccounts, CoaEntry};
pub use row::{ConsolidatedRow, RowField};
pub use statement::{ConsolidatedMeta, ConsolidatedResult};
pub use upload::{PdfUpload, PDF_CONTENT_TYPE};
