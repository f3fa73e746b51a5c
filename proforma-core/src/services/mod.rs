//! Service layer
//!
//! `ConsolidateService` and `ExportService` back the HTTP routes; `Workbench`
//! drives them from the client side through a `ConsolidatorApi`.

mod consolidate;
pub mod export;
pub mod workbench;

pub use consolidate::{ConsolidateService, MIN_TEXT_CHARS};
pub use export::{ExportService, XlsxExport};
pub use workbench::{Download, Phase, Workbench};
