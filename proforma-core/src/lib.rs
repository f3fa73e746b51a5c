//! Proforma Core - Business logic for the pro forma statement consolidator
//!
//! This crate implements the core domain logic following hexagonal architecture:
//!
//! - **domain**: Core entities (ConsolidatedRow, ConsolidatedResult, ChartOfAccounts)
//! - **ports**: Trait definitions for external collaborators (TextExtractor, StatementMapper, ...)
//! - **services**: Business logic orchestration (consolidate, export, workbench)
//! - **adapters**: Concrete implementations (lopdf, Tesseract, OpenAI, rust_xlsxwriter, reqwest)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod services;

use std::sync::Arc;

use anyhow::{Context, Result};

use adapters::openai::OpenAiMapper;
use adapters::pdf_text::PdfTextExtractor;
use adapters::tesseract::TesseractOcr;
use config::Config;
use ports::{OcrEngine, StatementMapper, TextExtractor};
use services::{ConsolidateService, ExportService};

// Re-export commonly used types at crate root
pub use domain::result::Error;
pub use domain::{ChartOfAccounts, ConsolidatedMeta, ConsolidatedResult, ConsolidatedRow, PdfUpload, RowField};

/// Main context for backend operations
///
/// Holds the configuration and the services wired to their adapters.
/// Cheap to share behind an `Arc` across request handlers.
pub struct ConsolidatorContext {
    pub config: Config,
    pub consolidate_service: ConsolidateService,
    pub export_service: ExportService,
}

impl ConsolidatorContext {
    /// Wire the production adapters from configuration
    pub fn new(config: Config) -> Result<Self> {
        let mapper = OpenAiMapper::new(&config.llm).context("Failed to set up OpenAI mapper")?;
        let ocr = TesseractOcr::new(&config.ocr);
        Ok(Self::with_components(
            config,
            Arc::new(PdfTextExtractor::new()),
            Arc::new(ocr),
            Arc::new(mapper),
        ))
    }

    /// Wire explicit adapters (used by tests and alternative deployments)
    pub fn with_components(
        config: Config,
        extractor: Arc<dyn TextExtractor>,
        ocr: Arc<dyn OcrEngine>,
        mapper: Arc<dyn StatementMapper>,
    ) -> Self {
        let consolidate_service = ConsolidateService::new(extractor, ocr, mapper, config.limits);
        Self {
            config,
            consolidate_service,
            export_service: ExportService::new(),
        }
    }
}
