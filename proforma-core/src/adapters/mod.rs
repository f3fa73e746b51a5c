//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - lopdf / pdf-extract for TextExtractor
//! - pdftoppm + tesseract executables for OcrEngine
//! - OpenAI Responses API for StatementMapper
//! - reqwest multipart client for ConsolidatorApi
//! - rust_xlsxwriter for the workbook export

pub mod http_api;
pub mod openai;
pub mod pdf_text;
pub mod tesseract;
pub mod xlsx;

#[cfg(test)]
pub mod openai_mock;
