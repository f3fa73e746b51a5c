//! Embedded PDF text extraction
//!
//! Per-page extraction with lopdf, falling back to pdf-extract for whole
//! documents when lopdf yields little or nothing.

use lopdf::Document;
use tracing::debug;

use crate::domain::result::{Error, Result};
use crate::ports::TextExtractor;

/// Below this many characters the lopdf result is not trusted
const MIN_PRIMARY_CHARS: usize = 100;

#[derive(Debug, Default, Clone, Copy)]
pub struct PdfTextExtractor;

impl PdfTextExtractor {
    pub fn new() -> Self {
        Self
    }

    fn extract_pages(&self, pdf: &[u8], max_pages: usize) -> Result<String> {
        let doc = Document::load_mem(pdf)
            .map_err(|e| Error::Extraction(format!("Could not parse PDF: {}", e)))?;

        let mut parts = Vec::new();
        for page_number in doc.get_pages().keys().take(max_pages) {
            match doc.extract_text(&[*page_number]) {
                Ok(text) => parts.push(text),
                Err(e) => {
                    debug!(page = page_number, error = %e, "page text extraction failed");
                    parts.push(String::new());
                }
            }
        }

        Ok(parts.join("\n").trim().to_string())
    }
}

impl TextExtractor for PdfTextExtractor {
    fn extract_text(&self, pdf: &[u8], max_pages: usize) -> Result<String> {
        let primary = match self.extract_pages(pdf, max_pages) {
            Ok(text) => text,
            Err(e) => {
                debug!(error = %e, "lopdf extraction failed; falling back to pdf-extract");
                String::new()
            }
        };

        if primary.chars().count() > MIN_PRIMARY_CHARS {
            return Ok(primary);
        }

        // pdf-extract panics on some malformed fonts
        let fallback = match std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(pdf)) {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err("pdf-extract panicked".to_string()),
        };

        match fallback {
            Ok(text) => {
                let text = text.trim().to_string();
                if text.len() >= primary.len() {
                    Ok(text)
                } else {
                    Ok(primary)
                }
            }
            Err(e) if primary.is_empty() => Err(Error::Extraction(format!(
                "Could not extract text from PDF: {}",
                e
            ))),
            Err(_) => Ok(primary),
        }
    }
}
