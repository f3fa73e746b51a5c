//! Document text ports
//!
//! Both traits are synchronous; callers run them on a blocking thread.

use crate::domain::result::Result;

/// Pulls embedded text out of a PDF
pub trait TextExtractor: Send + Sync {
    /// Extract text from at most `max_pages` pages
    fn extract_text(&self, pdf: &[u8], max_pages: usize) -> Result<String>;
}

/// Recognises text on rendered PDF pages
pub trait OcrEngine: Send + Sync {
    /// OCR at most `max_pages` pages
    fn ocr_pdf(&self, pdf: &[u8], max_pages: usize) -> Result<String>;
}
