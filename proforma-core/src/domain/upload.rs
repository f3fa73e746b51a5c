use std::path::Path;

use super::result::Result;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// One uploaded file part
#[derive(Debug, Clone, PartialEq)]
pub struct PdfUpload {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl PdfUpload {
    pub fn new(filename: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Read a file from disk, guessing its content type from the extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();
        let content_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .to_string();
        Ok(Self::new(filename, content_type, bytes))
    }

    pub fn is_pdf(&self) -> bool {
        self.content_type == PDF_CONTENT_TYPE
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
