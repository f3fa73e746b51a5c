//! OCR through Poppler's `pdftoppm` and the Tesseract CLI
//!
//! Pages are rasterised into a temporary directory, then each image is fed
//! to `tesseract <image> stdout`.

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;
use tracing::debug;

use crate::config::OcrSettings;
use crate::domain::result::{Error, Result};
use crate::ports::OcrEngine;

const RENDER_DPI: &str = "200";

#[derive(Debug, Clone)]
pub struct TesseractOcr {
    pdftoppm_bin: String,
    tesseract_bin: String,
}

impl TesseractOcr {
    pub fn new(settings: &OcrSettings) -> Self {
        Self {
            pdftoppm_bin: settings.pdftoppm_bin.clone(),
            tesseract_bin: settings.tesseract_bin.clone(),
        }
    }

    fn render_pages(&self, pdf_path: &Path, out_dir: &Path, max_pages: usize) -> Result<Vec<PathBuf>> {
        let prefix = out_dir.join("page");
        let output = Command::new(&self.pdftoppm_bin)
            .arg("-r")
            .arg(RENDER_DPI)
            .arg("-f")
            .arg("1")
            .arg("-l")
            .arg(max_pages.to_string())
            .arg("-png")
            .arg(pdf_path)
            .arg(&prefix)
            .output()
            .map_err(|e| Error::Ocr(format!("Could not run {}: {}", self.pdftoppm_bin, e)))?;

        if !output.status.success() {
            return Err(Error::Ocr(format!(
                "{} failed: {}",
                self.pdftoppm_bin,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let mut pages: Vec<PathBuf> = std::fs::read_dir(out_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("png"))
            .collect();
        // pdftoppm zero-pads page numbers, so lexical order is page order
        pages.sort();
        Ok(pages)
    }

    fn recognise(&self, image: &Path) -> Result<String> {
        let output = Command::new(&self.tesseract_bin)
            .arg(image)
            .arg("stdout")
            .output()
            .map_err(|e| Error::Ocr(format!("Could not run {}: {}", self.tesseract_bin, e)))?;

        if !output.status.success() {
            return Err(Error::Ocr(format!(
                "{} failed: {}",
                self.tesseract_bin,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl OcrEngine for TesseractOcr {
    fn ocr_pdf(&self, pdf: &[u8], max_pages: usize) -> Result<String> {
        if max_pages == 0 {
            return Ok(String::new());
        }

        let work_dir = TempDir::new()?;
        let pdf_path = work_dir.path().join("input.pdf");
        std::fs::write(&pdf_path, pdf)?;

        let images_dir = work_dir.path().join("pages");
        std::fs::create_dir(&images_dir)?;

        let pages = self.render_pages(&pdf_path, &images_dir, max_pages)?;
        debug!(pages = pages.len(), "rendered pages for OCR");

        let mut text = String::new();
        for page in pages {
            text.push('\n');
            text.push_str(&self.recognise(&page)?);
        }
        Ok(text.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_binary_is_ocr_error() {
        let ocr = TesseractOcr::new(&OcrSettings {
            pdftoppm_bin: "/nonexistent/pdftoppm".to_string(),
            tesseract_bin: "/nonexistent/tesseract".to_string(),
        });
        let result = ocr.ocr_pdf(b"%PDF-1.5", 3);
        match result {
            Err(Error::Ocr(msg)) => assert!(msg.contains("/nonexistent/pdftoppm")),
            other => panic!("expected OCR error, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_pages_is_empty() {
        let ocr = TesseractOcr::new(&OcrSettings::default());
        assert_eq!(ocr.ocr_pdf(b"%PDF-1.5", 0).unwrap(), "");
    }
}
