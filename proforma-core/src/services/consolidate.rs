//! Consolidate service - uploaded PDFs in, COA-mapped rows out
//!
//! Per file: skip non-PDFs, enforce the running byte budget, extract the
//! embedded text, fall back to OCR for scanned documents. The surviving
//! texts are joined under `--- FILE: name ---` banners and handed to the
//! statement mapper together with every warning raised along the way.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::Limits;
use crate::domain::result::{Error, Result};
use crate::domain::{ChartOfAccounts, ConsolidatedResult, PdfUpload};
use crate::ports::{OcrEngine, StatementMapper, TextExtractor};

/// Extracted text shorter than this is treated as a scan and OCR'd
pub const MIN_TEXT_CHARS: usize = 300;

/// Outcome of extracting one document
#[derive(Debug, Default)]
struct DocumentText {
    text: Option<String>,
    warnings: Vec<String>,
}

pub struct ConsolidateService {
    extractor: Arc<dyn TextExtractor>,
    ocr: Arc<dyn OcrEngine>,
    mapper: Arc<dyn StatementMapper>,
    limits: Limits,
}

impl ConsolidateService {
    pub fn new(
        extractor: Arc<dyn TextExtractor>,
        ocr: Arc<dyn OcrEngine>,
        mapper: Arc<dyn StatementMapper>,
        limits: Limits,
    ) -> Self {
        Self {
            extractor,
            ocr,
            mapper,
            limits,
        }
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    /// Run the whole pipeline for one request
    pub async fn consolidate(
        &self,
        uploads: Vec<PdfUpload>,
        coa_csv: &str,
    ) -> Result<ConsolidatedResult> {
        let run_id = Uuid::new_v4();
        self.run(uploads, coa_csv)
            .instrument(info_span!("consolidate", %run_id))
            .await
    }

    async fn run(&self, uploads: Vec<PdfUpload>, coa_csv: &str) -> Result<ConsolidatedResult> {
        let started = Instant::now();
        if uploads.is_empty() {
            return Err(Error::validation("No PDFs uploaded"));
        }

        let file_count = uploads.len();
        let byte_limit = self.limits.total_bytes();
        let mut total_bytes: u64 = 0;
        let mut warnings: Vec<String> = Vec::new();
        let mut sections: Vec<String> = Vec::new();

        for upload in uploads {
            if !upload.is_pdf() {
                warn!(file = %upload.filename, content_type = %upload.content_type, "skipping non-PDF upload");
                warnings.push(format!("Skipped non-PDF file: {}", upload.filename));
                continue;
            }

            total_bytes += upload.len() as u64;
            if total_bytes > byte_limit {
                return Err(Error::PayloadTooLarge(format!(
                    "Total file size exceeds {}MB",
                    self.limits.max_file_mb
                )));
            }

            let filename = upload.filename.clone();
            let document = self.extract(upload).await;
            warnings.extend(document.warnings);
            if let Some(text) = document.text {
                sections.push(format!("\n--- FILE: {} ---\n{}", filename, text));
            }
        }

        if sections.is_empty() {
            return Err(Error::validation(
                "Could not extract text from any uploaded PDF",
            ));
        }

        let joined = sections.join("\n");
        debug!(
            mapper = self.mapper.name(),
            documents = sections.len(),
            chars = joined.chars().count(),
            "mapping extracted text"
        );

        let mut result = self.mapper.consolidate(&joined, coa_csv, &warnings).await?;
        result.merge_warnings(&warnings);
        flag_unknown_codes(&mut result, coa_csv);

        info!(
            files = file_count,
            total_bytes,
            elapsed = %format!("{:.2}s", started.elapsed().as_secs_f64()),
            "consolidate finished"
        );
        Ok(result)
    }

    /// Extract one document on the blocking pool
    async fn extract(&self, upload: PdfUpload) -> DocumentText {
        let extractor = Arc::clone(&self.extractor);
        let ocr = Arc::clone(&self.ocr);
        let max_pages = self.limits.max_pages;
        let filename = upload.filename.clone();

        let task = tokio::task::spawn_blocking(move || {
            extract_document(extractor.as_ref(), ocr.as_ref(), &upload, max_pages)
        });

        match task.await {
            Ok(document) => document,
            Err(e) => {
                warn!(file = %filename, error = %e, "extraction task failed");
                DocumentText {
                    text: None,
                    warnings: vec![format!("No text extracted from {}", filename)],
                }
            }
        }
    }
}

fn extract_document(
    extractor: &dyn TextExtractor,
    ocr: &dyn OcrEngine,
    upload: &PdfUpload,
    max_pages: usize,
) -> DocumentText {
    let name = &upload.filename;
    let mut document = DocumentText::default();

    let mut text = extractor
        .extract_text(&upload.bytes, max_pages)
        .unwrap_or_else(|e| {
            debug!(file = %name, error = %e, "text extraction failed");
            String::new()
        });

    if text.chars().count() < MIN_TEXT_CHARS {
        document
            .warnings
            .push(format!("Scanned or image-heavy PDF detected for {}; OCR used", name));
        match ocr.ocr_pdf(&upload.bytes, max_pages) {
            Ok(ocr_text) => text = ocr_text,
            Err(e) => {
                warn!(file = %name, error = %e, "OCR failed");
                document.warnings.push(format!("OCR failed for {}", name));
                return document;
            }
        }
    }

    if text.trim().is_empty() {
        document.warnings.push(format!("No text extracted from {}", name));
        return document;
    }

    document.text = Some(text);
    document
}

/// Warn about mapped codes the uploaded chart does not define
fn flag_unknown_codes(result: &mut ConsolidatedResult, coa_csv: &str) {
    let coa = match ChartOfAccounts::parse(coa_csv) {
        Ok(coa) if !coa.is_empty() => coa,
        Ok(_) => return,
        Err(e) => {
            warn!(error = %e, "could not parse COA CSV; skipping code check");
            return;
        }
    };

    let unknown: Vec<String> = coa
        .unknown_codes(result)
        .into_iter()
        .map(|code| format!("Mapped COA code {} is not in the uploaded COA", code))
        .collect();
    result.merge_warnings(&unknown);
}
