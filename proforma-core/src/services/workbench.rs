//! Workbench - the consolidation page as a state machine
//!
//! Holds the selected PDFs and COA text, runs one consolidation at a time,
//! keeps the returned rows editable in memory and exports them on demand.
//!
//! ```text
//! Idle --run--> Running --ok--> Success
//!                       \--err--> Error
//! ```

use std::path::Path;
use std::sync::Arc;

use regex::Regex;
use tracing::{debug, warn};

use crate::domain::result::{Error, Result};
use crate::domain::{ConsolidatedResult, PdfUpload, RowField};
use crate::ports::ConsolidatorApi;
use crate::services::export::DEFAULT_FILENAME;

pub const UNEXPECTED_ERROR: &str = "Unexpected error.";
pub const EXPORT_FAILED: &str = "Export failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
    Success,
    Error,
}

/// A finished export, ready to be written to disk
#[derive(Debug, Clone, PartialEq)]
pub struct Download {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

pub struct Workbench {
    api: Arc<dyn ConsolidatorApi>,
    phase: Phase,
    files: Vec<PdfUpload>,
    coa_text: String,
    result: Option<ConsolidatedResult>,
    error: Option<String>,
}

impl Workbench {
    pub fn new(api: Arc<dyn ConsolidatorApi>) -> Self {
        Self {
            api,
            phase: Phase::Idle,
            files: Vec::new(),
            coa_text: String::new(),
            result: None,
            error: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn files(&self) -> &[PdfUpload] {
        &self.files
    }

    pub fn coa_text(&self) -> &str {
        &self.coa_text
    }

    pub fn result(&self) -> Option<&ConsolidatedResult> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn add_file(&mut self, upload: PdfUpload) {
        self.files.push(upload);
    }

    pub fn add_file_from_path(&mut self, path: &Path) -> Result<()> {
        let upload = PdfUpload::from_path(path)?;
        debug!(file = %upload.filename, bytes = upload.len(), "selected file");
        self.files.push(upload);
        Ok(())
    }

    /// Remove the file at `index`, if any
    pub fn remove_file(&mut self, index: usize) -> Option<PdfUpload> {
        if index < self.files.len() {
            Some(self.files.remove(index))
        } else {
            None
        }
    }

    pub fn set_coa_text(&mut self, text: impl Into<String>) {
        self.coa_text = text.into();
    }

    /// Replace the COA text with a file's contents
    pub fn load_coa_file(&mut self, path: &Path) -> Result<()> {
        self.coa_text = std::fs::read_to_string(path)?;
        Ok(())
    }

    pub fn can_run(&self) -> bool {
        !self.files.is_empty() && self.phase != Phase::Running
    }

    pub fn can_download(&self) -> bool {
        self.result.is_some()
    }

    /// Send the selected files and COA for consolidation.
    ///
    /// Fails without touching state when no file is selected. Otherwise the
    /// outcome lands in `phase`, `result` and `error`.
    pub async fn run(&mut self) -> Result<()> {
        if self.files.is_empty() {
            return Err(Error::validation("Select at least one PDF"));
        }

        self.phase = Phase::Running;
        self.result = None;
        self.error = None;

        let outcome = self.api.consolidate(&self.files, &self.coa_text).await;
        match outcome {
            Ok(response) if response.is_success() => {
                match serde_json::from_slice::<ConsolidatedResult>(&response.body) {
                    Ok(result) => {
                        debug!(rows = result.rows.len(), "consolidation succeeded");
                        self.result = Some(result);
                        self.phase = Phase::Success;
                    }
                    Err(e) => {
                        warn!(error = %e, "unparsable consolidation response");
                        self.fail(UNEXPECTED_ERROR);
                    }
                }
            }
            Ok(response) => {
                let text = response.text();
                if text.trim().is_empty() {
                    self.fail(format!("Request failed ({})", response.status));
                } else {
                    self.fail(text);
                }
            }
            Err(e) => {
                warn!(error = %e, "consolidation request failed");
                self.fail(UNEXPECTED_ERROR);
            }
        }
        Ok(())
    }

    fn fail(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
        self.phase = Phase::Error;
    }

    /// Edit one cell of the current result
    pub fn edit_cell(&mut self, row: usize, field: RowField, input: &str) -> Result<()> {
        let result = self
            .result
            .as_mut()
            .ok_or_else(|| Error::validation("No result to edit"))?;
        let total = result.rows.len();
        let target = result
            .rows
            .get_mut(row)
            .ok_or_else(|| Error::validation(format!("Row {} out of range (0..{})", row, total)))?;
        target.set_field(field, input);
        Ok(())
    }

    /// Export the current (edited) result as a workbook
    pub async fn download(&mut self) -> Result<Download> {
        let result = self
            .result
            .as_ref()
            .ok_or_else(|| Error::validation("Nothing to download yet"))?;

        let outcome = self.api.export_xlsx(result).await;
        match outcome {
            Ok(response) if response.is_success() => {
                self.error = None;
                let filename = response
                    .content_disposition
                    .as_deref()
                    .and_then(filename_from_disposition)
                    .unwrap_or_else(|| DEFAULT_FILENAME.to_string());
                Ok(Download {
                    filename,
                    content_type: response.content_type,
                    bytes: response.body,
                })
            }
            Ok(response) => {
                warn!(status = response.status, "export rejected");
                self.error = Some(EXPORT_FAILED.to_string());
                Err(Error::upstream(EXPORT_FAILED))
            }
            Err(e) => {
                warn!(error = %e, "export request failed");
                self.error = Some(EXPORT_FAILED.to_string());
                Err(Error::upstream(EXPORT_FAILED))
            }
        }
    }
}

/// Pull the filename out of a `Content-Disposition` value
pub fn filename_from_disposition(value: &str) -> Option<String> {
    let re = Regex::new(r#"(?i)filename\*?\s*=\s*(?:UTF-8'')?"?([^";]+)"?"#).ok()?;
    let name = re.captures(value)?.get(1)?.as_str().trim();
    // keep the last path component only
    let name = name.rsplit(['/', '\\']).next().unwrap_or(name);
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_from_disposition() {
        assert_eq!(
            filename_from_disposition(r#"attachment; filename="consolidated.xlsx""#).as_deref(),
            Some("consolidated.xlsx")
        );
        assert_eq!(
            filename_from_disposition("attachment; filename=report.xlsx").as_deref(),
            Some("report.xlsx")
        );
        assert_eq!(
            filename_from_disposition("attachment; filename*=UTF-8''q3.xlsx").as_deref(),
            Some("q3.xlsx")
        );
        assert_eq!(
            filename_from_disposition(r#"attachment; filename="../../etc/x.xlsx""#).as_deref(),
            Some("x.xlsx")
        );
        assert_eq!(filename_from_disposition("inline"), None);
    }
}
