//! Export service - consolidated rows to an xlsx download

use tracing::info;

use crate::adapters::xlsx;
use crate::domain::result::Result;
use crate::domain::ConsolidatedResult;

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const DEFAULT_FILENAME: &str = "consolidated.xlsx";
pub const DEFAULT_DISPOSITION: &str = "attachment; filename=\"consolidated.xlsx\"";

/// A rendered workbook ready to serve
#[derive(Debug, Clone)]
pub struct XlsxExport {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub content_disposition: &'static str,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ExportService;

impl ExportService {
    pub fn new() -> Self {
        Self
    }

    /// Validate the (possibly edited) result and render it
    pub fn export(&self, result: &ConsolidatedResult) -> Result<XlsxExport> {
        result.validate()?;
        let bytes = xlsx::write_workbook(result)?;
        info!(rows = result.rows.len(), bytes = bytes.len(), "export finished");
        Ok(XlsxExport {
            bytes,
            content_type: XLSX_CONTENT_TYPE,
            content_disposition: DEFAULT_DISPOSITION,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::result::Error;
    use crate::domain::ConsolidatedRow;

    #[test]
    fn test_export_sets_download_headers() {
        let mut result = ConsolidatedResult::default();
        result.rows.push(ConsolidatedRow::new("Cash"));

        let export = ExportService::new().export(&result).unwrap();
        assert_eq!(&export.bytes[..2], b"PK");
        assert_eq!(export.content_type, XLSX_CONTENT_TYPE);
        assert_eq!(export.content_disposition, r#"attachment; filename="consolidated.xlsx""#);
    }

    #[test]
    fn test_export_rejects_invalid_confidence() {
        let mut row = ConsolidatedRow::new("Cash");
        row.confidence = Some(1.5);
        let result = ConsolidatedResult {
            rows: vec![row],
            ..Default::default()
        };

        let err = ExportService::new().export(&result).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
