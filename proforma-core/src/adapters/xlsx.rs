//! Consolidated workbook writer (rust_xlsxwriter)

use std::borrow::Cow;

use rust_xlsxwriter::{Format, Workbook, XlsxError};

use crate::domain::result::{Error, Result};
use crate::domain::{ConsolidatedResult, RowField};

pub const SHEET_NAME: &str = "Consolidated";

/// Column widths in display order, matching `RowField::ALL`
const COLUMN_WIDTHS: [f64; 11] = [18.0, 30.0, 12.0, 12.0, 12.0, 12.0, 18.0, 24.0, 18.0, 12.0, 30.0];

const AMOUNT_FORMAT: &str = "#,##0.00_);(#,##0.00)";
const CONFIDENCE_FORMAT: &str = "0.00";

/// Excel's per-cell text limit, in characters
pub const MAX_CELL_CHARS: usize = 32_767;

/// Render the result as an in-memory xlsx file
pub fn write_workbook(result: &ConsolidatedResult) -> Result<Vec<u8>> {
    build(result).map_err(|e| Error::Spreadsheet(e.to_string()))
}

fn build(result: &ConsolidatedResult) -> std::result::Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    let header_format = Format::new().set_bold();
    let amount_format = Format::new().set_num_format(AMOUNT_FORMAT);
    let confidence_format = Format::new().set_num_format(CONFIDENCE_FORMAT);

    for (col, field) in RowField::ALL.iter().enumerate() {
        let col = col as u16;
        worksheet.write_string_with_format(0, col, field.label(), &header_format)?;
        worksheet.set_column_width(col, COLUMN_WIDTHS[col as usize])?;
    }

    for (idx, row) in result.rows.iter().enumerate() {
        let excel_row = (idx + 1) as u32;
        for (col, field) in RowField::ALL.iter().enumerate() {
            let col = col as u16;
            if field.is_numeric() {
                let Some(value) = row.number(*field) else {
                    continue;
                };
                let format = if field.is_amount() {
                    &amount_format
                } else {
                    &confidence_format
                };
                worksheet.write_number_with_format(excel_row, col, value, format)?;
            } else if let Some(text) = row.text(*field) {
                worksheet.write_string(excel_row, col, &*fit_cell(text))?;
            }
        }
    }

    let last_col = (RowField::ALL.len() - 1) as u16;
    worksheet.set_freeze_panes(1, 0)?;
    worksheet.autofilter(0, 0, result.rows.len() as u32, last_col)?;

    workbook.save_to_buffer()
}

/// Cut text down to what a cell can hold
fn fit_cell(text: &str) -> Cow<'_, str> {
    match text.char_indices().nth(MAX_CELL_CHARS) {
        Some((end, _)) => Cow::Owned(text[..end].to_string()),
        None => Cow::Borrowed(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConsolidatedMeta, ConsolidatedRow};
    use std::io::{Cursor, Read};

    fn read_part(bytes: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut contents = String::new();
        file.read_to_string(&mut contents).unwrap();
        contents
    }

    fn sample() -> ConsolidatedResult {
        let mut cash = ConsolidatedRow::new("Cash");
        cash.account_number = Some("1000".to_string());
        cash.y2023 = Some(1234.5);
        cash.mapping_confidence = Some(0.8);
        let mut revenue = ConsolidatedRow::new("Revenue");
        revenue.ttm = Some(-50.0);
        revenue.notes = Some("from TTM schedule".to_string());
        ConsolidatedResult {
            meta: ConsolidatedMeta {
                units: Some("USD".to_string()),
                ttm_present: true,
                warnings: vec![],
            },
            rows: vec![cash, revenue],
        }
    }

    #[test]
    fn test_workbook_is_zip() {
        let bytes = write_workbook(&sample()).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn test_sheet_name_and_headers() {
        let bytes = write_workbook(&sample()).unwrap();
        let workbook = read_part(&bytes, "xl/workbook.xml");
        assert!(workbook.contains(r#"name="Consolidated""#));

        let strings = read_part(&bytes, "xl/sharedStrings.xml");
        for field in RowField::ALL {
            assert!(strings.contains(field.label()), "missing header {}", field.label());
        }
        assert!(strings.contains("from TTM schedule"));
    }

    #[test]
    fn test_freeze_and_autofilter() {
        let bytes = write_workbook(&sample()).unwrap();
        let sheet = read_part(&bytes, "xl/worksheets/sheet1.xml");
        assert!(sheet.contains(r#"<autoFilter ref="A1:K3"/>"#));
        assert!(sheet.contains(r#"state="frozen""#));
    }

    #[test]
    fn test_empty_result_still_writes_headers() {
        let bytes = write_workbook(&ConsolidatedResult::default()).unwrap();
        let sheet = read_part(&bytes, "xl/worksheets/sheet1.xml");
        assert!(sheet.contains(r#"<autoFilter ref="A1:K1"/>"#));
    }

    #[test]
    fn test_long_notes_are_truncated_to_cell_limit() {
        let mut row = ConsolidatedRow::new("Cash");
        row.notes = Some("n".repeat(40_000));
        let result = ConsolidatedResult {
            rows: vec![row],
            ..Default::default()
        };

        let bytes = write_workbook(&result).unwrap();
        let strings = read_part(&bytes, "xl/sharedStrings.xml");
        assert!(strings.contains(&"n".repeat(MAX_CELL_CHARS)));
        assert!(!strings.contains(&"n".repeat(MAX_CELL_CHARS + 1)));
    }

    #[test]
    fn test_fit_cell_counts_chars_not_bytes() {
        let text = "é".repeat(MAX_CELL_CHARS + 5);
        let fitted = fit_cell(&text);
        assert_eq!(fitted.chars().count(), MAX_CELL_CHARS);
        assert!(matches!(fit_cell("short"), Cow::Borrowed("short")));
    }
}
