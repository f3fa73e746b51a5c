//! Chart of accounts parsed from the uploaded COA CSV

use std::collections::BTreeSet;

use serde::Serialize;

use super::result::{Error, Result};
use super::statement::ConsolidatedResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoaEntry {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ChartOfAccounts {
    entries: Vec<CoaEntry>,
}

impl ChartOfAccounts {
    /// Parse `code,name` rows. A leading header row is skipped when its first
    /// column is a known column title such as "Code" or "Account Number".
    pub fn parse(csv_text: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(csv_text.as_bytes());

        let mut entries = Vec::new();
        for (idx, record) in reader.records().enumerate() {
            let record =
                record.map_err(|e| Error::validation(format!("Invalid COA CSV: {}", e)))?;
            let code = record.get(0).unwrap_or("").to_string();
            if code.is_empty() {
                continue;
            }
            if idx == 0 && looks_like_header(&code) {
                continue;
            }
            let name = record
                .iter()
                .skip(1)
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(", ");
            entries.push(CoaEntry { code, name });
        }

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[CoaEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_code(&self, code: &str) -> bool {
        let code = code.trim();
        self.entries.iter().any(|e| e.code == code)
    }

    /// Mapped codes in `result` that this chart does not define, sorted and deduplicated
    pub fn unknown_codes(&self, result: &ConsolidatedResult) -> Vec<String> {
        result
            .rows
            .iter()
            .filter_map(|r| r.mapped_coa_code.as_deref())
            .map(str::trim)
            .filter(|c| !c.is_empty() && !self.contains_code(c))
            .map(String::from)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// First-column titles accepted as a header row, compared case-insensitively
const HEADER_TITLES: &[&str] = &[
    "code",
    "account",
    "account code",
    "account number",
    "account no",
    "account no.",
    "account #",
    "acct",
    "acct code",
    "acct no",
    "acct no.",
    "coa code",
    "gl code",
    "number",
    "no",
    "no.",
];

fn looks_like_header(first_cell: &str) -> bool {
    let lower = first_cell.trim().to_lowercase();
    HEADER_TITLES.contains(&lower.as_str())
}
