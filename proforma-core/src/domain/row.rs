//! Consolidated statement row and its editable fields

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::result::Error;

/// One consolidated financial-statement line
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedRow {
    #[serde(default)]
    pub account_number: Option<String>,
    pub account_name: String,
    #[serde(default)]
    pub y2022: Option<f64>,
    #[serde(default)]
    pub y2023: Option<f64>,
    #[serde(default)]
    pub y2024: Option<f64>,
    #[serde(default)]
    pub ttm: Option<f64>,
    #[serde(default)]
    pub mapped_coa_code: Option<String>,
    #[serde(default)]
    pub mapped_coa_name: Option<String>,
    /// 0..=1 when present
    #[serde(default)]
    pub mapping_confidence: Option<f64>,
    /// 0..=1 when present
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ConsolidatedRow {
    /// Create a row with only an account name
    pub fn new(account_name: impl Into<String>) -> Self {
        Self {
            account_name: account_name.into(),
            ..Default::default()
        }
    }

    /// Apply a user edit to one field.
    ///
    /// Numeric fields become a number, or null when the input is empty or
    /// does not parse. Text fields keep the input verbatim, empty becomes
    /// null. `account_name` is required, so an empty edit stores "".
    pub fn set_field(&mut self, field: RowField, input: &str) {
        match field {
            RowField::AccountNumber => self.account_number = coerce_text(input),
            RowField::AccountName => self.account_name = input.to_string(),
            RowField::Y2022 => self.y2022 = coerce_number(input),
            RowField::Y2023 => self.y2023 = coerce_number(input),
            RowField::Y2024 => self.y2024 = coerce_number(input),
            RowField::Ttm => self.ttm = coerce_number(input),
            RowField::MappedCoaCode => self.mapped_coa_code = coerce_text(input),
            RowField::MappedCoaName => self.mapped_coa_name = coerce_text(input),
            RowField::MappingConfidence => self.mapping_confidence = coerce_number(input),
            RowField::Confidence => self.confidence = coerce_number(input),
            RowField::Notes => self.notes = coerce_text(input),
        }
    }

    /// Numeric value of a field, `None` for text fields or missing values
    pub fn number(&self, field: RowField) -> Option<f64> {
        match field {
            RowField::Y2022 => self.y2022,
            RowField::Y2023 => self.y2023,
            RowField::Y2024 => self.y2024,
            RowField::Ttm => self.ttm,
            RowField::MappingConfidence => self.mapping_confidence,
            RowField::Confidence => self.confidence,
            _ => None,
        }
    }

    /// Text value of a field, `None` for numeric fields or missing values
    pub fn text(&self, field: RowField) -> Option<&str> {
        match field {
            RowField::AccountNumber => self.account_number.as_deref(),
            RowField::AccountName => Some(self.account_name.as_str()),
            RowField::MappedCoaCode => self.mapped_coa_code.as_deref(),
            RowField::MappedCoaName => self.mapped_coa_name.as_deref(),
            RowField::Notes => self.notes.as_deref(),
            _ => None,
        }
    }

    /// Cell contents as shown in a table; missing values render empty
    pub fn display(&self, field: RowField) -> String {
        if field.is_numeric() {
            self.number(field).map(|n| n.to_string()).unwrap_or_default()
        } else {
            self.text(field).unwrap_or_default().to_string()
        }
    }
}

fn coerce_number(input: &str) -> Option<f64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn coerce_text(input: &str) -> Option<String> {
    if input.is_empty() {
        None
    } else {
        Some(input.to_string())
    }
}

/// Editable column of a consolidated row, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowField {
    AccountNumber,
    AccountName,
    Y2022,
    Y2023,
    Y2024,
    Ttm,
    MappedCoaCode,
    MappedCoaName,
    MappingConfidence,
    Confidence,
    Notes,
}

impl RowField {
    pub const ALL: [RowField; 11] = [
        RowField::AccountNumber,
        RowField::AccountName,
        RowField::Y2022,
        RowField::Y2023,
        RowField::Y2024,
        RowField::Ttm,
        RowField::MappedCoaCode,
        RowField::MappedCoaName,
        RowField::MappingConfidence,
        RowField::Confidence,
        RowField::Notes,
    ];

    /// Field name on the wire (JSON key)
    pub fn key(&self) -> &'static str {
        match self {
            RowField::AccountNumber => "account_number",
            RowField::AccountName => "account_name",
            RowField::Y2022 => "y2022",
            RowField::Y2023 => "y2023",
            RowField::Y2024 => "y2024",
            RowField::Ttm => "ttm",
            RowField::MappedCoaCode => "mapped_coa_code",
            RowField::MappedCoaName => "mapped_coa_name",
            RowField::MappingConfidence => "mapping_confidence",
            RowField::Confidence => "confidence",
            RowField::Notes => "notes",
        }
    }

    /// Column header used in tables and the exported workbook
    pub fn label(&self) -> &'static str {
        match self {
            RowField::AccountNumber => "Account Number",
            RowField::AccountName => "Account Name",
            RowField::Y2022 => "2022",
            RowField::Y2023 => "2023",
            RowField::Y2024 => "2024",
            RowField::Ttm => "TTM",
            RowField::MappedCoaCode => "Mapped COA Code",
            RowField::MappedCoaName => "Mapped COA Name",
            RowField::MappingConfidence => "Mapping Confidence",
            RowField::Confidence => "Confidence",
            RowField::Notes => "Notes",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            RowField::Y2022
                | RowField::Y2023
                | RowField::Y2024
                | RowField::Ttm
                | RowField::MappingConfidence
                | RowField::Confidence
        )
    }

    /// Amount columns (the fiscal years and TTM)
    pub fn is_amount(&self) -> bool {
        matches!(
            self,
            RowField::Y2022 | RowField::Y2023 | RowField::Y2024 | RowField::Ttm
        )
    }
}

impl fmt::Display for RowField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for RowField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RowField::ALL
            .iter()
            .copied()
            .find(|f| f.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::validation(format!("Unknown field: {}", s)))
    }
}
