//! Consolidated result returned by the backend and edited by the workbench

use serde::{Deserialize, Serialize};

use super::result::{Error, Result};
use super::row::{ConsolidatedRow, RowField};

/// Metadata detected while consolidating
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedMeta {
    /// Detected currency/units, e.g. "USD thousands"
    #[serde(default)]
    pub units: Option<String>,
    pub ttm_present: bool,
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// Metadata plus the ordered row sequence
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedResult {
    pub meta: ConsolidatedMeta,
    pub rows: Vec<ConsolidatedRow>,
}

impl ConsolidatedResult {
    /// Check confidences are within 0..=1 and numbers are finite
    pub fn validate(&self) -> Result<()> {
        for (idx, row) in self.rows.iter().enumerate() {
            for field in RowField::ALL.iter().filter(|f| f.is_numeric()) {
                let Some(value) = row.number(*field) else {
                    continue;
                };
                if !value.is_finite() {
                    return Err(Error::validation(format!(
                        "rows[{}].{}: value must be a finite number",
                        idx, field
                    )));
                }
                if !field.is_amount() && !(0.0..=1.0).contains(&value) {
                    return Err(Error::validation(format!(
                        "rows[{}].{}: must be between 0 and 1, got {}",
                        idx, field, value
                    )));
                }
            }
        }
        Ok(())
    }

    /// Append warnings that are not already present, keeping order
    pub fn merge_warnings<'a>(&mut self, warnings: impl IntoIterator<Item = &'a String>) {
        for warning in warnings {
            if !self.meta.warnings.contains(warning) {
                self.meta.warnings.push(warning.clone());
            }
        }
    }
}
