//! Statement mapper port - turns extracted text into COA-mapped rows

use async_trait::async_trait;

use crate::domain::result::Result;
use crate::domain::ConsolidatedResult;

/// Statement-to-COA mapping service (an LLM in production)
#[async_trait]
pub trait StatementMapper: Send + Sync {
    /// Mapper name for logs (e.g. "openai")
    fn name(&self) -> &str;

    /// Consolidate extracted statement text against the COA CSV
    ///
    /// # Arguments
    /// * `extracted_text` - Text of all documents, with file banners
    /// * `coa_csv` - Raw chart-of-accounts CSV, may be empty
    /// * `warnings` - Warnings raised by the extraction pipeline so far
    async fn consolidate(
        &self,
        extracted_text: &str,
        coa_csv: &str,
        warnings: &[String],
    ) -> Result<ConsolidatedResult>;
}
