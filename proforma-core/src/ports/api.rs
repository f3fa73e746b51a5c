//! Consolidator API port - how the workbench reaches the proxy or backend

use async_trait::async_trait;

use crate::domain::result::Result;
use crate::domain::{ConsolidatedResult, PdfUpload};

/// Raw HTTP outcome, relayed without interpretation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub content_disposition: Option<String>,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body decoded as text, lossy
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// The two calls the UI page makes
///
/// `Err` means the request never produced an HTTP response (transport
/// failure); any status code, including errors, comes back as `Ok`.
#[async_trait]
pub trait ConsolidatorApi: Send + Sync {
    /// POST the PDFs and COA text as `multipart/form-data`
    async fn consolidate(&self, files: &[PdfUpload], coa_csv: &str) -> Result<ApiResponse>;

    /// POST the (possibly edited) result as JSON and receive the workbook
    async fn export_xlsx(&self, result: &ConsolidatedResult) -> Result<ApiResponse>;
}
