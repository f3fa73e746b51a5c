//! Backend API
//!
//! - `GET /api/health`
//! - `POST /api/consolidate` - multipart `pdfs` parts plus a `coa_csv` field
//! - `POST /api/export-xlsx` - JSON `ConsolidatedResult` in, workbook out

use std::sync::Arc;

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tracing::debug;

use proforma_core::config::Limits;
use proforma_core::{ConsolidatedResult, ConsolidatorContext, Error, PdfUpload};

use crate::error::ApiError;

const MIB: usize = 1024 * 1024;

/// Headroom for multipart framing, the COA field and skipped non-PDF parts
const MULTIPART_OVERHEAD_BYTES: usize = MIB;

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Build the backend router
pub fn router(context: Arc<ConsolidatorContext>) -> Router {
    let body_limit = request_limit_bytes(&context.config.limits);

    Router::new()
        .route("/api/health", get(health))
        .route("/api/consolidate", post(consolidate))
        .route("/api/export-xlsx", post(export_xlsx))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .with_state(context)
}

/// Cap on the whole request body: the PDF budget plus multipart headroom
pub fn request_limit_bytes(limits: &Limits) -> usize {
    usize::try_from(limits.total_bytes())
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD_BYTES)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn consolidate(
    State(context): State<Arc<ConsolidatorContext>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ConsolidatedResult>, ApiError> {
    let mut multipart = multipart.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let limits = context.config.limits;

    let mut uploads = Vec::new();
    let mut coa_csv = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, &limits))?
    {
        let name = field.name().map(String::from);
        match name.as_deref() {
            Some("pdfs") => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or(FALLBACK_CONTENT_TYPE)
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error(e, &limits))?;
                uploads.push(PdfUpload::new(filename, content_type, bytes.to_vec()));
            }
            Some("coa_csv") => {
                coa_csv = field
                    .text()
                    .await
                    .map_err(|e| multipart_error(e, &limits))?;
            }
            other => debug!(field = ?other, "ignoring multipart field"),
        }
    }

    let result = context
        .consolidate_service
        .consolidate(uploads, &coa_csv)
        .await?;
    Ok(Json(result))
}

/// The PDF budget itself is enforced by the consolidate service; a 413 here
/// means the request as a whole, non-PDF parts included, was too large.
fn multipart_error(error: MultipartError, limits: &Limits) -> ApiError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            format!(
                "Request body exceeds {}MB upload limit",
                request_limit_bytes(limits) / MIB
            ),
        )
    } else {
        ApiError::bad_request(error.body_text())
    }
}

async fn export_xlsx(
    State(context): State<Arc<ConsolidatorContext>>,
    payload: Result<Json<ConsolidatedResult>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(result) = payload.map_err(|e| ApiError::unprocessable(e.body_text()))?;

    let export = context.export_service.export(&result).map_err(|e| match e {
        Error::Validation(detail) => ApiError::unprocessable(detail),
        other => ApiError::from(other),
    })?;

    Ok((
        [
            (CONTENT_TYPE, export.content_type),
            (CONTENT_DISPOSITION, export.content_disposition),
        ],
        export.bytes,
    )
        .into_response())
}
