//! HTTP error responses
//!
//! Every backend failure is rendered as `{"detail": "..."}` with a status
//! derived from the core error variant.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use proforma_core::Error;

#[derive(Debug, Error)]
#[error("{status}: {detail}")]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail)
    }

    pub fn unprocessable(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, detail)
    }
}

/// Status for a core error
pub fn status_for(error: &Error) -> StatusCode {
    match error {
        Error::Validation(_) => StatusCode::BAD_REQUEST,
        Error::Json(_) => StatusCode::UNPROCESSABLE_ENTITY,
        Error::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
        Error::Llm(_) | Error::Upstream(_) => StatusCode::BAD_GATEWAY,
        Error::Config(_)
        | Error::Extraction(_)
        | Error::Ocr(_)
        | Error::Spreadsheet(_)
        | Error::Io(_)
        | Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        Self::new(status_for(&error), error.detail())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, detail = %self.detail, "request failed");
        }
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (Error::validation("No PDFs uploaded"), StatusCode::BAD_REQUEST),
            (Error::PayloadTooLarge("big".into()), StatusCode::PAYLOAD_TOO_LARGE),
            (Error::config("OPENAI_API_KEY is not set"), StatusCode::INTERNAL_SERVER_ERROR),
            (Error::Llm("bad json".into()), StatusCode::BAD_GATEWAY),
            (Error::upstream("down"), StatusCode::BAD_GATEWAY),
            (Error::Spreadsheet("xlsx".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, status) in cases {
            assert_eq!(status_for(&error), status, "{}", error);
        }
    }

    #[test]
    fn test_detail_has_no_variant_prefix() {
        let api_error = ApiError::from(Error::config("OPENAI_API_KEY is not set"));
        assert_eq!(api_error.detail, "OPENAI_API_KEY is not set");
        assert_eq!(api_error.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
