//! Result and error types for the core library

use thiserror::Error;

/// Core library error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("OCR error: {0}")]
    Ocr(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an upstream (remote service) error
    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::Upstream(msg.into())
    }

    /// The message without the variant prefix, suitable for API responses
    pub fn detail(&self) -> String {
        match self {
            Self::Validation(msg)
            | Self::PayloadTooLarge(msg)
            | Self::Config(msg)
            | Self::Extraction(msg)
            | Self::Ocr(msg)
            | Self::Llm(msg)
            | Self::Upstream(msg)
            | Self::Spreadsheet(msg)
            | Self::Other(msg) => msg.clone(),
            Self::Io(e) => e.to_string(),
            Self::Json(e) => e.to_string(),
        }
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;
