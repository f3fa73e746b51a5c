//! Configuration management
//!
//! Everything is read from the environment (a `.env` file in the working
//! directory is loaded first when present):
//!
//! | Variable               | Default                      |
//! |------------------------|------------------------------|
//! | `BACKEND_INTERNAL_URL` | `http://127.0.0.1:8000`      |
//! | `MAX_PAGES`            | `60`                         |
//! | `MAX_FILE_MB`          | `25`                         |
//! | `OPENAI_MODEL`         | `gpt-4.1-mini`               |
//! | `OPENAI_API_KEY`       | unset                        |
//! | `OPENAI_BASE_URL`      | `https://api.openai.com/v1`  |
//! | `PDFTOPPM_BIN`         | `pdftoppm`                   |
//! | `TESSERACT_BIN`        | `tesseract`                  |

use tracing::warn;
use url::Url;

use crate::domain::result::{Error, Result};

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_MAX_PAGES: usize = 60;
pub const DEFAULT_MAX_FILE_MB: u64 = 25;
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4.1-mini";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Upload and page limits for the extraction pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_pages: usize,
    pub max_file_mb: u64,
}

impl Limits {
    /// Total upload budget in bytes, saturating for absurd `MAX_FILE_MB`
    pub fn total_bytes(&self) -> u64 {
        self.max_file_mb.saturating_mul(1024 * 1024)
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_pages: DEFAULT_MAX_PAGES,
            max_file_mb: DEFAULT_MAX_FILE_MB,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            model: DEFAULT_OPENAI_MODEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrSettings {
    pub pdftoppm_bin: String,
    pub tesseract_bin: String,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            pdftoppm_bin: "pdftoppm".to_string(),
            tesseract_bin: "tesseract".to_string(),
        }
    }
}

/// Consolidator configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Backend origin the proxy routes forward to
    pub backend_url: String,
    pub limits: Limits,
    pub llm: LlmSettings,
    pub ocr: OcrSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            limits: Limits::default(),
            llm: LlmSettings::default(),
            ocr: OcrSettings::default(),
        }
    }
}

impl Config {
    /// Load config from the process environment
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load config through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let backend_url = match get("BACKEND_INTERNAL_URL") {
            Some(url) => normalize_url(&url, "BACKEND_INTERNAL_URL")?,
            None => DEFAULT_BACKEND_URL.to_string(),
        };

        let llm_base_url = match get("OPENAI_BASE_URL") {
            Some(url) => normalize_url(&url, "OPENAI_BASE_URL")?,
            None => DEFAULT_OPENAI_BASE_URL.to_string(),
        };

        Ok(Self {
            backend_url,
            limits: Limits {
                max_pages: parse_or(get("MAX_PAGES"), "MAX_PAGES", DEFAULT_MAX_PAGES),
                max_file_mb: parse_or(get("MAX_FILE_MB"), "MAX_FILE_MB", DEFAULT_MAX_FILE_MB),
            },
            llm: LlmSettings {
                api_key: get("OPENAI_API_KEY"),
                base_url: llm_base_url,
                model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            },
            ocr: OcrSettings {
                pdftoppm_bin: get("PDFTOPPM_BIN").unwrap_or_else(|| "pdftoppm".to_string()),
                tesseract_bin: get("TESSERACT_BIN").unwrap_or_else(|| "tesseract".to_string()),
            },
        })
    }

    /// Override the backend origin (e.g. from a CLI flag)
    pub fn with_backend_url(mut self, url: &str) -> Result<Self> {
        self.backend_url = normalize_url(url, "backend URL")?;
        Ok(self)
    }
}

/// Validate an http(s) URL and strip the trailing slash
pub fn normalize_url(raw: &str, what: &str) -> Result<String> {
    let parsed = Url::parse(raw.trim())
        .map_err(|e| Error::config(format!("Invalid {}: {} ({})", what, raw, e)))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(Error::config(format!("{} must use http or https: {}", what, raw)));
    }
    Ok(raw.trim().trim_end_matches('/').to_string())
}

fn parse_or<T>(value: Option<String>, key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy + std::fmt::Display,
{
    match value {
        Some(v) => match v.parse::<T>() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!(key, value = %v, fallback = %default, "ignoring unparsable setting");
                default
            }
        },
        None => default,
    }
}
