//! OpenAI Responses API statement mapper
//!
//! Sends the extracted statement text and the COA to a hosted model, then
//! parses the JSON reply into a `ConsolidatedResult`. A reply that does not
//! parse or validate gets exactly one repair request.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use crate::config::LlmSettings;
use crate::domain::result::{Error, Result};
use crate::domain::ConsolidatedResult;
use crate::ports::StatementMapper;

/// Source text sent to the model is cut to this many characters
pub const MAX_SOURCE_CHARS: usize = 200_000;

// =============================================================================
// API Request/Response Models
// =============================================================================

#[derive(Debug, Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    input: Vec<InputMessage>,
}

#[derive(Debug, Serialize)]
struct InputMessage {
    role: &'static str,
    content: Vec<InputContent>,
}

#[derive(Debug, Serialize)]
struct InputContent {
    #[serde(rename = "type")]
    kind: &'static str,
    text: String,
}

#[derive(Debug, Deserialize)]
struct ResponsesReply {
    #[serde(default)]
    output: Vec<OutputItem>,
    #[serde(default)]
    output_text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(default)]
    content: Vec<OutputContent>,
}

#[derive(Debug, Deserialize)]
struct OutputContent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl ResponsesReply {
    /// Concatenated `output_text` parts, like the SDK's `output_text` helper
    fn text(&self) -> String {
        if let Some(text) = &self.output_text {
            return text.clone();
        }
        self.output
            .iter()
            .flat_map(|item| item.content.iter())
            .filter(|c| c.kind == "output_text")
            .filter_map(|c| c.text.as_deref())
            .collect::<Vec<_>>()
            .join("")
    }
}

// =============================================================================
// OpenAI Client
// =============================================================================

#[derive(Debug, Clone)]
pub struct OpenAiMapper {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl OpenAiMapper {
    pub fn new(settings: &LlmSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| Error::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: settings.api_key.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
        })
    }

    async fn respond(&self, api_key: &str, prompt: String) -> Result<String> {
        let url = format!("{}/responses", self.base_url);
        let payload = ResponsesRequest {
            model: &self.model,
            input: vec![InputMessage {
                role: "user",
                content: vec![InputContent {
                    kind: "input_text",
                    text: prompt,
                }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Llm(format!(
                "OpenAI API error (status {}): {}",
                status, body
            )));
        }

        let reply: ResponsesReply = response
            .json()
            .await
            .map_err(|e| Error::Llm(format!("Invalid OpenAI response: {}", e)))?;

        Ok(reply.text().trim().to_string())
    }
}

fn map_request_error(error: reqwest::Error) -> Error {
    if error.is_timeout() {
        Error::Llm("OpenAI request timed out".to_string())
    } else if error.is_connect() {
        Error::Llm("Unable to connect to the OpenAI API".to_string())
    } else {
        Error::Llm(format!("OpenAI request failed: {}", error))
    }
}

#[async_trait]
impl StatementMapper for OpenAiMapper {
    fn name(&self) -> &str {
        "openai"
    }

    async fn consolidate(
        &self,
        extracted_text: &str,
        coa_csv: &str,
        warnings: &[String],
    ) -> Result<ConsolidatedResult> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::config("OPENAI_API_KEY is not set"))?;

        let raw = self
            .respond(api_key, build_prompt(extracted_text, coa_csv, warnings))
            .await?;

        match parse_reply(&raw) {
            Ok(result) => Ok(result),
            Err(e) => {
                warn!(model = %self.model, error = %e, "model reply did not match schema; requesting repair");
                let repaired = self.respond(api_key, build_repair_prompt(&raw)).await?;
                parse_reply(&repaired)
                    .map_err(|e| Error::Llm(format!("Model returned invalid JSON after repair: {}", e)))
            }
        }
    }
}

// =============================================================================
// Prompt and reply handling
// =============================================================================

fn schema_hint() -> serde_json::Value {
    json!({
        "meta": {"units": "string|null", "ttm_present": true, "warnings": ["string"]},
        "rows": [{
            "account_number": "string|null",
            "account_name": "string",
            "y2022": 0,
            "y2023": 0,
            "y2024": 0,
            "ttm": 0,
            "mapped_coa_code": "string|null",
            "mapped_coa_name": "string|null",
            "mapping_confidence": 0.0,
            "confidence": 0.0,
            "notes": "string|null"
        }]
    })
}

/// Build the consolidation prompt
pub fn build_prompt(extracted_text: &str, coa_csv: &str, warnings: &[String]) -> String {
    let coa = if coa_csv.trim().is_empty() { "(none)" } else { coa_csv };
    let source = truncate_chars(extracted_text, MAX_SOURCE_CHARS);
    let warnings_json = serde_json::to_string(warnings).unwrap_or_else(|_| "[]".to_string());

    format!(
        "You are a financial statement extraction engine.\n\
         Return JSON only.\n\
         Use this exact schema shape: {schema}\n\n\
         Rules:\n\
         - Never guess missing numbers; use null.\n\
         - Convert parentheses to negative numbers.\n\
         - Detect units (ones/thousands/millions), normalize values consistently, set meta.units.\n\
         - Only include TTM if explicitly present.\n\
         - Merge duplicates cautiously; if unsure keep separate and note.\n\
         - mapping_confidence and confidence should be 0..1.\n\n\
         COA CSV (may be empty):\n{coa}\n\n\
         Source text:\n{source}\n\n\
         Existing warnings from parsing pipeline:\n{warnings}\n",
        schema = schema_hint(),
        coa = coa,
        source = source,
        warnings = warnings_json,
    )
}

fn build_repair_prompt(raw: &str) -> String {
    format!(
        "Return valid JSON only, no markdown, matching the schema exactly. Repair this:\n{}",
        raw
    )
}

/// Parse and validate a model reply
pub fn parse_reply(raw: &str) -> Result<ConsolidatedResult> {
    let result: ConsolidatedResult = serde_json::from_str(raw.trim())?;
    result.validate()?;
    debug!(rows = result.rows.len(), "parsed model reply");
    Ok(result)
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

// =============================================================================
// Tests
// =============================================================================
