// src/extractors/llm.rs
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::extractors::prompt::{build_user_prompt, SYSTEM_PROMPT};
use crate::extractors::schema::{BANK_RECORD_SCHEMA, SCHEMA_NAME};
use crate::records::BankRecord;
use crate::utils::error::ExtractError;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini-2024-07-18";
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const INFERENCE_TIMEOUT_SECS: u64 = 120;

/// Turns one segment of table text into a partial [`BankRecord`].
///
/// Implementations hold no per-call state; each segment is extracted on its
/// own.
#[async_trait]
pub trait RecordExtractor: Send + Sync {
    async fn extract(&self, segment: &str) -> Result<BankRecord, ExtractError>;

    /// Model identifier, for logs and run metadata.
    fn model(&self) -> &str;
}

/// Settings for the structured-output inference client.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    pub api_base: String,
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
}

impl ExtractorConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(INFERENCE_TIMEOUT_SECS),
        }
    }
}

/// Extractor backed by an OpenAI-compatible chat completions endpoint using
/// strict JSON-schema output.
pub struct OpenAiExtractor {
    client: reqwest::Client,
    config: ExtractorConfig,
}

impl OpenAiExtractor {
    pub fn new(config: ExtractorConfig) -> Result<Self, ExtractError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.api_base.trim_end_matches('/'))
    }

    fn build_request<'a>(&'a self, segment: &str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: build_user_prompt(segment),
                },
            ],
            response_format: ResponseFormat {
                kind: "json_schema",
                json_schema: JsonSchemaFormat {
                    name: SCHEMA_NAME,
                    strict: true,
                    schema: &BANK_RECORD_SCHEMA,
                },
            },
        }
    }
}

#[async_trait]
impl RecordExtractor for OpenAiExtractor {
    async fn extract(&self, segment: &str) -> Result<BankRecord, ExtractError> {
        let request = self.build_request(segment);
        tracing::debug!("Sending {} chars to {} ({})", segment.chars().count(), self.endpoint(), self.config.model);

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Inference HTTP error status: {}", status);
            return Err(ExtractError::Http { status, body });
        }

        let completion: ChatResponse = response.json().await?;
        parse_completion(completion)
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

/// Validates a completion and turns its content into a record.
fn parse_completion(completion: ChatResponse) -> Result<BankRecord, ExtractError> {
    let message = completion
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message)
        .ok_or(ExtractError::EmptyResponse)?;

    if let Some(refusal) = message.refusal {
        return Err(ExtractError::Refusal(refusal));
    }
    let content = message
        .content
        .filter(|c| !c.trim().is_empty())
        .ok_or(ExtractError::EmptyResponse)?;

    parse_record(&content)
}

/// Parses and checks the JSON content of a structured-output response.
pub fn parse_record(content: &str) -> Result<BankRecord, ExtractError> {
    let value: serde_json::Value =
        serde_json::from_str(content).map_err(|e| ExtractError::InvalidJson(e.to_string()))?;
    let mut record: BankRecord =
        serde_json::from_value(value).map_err(|e| ExtractError::SchemaViolation(e.to_string()))?;

    if record.bank_root_domain.trim().is_empty() {
        return Err(ExtractError::MissingDomain);
    }

    let adjusted = record.reconcile_rates();
    if adjusted > 0 {
        tracing::debug!("Dropped interest rate on {} item(s) that also carry a dividend rate", adjusted);
    }

    Ok(record)
}

// --- Wire types ---

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    response_format: ResponseFormat<'a>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    json_schema: JsonSchemaFormat<'a>,
}

#[derive(Serialize)]
struct JsonSchemaFormat<'a> {
    name: &'static str,
    strict: bool,
    schema: &'a serde_json::Value,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    refusal: Option<String>,
}
