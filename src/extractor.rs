//! Field extractors and the two-tier fallback chain.
//!
//! Two tiers:
//! - **[`RemoteExtractor`]** — an [`Extractor`] that asks a hosted
//!   chat-completions model to fill the six fields through a strict JSON
//!   schema.
//! - **[`HeuristicExtractor`]** — the local keyword segmenter. It cannot
//!   fail, so it sits outside the fallible [`Extractor`] trait.
//!
//! [`ExtractionService`] wires them together: at most one remote attempt,
//! then an unconditional local fallback on any failure. Fields are never
//! merged between tiers and nothing is retried.
//!
//! # Availability
//!
//! The remote tier exists only when the credential named by
//! `extractor.api_key_env` is set to a non-empty value. The credential is
//! resolved once, when the service is built.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::ExtractorConfig;
use crate::models::ExtractionResult;
use crate::segment;

/// Errors from an extraction attempt. The service treats all of them the
/// same way: log and fall back.
#[derive(Error, Debug)]
pub enum ExtractorError {
    #[error("no credential in ${0}")]
    MissingCredential(String),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("remote extractor returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Something that turns document text into an [`ExtractionResult`].
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Short label used in logs (e.g. `"remote"`).
    fn name(&self) -> &str;

    async fn extract(&self, text: &str) -> Result<ExtractionResult, ExtractorError>;
}

// ============ Heuristic ============

/// Keyword segmenter used as the last tier of [`ExtractionService`].
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicExtractor;

impl HeuristicExtractor {
    pub fn run(&self, text: &str) -> ExtractionResult {
        segment::segment(text)
    }
}

// ============ Remote ============

const SYSTEM_PROMPT: &str =
    "You extract structured information from research papers. Be thorough and accurate.";

/// Hosted language-model extractor using the chat-completions API with a
/// strict JSON-schema response format.
pub struct RemoteExtractor {
    client: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl RemoteExtractor {
    /// Build from config, reading the credential from the environment.
    pub fn from_config(config: &ExtractorConfig) -> Result<Self, ExtractorError> {
        let api_key = config
            .api_key()
            .ok_or_else(|| ExtractorError::MissingCredential(config.api_key_env.clone()))?;
        Self::with_key(config, api_key)
    }

    pub fn with_key(config: &ExtractorConfig, api_key: String) -> Result<Self, ExtractorError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key,
            model: config.model.clone(),
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
        })
    }

    fn request_body(&self, text: &str) -> Value {
        json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": user_prompt(text) },
            ],
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": "research_paper",
                    "strict": true,
                    "schema": result_schema(),
                },
            },
        })
    }
}

#[async_trait]
impl Extractor for RemoteExtractor {
    fn name(&self) -> &str {
        "remote"
    }

    async fn extract(&self, text: &str) -> Result<ExtractionResult, ExtractorError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(text))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExtractorError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let json: Value = response.json().await?;
        parse_completion(&json)
    }
}

fn user_prompt(text: &str) -> String {
    format!(
        "Analyze the following research paper text and extract the key information according to the schema.\n\
         Be thorough and accurate in your extraction.\n\n\
         Research Paper Text:\n{text}\n\n\
         Please extract:\n\
         1. Title - The main title of the paper\n\
         2. Summary - A comprehensive summary including main findings\n\
         3. Problem Statement - The research problem being addressed\n\
         4. Methodology - The research methods and approaches used\n\
         5. Results - Key findings and outcomes\n\
         6. Conclusion - Main conclusions and implications"
    )
}

/// JSON schema for [`ExtractionResult`], keyed the way it serializes.
pub fn result_schema() -> Value {
    let fields = [
        ("title", "The title of the research paper"),
        (
            "summary",
            "A comprehensive summary of the paper including main findings and contributions",
        ),
        (
            "problemStatement",
            "The problem or research question the paper addresses",
        ),
        (
            "methodology",
            "The research methods, techniques, and approaches used in the study",
        ),
        ("results", "The key findings, data, and outcomes of the research"),
        (
            "conclusion",
            "The conclusions drawn from the research and their implications",
        ),
    ];

    let properties: serde_json::Map<String, Value> = fields
        .iter()
        .map(|(name, description)| {
            (
                name.to_string(),
                json!({ "type": "string", "description": description }),
            )
        })
        .collect();
    let required: Vec<&str> = fields.iter().map(|(name, _)| *name).collect();

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    })
}

/// Pull `choices[0].message.content` out of a chat completion and decode it.
pub fn parse_completion(json: &Value) -> Result<ExtractionResult, ExtractorError> {
    let content = json
        .pointer("/choices/0/message/content")
        .and_then(|c| c.as_str())
        .ok_or_else(|| {
            ExtractorError::InvalidResponse("missing choices[0].message.content".to_string())
        })?;

    serde_json::from_str(content).map_err(|e| ExtractorError::InvalidResponse(e.to_string()))
}

// ============ Fallback chain ============

/// Which tier produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionSource {
    Remote,
    Heuristic,
}

impl ExtractionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionSource::Remote => "remote",
            ExtractionSource::Heuristic => "heuristic",
        }
    }
}

/// A finished extraction and the tier that produced it.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub result: ExtractionResult,
    pub source: ExtractionSource,
}

/// Remote-then-heuristic extraction. Never fails.
pub struct ExtractionService {
    remote: Option<Box<dyn Extractor>>,
    heuristic: HeuristicExtractor,
}

impl ExtractionService {
    /// Build the chain from config. A missing credential leaves only the
    /// heuristic tier; a client that cannot be built does the same.
    pub fn from_config(config: &ExtractorConfig) -> Self {
        let remote = match RemoteExtractor::from_config(config) {
            Ok(extractor) => {
                info!(model = %config.model, "remote extractor enabled");
                Some(Box::new(extractor) as Box<dyn Extractor>)
            }
            Err(ExtractorError::MissingCredential(var)) => {
                info!("no credential in ${}, using heuristic extraction only", var);
                None
            }
            Err(e) => {
                warn!("could not build remote extractor, using heuristic only: {}", e);
                None
            }
        };
        Self::new(remote)
    }

    pub fn new(remote: Option<Box<dyn Extractor>>) -> Self {
        Self {
            remote,
            heuristic: HeuristicExtractor,
        }
    }

    /// Heuristic tier only.
    pub fn heuristic_only() -> Self {
        Self::new(None)
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    pub async fn analyze(&self, text: &str) -> Analysis {
        if let Some(remote) = &self.remote {
            match remote.extract(text).await {
                Ok(result) => {
                    debug!(extractor = remote.name(), "remote extraction succeeded");
                    return Analysis {
                        result,
                        source: ExtractionSource::Remote,
                    };
                }
                Err(e) => {
                    warn!(
                        extractor = remote.name(),
                        "remote extraction failed, using fallback: {}", e
                    );
                }
            }
        }

        Analysis {
            result: self.heuristic.run(text),
            source: ExtractionSource::Heuristic,
        }
    }
}
