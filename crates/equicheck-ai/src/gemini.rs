//! Gemini `generateContent` adapter.
//!
//! Documents travel as base64 `inlineData` parts. The request forces
//! `responseMimeType` and `responseSchema` so the reply text is the JSON
//! object itself.

use std::fmt;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use equicheck_core::SchemaNode;

use crate::error::ModelError;
use crate::model::{GenerateRequest, GenerativeModel, Part};

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GeminiConfigError {
    #[error("Configuration Error: API_KEY is missing")]
    MissingApiKey,
}

/// Connection settings for the Gemini API.
#[derive(Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    /// No trailing slash.
    pub base_url: String,
}

impl GeminiConfig {
    /// Settings with the default model and endpoint. A blank key is rejected.
    pub fn new(api_key: &str) -> Result<Self, GeminiConfigError> {
        if api_key.trim().is_empty() {
            return Err(GeminiConfigError::MissingApiKey);
        }
        Ok(Self {
            api_key: api_key.trim().to_string(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

impl fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// HTTP client for Gemini.
#[derive(Debug)]
pub struct GeminiClient {
    client: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    fn model_name(&self) -> &str {
        &self.config.model
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<Option<String>, ModelError> {
        let url = self.config.endpoint();
        let body = WireRequest::from_request(request);

        debug!(url = %url, parts = request.parts.len(), "calling Gemini generateContent");
        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ModelError::new(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ModelError::new(format!(
                "Gemini API error {status}: {}",
                error_detail(&body)
            )));
        }

        let parsed: WireResponse = resp
            .json()
            .await
            .map_err(|e| ModelError::new(format!("invalid Gemini response envelope: {e}")))?;
        if let Some(usage) = &parsed.usage_metadata {
            debug!(
                prompt_tokens = usage.prompt_token_count,
                output_tokens = usage.candidates_token_count,
                "Gemini response received"
            );
        }
        Ok(parsed.text())
    }
}

// ── Wire types ──

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireRequest<'a> {
    system_instruction: WireContent<'a>,
    contents: Vec<WireContent<'a>>,
    generation_config: WireGenerationConfig<'a>,
}

#[derive(Debug, Serialize)]
struct WireContent<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<WirePart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum WirePart<'a> {
    Text {
        text: &'a str,
    },
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: WireBlob<'a>,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireBlob<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireGenerationConfig<'a> {
    temperature: f32,
    response_mime_type: &'a str,
    response_schema: &'a SchemaNode,
}

impl<'a> WireRequest<'a> {
    fn from_request(req: &'a GenerateRequest) -> Self {
        let parts = req
            .parts
            .iter()
            .map(|p| match p {
                Part::Text(text) => WirePart::Text { text },
                Part::InlineData { mime_type, data } => WirePart::Inline {
                    inline_data: WireBlob {
                        mime_type,
                        data: STANDARD.encode(data),
                    },
                },
            })
            .collect();
        Self {
            system_instruction: WireContent {
                role: None,
                parts: vec![WirePart::Text {
                    text: &req.system_instruction,
                }],
            },
            contents: vec![WireContent {
                role: Some("user"),
                parts,
            }],
            generation_config: WireGenerationConfig {
                temperature: req.temperature,
                response_mime_type: &req.response_mime_type,
                response_schema: &req.response_schema,
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireResponse {
    #[serde(default)]
    candidates: Vec<WireCandidate>,
    usage_metadata: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct WireCandidate {
    content: Option<WireCandidateContent>,
}

#[derive(Debug, Deserialize)]
struct WireCandidateContent {
    #[serde(default)]
    parts: Vec<WireResponsePart>,
}

#[derive(Debug, Deserialize)]
struct WireResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireUsage {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
}

impl WireResponse {
    /// Text of the first candidate, all parts joined. `None` if there is none.
    fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        if text.is_empty() { None } else { Some(text) }
    }
}

#[derive(Debug, Deserialize)]
struct WireErrorEnvelope {
    error: WireError,
}

#[derive(Debug, Deserialize)]
struct WireError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

/// Pull `status: message` out of a Google API error body, or return the raw body.
fn error_detail(body: &str) -> String {
    match serde_json::from_str::<WireErrorEnvelope>(body) {
        Ok(env) if !env.error.status.is_empty() => {
            format!("{}: {}", env.error.status, env.error.message)
        }
        Ok(env) => env.error.message,
        Err(_) => body.trim().to_string(),
    }
}
