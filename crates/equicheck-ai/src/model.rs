//! The generative-model seam: a provider-neutral request and the trait every
//! model adapter implements.

use async_trait::async_trait;
use equicheck_core::SchemaNode;

use crate::error::ModelError;

pub const PDF_MIME_TYPE: &str = "application/pdf";
pub const JSON_MIME_TYPE: &str = "application/json";

/// One element of the request content, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text(String),
    /// Raw bytes tagged with their media type. Forwarded opaquely.
    InlineData { mime_type: String, data: Vec<u8> },
}

impl Part {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn pdf(data: &[u8]) -> Self {
        Self::InlineData {
            mime_type: PDF_MIME_TYPE.to_string(),
            data: data.to_vec(),
        }
    }
}

/// A single structured-generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub system_instruction: String,
    pub parts: Vec<Part>,
    /// Forces machine-parseable output when set to JSON.
    pub response_mime_type: String,
    pub response_schema: SchemaNode,
    pub temperature: f32,
}

/// A remote generative model.
///
/// Returns the response text, or `None` when the service answered without any.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Model identifier for logs.
    fn model_name(&self) -> &str;

    async fn generate(&self, request: &GenerateRequest) -> Result<Option<String>, ModelError>;
}
