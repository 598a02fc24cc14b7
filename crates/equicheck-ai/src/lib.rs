//! AI layer: structured document comparison through a remote generative model.

pub mod error;
pub mod model;
pub mod prompt;
pub mod service;

#[cfg(feature = "gemini")]
pub mod gemini;

pub use error::{AnalysisError, ModelError, classify_failure};
pub use model::{GenerateRequest, GenerativeModel, Part};
pub use service::AnalysisService;

#[cfg(feature = "gemini")]
pub use gemini::{GeminiClient, GeminiConfig, GeminiConfigError};
